//! SQLite repository platform
//!
//! Records live in an `eprint` table keyed by `eprintid` with an
//! `eprint_status` column. Each multi-valued field `<f>` has its own table
//! `eprint_<f>(eprintid, pos, <f>)`, one row per value.

pub mod db;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

use super::dataset::Dataset;
use super::platform::{Noise, Platform, Record, RecordId, RecordVisitor, ResultSet, Session};
use super::query::{Filter, validate_field_name};
use crate::config::Config;

/// Platform resolving repository identifiers through the configuration file
pub struct SqlitePlatform {
    config: Config,
}

impl SqlitePlatform {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Platform for SqlitePlatform {
    async fn open_session(&self, repository_id: &str, noise: Noise) -> Result<Box<dyn Session>> {
        let repository = self.config.repository(repository_id)?;
        let pool = db::connect(&repository.database).await?;
        db::verify_schema(&pool).await?;

        let stamps_lastmod: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('eprint') WHERE name = 'lastmod'",
        )
        .fetch_one(&pool)
        .await
        .context("Failed to inspect record table")?;

        info!(
            "Opened session for '{}' ({}) at noise {}",
            repository_id,
            repository.database.display(),
            noise
        );

        Ok(Box::new(SqliteSession {
            repository_id: repository_id.to_string(),
            noise,
            pool,
            stamps_lastmod: stamps_lastmod > 0,
        }))
    }

    fn default_dataset(&self, repository_id: &str) -> String {
        self.config.dataset_for(repository_id).to_string()
    }
}

struct SqliteSession {
    repository_id: String,
    noise: Noise,
    pool: SqlitePool,
    stamps_lastmod: bool,
}

/// Build the id query for a search
///
/// Bind order: dataset status (if any), then each filter value in order.
fn search_sql(dataset: &Dataset, filters: &[Filter], satisfy_all: bool) -> String {
    let mut sql = String::from("SELECT eprintid FROM eprint WHERE 1 = 1");

    if dataset.status().is_some() {
        sql.push_str(" AND eprint_status = ?");
    }

    if !filters.is_empty() {
        let subqueries: Vec<String> = filters
            .iter()
            .map(|f| format!("SELECT eprintid FROM eprint_{0} WHERE {0} = ?", f.field()))
            .collect();
        let joiner = if satisfy_all { " INTERSECT " } else { " UNION " };
        sql.push_str(&format!(" AND eprintid IN ({})", subqueries.join(joiner)));
    }

    sql.push_str(" ORDER BY eprintid");
    sql
}

#[async_trait]
impl Session for SqliteSession {
    fn repository_id(&self) -> &str {
        &self.repository_id
    }

    fn noise(&self) -> Noise {
        self.noise
    }

    async fn search(
        &self,
        dataset: &Dataset,
        filters: &[Filter],
        satisfy_all: bool,
    ) -> Result<Box<dyn ResultSet>> {
        for filter in filters {
            validate_field_name(filter.field())?;
        }

        let sql = search_sql(dataset, filters, satisfy_all);
        debug!("Searching {}: {}", dataset, sql);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(status) = dataset.status() {
            query = query.bind(status.to_string());
        }
        for filter in filters {
            query = query.bind(filter.value().to_string());
        }

        let ids = query
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Search of dataset '{}' failed", dataset))?;

        Ok(Box::new(SqliteResultSet {
            pool: self.pool.clone(),
            stamps_lastmod: self.stamps_lastmod,
            ids,
        }))
    }

    async fn terminate(&self) -> Result<()> {
        self.pool.close().await;
        debug!("Closed session for '{}'", self.repository_id);
        Ok(())
    }
}

struct SqliteResultSet {
    pool: SqlitePool,
    stamps_lastmod: bool,
    ids: Vec<RecordId>,
}

#[async_trait]
impl ResultSet for SqliteResultSet {
    fn count(&self) -> usize {
        self.ids.len()
    }

    async fn for_each(&mut self, visitor: &mut dyn RecordVisitor) -> Result<()> {
        for &id in &self.ids {
            let mut record = SqliteRecord {
                id,
                pool: self.pool.clone(),
                stamps_lastmod: self.stamps_lastmod,
                changes: BTreeMap::new(),
            };
            visitor.visit(&mut record).await?;
        }
        Ok(())
    }
}

struct SqliteRecord {
    id: RecordId,
    pool: SqlitePool,
    stamps_lastmod: bool,
    changes: BTreeMap<String, Vec<String>>,
}

#[async_trait]
impl Record for SqliteRecord {
    fn id(&self) -> RecordId {
        self.id
    }

    fn set_field(&mut self, field: &str, values: Vec<String>) {
        self.changes.insert(field.to_string(), values);
    }

    async fn commit(&mut self) -> Result<()> {
        if self.changes.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;

        for (field, values) in &self.changes {
            validate_field_name(field)?;

            sqlx::query(&format!("DELETE FROM eprint_{} WHERE eprintid = ?", field))
                .bind(self.id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to clear '{}' of record {}", field, self.id))?;

            for (pos, value) in values.iter().enumerate() {
                sqlx::query(&format!(
                    "INSERT INTO eprint_{0} (eprintid, pos, {0}) VALUES (?, ?, ?)",
                    field
                ))
                .bind(self.id)
                .bind(pos as i64)
                .bind(value.as_str())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to write '{}' of record {}", field, self.id))?;
            }
        }

        if self.stamps_lastmod {
            sqlx::query("UPDATE eprint SET lastmod = ? WHERE eprintid = ?")
                .bind(Utc::now())
                .bind(self.id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to stamp record {}", self.id))?;
        }

        tx.commit()
            .await
            .with_context(|| format!("Failed to commit record {}", self.id))?;

        debug!("Committed record {}", self.id);
        self.changes.clear();
        Ok(())
    }
}
