//! Shared fixtures for integration tests
//!
//! Builds on-disk SQLite repositories laid out the way the tool expects and
//! configuration files pointing at them.

#![allow(dead_code)]

pub mod mocks;

use anyhow::Result;
use move_division::config::{Config, RepositoryConfig};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE eprint (
        eprintid INTEGER PRIMARY KEY,
        eprint_status TEXT NOT NULL,
        title TEXT,
        lastmod TEXT
    )
    "#,
    r#"
    CREATE TABLE eprint_divisions (
        eprintid INTEGER NOT NULL REFERENCES eprint(eprintid),
        pos INTEGER NOT NULL,
        divisions TEXT NOT NULL,
        PRIMARY KEY (eprintid, pos)
    )
    "#,
];

/// A record to seed: id, status, divisions
pub type Seed<'a> = (i64, &'a str, &'a [&'a str]);

/// Create a repository database at `path` holding `records`
pub async fn create_repository(path: &Path, records: &[Seed<'_>]) -> Result<()> {
    let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut conn).await?;
    }

    for (id, status, divisions) in records {
        sqlx::query("INSERT INTO eprint (eprintid, eprint_status, title) VALUES (?, ?, ?)")
            .bind(*id)
            .bind(*status)
            .bind(format!("Record {}", id))
            .execute(&mut conn)
            .await?;

        for (pos, division) in divisions.iter().enumerate() {
            sqlx::query("INSERT INTO eprint_divisions (eprintid, pos, divisions) VALUES (?, ?, ?)")
                .bind(*id)
                .bind(pos as i64)
                .bind(*division)
                .execute(&mut conn)
                .await?;
        }
    }

    conn.close().await?;
    Ok(())
}

/// Divisions of record `id`, in position order
pub async fn divisions_of(path: &Path, id: i64) -> Result<Vec<String>> {
    let options = SqliteConnectOptions::new().filename(path);
    let mut conn = SqliteConnection::connect_with(&options).await?;
    let rows: Vec<String> =
        sqlx::query_scalar("SELECT divisions FROM eprint_divisions WHERE eprintid = ? ORDER BY pos")
            .bind(id)
            .fetch_all(&mut conn)
            .await?;
    conn.close().await?;
    Ok(rows)
}

/// Last-modified stamp of record `id`
pub async fn lastmod_of(path: &Path, id: i64) -> Result<Option<String>> {
    let options = SqliteConnectOptions::new().filename(path);
    let mut conn = SqliteConnection::connect_with(&options).await?;
    let stamp: Option<String> = sqlx::query_scalar("SELECT lastmod FROM eprint WHERE eprintid = ?")
        .bind(id)
        .fetch_one(&mut conn)
        .await?;
    conn.close().await?;
    Ok(stamp)
}

/// Configuration with a single repository backed by `database`
pub fn config_for(repository_id: &str, database: PathBuf) -> Config {
    let mut repositories = HashMap::new();
    repositories.insert(
        repository_id.to_string(),
        RepositoryConfig {
            database,
            dataset: "eprint".to_string(),
        },
    );
    Config { repositories }
}
