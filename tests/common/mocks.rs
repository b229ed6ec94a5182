//! In-process repository platform
//!
//! Holds records in memory behind a shared handle so a test can seed a
//! repository, run the driver against it, then inspect what was committed.

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use move_division::api::{
    Dataset, Filter, Noise, Platform, Record, RecordId, RecordVisitor, ResultSet, Session,
    validate_field_name,
};

#[derive(Debug, Clone)]
struct StoredRecord {
    status: String,
    fields: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
struct Store {
    records: BTreeMap<RecordId, StoredRecord>,
    commits: usize,
    fail_commit_on: Option<RecordId>,
    fail_terminate: bool,
}

/// Shared handle to one in-memory repository
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a record with the given status and one multi-valued field
    pub fn with_record(self, id: RecordId, status: &str, field: &str, values: &[&str]) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            field.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self.lock().records.insert(
            id,
            StoredRecord {
                status: status.to_string(),
                fields,
            },
        );
        self
    }

    /// Current values of `field` on record `id`
    pub fn values(&self, id: RecordId, field: &str) -> Option<Vec<String>> {
        self.lock()
            .records
            .get(&id)
            .map(|r| r.fields.get(field).cloned().unwrap_or_default())
    }

    /// Number of successful record commits so far
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    /// Make the commit of record `id` fail
    pub fn fail_commit_on(&self, id: RecordId) {
        self.lock().fail_commit_on = Some(id);
    }

    /// Make closing a session on this repository fail
    pub fn fail_terminate(&self) {
        self.lock().fail_terminate = true;
    }

    fn matching_ids(&self, dataset: &Dataset, filters: &[Filter], satisfy_all: bool) -> Vec<RecordId> {
        self.lock()
            .records
            .iter()
            .filter(|(_, record)| dataset.includes(&record.status))
            .filter(|(_, record)| {
                if filters.is_empty() {
                    return true;
                }
                let hit = |filter: &Filter| {
                    record
                        .fields
                        .get(filter.field())
                        .map_or(false, |values| filter.matches(values))
                };
                if satisfy_all {
                    filters.iter().all(hit)
                } else {
                    filters.iter().any(hit)
                }
            })
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Platform resolving repository identifiers to in-memory repositories
///
/// Clones share the session counter, so a clone can be handed to the code
/// under test while the original is inspected.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlatform {
    repositories: HashMap<String, MemoryRepository>,
    sessions_opened: Arc<AtomicUsize>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(mut self, repository_id: &str, repository: MemoryRepository) -> Self {
        self.repositories.insert(repository_id.to_string(), repository);
        self
    }

    /// How many sessions have been opened against this platform
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for MemoryPlatform {
    async fn open_session(&self, repository_id: &str, noise: Noise) -> Result<Box<dyn Session>> {
        let repository = self
            .repositories
            .get(repository_id)
            .ok_or_else(|| anyhow::anyhow!("Repository '{}' does not exist", repository_id))?
            .clone();

        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        debug!("Opened in-memory session for '{}' at noise {}", repository_id, noise);

        Ok(Box::new(MemorySession {
            repository_id: repository_id.to_string(),
            noise,
            repository,
        }))
    }
}

struct MemorySession {
    repository_id: String,
    noise: Noise,
    repository: MemoryRepository,
}

#[async_trait]
impl Session for MemorySession {
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

        let ids = self.repository.matching_ids(dataset, filters, satisfy_all);
        Ok(Box::new(MemoryResultSet {
            repository: self.repository.clone(),
            ids,
        }))
    }

    async fn terminate(&self) -> Result<()> {
        if self.repository.lock().fail_terminate {
            anyhow::bail!("Repository '{}' refused to close", self.repository_id);
        }
        Ok(())
    }
}

struct MemoryResultSet {
    repository: MemoryRepository,
    ids: Vec<RecordId>,
}

#[async_trait]
impl ResultSet for MemoryResultSet {
    fn count(&self) -> usize {
        self.ids.len()
    }

    async fn for_each(&mut self, visitor: &mut dyn RecordVisitor) -> Result<()> {
        for &id in &self.ids {
            let mut record = MemoryRecord {
                id,
                repository: self.repository.clone(),
                changes: BTreeMap::new(),
            };
            visitor.visit(&mut record).await?;
        }
        Ok(())
    }
}

struct MemoryRecord {
    id: RecordId,
    repository: MemoryRepository,
    changes: BTreeMap<String, Vec<String>>,
}

#[async_trait]
impl Record for MemoryRecord {
    fn id(&self) -> RecordId {
        self.id
    }

    fn set_field(&mut self, field: &str, values: Vec<String>) {
        self.changes.insert(field.to_string(), values);
    }

    async fn commit(&mut self) -> Result<()> {
        let mut store = self.repository.lock();
        if store.fail_commit_on == Some(self.id) {
            anyhow::bail!("Commit of record {} rejected by repository", self.id);
        }

        let record = store
            .records
            .get_mut(&self.id)
            .ok_or_else(|| anyhow::anyhow!("Record {} no longer exists", self.id))?;
        for (field, values) in std::mem::take(&mut self.changes) {
            record.fields.insert(field, values);
        }
        store.commits += 1;
        Ok(())
    }
}
