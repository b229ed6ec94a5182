//! Traits every concrete repository platform implements

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

use super::dataset::{DEFAULT_DATASET, Dataset};
use super::query::Filter;

/// Stable identity of a record across rewrites
pub type RecordId = i64;

/// How chatty the tool and its session should be
///
/// `0` is silent, `1` is the normal level, anything higher is verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Noise(u8);

impl Noise {
    pub const SILENT: Noise = Noise(0);
    pub const NORMAL: Noise = Noise(1);

    pub fn new(level: u8) -> Self {
        Self(level)
    }

    /// Derive the level from the counted `--quiet` and `--verbose` flags
    pub fn from_flags(quiet: u8, verbose: u8) -> Self {
        if quiet > 0 {
            Self::SILENT
        } else {
            Self(1u8.saturating_add(verbose))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn is_silent(self) -> bool {
        self.0 == 0
    }

    pub fn is_verbose(self) -> bool {
        self.0 > 1
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Noise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves repository identifiers to sessions
#[async_trait]
pub trait Platform: Send + Sync {
    /// Open a session against the named repository
    ///
    /// Fails when the identifier does not resolve to a reachable repository.
    async fn open_session(&self, repository_id: &str, noise: Noise) -> Result<Box<dyn Session>>;

    /// Name of the dataset searched in `repository_id`
    fn default_dataset(&self, _repository_id: &str) -> String {
        DEFAULT_DATASET.to_string()
    }
}

/// An open connection to one repository instance
#[async_trait]
pub trait Session: Send + Sync {
    fn repository_id(&self) -> &str;

    fn noise(&self) -> Noise;

    /// Look up a dataset by name
    fn dataset(&self, name: &str) -> Result<Dataset> {
        Dataset::named(name)
    }

    /// Find the records of `dataset` matching `filters`
    ///
    /// With `satisfy_all` a record must match every filter, otherwise any one.
    /// An empty filter list matches the whole dataset.
    async fn search(
        &self,
        dataset: &Dataset,
        filters: &[Filter],
        satisfy_all: bool,
    ) -> Result<Box<dyn ResultSet>>;

    /// Release the connection; the session is unusable afterwards
    async fn terminate(&self) -> Result<()> {
        Ok(())
    }
}

/// Records matched by a search
#[async_trait]
pub trait ResultSet: Send {
    fn count(&self) -> usize;

    /// Hand every matched record to `visitor`, stopping at the first error
    async fn for_each(&mut self, visitor: &mut dyn RecordVisitor) -> Result<()>;
}

/// A single persisted record
#[async_trait]
pub trait Record: Send {
    fn id(&self) -> RecordId;

    /// Replace every value of a multi-valued field
    fn set_field(&mut self, field: &str, values: Vec<String>);

    /// Persist the fields changed since the record was loaded
    async fn commit(&mut self) -> Result<()>;
}

/// Callback applied to each record of a result set
#[async_trait]
pub trait RecordVisitor: Send {
    async fn visit(&mut self, record: &mut dyn Record) -> Result<()>;
}
