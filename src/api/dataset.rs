//! Named views over the record table

use anyhow::Result;
use std::fmt;

/// Dataset searched when none is configured
pub const DEFAULT_DATASET: &str = "eprint";

/// A dataset is the record table, optionally narrowed to one record status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    name: String,
    status: Option<String>,
}

impl Dataset {
    /// Resolve one of the known dataset names
    ///
    /// `eprint` covers every record; `archive`, `buffer`, `inbox` and
    /// `deletion` only cover records with that status.
    pub fn named(name: &str) -> Result<Self> {
        let status = match name {
            "eprint" => None,
            "archive" | "buffer" | "inbox" | "deletion" => Some(name.to_string()),
            other => anyhow::bail!("Unknown dataset '{}'", other),
        };

        Ok(Self {
            name: name.to_string(),
            status,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record status this dataset is restricted to, if any
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether a record with `status` belongs to this dataset
    pub fn includes(&self, status: &str) -> bool {
        self.status.as_deref().map_or(true, |s| s == status)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
