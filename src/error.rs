//! Error taxonomy at the process boundary
//!
//! Everything below the driver propagates `anyhow::Error`; `main` sorts the
//! outcome into one of these variants to pick an exit status.

use thiserror::Error;

/// One-line usage string printed for malformed invocations
pub const USAGE: &str = "Usage: move_division <repository_id> <source_division>... <dest_division> [--quiet] [--force] [--verbose] [--config <PATH>]";

#[derive(Error, Debug)]
pub enum MoveError {
    /// Help or version text was asked for; not a failure
    #[error("{0}")]
    Help(String),

    /// Malformed invocation, detected before any repository access
    #[error("{0}")]
    Usage(String),

    /// The repository identifier did not resolve to a session
    #[error("Failed to load repository: {repository} ({reason})")]
    Session { repository: String, reason: String },

    /// Anything raised by the search or persistence layer
    #[error(transparent)]
    Platform(#[from] anyhow::Error),
}

impl MoveError {
    pub fn usage(detail: impl Into<String>) -> Self {
        Self::Usage(detail.into())
    }

    pub fn session(repository: impl Into<String>, reason: &anyhow::Error) -> Self {
        Self::Session {
            repository: repository.into(),
            reason: format!("{:#}", reason),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            MoveError::Help(_) => 0,
            MoveError::Usage(_) => 1,
            MoveError::Session { .. } => 2,
            MoveError::Platform(_) => 3,
        }
    }
}
