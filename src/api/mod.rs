//! Repository platform contract
//!
//! The migration driver only talks to a repository through the traits in
//! [`platform`]: open a session, pick a dataset, search it with filters, then
//! visit the matching records and commit changes. [`sqlite`] implements the
//! contract over an on-disk SQLite store.

pub mod dataset;
pub mod platform;
pub mod query;
pub mod sqlite;

pub use dataset::Dataset;
pub use platform::{Noise, Platform, Record, RecordId, RecordVisitor, ResultSet, Session};
pub use query::{Filter, validate_field_name};
pub use sqlite::SqlitePlatform;
