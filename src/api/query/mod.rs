//! Search filters
//!
//! Filters select records by the values of a multi-valued field. A session
//! combines several filters with AND or OR semantics.

pub mod filters;

pub use filters::{Filter, validate_field_name};
