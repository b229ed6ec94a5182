//! Filter building
//!
//! Provides type-safe filter construction for repository searches

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static FIELD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("field name pattern is valid"));

/// Check that a field name is a plain lowercase identifier
///
/// Field names end up in table and column names, so anything else is rejected.
pub fn validate_field_name(field: &str) -> Result<()> {
    if FIELD_NAME.is_match(field) {
        Ok(())
    } else {
        anyhow::bail!("Invalid field name '{}'", field)
    }
}

/// Exact match against one value of a multi-valued field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    field: String,
    value: String,
}

impl Filter {
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether any of `values` equals the filter value
    pub fn matches(&self, values: &[String]) -> bool {
        values.iter().any(|v| v == &self.value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = '{}'", self.field, self.value.replace('\'', "''"))
    }
}
