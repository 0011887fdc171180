//! Equality filters applied to collection queries.
//!
//! A `Filter` is built from one of the per-endpoint allow-list structs
//! (`AuthorFilter`, `BookFilter`), so its column names are always known
//! `'static` identifiers and never come straight from the query string.

use chrono::{DateTime, Utc};

use crate::models::Entity;

/// A scalar value a column can be compared or sorted by.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// A set of `column = value` predicates, implicitly AND-ed.
/// An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(&'static str, FieldValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column = value`.
    pub fn eq(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.conditions.push((column, value.into()));
        self
    }

    /// Adds `column = value` only when a value was supplied.
    pub fn eq_opt<V: Into<FieldValue>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    pub fn conditions(&self) -> &[(&'static str, FieldValue)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter against an already loaded entity.
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        self.conditions
            .iter()
            .all(|(column, expected)| entity.value_of(column).as_ref() == Some(expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_opt_skips_missing_values() {
        let filter = Filter::new()
            .eq_opt("genre", Some("drama".to_string()))
            .eq_opt::<String>("title", None)
            .eq("author_id", 7);

        assert_eq!(
            filter.conditions(),
            &[
                ("genre", FieldValue::Text("drama".into())),
                ("author_id", FieldValue::Int(7)),
            ]
        );
        assert!(!filter.is_empty());
        assert!(Filter::new().is_empty());
    }
}
