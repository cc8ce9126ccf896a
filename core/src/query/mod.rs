//! Query engine
//!
//! Queries are nested equality constraints evaluated with a single pass over
//! the stored values, followed by an optional sort, skip and limit.

mod matcher;
mod options;

pub use matcher::matches;
pub use options::{FindOptions, Sort, SortOrder};

use crate::error::StoreError;
use crate::value::{Document, Value};

/// Query specification.
///
/// Each field maps to either a value the candidate's field must equal, or to a
/// nested specification for an object-valued field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query(Document);

impl Query {
    /// Query matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a constraint on a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, candidate: &Value) -> bool {
        matches(Some(candidate), &self.0)
    }
}

impl From<Document> for Query {
    fn from(spec: Document) -> Self {
        Self(spec)
    }
}

impl TryFrom<Value> for Query {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(spec) => Ok(Self(spec)),
            other => Err(StoreError::InvalidQuery(format!(
                "Query must be an object, got {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<serde_json::Value> for Query {
    type Error = StoreError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Query::try_from(Value::from_json(value))
    }
}

/// Filter, sort, skip and limit, in that order.
///
/// Only the documents that survive all four steps are cloned.
pub fn find<'a, I>(values: I, query: &Query, options: &FindOptions) -> Vec<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut results: Vec<&Value> = values.into_iter().filter(|v| query.matches(v)).collect();

    // Stable, so documents that compare equal keep store order
    if let Some(sort) = &options.sort {
        results.sort_by(|a, b| sort.compare(a, b));
    }

    results
        .into_iter()
        .skip(options.skip.unwrap_or(0))
        .take(options.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// Number of documents matching a query, without cloning any of them.
pub fn count<'a, I>(values: I, query: &Query) -> usize
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().filter(|v| query.matches(v)).count()
}
