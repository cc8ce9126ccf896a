//! Recursive structural matching

use crate::value::{Document, Value};

/// Check a candidate against a query specification.
///
/// A nested object in `spec` descends into the same-named field of the
/// candidate; every other spec value requires the field to be present and
/// equal, without coercion. An absent candidate (missing field or non-object
/// parent) satisfies only an empty specification.
pub fn matches(candidate: Option<&Value>, spec: &Document) -> bool {
    spec.iter().all(|(field, expected)| {
        let actual = candidate.and_then(|value| value.get(field));
        match expected {
            Value::Object(nested) => matches(actual, nested),
            _ => actual == Some(expected),
        }
    })
}
