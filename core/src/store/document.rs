//! Key to document mapping owned by a database instance

use crate::value::{Document, Value};

/// In-memory mapping from key to [`Value`].
///
/// Iteration follows insertion order. Overwriting a key keeps its position;
/// deleting and re-inserting moves it to the end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    documents: Document,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a key, returning the previous value
    pub fn set(&mut self, key: String, value: Value) -> Option<Value> {
        self.documents.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.documents.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.documents.contains_key(key)
    }

    /// Remove a key, returning its value if it was present
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.documents.shift_remove(key)
    }

    /// Remove every key, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let removed = self.documents.len();
        self.documents.clear();
        removed
    }

    /// Independent copy of the full mapping
    pub fn snapshot(&self) -> Document {
        self.documents.clone()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.documents.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.documents.keys()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl From<Document> for DocumentStore {
    fn from(documents: Document) -> Self {
        Self { documents }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store_with(keys: &[&str]) -> DocumentStore {
        let mut store = DocumentStore::new();
        for (i, key) in keys.iter().enumerate() {
            store.set(key.to_string(), Value::from(i as i64));
        }
        store
    }

    #[test]
    fn test_set_get_has() {
        let mut store = DocumentStore::new();
        let doc = Value::from(json!({"name": "test", "value": 123}));

        assert_eq!(store.set("test".into(), doc.clone()), None);
        assert_eq!(store.get("test"), Some(&doc));
        assert!(store.has("test"));
        assert!(!store.has("nonexistent"));
        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_stored_null_is_not_absent() {
        let mut store = DocumentStore::new();
        store.set("empty".into(), Value::Null);

        assert!(store.has("empty"));
        assert_eq!(store.get("empty"), Some(&Value::Null));
    }

    #[test]
    fn test_overwrite_returns_previous() {
        let mut store = DocumentStore::new();
        store.set("k".into(), Value::from(1));
        assert_eq!(store.set("k".into(), Value::from(2)), Some(Value::from(1)));
        assert_eq!(store.get("k"), Some(&Value::from(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut store = store_with(&["a", "b"]);

        assert_eq!(store.delete("a"), Some(Value::from(0)));
        assert_eq!(store.delete("a"), None);
        assert!(!store.has("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut store = store_with(&["a", "b", "c"]);
        assert_eq!(store.clear(), 3);
        assert!(store.is_empty());
        assert_eq!(store.clear(), 0);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut store = store_with(&["a"]);
        let mut snapshot = store.snapshot();

        snapshot.insert("b".into(), Value::from(true));
        store.set("c".into(), Value::from(false));

        assert!(!store.has("b"));
        assert!(!snapshot.contains_key("c"));
    }

    #[test]
    fn test_iteration_order() {
        let mut store = store_with(&["u1", "u2", "u3"]);
        store.set("u1".into(), Value::from("changed"));
        let keys: Vec<&str> = store.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["u1", "u2", "u3"]);

        store.delete("u1");
        store.set("u1".into(), Value::from("back"));
        let keys: Vec<&str> = store.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["u2", "u3", "u1"]);
    }
}
