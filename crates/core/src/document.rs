//! Minimal document-store interface and an in-memory implementation.
//!
//! The core only ever needs exact-match finds, single inserts and a targeted
//! field update; anything richer belongs to the storage engine behind the trait.

use dashmap::DashMap;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::GrievanceResult;

/// A flat mapping of field name to value.
pub type Document = serde_json::Map<String, Value>;

pub trait DocumentStore: Send + Sync {
    fn insert_one(&self, collection: &str, document: Document) -> GrievanceResult<()>;

    /// Exact-match conjunction over `filter`. With a projection, only the named
    /// fields are returned. Results come back in insertion order.
    fn find(
        &self,
        collection: &str,
        filter: &Document,
        projection: Option<&[&str]>,
    ) -> GrievanceResult<Vec<Document>>;

    /// Set and unset fields on every document matching `filter`; returns how many matched.
    fn update_many(
        &self,
        collection: &str,
        filter: &Document,
        set: &Document,
        unset: &[&str],
    ) -> GrievanceResult<u64>;
}

/// Run a storage call, retrying transient failures up to `max_retries` extra
/// times with no backoff.
pub fn with_retry<T>(
    max_retries: u32,
    op: &'static str,
    mut f: impl FnMut() -> GrievanceResult<T>,
) -> GrievanceResult<T> {
    let mut attempt = 0;
    loop {
        match f() {
            Err(e) if e.is_retryable() && attempt < max_retries => {
                attempt += 1;
                warn!(op, attempt, error = %e, "Transient storage failure, retrying");
            }
            result => return result,
        }
    }
}

/// True when every filter field is present in `doc` with an equal value.
pub fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(k, v)| doc.get(k) == Some(v))
}

fn project(doc: &Document, projection: Option<&[&str]>) -> Document {
    match projection {
        None => doc.clone(),
        Some(fields) => fields
            .iter()
            .filter_map(|f| doc.get(*f).map(|v| ((*f).to_string(), v.clone())))
            .collect(),
    }
}

/// Thread-safe in-memory document store backed by DashMap, one entry per collection.
pub struct InMemoryDocumentStore {
    collections: DashMap<String, Vec<Document>>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        info!("Document store initialized (in-memory)");
        Self {
            collections: DashMap::new(),
        }
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert_one(&self, collection: &str, document: Document) -> GrievanceResult<()> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    fn find(
        &self,
        collection: &str,
        filter: &Document,
        projection: Option<&[&str]>,
    ) -> GrievanceResult<Vec<Document>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|d| matches(d, filter))
            .map(|d| project(d, projection))
            .collect())
    }

    fn update_many(
        &self,
        collection: &str,
        filter: &Document,
        set: &Document,
        unset: &[&str],
    ) -> GrievanceResult<u64> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut matched = 0;
        for doc in docs.iter_mut().filter(|d| matches(d, filter)) {
            for (k, v) in set {
                doc.insert(k.clone(), v.clone());
            }
            for k in unset {
                doc.remove(*k);
            }
            matched += 1;
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrievanceError;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_find_exact_match_in_insertion_order() {
        let store = InMemoryDocumentStore::new();
        store.insert_one("c", doc(json!({"n": 1, "k": "a"}))).unwrap();
        store.insert_one("c", doc(json!({"n": 2, "k": "b"}))).unwrap();
        store.insert_one("c", doc(json!({"n": 3, "k": "a"}))).unwrap();

        let found = store.find("c", &doc(json!({"k": "a"})), None).unwrap();
        let ns: Vec<_> = found.iter().map(|d| d["n"].clone()).collect();
        assert_eq!(ns, vec![json!(1), json!(3)]);

        assert_eq!(store.find("c", &Document::new(), None).unwrap().len(), 3);
        assert!(store.find("missing", &Document::new(), None).unwrap().is_empty());
    }

    #[test]
    fn test_projection_keeps_named_fields() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one("c", doc(json!({"a": 1, "b": 2, "c": 3})))
            .unwrap();
        let found = store.find("c", &Document::new(), Some(&["a", "c", "zz"][..])).unwrap();
        assert_eq!(found[0], doc(json!({"a": 1, "c": 3})));
    }

    #[test]
    fn test_update_many_sets_and_unsets() {
        let store = InMemoryDocumentStore::new();
        store.insert_one("c", doc(json!({"id": "x", "s": "old"}))).unwrap();
        store.insert_one("c", doc(json!({"id": "y"}))).unwrap();

        let matched = store
            .update_many("c", &doc(json!({"id": "x"})), &doc(json!({"t": true})), &["s"])
            .unwrap();
        assert_eq!(matched, 1);
        let found = store.find("c", &doc(json!({"id": "x"})), None).unwrap();
        assert_eq!(found[0], doc(json!({"id": "x", "t": true})));

        let none = store
            .update_many("other", &Document::new(), &Document::new(), &[])
            .unwrap();
        assert_eq!(none, 0);
    }

    #[test]
    fn test_with_retry_bounded() {
        let mut calls = 0;
        let result: GrievanceResult<()> = with_retry(2, "find", || {
            calls += 1;
            Err(GrievanceError::StorageUnavailable("down".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);

        let mut calls = 0;
        let result = with_retry(2, "find", || {
            calls += 1;
            if calls < 2 {
                Err(GrievanceError::StorageUnavailable("blip".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn test_with_retry_skips_permanent_errors() {
        let mut calls = 0;
        let result: GrievanceResult<()> = with_retry(5, "insert", || {
            calls += 1;
            Err(GrievanceError::NotFound("x".into()))
        });
        assert!(matches!(result, Err(GrievanceError::NotFound(_))));
        assert_eq!(calls, 1);
    }
}
