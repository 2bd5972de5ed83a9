//! Course reference data edited from the admin dashboard.
//!
//! The whole catalog is one JSON object held in a single `course_data`
//! document under the `data` key. An update replaces it wholesale.

use std::sync::Arc;

use grievance_core::document::{with_retry, Document, DocumentStore};
use grievance_core::types::COURSE_DATA;
use grievance_core::{GrievanceError, GrievanceResult};
use serde_json::Value;
use tracing::info;

const CATALOG_KEY: &str = "courses";

pub struct CourseCatalog {
    docs: Arc<dyn DocumentStore>,
    max_retries: u32,
}

impl CourseCatalog {
    pub fn new(docs: Arc<dyn DocumentStore>, max_retries: u32) -> Self {
        Self { docs, max_retries }
    }

    /// The current catalog; an empty object before the first update.
    pub fn get(&self) -> GrievanceResult<Document> {
        let found = with_retry(self.max_retries, "find courses", || {
            self.docs.find(COURSE_DATA, &key_filter(), Some(&["data"][..]))
        })?;
        Ok(found
            .into_iter()
            .last()
            .and_then(|mut doc| match doc.remove("data") {
                Some(Value::Object(data)) => Some(data),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// Replace the catalog. Anything other than a JSON object is rejected.
    pub fn replace(&self, data: Value) -> GrievanceResult<Document> {
        let Value::Object(data) = data else {
            return Err(GrievanceError::validation(["data"]));
        };

        let mut set = Document::new();
        set.insert("data".into(), Value::Object(data.clone()));
        let matched = with_retry(self.max_retries, "update courses", || {
            self.docs.update_many(COURSE_DATA, &key_filter(), &set, &[])
        })?;
        if matched == 0 {
            let mut doc = key_filter();
            doc.insert("data".into(), Value::Object(data.clone()));
            with_retry(self.max_retries, "insert courses", || {
                self.docs.insert_one(COURSE_DATA, doc.clone())
            })?;
        }
        info!(entries = data.len(), "Course catalog replaced");
        Ok(data)
    }
}

fn key_filter() -> Document {
    let mut filter = Document::new();
    filter.insert("key".into(), Value::from(CATALOG_KEY));
    filter
}
