//! Complaint store: the dual write into a type queue plus the aggregate
//! collection, and the filtered reads behind every admin view.
//!
//! The two writes of a submission are sequential and independent. If the
//! aggregate write fails after the queue write succeeded, the error is returned
//! and the queue copy stays; nothing reconciles it.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use grievance_core::document::{self, Document, DocumentStore};
use grievance_core::types::{Category, Complaint, GeneralCategory, Queue, Status};
use grievance_core::{GrievanceError, GrievanceResult};
use grievance_platform::{ViewKind, ViewSource};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{ComplaintFilter, ComplaintSubmission};

pub struct ComplaintStore {
    docs: Arc<dyn DocumentStore>,
    max_retries: u32,
}

impl ComplaintStore {
    pub fn new(docs: Arc<dyn DocumentStore>, max_retries: u32) -> Self {
        info!(max_retries, "Complaint store initialized");
        Self { docs, max_retries }
    }

    // ─── Writes ────────────────────────────────────────────────────────────

    /// Validate a submission and write it to its queue and the aggregate collection.
    pub fn submit(&self, submission: ComplaintSubmission) -> GrievanceResult<Complaint> {
        let complaint = submission.into_complaint(Uuid::new_v4(), Utc::now())?;
        let doc = complaint.to_document()?;
        let queue = complaint.complaint_type().queue();

        self.with_retry("insert queue", || {
            self.docs.insert_one(queue.collection(), doc.clone())
        })?;

        if let Err(e) = self.with_retry("insert aggregate", || {
            self.docs.insert_one(Queue::Aggregate.collection(), doc.clone())
        }) {
            error!(
                complaint_id = %complaint.id,
                queue = queue.collection(),
                error = %e,
                "Complaint stored in queue but missing from aggregate collection"
            );
            return Err(e);
        }

        info!(
            complaint_id = %complaint.id,
            queue = queue.collection(),
            category = %complaint.category,
            "Complaint submitted"
        );
        Ok(complaint)
    }

    /// Set the status on both copies of a complaint. Setting the same status
    /// twice is harmless; `Unset` removes the field.
    pub fn update_status(&self, id: Uuid, status: Status) -> GrievanceResult<()> {
        let filter = id_filter(id);
        let mut set = Document::new();
        let mut unset: Vec<&str> = Vec::new();
        if status.is_unset() {
            unset.push("status");
        } else {
            set.insert("status".into(), Value::from(status.as_str()));
        }

        let mut matched = 0;
        for queue in Queue::TYPED.iter().chain(std::iter::once(&Queue::Aggregate)) {
            matched += self.with_retry("update status", || {
                self.docs
                    .update_many(queue.collection(), &filter, &set, &unset)
            })?;
        }

        if matched == 0 {
            return Err(GrievanceError::NotFound(format!("complaint {id}")));
        }
        info!(complaint_id = %id, status = %status, "Complaint status updated");
        Ok(())
    }

    // ─── Reads ─────────────────────────────────────────────────────────────

    /// All complaints in one collection matching the filter, in insertion order.
    pub fn query(&self, queue: Queue, filter: &ComplaintFilter) -> GrievanceResult<Vec<Complaint>> {
        self.find(queue, Document::new(), filter)
    }

    /// Complaints of one category across every type queue, each identity once.
    pub fn query_cross_cutting(
        &self,
        category: Category,
        filter: &ComplaintFilter,
    ) -> GrievanceResult<Vec<Complaint>> {
        let mut base = Document::new();
        base.insert("category".into(), Value::from(category.as_str()));

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for queue in Queue::TYPED {
            for complaint in self.find(queue, base.clone(), filter)? {
                if seen.insert(complaint.id) {
                    out.push(complaint);
                }
            }
        }
        Ok(out)
    }

    /// General complaints filed under one sub-category.
    pub fn query_general(
        &self,
        general_category: GeneralCategory,
        filter: &ComplaintFilter,
    ) -> GrievanceResult<Vec<Complaint>> {
        let mut base = Document::new();
        base.insert(
            "general_category".into(),
            Value::from(general_category.as_str()),
        );
        self.find(Queue::General, base, filter)
    }

    /// The complaints a resolved view may see.
    pub fn query_view(&self, view: ViewKind, filter: &ComplaintFilter) -> GrievanceResult<Vec<Complaint>> {
        match view.source() {
            Some(ViewSource::Queue(queue)) => self.query(queue, filter),
            Some(ViewSource::CrossCutting(category)) => self.query_cross_cutting(category, filter),
            Some(ViewSource::GeneralSubCategory(sub)) => self.query_general(sub, filter),
            None => Err(GrievanceError::AccessDenied(
                "role has no complaint view".into(),
            )),
        }
    }

    /// Whether a complaint is among the records a view may see.
    pub fn visible_in(&self, view: ViewKind, id: Uuid) -> GrievanceResult<bool> {
        Ok(self
            .query_view(view, &ComplaintFilter::default())?
            .iter()
            .any(|c| c.id == id))
    }

    fn find(
        &self,
        queue: Queue,
        mut base: Document,
        filter: &ComplaintFilter,
    ) -> GrievanceResult<Vec<Complaint>> {
        for (k, v) in filter.to_document() {
            // A pushed-down field that contradicts the base filter can never match.
            if base.get(&k).is_some_and(|existing| existing != &v) {
                return Ok(Vec::new());
            }
            base.insert(k, v);
        }

        let docs = self.with_retry("find", || self.docs.find(queue.collection(), &base, None))?;
        let mut out = Vec::with_capacity(docs.len());
        for doc in docs {
            let complaint = Complaint::from_document(doc)?;
            if filter.accepts(&complaint) {
                out.push(complaint);
            }
        }
        Ok(out)
    }

    fn with_retry<T>(
        &self,
        op: &'static str,
        f: impl FnMut() -> GrievanceResult<T>,
    ) -> GrievanceResult<T> {
        document::with_retry(self.max_retries, op, f)
    }
}

fn id_filter(id: Uuid) -> Document {
    let mut filter = Document::new();
    filter.insert("id".into(), Value::from(id.to_string()));
    filter
}
