//! Chat usage log. Each chatbot exchange becomes one `chat_history` document.

use std::sync::Arc;

use chrono::Utc;
use grievance_core::document::{with_retry, DocumentStore};
use grievance_core::types::{ChatRecord, CHAT_HISTORY};
use grievance_core::{GrievanceError, GrievanceResult};
use serde_json::Value;
use tracing::debug;

pub struct UsageLog {
    docs: Arc<dyn DocumentStore>,
    max_retries: u32,
}

impl UsageLog {
    pub fn new(docs: Arc<dyn DocumentStore>, max_retries: u32) -> Self {
        Self { docs, max_retries }
    }

    /// Append an exchange stamped with the current time.
    pub fn record(
        &self,
        user_id: &str,
        user_message: &str,
        bot_response: &str,
    ) -> GrievanceResult<ChatRecord> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(GrievanceError::validation(["user_id"]));
        }
        let record = ChatRecord {
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            user_message: user_message.to_string(),
            bot_response: bot_response.to_string(),
        };
        self.append(&record)?;
        Ok(record)
    }

    /// Append a record as-is, keeping its timestamp.
    pub fn append(&self, record: &ChatRecord) -> GrievanceResult<()> {
        let Value::Object(doc) = serde_json::to_value(record)? else {
            return Err(GrievanceError::Internal(anyhow::anyhow!(
                "chat record serialized to non-object"
            )));
        };
        with_retry(self.max_retries, "insert chat", || {
            self.docs.insert_one(CHAT_HISTORY, doc.clone())
        })?;
        debug!(user_id = %record.user_id, "Chat exchange recorded");
        Ok(())
    }
}
