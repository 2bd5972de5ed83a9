//! Complaint intake and admin API types.

use chrono::{DateTime, NaiveDate, Utc};
use grievance_core::document::Document;
use grievance_core::types::{
    Category, Complaint, ComplaintLocation, ComplaintType, GeneralCategory, Role, Status,
};
use grievance_core::{GrievanceError, GrievanceResult};
use grievance_platform::ViewKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Maximum length of short text fields (name, registration id, room, ...).
const MAX_FIELD_LEN: usize = 256;

/// Maximum length of the free-text details.
const MAX_DETAILS_LEN: usize = 4000;

/// The value a selector sends for "no filter".
const ALL: &str = "All";

// ─── Submission ────────────────────────────────────────────────────────────

/// Raw, untrusted complaint form values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplaintSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reg_no: String,
    #[serde(rename = "type", default)]
    pub complaint_type: String,
    #[serde(default)]
    pub hostel: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub room_no: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub general_category: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub details: String,
}

impl ComplaintSubmission {
    /// Validate every field and build the record. All offending fields are
    /// reported together.
    pub fn into_complaint(self, id: Uuid, created_at: DateTime<Utc>) -> GrievanceResult<Complaint> {
        let mut invalid = Vec::new();

        let name = text(&self.name, "name", MAX_FIELD_LEN, &mut invalid);
        let reg_no = text(&self.reg_no, "reg_no", MAX_FIELD_LEN, &mut invalid);

        let complaint_type = self.complaint_type.parse::<ComplaintType>().ok();
        if complaint_type.is_none() {
            invalid.push("type");
        }

        let category = self
            .category
            .parse::<Category>()
            .ok()
            .filter(|c| complaint_type.map_or(true, |t| t.allows(*c)));
        if category.is_none() {
            invalid.push("category");
        }

        let location = complaint_type.and_then(|t| self.location(t, &mut invalid));
        let details = text(&self.details, "details", MAX_DETAILS_LEN, &mut invalid);

        match (name, reg_no, location, category, details) {
            (Some(name), Some(reg_no), Some(location), Some(category), Some(details))
                if invalid.is_empty() =>
            {
                Ok(Complaint {
                    id,
                    name,
                    reg_no,
                    location,
                    category,
                    details,
                    status: Status::Unset,
                    created_at,
                })
            }
            _ => Err(GrievanceError::validation(invalid)),
        }
    }

    fn location(
        &self,
        complaint_type: ComplaintType,
        invalid: &mut Vec<&'static str>,
    ) -> Option<ComplaintLocation> {
        match complaint_type {
            ComplaintType::Hostel => {
                let hostel = opt_text(&self.hostel, "hostel", invalid);
                let floor = opt_text(&self.floor, "floor", invalid);
                let room_no = opt_text(&self.room_no, "room_no", invalid);
                Some(ComplaintLocation::Hostel {
                    hostel: hostel?,
                    floor: floor?,
                    room_no: room_no?,
                })
            }
            ComplaintType::Department => Some(ComplaintLocation::Department {
                department: opt_text(&self.department, "department", invalid)?,
            }),
            ComplaintType::General => {
                let parsed = self
                    .general_category
                    .as_deref()
                    .and_then(|g| g.parse::<GeneralCategory>().ok());
                if parsed.is_none() {
                    invalid.push("general_category");
                }
                Some(ComplaintLocation::General {
                    general_category: parsed?,
                })
            }
        }
    }
}

fn text(raw: &str, field: &'static str, max: usize, invalid: &mut Vec<&'static str>) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > max {
        invalid.push(field);
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn opt_text(raw: &Option<String>, field: &'static str, invalid: &mut Vec<&'static str>) -> Option<String> {
    text(raw.as_deref().unwrap_or(""), field, MAX_FIELD_LEN, invalid)
}

// ─── Filtering ─────────────────────────────────────────────────────────────

/// Exact-match conjunction over type, category and status. `None` means "All".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplaintFilter {
    pub complaint_type: Option<ComplaintType>,
    pub category: Option<Category>,
    pub status: Option<Status>,
}

/// Query-string form of [`ComplaintFilter`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplaintQuery {
    #[serde(rename = "type")]
    pub complaint_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl ComplaintFilter {
    pub fn from_query(query: &ComplaintQuery) -> GrievanceResult<Self> {
        let mut invalid = Vec::new();
        let filter = Self {
            complaint_type: selector(query.complaint_type.as_deref(), "type", &mut invalid),
            category: selector(query.category.as_deref(), "category", &mut invalid),
            status: selector(query.status.as_deref(), "status", &mut invalid),
        };
        if invalid.is_empty() {
            Ok(filter)
        } else {
            Err(GrievanceError::validation(invalid))
        }
    }

    /// The part of the filter a document store can evaluate. Unset status is
    /// the absence of a field, so it is left to [`ComplaintFilter::accepts`].
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(t) = self.complaint_type {
            doc.insert("type".into(), Value::from(t.as_str()));
        }
        if let Some(c) = self.category {
            doc.insert("category".into(), Value::from(c.as_str()));
        }
        if let Some(s) = self.status.filter(|s| !s.is_unset()) {
            doc.insert("status".into(), Value::from(s.as_str()));
        }
        doc
    }

    pub fn accepts(&self, complaint: &Complaint) -> bool {
        self.complaint_type.map_or(true, |t| complaint.complaint_type() == t)
            && self.category.map_or(true, |c| complaint.category == c)
            && self.status.map_or(true, |s| complaint.status == s)
    }
}

fn selector<T: std::str::FromStr>(
    raw: Option<&str>,
    field: &'static str,
    invalid: &mut Vec<&'static str>,
) -> Option<T> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty() && *r != ALL)?;
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        invalid.push(field);
    }
    parsed
}

// ─── API Request/Response types ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: String,
    pub role: Role,
    pub view: ViewKind,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewResponse {
    pub user: String,
    pub role: Role,
    pub view: ViewKind,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub user_id: String,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub bot_response: String,
}

/// Inclusive reporting range. Missing ends default to the last 30 days.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversationQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hostel_submission() -> ComplaintSubmission {
        ComplaintSubmission {
            name: "A".into(),
            reg_no: "R1".into(),
            complaint_type: "Hostel".into(),
            hostel: Some("Narmada".into()),
            floor: Some("II".into()),
            room_no: Some("204".into()),
            category: "Plumbing".into(),
            details: "leak".into(),
            ..Default::default()
        }
    }

    fn invalid_fields(result: GrievanceResult<Complaint>) -> Vec<String> {
        match result {
            Err(GrievanceError::Validation { fields }) => fields,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_hostel_submission() {
        let id = Uuid::new_v4();
        let complaint = hostel_submission().into_complaint(id, Utc::now()).unwrap();
        assert_eq!(complaint.id, id);
        assert_eq!(complaint.complaint_type(), ComplaintType::Hostel);
        assert_eq!(complaint.status, Status::Unset);
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let submission = ComplaintSubmission {
            name: "  ".into(),
            reg_no: String::new(),
            details: String::new(),
            category: "Select".into(),
            ..hostel_submission()
        };
        let fields = invalid_fields(submission.into_complaint(Uuid::new_v4(), Utc::now()));
        assert_eq!(fields, vec!["name", "reg_no", "category", "details"]);
    }

    #[test]
    fn test_category_must_fit_type() {
        let submission = ComplaintSubmission {
            category: "Fee".into(),
            ..hostel_submission()
        };
        let fields = invalid_fields(submission.into_complaint(Uuid::new_v4(), Utc::now()));
        assert_eq!(fields, vec!["category"]);
    }

    #[test]
    fn test_type_specific_fields_required() {
        let submission = ComplaintSubmission {
            name: "B".into(),
            reg_no: "R2".into(),
            complaint_type: "General".into(),
            general_category: Some("Laundry".into()),
            category: "Food".into(),
            details: "cold".into(),
            ..Default::default()
        };
        let fields = invalid_fields(submission.into_complaint(Uuid::new_v4(), Utc::now()));
        assert_eq!(fields, vec!["general_category"]);

        let submission = ComplaintSubmission {
            room_no: None,
            ..hostel_submission()
        };
        let fields = invalid_fields(submission.into_complaint(Uuid::new_v4(), Utc::now()));
        assert_eq!(fields, vec!["room_no"]);
    }

    #[test]
    fn test_unknown_type_reported() {
        let submission = ComplaintSubmission {
            complaint_type: "Library".into(),
            ..hostel_submission()
        };
        let fields = invalid_fields(submission.into_complaint(Uuid::new_v4(), Utc::now()));
        assert_eq!(fields, vec!["type"]);
    }

    #[test]
    fn test_all_selector_means_no_filter() {
        let query = ComplaintQuery {
            complaint_type: Some("All".into()),
            category: Some("Electrical".into()),
            status: None,
        };
        let filter = ComplaintFilter::from_query(&query).unwrap();
        assert_eq!(filter.complaint_type, None);
        assert_eq!(filter.category, Some(Category::Electrical));
        assert_eq!(filter.to_document().len(), 1);
    }

    #[test]
    fn test_bad_selector_rejected() {
        let query = ComplaintQuery {
            status: Some("Closed".into()),
            ..Default::default()
        };
        assert!(matches!(
            ComplaintFilter::from_query(&query),
            Err(GrievanceError::Validation { .. })
        ));
    }

    #[test]
    fn test_unset_status_not_pushed_down() {
        let filter = ComplaintFilter {
            status: Some(Status::Unset),
            ..Default::default()
        };
        assert!(filter.to_document().is_empty());
    }
}
