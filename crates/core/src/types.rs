use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::document::Document;
use crate::error::{GrievanceError, GrievanceResult};

pub const HOSTEL_ISSUES: &str = "hostel_issues";
pub const DEPT_ISSUES: &str = "dept_issues";
pub const GENERAL_ISSUES: &str = "general_issues";
pub const ADMIN_ISSUES: &str = "admin_issues";
pub const CHAT_HISTORY: &str = "chat_history";
pub const COURSE_DATA: &str = "course_data";

/// A label that did not match any known variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized {kind}: {label:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownLabel { kind: $kind, label: s.to_string() })
            }
        }
    };
}

labelled_enum!(
    /// Which intake form a complaint came through.
    ComplaintType, "complaint type" {
        Hostel => "Hostel",
        Department => "Department",
        General => "General",
    }
);

labelled_enum!(
    Category, "category" {
        Plumbing => "Plumbing",
        Electrical => "Electrical",
        Civil => "Civil",
        Hr => "HR",
        Food => "Food",
        Curriculum => "Curriculum",
        Faculty => "Faculty",
        ClassroomManagement => "Classroom Management",
        Fee => "Fee",
        Placement => "Placement",
        Other => "Other",
    }
);

labelled_enum!(
    /// Sub-category carried by General complaints.
    GeneralCategory, "general category" {
        SportsManagement => "Sports Management",
        TransportManagement => "Transport Management",
        CanteenManagement => "Canteen Management",
    }
);

labelled_enum!(
    /// Triage state. `Unset` is never written: it is the absence of a status field.
    Status, "status" {
        Pending => "Pending",
        InProgress => "In Progress",
        Resolved => "Resolved",
        Unset => "Unset",
    }
);

labelled_enum!(
    /// Access scope bound to an administrator account.
    Role, "role" {
        Admin => "Admin",
        HostelManagement => "Hostel Management",
        ElectricalManagement => "Electrical Management",
        CivilManagement => "Civil Management",
        TransportManagement => "Transport Management",
    }
);

impl ComplaintType {
    pub fn queue(&self) -> Queue {
        match self {
            ComplaintType::Hostel => Queue::Hostel,
            ComplaintType::Department => Queue::Department,
            ComplaintType::General => Queue::General,
        }
    }

    pub fn allowed_categories(&self) -> &'static [Category] {
        use Category::*;
        match self {
            ComplaintType::Hostel => &[Plumbing, Electrical, Civil, Hr, Food],
            ComplaintType::Department => &[
                Curriculum,
                Faculty,
                ClassroomManagement,
                Fee,
                Placement,
                Electrical,
                Civil,
            ],
            ComplaintType::General => &[Electrical, Civil, Food, Other],
        }
    }

    pub fn allows(&self, category: Category) -> bool {
        self.allowed_categories().contains(&category)
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Unset
    }
}

impl Status {
    pub fn is_unset(&self) -> bool {
        *self == Status::Unset
    }
}

/// A logical collection in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Queue {
    Hostel,
    Department,
    General,
    /// Every complaint, regardless of type.
    Aggregate,
}

impl Queue {
    /// The per-type queues, excluding the aggregate.
    pub const TYPED: [Queue; 3] = [Queue::Hostel, Queue::Department, Queue::General];

    pub fn collection(&self) -> &'static str {
        match self {
            Queue::Hostel => HOSTEL_ISSUES,
            Queue::Department => DEPT_ISSUES,
            Queue::General => GENERAL_ISSUES,
            Queue::Aggregate => ADMIN_ISSUES,
        }
    }
}

/// Type-specific attributes; the variant doubles as the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComplaintLocation {
    Hostel {
        hostel: String,
        floor: String,
        room_no: String,
    },
    Department {
        department: String,
    },
    General {
        general_category: GeneralCategory,
    },
}

impl ComplaintLocation {
    pub fn complaint_type(&self) -> ComplaintType {
        match self {
            ComplaintLocation::Hostel { .. } => ComplaintType::Hostel,
            ComplaintLocation::Department { .. } => ComplaintType::Department,
            ComplaintLocation::General { .. } => ComplaintType::General,
        }
    }
}

/// A complaint record as stored in both its queue and the aggregate collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub name: String,
    pub reg_no: String,
    #[serde(flatten)]
    pub location: ComplaintLocation,
    pub category: Category,
    pub details: String,
    #[serde(default, skip_serializing_if = "Status::is_unset")]
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl Complaint {
    pub fn complaint_type(&self) -> ComplaintType {
        self.location.complaint_type()
    }

    pub fn to_document(&self) -> GrievanceResult<Document> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(GrievanceError::Internal(anyhow::anyhow!(
                "complaint serialized to non-object: {other}"
            ))),
        }
    }

    pub fn from_document(doc: Document) -> GrievanceResult<Self> {
        Ok(serde_json::from_value(serde_json::Value::Object(doc))?)
    }
}

/// One chatbot exchange, the raw material for usage statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub bot_response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hostel_complaint() -> Complaint {
        Complaint {
            id: Uuid::new_v4(),
            name: "A".into(),
            reg_no: "R1".into(),
            location: ComplaintLocation::Hostel {
                hostel: "Narmada".into(),
                floor: "II".into(),
                room_no: "204".into(),
            },
            category: Category::Plumbing,
            details: "leak".into(),
            status: Status::Unset,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_labels_parse_with_spaces() {
        assert_eq!("In Progress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!(
            "Classroom Management".parse::<Category>(),
            Ok(Category::ClassroomManagement)
        );
        assert_eq!(" Hostel Management ".parse::<Role>(), Ok(Role::HostelManagement));
        let err = "Janitorial".parse::<Role>().unwrap_err();
        assert_eq!(err.kind, "role");
    }

    #[test]
    fn test_complaint_document_is_flat() {
        let complaint = hostel_complaint();
        let doc = complaint.to_document().unwrap();

        assert_eq!(doc.get("type"), Some(&json!("Hostel")));
        assert_eq!(doc.get("hostel"), Some(&json!("Narmada")));
        assert_eq!(doc.get("room_no"), Some(&json!("204")));
        assert_eq!(doc.get("category"), Some(&json!("Plumbing")));
        assert!(!doc.contains_key("status"));
        assert!(!doc.contains_key("location"));

        let back = Complaint::from_document(doc).unwrap();
        assert_eq!(back, complaint);
    }

    #[test]
    fn test_status_written_when_set() {
        let mut complaint = hostel_complaint();
        complaint.status = Status::InProgress;
        let doc = complaint.to_document().unwrap();
        assert_eq!(doc.get("status"), Some(&json!("In Progress")));
    }

    #[test]
    fn test_category_rules_per_type() {
        assert!(ComplaintType::Hostel.allows(Category::Electrical));
        assert!(ComplaintType::Department.allows(Category::Electrical));
        assert!(!ComplaintType::Hostel.allows(Category::Fee));
        assert!(!ComplaintType::General.allows(Category::Plumbing));
    }

    #[test]
    fn test_queue_collections() {
        assert_eq!(ComplaintType::Department.queue().collection(), "dept_issues");
        assert_eq!(Queue::Aggregate.collection(), "admin_issues");
    }
}
