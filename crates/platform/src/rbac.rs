//! Role routing: which complaint view an authenticated role may open.
//!
//! The mapping is static and total over [`Role`]; labels that do not parse as a
//! role land on [`ViewKind::NoAccess`].

use grievance_core::types::{Category, GeneralCategory, Queue, Role};
use serde::{Deserialize, Serialize};

/// The dashboard or queue a role is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Aggregate collection plus reports.
    FullDashboard,
    HostelQueue,
    /// Electrical complaints drawn from every queue collection.
    ElectricalQueueCrossCutting,
    /// Civil complaints drawn from every queue collection.
    CivilQueueCrossCutting,
    /// General complaints filed under Transport Management.
    TransportQueue,
    NoAccess,
}

/// How a view reads complaints out of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSource {
    Queue(Queue),
    CrossCutting(Category),
    GeneralSubCategory(GeneralCategory),
}

impl ViewKind {
    pub fn source(&self) -> Option<ViewSource> {
        match self {
            ViewKind::FullDashboard => Some(ViewSource::Queue(Queue::Aggregate)),
            ViewKind::HostelQueue => Some(ViewSource::Queue(Queue::Hostel)),
            ViewKind::ElectricalQueueCrossCutting => {
                Some(ViewSource::CrossCutting(Category::Electrical))
            }
            ViewKind::CivilQueueCrossCutting => Some(ViewSource::CrossCutting(Category::Civil)),
            ViewKind::TransportQueue => Some(ViewSource::GeneralSubCategory(
                GeneralCategory::TransportManagement,
            )),
            ViewKind::NoAccess => None,
        }
    }

    pub fn includes_reports(&self) -> bool {
        matches!(self, ViewKind::FullDashboard)
    }
}

/// Stateless role → view resolver.
pub struct RoleRouter;

impl RoleRouter {
    pub fn permitted_view(role: Role) -> ViewKind {
        match role {
            Role::Admin => ViewKind::FullDashboard,
            Role::HostelManagement => ViewKind::HostelQueue,
            Role::ElectricalManagement => ViewKind::ElectricalQueueCrossCutting,
            Role::CivilManagement => ViewKind::CivilQueueCrossCutting,
            Role::TransportManagement => ViewKind::TransportQueue,
        }
    }

    /// Resolve a raw role label, failing closed.
    pub fn permitted_view_for_label(label: &str) -> ViewKind {
        label
            .parse::<Role>()
            .map(Self::permitted_view)
            .unwrap_or(ViewKind::NoAccess)
    }

    /// Every role with its view, in declaration order.
    pub fn table() -> Vec<(Role, ViewKind)> {
        Role::ALL
            .iter()
            .map(|role| (*role, Self::permitted_view(*role)))
            .collect()
    }
}
