//! Axum REST handlers for complaint intake and the admin dashboard.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use grievance_core::config::AppConfig;
use grievance_core::document::{Document, DocumentStore};
use grievance_core::types::{ChatRecord, Complaint, Status};
use grievance_core::{GrievanceError, GrievanceResult};
use grievance_platform::{AdminDirectory, RoleRouter, SessionManager};
use grievance_reporting::dashboard::{
    ChatMetrics, Conversation, DashboardOverview, MAX_RECENT_CONVERSATIONS,
};
use grievance_reporting::{ReportingAggregator, UsageLog};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::courses::CourseCatalog;
use crate::error::ApiError;
use crate::models::*;
use crate::store::ComplaintStore;

/// Default reporting window when the caller gives no start date.
const DEFAULT_REPORT_DAYS: i64 = 30;

/// Shared state for every handler.
#[derive(Clone)]
pub struct ManagementState {
    pub complaints: Arc<ComplaintStore>,
    pub sessions: Arc<SessionManager>,
    pub directory: Arc<AdminDirectory>,
    pub reports: Arc<ReportingAggregator>,
    pub usage: Arc<UsageLog>,
    pub courses: Arc<CourseCatalog>,
}

impl ManagementState {
    /// Wire every component over one document store.
    pub fn from_config(config: &AppConfig, docs: Arc<dyn DocumentStore>) -> GrievanceResult<Self> {
        let retries = config.storage.max_retries;
        Ok(Self {
            complaints: Arc::new(ComplaintStore::new(docs.clone(), retries)),
            sessions: Arc::new(SessionManager::new(Duration::from_secs(
                config.session.ttl_secs,
            ))),
            directory: Arc::new(AdminDirectory::from_seeds(&config.admins)?),
            reports: Arc::new(ReportingAggregator::new(
                docs.clone(),
                config.reporting.utc_offset_minutes,
                retries,
            )?),
            usage: Arc::new(UsageLog::new(docs.clone(), retries)),
            courses: Arc::new(CourseCatalog::new(docs, retries)),
        })
    }
}

// ─── Public intake ─────────────────────────────────────────────────────────

pub async fn submit_complaint(
    State(state): State<ManagementState>,
    Json(req): Json<ComplaintSubmission>,
) -> Result<(StatusCode, Json<Complaint>), ApiError> {
    let complaint = state.complaints.submit(req)?;
    metrics::counter!(
        "grievance.complaints.submitted",
        "type" => complaint.complaint_type().as_str()
    )
    .increment(1);
    Ok((StatusCode::CREATED, Json(complaint)))
}

pub async fn record_chat(
    State(state): State<ManagementState>,
    Json(req): Json<ChatMessageRequest>,
) -> Result<(StatusCode, Json<ChatRecord>), ApiError> {
    let record = state
        .usage
        .record(&req.user_id, &req.user_message, &req.bot_response)?;
    Ok((StatusCode::CREATED, Json(record)))
}

// ─── Auth ──────────────────────────────────────────────────────────────────

pub async fn login(
    State(state): State<ManagementState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let account = match state.directory.authenticate(&req.username, &req.password) {
        Ok(account) => account,
        Err(e) => {
            metrics::counter!("grievance.auth.failures").increment(1);
            return Err(e.into());
        }
    };
    let (token, session) = state.sessions.issue(&account);
    metrics::counter!("grievance.auth.logins").increment(1);

    Ok(Json(LoginResponse {
        token,
        user: account.username,
        role: account.role,
        view: RoleRouter::permitted_view(account.role),
        expires_at: session.expires_at,
    }))
}

pub async fn logout(
    State(state): State<ManagementState>,
    Extension(auth): Extension<AuthSession>,
) -> StatusCode {
    state.sessions.revoke(&auth.token);
    StatusCode::NO_CONTENT
}

pub async fn current_view(Extension(auth): Extension<AuthSession>) -> Json<ViewResponse> {
    Json(ViewResponse {
        view: RoleRouter::permitted_view(auth.session.role),
        user: auth.session.username,
        role: auth.session.role,
    })
}

// ─── Complaints ────────────────────────────────────────────────────────────

pub async fn list_complaints(
    State(state): State<ManagementState>,
    Extension(auth): Extension<AuthSession>,
    Query(query): Query<ComplaintQuery>,
) -> Result<Json<Vec<Complaint>>, ApiError> {
    let filter = ComplaintFilter::from_query(&query)?;
    let view = RoleRouter::permitted_view(auth.session.role);
    Ok(Json(state.complaints.query_view(view, &filter)?))
}

pub async fn update_status(
    State(state): State<ManagementState>,
    Extension(auth): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    let status: Status = req
        .status
        .parse()
        .map_err(|_| GrievanceError::validation(["status"]))?;
    let view = RoleRouter::permitted_view(auth.session.role);
    // Complaints outside the caller's view are reported as missing.
    if !state.complaints.visible_in(view, id)? {
        return Err(GrievanceError::NotFound(format!("complaint {id}")).into());
    }
    state.complaints.update_status(id, status)?;
    info!(complaint_id = %id, username = %auth.session.username, status = %status, "Status changed by admin");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Reports ───────────────────────────────────────────────────────────────

pub async fn reports_overview(
    State(state): State<ManagementState>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<DashboardOverview>, ApiError> {
    require_reports(&auth)?;
    Ok(Json(state.reports.overview(Utc::now())?))
}

pub async fn chat_report(
    State(state): State<ManagementState>,
    Extension(auth): Extension<AuthSession>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<ChatMetrics>, ApiError> {
    require_reports(&auth)?;
    let (start, end) = report_range(&state, range.start, range.end)?;
    Ok(Json(state.reports.chat_metrics(start, end)?))
}

pub async fn recent_conversations(
    State(state): State<ManagementState>,
    Extension(auth): Extension<AuthSession>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    require_reports(&auth)?;
    let (start, end) = report_range(&state, query.start, query.end)?;
    let limit = query.limit.unwrap_or(MAX_RECENT_CONVERSATIONS);
    Ok(Json(state.reports.recent_conversations(start, end, limit)?))
}

/// Fill in a missing range end with today and a missing start with the
/// default window ending at `end`.
fn report_range(
    state: &ManagementState,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), GrievanceError> {
    let end = end.unwrap_or_else(|| state.reports.local_date(Utc::now()));
    let start = match start {
        Some(start) => start,
        None => end
            .checked_sub_signed(chrono::Duration::days(DEFAULT_REPORT_DAYS - 1))
            .ok_or_else(|| GrievanceError::validation(["start"]))?,
    };
    Ok((start, end))
}

/// Reports and course data belong to the full dashboard only.
fn require_reports(auth: &AuthSession) -> Result<(), GrievanceError> {
    if RoleRouter::permitted_view(auth.session.role).includes_reports() {
        Ok(())
    } else {
        Err(GrievanceError::AccessDenied(format!(
            "role {} cannot view reports",
            auth.session.role
        )))
    }
}

// ─── Course data ───────────────────────────────────────────────────────────

pub async fn get_courses(
    State(state): State<ManagementState>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<Document>, ApiError> {
    require_reports(&auth)?;
    Ok(Json(state.courses.get()?))
}

pub async fn replace_courses(
    State(state): State<ManagementState>,
    Extension(auth): Extension<AuthSession>,
    Json(data): Json<Value>,
) -> Result<Json<Document>, ApiError> {
    require_reports(&auth)?;
    let updated = state.courses.replace(data)?;
    info!(username = %auth.session.username, "Course data updated by admin");
    Ok(Json(updated))
}

// ─── Operational ───────────────────────────────────────────────────────────

pub async fn health(State(state): State<ManagementState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "active_sessions": state.sessions.active_sessions(),
    }))
}
