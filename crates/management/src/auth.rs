//! Bearer session middleware for the admin routes.
//!
//! The token is resolved through the [`SessionManager`](grievance_platform::SessionManager);
//! the resulting session is placed in the request extensions for handlers.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use grievance_core::GrievanceError;
use grievance_platform::Session;

use crate::error::ApiError;
use crate::handlers::ManagementState;

/// The validated session behind the current request.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub session: Session,
}

pub async fn require_session(
    State(state): State<ManagementState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .map(str::to_owned)
        .ok_or(GrievanceError::SessionInvalid)?;
    let session = state.sessions.validate(&token)?;
    req.extensions_mut().insert(AuthSession { token, session });
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
