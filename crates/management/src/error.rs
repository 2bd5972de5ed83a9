//! HTTP mapping for [`GrievanceError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use grievance_core::GrievanceError;
use tracing::error;

use crate::models::ErrorResponse;

/// Handler error wrapper; renders as `{error, message, fields?}`.
#[derive(Debug)]
pub struct ApiError(pub GrievanceError);

impl From<GrievanceError> for ApiError {
    fn from(err: GrievanceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GrievanceError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GrievanceError::AuthenticationFailed | GrievanceError::SessionInvalid => {
                StatusCode::UNAUTHORIZED
            }
            GrievanceError::AccessDenied(_) => StatusCode::FORBIDDEN,
            GrievanceError::NotFound(_) => StatusCode::NOT_FOUND,
            GrievanceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GrievanceError::Config(_)
            | GrievanceError::Serialization(_)
            | GrievanceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self.0, kind = self.0.kind(), "Request failed");
            match &self.0 {
                GrievanceError::StorageUnavailable(_) => "Storage temporarily unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.0.to_string()
        };
        let fields = match &self.0 {
            GrievanceError::Validation { fields } => Some(fields.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.0.kind().to_string(),
            message,
            fields,
        };
        (status, Json(body)).into_response()
    }
}
