use thiserror::Error;

pub type GrievanceResult<T> = Result<T, GrievanceError>;

#[derive(Error, Debug)]
pub enum GrievanceError {
    #[error("Missing or invalid fields: {}", .fields.join(", "))]
    Validation { fields: Vec<String> },

    /// Same message for an unknown user and a wrong password.
    #[error("Invalid credentials")]
    AuthenticationFailed,

    #[error("Session is invalid or has expired")]
    SessionInvalid,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl GrievanceError {
    pub fn validation<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GrievanceError::Validation {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Transient backend failures the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GrievanceError::StorageUnavailable(_))
    }

    /// Stable machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            GrievanceError::Validation { .. } => "validation_error",
            GrievanceError::AuthenticationFailed => "authentication_failed",
            GrievanceError::SessionInvalid => "session_invalid",
            GrievanceError::AccessDenied(_) => "access_denied",
            GrievanceError::NotFound(_) => "not_found",
            GrievanceError::StorageUnavailable(_) => "storage_unavailable",
            GrievanceError::Config(_) => "config_error",
            GrievanceError::Serialization(_) => "serialization_error",
            GrievanceError::Internal(_) => "internal_error",
        }
    }
}
