//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// No endpoint is registered for the service in the catalog.
    #[error("Service endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The resource is still in use by something else (HTTP 409).
    #[error("Resource in use: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a deletion routine should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth retrying on the next pass.
    Transient,
    /// The entity is still referenced; skip it for this pass.
    Conflict,
    /// Somebody else already removed it.
    NotFound,
    /// Retrying cannot help.
    Fatal,
}

impl CloudError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CloudError::NotFound(_) => ErrorClass::NotFound,
            CloudError::Conflict(_) => ErrorClass::Conflict,
            CloudError::Api { status: 404, .. } => ErrorClass::NotFound,
            CloudError::Api { status: 409, .. } => ErrorClass::Conflict,
            CloudError::InvalidConfig(_) => ErrorClass::Fatal,
            _ => ErrorClass::Transient,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.class() == ErrorClass::Conflict
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }

    /// True when the optional service is simply not deployed on this cloud.
    pub fn is_endpoint_not_found(&self) -> bool {
        matches!(self, CloudError::EndpointNotFound(_))
    }

    /// True for 401/403 responses.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            CloudError::Forbidden(_)
                | CloudError::AuthenticationFailed(_)
                | CloudError::Api {
                    status: 401 | 403,
                    ..
                }
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
