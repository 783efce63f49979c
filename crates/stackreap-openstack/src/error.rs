//! OpenStack provider error types

use stackreap_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenStackError {
    #[error("openstack CLI not found. Please install: pip install python-openstackclient")]
    CliNotFound,

    #[error("openstack authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource in use: {0}")]
    Conflict(String),

    #[error("Service endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("openstack command failed: {0}")]
    CommandFailed(String),

    #[error("Unexpected output from `openstack {command}`: {message}")]
    UnexpectedOutput { command: String, message: String },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OpenStackError>;

impl OpenStackError {
    /// Maps the CLI's error output onto an error kind.
    ///
    /// The client prints the HTTP status and the service's exception name,
    /// so both spellings are checked. Missing catalog entries are checked
    /// first as their message also contains "not found".
    pub fn from_stderr(stderr: &str) -> Self {
        let message = stderr.trim().to_string();
        let lower = message.to_lowercase();

        if lower.contains("endpoint for") && lower.contains("not found") {
            return OpenStackError::EndpointNotFound(message);
        }
        if lower.contains("http 401")
            || lower.contains("authentication required")
            || lower.contains("the request you have made requires authentication")
        {
            return OpenStackError::AuthenticationFailed(message);
        }
        if lower.contains("http 403") || lower.contains("forbidden") {
            return OpenStackError::Forbidden(message);
        }
        if lower.contains("http 409")
            || lower.contains("conflict")
            || lower.contains("in use")
            || lower.contains("in-use")
            || lower.contains("inuse")
        {
            return OpenStackError::Conflict(message);
        }
        if lower.contains("http 404")
            || lower.contains("notfound")
            || lower.contains("could not be found")
            || lower.contains("could not find")
            || (lower.starts_with("no ") && lower.contains(" found for "))
        {
            return OpenStackError::NotFound(message);
        }
        OpenStackError::CommandFailed(message)
    }
}

impl From<OpenStackError> for CloudError {
    fn from(err: OpenStackError) -> Self {
        match err {
            OpenStackError::CliNotFound => {
                CloudError::InvalidConfig(OpenStackError::CliNotFound.to_string())
            }
            OpenStackError::AuthenticationFailed(m) => CloudError::AuthenticationFailed(m),
            OpenStackError::Forbidden(m) => CloudError::Forbidden(m),
            OpenStackError::NotFound(m) => CloudError::NotFound(m),
            OpenStackError::Conflict(m) => CloudError::Conflict(m),
            OpenStackError::EndpointNotFound(m) => CloudError::EndpointNotFound(m),
            OpenStackError::CommandFailed(m) => CloudError::CommandFailed(m),
            OpenStackError::UnexpectedOutput { command, message } => CloudError::CommandFailed(
                format!("unexpected output from `openstack {command}`: {message}"),
            ),
            OpenStackError::JsonError(e) => CloudError::Json(e),
            OpenStackError::IoError(e) => CloudError::Io(e),
        }
    }
}
