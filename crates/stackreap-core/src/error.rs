use stackreap_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DestroyError {
    /// State that retrying cannot resolve, e.g. two resources where one was expected.
    #[error("{task}: ambiguous state: {message}")]
    Ambiguous { task: String, message: String },

    #[error(
        "{task}: gave up after {attempts} attempts; still present: {}",
        describe_remaining(.remaining)
    )]
    Timeout {
        task: String,
        attempts: u32,
        remaining: Vec<String>,
    },

    #[error("{task}: unrecoverable provider error: {source}")]
    Cloud {
        task: String,
        #[source]
        source: CloudError,
    },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Cloud is not supported: {0}")]
    UnsupportedCloud(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("{task}: task aborted: {message}")]
    Join { task: String, message: String },
}

impl DestroyError {
    /// Name of the task the error came from, if any.
    pub fn task(&self) -> Option<&str> {
        match self {
            DestroyError::Ambiguous { task, .. }
            | DestroyError::Timeout { task, .. }
            | DestroyError::Cloud { task, .. }
            | DestroyError::Join { task, .. } => Some(task),
            _ => None,
        }
    }
}

fn describe_remaining(remaining: &[String]) -> String {
    if remaining.is_empty() {
        "unknown".to_string()
    } else {
        remaining.join(", ")
    }
}

pub type Result<T> = std::result::Result<T, DestroyError>;
