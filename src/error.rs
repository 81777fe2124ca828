use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("invalid resource name: {0}")]
    InvalidResourceName(String),

    #[error("invalid base url {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("fetch {resource}: request failed: {message}")]
    Http { resource: String, message: String },

    #[error("fetch {resource}: server returned status {status}: {message}")]
    Status {
        resource: String,
        status: u16,
        message: String,
    },

    #[error("write {resource}: {message}")]
    Write { resource: String, message: String },

    #[error("extract {resource}: {message}")]
    Extract { resource: String, message: String },

    #[error("failed to remove archive {path}: {message}")]
    Cleanup { path: Utf8PathBuf, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("worker for {0} panicked")]
    WorkerPanicked(String),
}

impl FetchError {
    /// Resource the failure belongs to, when the failure happened inside a worker.
    pub fn resource(&self) -> Option<&str> {
        match self {
            FetchError::Http { resource, .. }
            | FetchError::Status { resource, .. }
            | FetchError::Write { resource, .. }
            | FetchError::Extract { resource, .. } => Some(resource.as_str()),
            FetchError::WorkerPanicked(resource) => Some(resource.as_str()),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Http { .. } | FetchError::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_errors_carry_resource() {
        let err = FetchError::Status {
            resource: "beta".to_string(),
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.resource(), Some("beta"));
        assert!(err.is_network());
        assert_eq!(
            err.to_string(),
            "fetch beta: server returned status 404: not found"
        );

        let err = FetchError::Filesystem("disk full".to_string());
        assert_eq!(err.resource(), None);
        assert!(!err.is_network());
    }
}
