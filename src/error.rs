// Error types shared by the collectors, the orchestrator and the report codec

use std::path::PathBuf;

/// Failure raised while gathering one piece of diagnostic data.
/// Every variant except `Cancelled` is absorbed by the orchestrator and
/// turned into a warning plus an empty substitute value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollectionError {
    /// A single adapter step failed
    #[error("{reason}")]
    CollectionFailed { step: String, reason: String },

    /// Summary of a run where some steps degraded
    #[error("partial collection: {succeeded:?} succeeded, {failed:?} failed")]
    PartialCollection {
        succeeded: Vec<String>,
        failed: Vec<String>,
    },

    /// An adapter produced data that does not have the expected shape
    #[error("invalid data from {data_source}: {detail}")]
    InvalidData { data_source: String, detail: String },

    /// A step ran past its deadline
    #[error("{step} timed out after {seconds} seconds")]
    Timeout { step: String, seconds: u64 },

    /// The current user may not query the resource
    #[error("access denied to {resource}; run with administrator privileges")]
    AccessDenied { resource: String },

    /// The caller cancelled the run
    #[error("operation cancelled")]
    Cancelled,
}

impl CollectionError {
    pub fn collection_failed(step: impl Into<String>, reason: impl Into<String>) -> Self {
        CollectionError::CollectionFailed {
            step: step.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_data(data_source: impl Into<String>, detail: impl Into<String>) -> Self {
        CollectionError::InvalidData {
            data_source: data_source.into(),
            detail: detail.into(),
        }
    }

    pub fn timeout(step: impl Into<String>, seconds: u64) -> Self {
        CollectionError::Timeout {
            step: step.into(),
            seconds,
        }
    }

    pub fn access_denied(resource: impl Into<String>) -> Self {
        CollectionError::AccessDenied {
            resource: resource.into(),
        }
    }

    /// True only for the variant that aborts a whole run.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CollectionError::Cancelled)
    }
}

/// Failure while encoding, decoding or writing a report artifact.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to render HTML report: {0}")]
    Template(#[from] tera::Error),

    #[error("failed to write report to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read report from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while loading the TOML configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
