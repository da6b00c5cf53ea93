//! Error types for the index coordination layer.

use thiserror::Error;

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors surfaced by index lifecycle and maintenance operations.
///
/// Absent selector candidates and empty interested-index sets are not
/// errors; those paths return `Option`/no-op values instead.
#[derive(Error, Debug)]
pub enum IndexError {
    /// An index instance could not be created from its metadata. Fatal:
    /// nothing is registered when this is returned.
    #[error("Failed to construct index '{name}': {reason}")]
    Construction { name: String, reason: String },

    /// A write was rejected by an index's validation hook, before any
    /// indexer ran.
    #[error("Validation failed for index '{index}': {reason}")]
    Validation { index: String, reason: String },

    /// A lifecycle task (flush, truncate, invalidate, metadata reload)
    /// failed; the enclosing blocking operation does not return normally.
    #[error("Index '{index}' {task} task failed: {reason}")]
    TaskFailed {
        index: String,
        task: String,
        reason: String,
    },

    /// An initial or requested build failed. The index's persisted build
    /// marker still reflects only successfully completed phases.
    #[error("Build of index '{index}' failed: {reason}")]
    BuildFailed { index: String, reason: String },

    /// The durable built/removed marker could not be updated.
    #[error("Build status update failed: {0}")]
    BuildStatus(String),

    /// The full-partition scan feeding a build failed.
    #[error("Partition scan failed: {0}")]
    Scan(String),

    /// The build worker thread has shut down and can no longer accept or
    /// report work.
    #[error("Index build worker is no longer running")]
    WorkerUnavailable,
}

impl IndexError {
    pub fn construction(name: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::Construction {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(index: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::Validation {
            index: index.into(),
            reason: reason.into(),
        }
    }

    pub fn task_failed(
        index: impl Into<String>,
        task: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        IndexError::TaskFailed {
            index: index.into(),
            task: task.into(),
            reason: reason.into(),
        }
    }

    pub fn build_failed(index: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::BuildFailed {
            index: index.into(),
            reason: reason.into(),
        }
    }

    pub fn build_status(reason: impl Into<String>) -> Self {
        IndexError::BuildStatus(reason.into())
    }

    pub fn scan(reason: impl Into<String>) -> Self {
        IndexError::Scan(reason.into())
    }
}
