//! Error types for provisioning and migration

use std::time::Duration;
use storeshift_models::{ResourceKind, ResourceSpec};
use thiserror::Error;

/// Errors returned by the cloud seam
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CloudError {
    /// The describe/list call reported that the resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other control-plane fault, carried verbatim
    #[error("{operation} failed: {message}")]
    Fault {
        operation: &'static str,
        message: String,
    },
}

impl CloudError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn fault(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Fault {
            operation,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }
}

/// Fatal provisioning and migration errors.
///
/// Every variant aborts the run; nothing is retried automatically.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A required external tool or cluster access is missing
    #[error("Prerequisite not met: {0}")]
    Prerequisite(String),

    /// The target resource exists in a state incompatible with the intended action
    #[error("Conflict on {kind} '{name}': {reason}")]
    Conflict {
        kind: ResourceKind,
        name: String,
        reason: String,
    },

    /// A resource that must already exist was not found
    #[error("Missing dependency: {spec} does not exist ({reason})")]
    MissingDependency { spec: ResourceSpec, reason: String },

    /// Control-plane fault other than "not found"
    #[error("Remote fault: {0}")]
    Remote(CloudError),

    /// A bounded wait expired; the remote operation may still be in progress
    #[error("Timeout after {}s waiting for {what}; the operation may still be in progress", waited.as_secs())]
    Timeout { what: String, waited: Duration },

    /// A snapshot, instance or replication execution reached a failed terminal status
    #[error("{what} reached terminal status '{status}'")]
    TerminalStatus { what: String, status: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Downstream configuration artifact could not be read or written
    #[error("Failed to publish {path}: {message}")]
    Publish { path: String, message: String },
}

impl From<CloudError> for ProvisionError {
    fn from(err: CloudError) -> Self {
        ProvisionError::Remote(err)
    }
}

impl ProvisionError {
    pub fn conflict(kind: ResourceKind, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(spec: ResourceSpec, reason: impl Into<String>) -> Self {
        Self::MissingDependency {
            spec,
            reason: reason.into(),
        }
    }

    pub fn publish(path: impl AsRef<std::path::Path>, message: impl ToString) -> Self {
        Self::Publish {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ProvisionError::Conflict { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProvisionError::Timeout { .. })
    }

    pub fn is_terminal_status(&self) -> bool {
        matches!(self, ProvisionError::TerminalStatus { .. })
    }
}

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;
