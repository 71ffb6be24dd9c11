//! Error taxonomy shared by the client, the orchestrator and the tool registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a geocoding operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// Bad input. Never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// Upstream kept rate-limiting us after local retries.
    #[error("Nominatim rate limit exceeded after {attempts} attempt(s). Please wait and retry.")]
    ServiceBusy { attempts: u32 },

    /// Network, timeout or non-2xx status.
    #[error("Nominatim unavailable: {0}")]
    ServiceUnavailable(String),

    /// Response did not have the expected shape, or the request was rejected.
    #[error("Unexpected Nominatim response: {0}")]
    Upstream(String),

    /// The query legitimately matched nothing.
    #[error("{0}")]
    NotFound(String),
}

impl GeocodeError {
    pub fn validation(message: impl Into<String>) -> Self {
        GeocodeError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GeocodeError::Validation(_) => ErrorKind::Validation,
            GeocodeError::ServiceBusy { .. } => ErrorKind::ServiceBusy,
            GeocodeError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            GeocodeError::Upstream(_) => ErrorKind::Upstream,
            GeocodeError::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Structured form handed across the registry boundary.
    pub fn descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    ServiceBusy,
    ServiceUnavailable,
    Upstream,
    NotFound,
}

/// Error kind plus human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<GeocodeError> for ErrorDescriptor {
    fn from(err: GeocodeError) -> Self {
        err.descriptor()
    }
}

pub type Result<T, E = GeocodeError> = std::result::Result<T, E>;
