//! Instance reconciliation error types

use thiserror::Error;

/// Errors surfaced by the instance client and the reconciler
#[derive(Error, Debug)]
pub enum CloudError {
    /// The provider reports that the resource does not exist.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Required input is missing or cannot be satisfied.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("API error: {message}")]
    ApiError {
        code: Option<String>,
        message: String,
    },

    /// A provider failure wrapped with the operation that was attempted.
    #[error("{operation}: {source}")]
    OperationFailed {
        operation: String,
        #[source]
        source: Box<CloudError>,
    },

    /// The provider response is missing a field the protocol guarantees.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),
}

impl CloudError {
    pub fn api(code: Option<&str>, message: impl Into<String>) -> Self {
        CloudError::ApiError {
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    /// Wrap this error with the operation that produced it
    pub fn context(self, operation: impl Into<String>) -> Self {
        CloudError::OperationFailed {
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is a "not found" error, looking through context wrappers
    pub fn is_not_found(&self) -> bool {
        match self {
            CloudError::ResourceNotFound(_) => true,
            CloudError::OperationFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if this is a configuration error
    pub fn is_invalid_config(&self) -> bool {
        match self {
            CloudError::InvalidConfig(_) => true,
            CloudError::OperationFailed { source, .. } => source.is_invalid_config(),
            _ => false,
        }
    }

    /// Provider error code, if the provider returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            CloudError::ApiError { code, .. } => code.as_deref(),
            CloudError::OperationFailed { source, .. } => source.code(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
