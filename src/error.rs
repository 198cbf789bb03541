//! Error types for the Common Fate provider.

use thiserror::Error;

/// Errors that can occur while serving a provider call.
///
/// Every variant is surfaced to the host as an error diagnostic; the gRPC
/// call itself still succeeds. The [`tonic::Status`] conversions exist for
/// the downstream control-plane client, which receives statuses, and for
/// callers embedding the provider behind their own service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested remote object was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal provider error occurred.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A resource operation was attempted before Configure published a client.
    #[error("Provider not configured: {0}")]
    Unconfigured(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// An integration was read back with a different config variant than the
    /// resource kind manages.
    #[error("Integration config variant mismatch: expected {expected}, found {found}")]
    VariantMismatch {
        /// The variant the resource kind manages.
        expected: String,
        /// The variant the control plane returned (`none` when unset).
        found: String,
    },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Resource already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Permission denied (authentication/authorization failure).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Quota or rate limit exceeded.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Service temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Operation timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The operation was cancelled by the host stopping the provider.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Operation failed due to current state (precondition not met).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Invalid request from client.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other failure reported by the control plane.
    #[error("Remote error: {0}")]
    Remote(String),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Internal(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::Unconfigured(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::VariantMismatch { .. } => "integration config variant mismatch",
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Transport(_err) => "transport error (see Debug output)",
            Self::AlreadyExists(msg) => msg,
            Self::PermissionDenied(msg) => msg,
            Self::ResourceExhausted(msg) => msg,
            Self::Unavailable(msg) => msg,
            Self::DeadlineExceeded(msg) => msg,
            Self::Cancelled(msg) => msg,
            Self::FailedPrecondition(msg) => msg,
            Self::Unimplemented(msg) => msg,
            Self::InvalidRequest(msg) => msg,
            Self::Remote(msg) => msg,
        }
    }

    /// Whether this error means the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<tonic::Status> for ProviderError {
    fn from(status: tonic::Status) -> Self {
        let msg = status.message().to_string();
        match status.code() {
            tonic::Code::NotFound => Self::NotFound(msg),
            tonic::Code::AlreadyExists => Self::AlreadyExists(msg),
            tonic::Code::PermissionDenied | tonic::Code::Unauthenticated => {
                Self::PermissionDenied(msg)
            }
            tonic::Code::ResourceExhausted => Self::ResourceExhausted(msg),
            tonic::Code::Unavailable => Self::Unavailable(msg),
            tonic::Code::DeadlineExceeded => Self::DeadlineExceeded(msg),
            tonic::Code::Cancelled => Self::Cancelled(msg),
            tonic::Code::FailedPrecondition => Self::FailedPrecondition(msg),
            tonic::Code::Unimplemented => Self::Unimplemented(msg),
            tonic::Code::InvalidArgument | tonic::Code::OutOfRange => Self::InvalidRequest(msg),
            code => Self::Remote(format!("{}: {}", code, msg)),
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::Unconfigured(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Internal(msg) => tonic::Status::internal(msg),
            err @ ProviderError::VariantMismatch { .. } => {
                tonic::Status::failed_precondition(err.to_string())
            }
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            }
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            }
            ProviderError::AlreadyExists(msg) => tonic::Status::already_exists(msg),
            ProviderError::PermissionDenied(msg) => tonic::Status::permission_denied(msg),
            ProviderError::ResourceExhausted(msg) => tonic::Status::resource_exhausted(msg),
            ProviderError::Unavailable(msg) => tonic::Status::unavailable(msg),
            ProviderError::DeadlineExceeded(msg) => tonic::Status::deadline_exceeded(msg),
            ProviderError::Cancelled(msg) => tonic::Status::cancelled(msg),
            ProviderError::FailedPrecondition(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::Unimplemented(msg) => tonic::Status::unimplemented(msg),
            ProviderError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Remote(msg) => tonic::Status::unknown(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("integration I-42".to_string());
        assert_eq!(format!("{}", err), "Resource not found: integration I-42");

        let err = ProviderError::Unconfigured("call Configure first".to_string());
        assert_eq!(
            format!("{}", err),
            "Provider not configured: call Configure first"
        );

        let err = ProviderError::VariantMismatch {
            expected: "okta".to_string(),
            found: "auth0".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Integration config variant mismatch: expected okta, found auth0"
        );
    }

    #[test]
    fn test_status_to_error() {
        let err: ProviderError = tonic::Status::not_found("W-123").into();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "W-123");

        let err: ProviderError = tonic::Status::unauthenticated("bad credentials").into();
        assert!(matches!(err, ProviderError::PermissionDenied(_)));

        let err: ProviderError = tonic::Status::cancelled("stopped").into();
        assert!(matches!(err, ProviderError::Cancelled(_)));

        let err: ProviderError = tonic::Status::internal("boom").into();
        match err {
            ProviderError::Remote(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_to_status() {
        let cases = vec![
            (
                ProviderError::NotFound("test".to_string()),
                tonic::Code::NotFound,
            ),
            (
                ProviderError::Validation("test".to_string()),
                tonic::Code::InvalidArgument,
            ),
            (
                ProviderError::Configuration("test".to_string()),
                tonic::Code::FailedPrecondition,
            ),
            (
                ProviderError::Unconfigured("test".to_string()),
                tonic::Code::FailedPrecondition,
            ),
            (
                ProviderError::Internal("test".to_string()),
                tonic::Code::Internal,
            ),
            (
                ProviderError::Cancelled("test".to_string()),
                tonic::Code::Cancelled,
            ),
            (
                ProviderError::DeadlineExceeded("test".to_string()),
                tonic::Code::DeadlineExceeded,
            ),
            (
                ProviderError::Remote("test".to_string()),
                tonic::Code::Unknown,
            ),
        ];

        for (err, code) in cases {
            let status: tonic::Status = err.into();
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_variant_mismatch_to_status_keeps_both_variants() {
        let status: tonic::Status = ProviderError::VariantMismatch {
            expected: "okta".to_string(),
            found: "none".to_string(),
        }
        .into();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);
        assert!(status.message().contains("expected okta"));
        assert!(status.message().contains("found none"));
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::Configuration("host is empty".to_string());
        assert_eq!(err.message(), "host is empty");

        let err = ProviderError::InvalidRequest("bad request".to_string());
        assert_eq!(err.message(), "bad request");
    }
}
