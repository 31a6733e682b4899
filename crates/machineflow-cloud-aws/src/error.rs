//! EC2 error classification
//!
//! Maps EC2 error codes onto [`CloudError`] using the SDK's error metadata
//! rather than matching on formatted messages.

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use machineflow_cloud::CloudError;

/// Error codes meaning the addressed instance does not exist
const NOT_FOUND_CODES: &[&str] = &["InvalidInstanceID.NotFound"];

/// Classify an EC2 error code and message
pub fn classify_error(code: Option<&str>, message: &str) -> CloudError {
    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => {
            CloudError::ResourceNotFound(message.to_string())
        }
        _ => CloudError::api(code, message),
    }
}

/// Convert any EC2 operation error into a [`CloudError`]
pub fn from_sdk_error<E, R>(err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    classify_error(code.as_deref(), &message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_code() {
        let err = classify_error(
            Some("InvalidInstanceID.NotFound"),
            "The instance ID 'i-0abc' does not exist",
        );
        assert!(err.is_not_found());
        assert!(matches!(err, CloudError::ResourceNotFound(_)));
    }

    #[test]
    fn test_malformed_id_is_not_not_found() {
        let err = classify_error(Some("InvalidInstanceID.Malformed"), "Invalid id: \"x\"");
        assert!(!err.is_not_found());
        assert_eq!(err.code(), Some("InvalidInstanceID.Malformed"));
    }

    #[test]
    fn test_throttling_and_missing_code() {
        let err = classify_error(Some("RequestLimitExceeded"), "Request limit exceeded.");
        assert!(!err.is_not_found());
        assert_eq!(err.code(), Some("RequestLimitExceeded"));

        let err = classify_error(None, "dispatch failure");
        assert!(matches!(err, CloudError::ApiError { code: None, .. }));
        assert_eq!(err.to_string(), "API error: dispatch failure");
    }
}
