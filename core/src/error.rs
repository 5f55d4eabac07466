use thiserror::Error;

/// Wharf error types.
///
/// `NotFound`, `Validation` and `Conflict` are the caller-visible outcomes
/// of the deletion engine. `Notify` and `Supervisor` belong to the monitor
/// process. The remaining variants cover ambient storage and I/O failures.
#[derive(Error, Debug)]
pub enum WharfError {
    /// Image or repository reference did not resolve
    #[error("No such image: {reference}")]
    NotFound { reference: String },

    /// Malformed request input
    #[error("{0}")]
    Validation(String),

    /// Deletion refused because of aliasing or live references
    #[error("Conflict, {0}")]
    Conflict(String),

    /// Status push failed after exhausting retries
    #[error("notify daemon failed: {0}")]
    Notify(String),

    /// Supervisor could not reach or hold the running state
    #[error("monitor: {0}")]
    Supervisor(String),

    /// Execution driver failure
    #[error("driver error: {0}")]
    Driver(String),

    /// Image graph / repository index storage failure
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for WharfError {
    fn from(err: serde_json::Error) -> Self {
        WharfError::Serialization(err.to_string())
    }
}

/// Result type alias for wharf operations
pub type Result<T> = std::result::Result<T, WharfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = WharfError::NotFound {
            reference: "busybox:latest".to_string(),
        };
        assert_eq!(error.to_string(), "No such image: busybox:latest");
    }

    #[test]
    fn test_validation_display() {
        let error = WharfError::Validation("Image name can not be blank".to_string());
        assert_eq!(error.to_string(), "Image name can not be blank");
    }

    #[test]
    fn test_conflict_display() {
        let error = WharfError::Conflict(
            "cannot delete image busybox because it is tagged in multiple repositories, use -f to force"
                .to_string(),
        );
        assert!(error
            .to_string()
            .starts_with("Conflict, cannot delete image busybox"));
    }

    #[test]
    fn test_notify_display() {
        let error = WharfError::Notify("connection refused".to_string());
        assert_eq!(
            error.to_string(),
            "notify daemon failed: connection refused"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: WharfError = io_error.into();
        assert!(matches!(error, WharfError::Io(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{ invalid json }");
        let error: WharfError = result.unwrap_err().into();
        assert!(matches!(error, WharfError::Serialization(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(returns_ok().unwrap(), 42);
    }
}
