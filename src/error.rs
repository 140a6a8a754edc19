// Error handling module
// Defines the error taxonomy and error-body message extraction

use thiserror::Error;

/// Errors that can occur during session and task operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Input rejected locally, before any network call
    #[error("validation failed: {0}")]
    Validation(String),

    /// Login or registration rejected by the remote service,
    /// or a success response missing an expected field
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Task operation rejected by the remote service (non-401)
    #[error("task service error: {status} - {message}")]
    Sync { status: u16, message: String },

    /// The credential was rejected with 401. The expiry path has already
    /// run by the time this is returned: the persisted credential is
    /// cleared and registered handlers have fired.
    #[error("session expired")]
    SessionExpired,

    /// Transport or other unexpected failure
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Extract a human-readable message from an error response body.
///
/// A JSON body with a non-empty `message` field wins; anything else
/// (including malformed JSON) falls back to the raw text, so a backend
/// that does not produce JSON cannot crash the error path. Returns None
/// for a blank body.
pub(crate) fn extract_service_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    if let Ok(ErrorBody {
        message: Some(message),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        if !message.trim().is_empty() {
            return Some(message);
        }
    }

    let raw = body.trim();
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClientError::Validation("identity and secret are required".to_string());
        assert_eq!(
            err.to_string(),
            "validation failed: identity and secret are required"
        );

        let err = ClientError::Auth("bad credentials".to_string());
        assert_eq!(err.to_string(), "authentication failed: bad credentials");

        let err = ClientError::Sync {
            status: 500,
            message: "database unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "task service error: 500 - database unavailable"
        );

        assert_eq!(ClientError::SessionExpired.to_string(), "session expired");
    }

    #[test]
    fn test_extract_json_message() {
        let body = r#"{"message": "user already exists"}"#;
        assert_eq!(
            extract_service_message(body),
            Some("user already exists".to_string())
        );
    }

    #[test]
    fn test_extract_falls_back_to_raw_text() {
        assert_eq!(
            extract_service_message("plain text failure"),
            Some("plain text failure".to_string())
        );

        // Malformed JSON is tolerated, not an error
        assert_eq!(
            extract_service_message("{ not json }"),
            Some("{ not json }".to_string())
        );
    }

    #[test]
    fn test_extract_ignores_empty_message_field() {
        let body = r#"{"message": ""}"#;
        assert_eq!(
            extract_service_message(body),
            Some(r#"{"message": ""}"#.to_string())
        );
    }

    #[test]
    fn test_extract_blank_body() {
        assert_eq!(extract_service_message(""), None);
        assert_eq!(extract_service_message("   \n"), None);
    }

    #[test]
    fn test_extract_json_without_message_field() {
        let body = r#"{"code": 42}"#;
        assert_eq!(extract_service_message(body), Some(body.to_string()));
    }
}
