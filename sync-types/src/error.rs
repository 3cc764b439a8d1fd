//! Error taxonomy for matrix-sync operations.

use thiserror::Error;

/// Errors surfaced by the transport collaborator and the sync engine.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// The request mechanism itself failed (connection, request encoding).
    /// No HTTP status exists for these; they are always fatal to the attempt.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The homeserver answered with a non-success status.
    #[error("homeserver returned {status}: {body}")]
    Request {
        /// HTTP status code of the rejection.
        status: u16,
        /// Raw response body.
        body: String,
        /// Best-effort parsed protocol error code (e.g. `M_FORBIDDEN`).
        errcode: Option<String>,
    },

    /// Malformed input to a validation helper; fails fast, never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A success response was missing an expected field.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A response body did not match the expected schema.
    #[error("deserialization failed: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl MatrixError {
    /// Build a [`MatrixError::Request`], extracting the protocol `errcode`
    /// from the JSON error body when one is present.
    pub fn request(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let errcode = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("errcode").and_then(|c| c.as_str()).map(String::from));
        Self::Request {
            status,
            body,
            errcode,
        }
    }

    /// Whether this is a server-side error response (status >= 500).
    ///
    /// These are the only errors the continuous listen mode retries with
    /// backoff; everything else is handed to the caller.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Request { status, .. } if *status >= 500)
    }

    /// Whether this is a "not found" class response (status 404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Request { status, .. } if *status == 404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_errcode_from_json_body() {
        let err = MatrixError::request(403, r#"{"errcode":"M_FORBIDDEN","error":"denied"}"#);
        match err {
            MatrixError::Request { status, errcode, .. } => {
                assert_eq!(status, 403);
                assert_eq!(errcode.as_deref(), Some("M_FORBIDDEN"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn request_tolerates_non_json_body() {
        let err = MatrixError::request(502, "Bad Gateway");
        match err {
            MatrixError::Request { errcode, .. } => assert!(errcode.is_none()),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn server_error_classification() {
        assert!(MatrixError::request(500, "").is_server_error());
        assert!(MatrixError::request(503, "").is_server_error());
        assert!(!MatrixError::request(404, "").is_server_error());
        assert!(!MatrixError::Transport("connection reset".into()).is_server_error());
    }

    #[test]
    fn not_found_classification() {
        assert!(MatrixError::request(404, "").is_not_found());
        assert!(!MatrixError::request(500, "").is_not_found());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MatrixError>();
    }
}
