//! Error types for memberhub
//!
//! Every failure a caller can observe is one of the variants below. The
//! first five are the domain taxonomy; the rest are infrastructure faults.

use hyper::StatusCode;
use rusqlite::ffi;

/// Main error type for memberhub operations
#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MemberError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message without the variant prefix, for JSON error bodies
    pub fn message(&self) -> &str {
        match self {
            Self::Conflict(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::InvalidArgument(m)
            | Self::Database(m)
            | Self::Config(m)
            | Self::Internal(m) => m,
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = self.message().to_string();
        (status, body)
    }
}

impl From<rusqlite::Error> for MemberError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref detail) = err {
            let detail = detail.clone().unwrap_or_else(|| failure.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::Conflict(detail);
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Self::NotFound(format!("Referenced record does not exist ({detail})"));
                }
                ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return Self::InvalidArgument(detail);
                }
                _ => {}
            }
        }
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for MemberError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArgument(format!("Invalid JSON: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for MemberError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {err}"))
    }
}

impl From<std::io::Error> for MemberError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<hyper::Error> for MemberError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {err}"))
    }
}

/// Result type alias for memberhub operations
pub type Result<T> = std::result::Result<T, MemberError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            MemberError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            MemberError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            MemberError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            MemberError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MemberError::InvalidArgument("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_message_strips_prefix() {
        let err = MemberError::Forbidden("Not allowed.".into());
        assert_eq!(err.to_string(), "Forbidden: Not allowed.");
        assert_eq!(err.message(), "Not allowed.");
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (email TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: MemberError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, MemberError::Conflict(_)));
    }

    #[test]
    fn test_foreign_key_violation_maps_to_not_found() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (parent_id INTEGER NOT NULL REFERENCES parent(id));",
        )
        .unwrap();
        let err: MemberError = conn
            .execute("INSERT INTO child VALUES (42)", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, MemberError::NotFound(_)));
    }
}
