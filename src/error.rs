use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use miette::Diagnostic;
use thiserror::Error;
use tracing::error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(taskcal::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(taskcal::config))]
    Config(String),

    #[error("OAuth error: {0}")]
    #[diagnostic(code(taskcal::oauth))]
    OAuth(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(taskcal::google_calendar))]
    GoogleCalendar(String),

    #[error("Session error: {0}")]
    #[diagnostic(code(taskcal::session))]
    Session(String),

    #[error("{0}")]
    #[diagnostic(code(taskcal::time))]
    Time(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(taskcal::http))]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(taskcal::serialization))]
    Serialization(String),

    #[error("Template error: {0}")]
    #[diagnostic(code(taskcal::template))]
    Template(#[from] askama::Error),

    #[error(transparent)]
    #[diagnostic(code(taskcal::io))]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    #[diagnostic(code(taskcal::other))]
    Other(String),
}

// Redis failures only happen while reading or writing sessions
impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Session(format!("Redis error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Session(format!("Session cookie error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create OAuth errors
pub fn oauth_error(message: &str) -> Error {
    Error::OAuth(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create session errors
pub fn session_error(message: &str) -> Error {
    Error::Session(message.to_string())
}

/// Helper to create time conversion errors
pub fn time_error(message: &str) -> Error {
    Error::Time(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_errors_are_session_errors() {
        let err: Error = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into();
        assert!(matches!(err, Error::Session(_)));
        assert!(err.to_string().starts_with("Session error: Redis error:"));
    }

    #[test]
    fn test_json_errors_are_serialization_errors() {
        let err: Error = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_jwt_errors_are_session_errors() {
        let err: Error = jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidToken).into();
        assert_eq!(err.to_string(), "Session error: Session cookie error: InvalidToken");
    }

    #[test]
    fn test_time_errors_render_bare() {
        assert_eq!(time_error("bad input").to_string(), "bad input");
    }
}
