use std::time::Duration;
use thiserror::Error;

/// Startup configuration errors. Any of these prevents the module from being
/// built, so nothing is served with a broken setup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cookie key must not be empty")]
    EmptyCookieKey,
    #[error("cookie key `{0}` is not a valid cookie name")]
    InvalidCookieKey(String),
    #[error("login path `{0}` must be an absolute path without query or fragment")]
    InvalidLoginPath(String),
    #[error("swagger path `{0}` must be an absolute path")]
    InvalidSwaggerPath(String),
    #[error("docs path `{0}` must be an absolute, non-root path")]
    InvalidDocsPath(String),
    #[error("invalid swagger path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("a swagger guard is required")]
    MissingGuard,
    #[error("swagger path also matches the login path `{login_path}`")]
    LoginPathProtected { login_path: String },
    #[error("swagger path does not cover the documentation route `{path}`")]
    DocsNotProtected { path: String },
}

/// Failure raised by an integrator-supplied guard or login capability.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("{0}")]
    Message(String),
    #[error("validation timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl GuardError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Result type for guard and login capabilities
pub type GuardResult<T> = Result<T, GuardError>;
