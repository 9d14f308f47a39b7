//! Classification of HTTP failures into user-facing errors.
//!
//! Nothing here is retried: a failed fetch ends the install.

use reqwest::StatusCode;
use thiserror::Error;

/// A fetch failure with a message worth showing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("not found (HTTP 404); check that the release and platform exist")]
    NotFound,

    #[error("authentication failed (HTTP {0}); check GITHUB_TOKEN")]
    AuthenticationFailed(u16),

    #[error("rate limit exceeded (HTTP 429); try again later or set GITHUB_TOKEN")]
    RateLimitExceeded,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,
}

/// Map a non-success status onto an [`HttpError`].
pub fn classify_status(status: StatusCode) -> HttpError {
    match status {
        StatusCode::NOT_FOUND => HttpError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            HttpError::AuthenticationFailed(status.as_u16())
        }
        StatusCode::TOO_MANY_REQUESTS => HttpError::RateLimitExceeded,
        s => HttpError::Status(s.as_u16()),
    }
}

/// Convert a reqwest error, keeping transport details for anything that is
/// neither a timeout nor a status error.
pub fn classify_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow::Error::from(HttpError::Timeout);
    }
    if let Some(status) = error.status() {
        return anyhow::Error::from(classify_status(status));
    }
    anyhow::Error::from(error)
}
