//! GitHub API error types.

use std::path::PathBuf;

use mergebot_core::HostError;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from GitHub authentication and API calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The App private key file could not be read.
    #[error("failed to read private key {path}: {source}")]
    KeyMaterial {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The App private key is not a valid RSA PEM, or JWT signing failed.
    #[error("invalid App key material: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The system clock reports a time before the Unix epoch.
    #[error("system clock before Unix epoch")]
    Clock,

    /// GitHub rejected the credential (expired or revoked token, bad JWT).
    #[error("authentication failed")]
    AuthenticationFailed,

    /// GitHub rate limit exhausted.
    #[error("rate limited by GitHub API")]
    RateLimited,

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The App has no installation for the configured owner.
    #[error("no App installation found for {owner}")]
    InstallationNotFound {
        /// Owner whose installation was looked up.
        owner: String,
    },

    /// An event arrived without an installation id outside enterprise mode.
    #[error("installation id required outside enterprise mode")]
    MissingInstallationId,

    /// Any other API rejection.
    #[error("GitHub API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        message: String,
    },

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<Error> for HostError {
    fn from(err: Error) -> Self {
        match err {
            Error::AuthenticationFailed => Self::Unauthorized("authentication failed".into()),
            Error::NotFound(what) => Self::NotFound(what),
            Error::RateLimited => Self::Api {
                status: 403,
                message: "rate limited by GitHub API".into(),
            },
            Error::ApiError { status, message } => Self::Api { status, message },
            Error::Http(e) => Self::Transport(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}
