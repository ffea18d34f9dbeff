//! Error types for mergebot-core.

use crate::host::HostError;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from configuration, reconciliation, and event processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is missing, malformed, or self-contradictory.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// App identity or installation token could not be obtained.
    #[error("credential error: {0}")]
    Credential(#[source] HostError),

    /// Looking up a branch reference failed.
    #[error("failed to look up branch {branch}: {source}")]
    ReferenceLookup {
        /// Branch whose lookup failed.
        branch: String,
        /// Underlying platform error.
        source: HostError,
    },

    /// Creating or force-updating a branch reference failed.
    #[error("failed to write branch {branch}: {source}")]
    ReferenceWrite {
        /// Branch whose write failed.
        branch: String,
        /// Underlying platform error.
        source: HostError,
    },

    /// Pull-request creation failed for a reason other than the
    /// "already exists" condition.
    #[error("failed to create pull request {head} -> {base}: {source}")]
    PullRequest {
        /// Head branch of the attempted PR.
        head: String,
        /// Base branch of the attempted PR.
        base: String,
        /// Underlying platform error.
        source: HostError,
    },
}

impl Error {
    /// Whether the underlying platform error was an expired or rejected
    /// credential, making a single re-authenticated retry worthwhile.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        match self {
            Self::Credential(source)
            | Self::ReferenceLookup { source, .. }
            | Self::ReferenceWrite { source, .. }
            | Self::PullRequest { source, .. } => source.is_unauthorized(),
            Self::InvalidConfig(_) => false,
        }
    }
}
