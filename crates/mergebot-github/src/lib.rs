//! # mergebot-github
//!
//! GitHub integration for mergebot: App JWT signing, installation token
//! exchange, the installation-scoped credential manager, and the REST
//! client implementing `mergebot_core`'s hosting-platform traits.

mod auth;
mod client;
mod credentials;
mod error;
mod types;

pub use auth::AppAuth;
pub use client::GitHubClient;
pub use credentials::CredentialManager;
pub use error::{Error, Result};
pub use types::{
    CommitUser, Installation, InstallationToken, NewPullRequest, NewReference, PullRequest,
    PullRequestCommit, Reference, ReviewersRequest, UpdateReference,
};
