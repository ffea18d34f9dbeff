//! # mergebot-core
//!
//! Core library for mergebot providing configuration, the branch
//! reconciler, and the release event processor, behind a hosting-platform
//! trait seam implemented by `mergebot-github`.

pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod processor;
pub mod reconcile;
pub mod repos;

#[cfg(test)]
mod testing;

pub use config::{Config, EnterpriseConfig};
pub use error::{Error, Result};
pub use event::PushEvent;
pub use host::{
    BranchRef, ClientResolver, CreatedPullRequest, HostError, PullRequestSpec, RepoHost,
};
pub use processor::{Outcome, ReleaseProcessor};
pub use reconcile::reconcile;
pub use repos::MonitoredRepos;
