//! Hosting-platform seam.
//!
//! The reconciler and event processor talk to the hosting platform through
//! the [`RepoHost`] trait, and obtain authenticated hosts through
//! [`ClientResolver`]. The GitHub implementations live in `mergebot-github`;
//! tests use in-memory recording fakes.

use std::future::Future;

/// A named ref (`refs/heads/<name>`) and the commit it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    /// Fully qualified ref name, e.g. `refs/heads/merge-release-2.0`.
    pub ref_name: String,

    /// Commit identifier the ref points to (opaque content hash).
    pub sha: String,
}

/// Request to open a pull request.
#[derive(Debug, Clone)]
pub struct PullRequestSpec {
    /// PR title.
    pub title: String,

    /// PR body.
    pub body: String,

    /// Head branch name.
    pub head: String,

    /// Base branch name.
    pub base: String,

    /// Whether maintainers may push to the head branch.
    pub maintainer_can_modify: bool,
}

/// A pull request the platform reports as created.
#[derive(Debug, Clone)]
pub struct CreatedPullRequest {
    /// PR number.
    pub number: u64,

    /// PR URL.
    pub html_url: String,
}

/// Error surfaced by a [`RepoHost`] call.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The named resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform rejected the credential (expired or revoked token).
    #[error("credential rejected by platform: {0}")]
    Unauthorized(String),

    /// The platform rejected the request with an API error.
    #[error("platform error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Platform error text.
        message: String,
    },

    /// Transport-level failure (network, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),
}

impl HostError {
    /// Whether this error means the resource was absent, as opposed to the
    /// lookup itself failing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error signals an expired or rejected credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Repository, ref, and pull-request operations against the hosting
/// platform, scoped to one installation.
pub trait RepoHost: Send + Sync {
    /// Look up a branch's current reference.
    fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> impl Future<Output = Result<BranchRef, HostError>> + Send;

    /// Create a branch pointing at `sha`.
    fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> impl Future<Output = Result<BranchRef, HostError>> + Send;

    /// Force-update an existing branch to point at `sha`.
    fn force_update_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> impl Future<Output = Result<BranchRef, HostError>> + Send;

    /// Open a pull request.
    fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        spec: &PullRequestSpec,
    ) -> impl Future<Output = Result<CreatedPullRequest, HostError>> + Send;

    /// List the distinct committer logins on a pull request's commits.
    fn list_pull_request_committers(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> impl Future<Output = Result<Vec<String>, HostError>> + Send;

    /// Request reviews from the given users.
    fn request_reviewers(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        reviewers: &[String],
    ) -> impl Future<Output = Result<(), HostError>> + Send;
}

impl<H: RepoHost> RepoHost for std::sync::Arc<H> {
    fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> impl Future<Output = Result<BranchRef, HostError>> + Send {
        (**self).get_branch(owner, repo, branch)
    }

    fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> impl Future<Output = Result<BranchRef, HostError>> + Send {
        (**self).create_branch(owner, repo, branch, sha)
    }

    fn force_update_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> impl Future<Output = Result<BranchRef, HostError>> + Send {
        (**self).force_update_branch(owner, repo, branch, sha)
    }

    fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        spec: &PullRequestSpec,
    ) -> impl Future<Output = Result<CreatedPullRequest, HostError>> + Send {
        (**self).create_pull_request(owner, repo, spec)
    }

    fn list_pull_request_committers(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> impl Future<Output = Result<Vec<String>, HostError>> + Send {
        (**self).list_pull_request_committers(owner, repo, number)
    }

    fn request_reviewers(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        reviewers: &[String],
    ) -> impl Future<Output = Result<(), HostError>> + Send {
        (**self).request_reviewers(owner, repo, number, reviewers)
    }
}

/// Resolves an authenticated [`RepoHost`] for an installation.
///
/// Single-tenant (enterprise) resolvers ignore the installation id; in
/// multi-tenant mode the id comes from each incoming event.
pub trait ClientResolver: Send + Sync {
    /// The host type this resolver produces.
    type Host: RepoHost;

    /// Return a host authenticated for the given installation.
    fn resolve(
        &self,
        installation_id: Option<u64>,
    ) -> impl Future<Output = Result<Self::Host, HostError>> + Send;

    /// Drop any cached credential for the given installation, forcing the
    /// next [`resolve`](Self::resolve) to authenticate from scratch.
    fn invalidate(&self, installation_id: Option<u64>) -> impl Future<Output = ()> + Send;
}
