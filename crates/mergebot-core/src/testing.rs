//! In-memory fakes for the hosting-platform seam, used by reconciler and
//! processor tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::host::{
    BranchRef, ClientResolver, CreatedPullRequest, HostError, PullRequestSpec, RepoHost,
};

/// One recorded platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetBranch { branch: String },
    CreateBranch { branch: String, sha: String },
    ForceUpdate { branch: String, sha: String },
    CreatePullRequest { head: String, base: String, title: String },
    ListCommitters { number: u64 },
    RequestReviewers { number: u64, reviewers: Vec<String> },
}

/// A scriptable in-memory [`RepoHost`] that records every call.
#[derive(Debug, Default)]
pub struct FakeHost {
    branches: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<Call>>,
    pr_failure: Mutex<Option<(u16, String)>>,
    committers: Mutex<Vec<String>>,
    unauthorized_remaining: Mutex<u32>,
}

impl FakeHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a branch at the given commit.
    pub fn set_branch(&self, branch: &str, sha: &str) {
        self.branches
            .lock()
            .unwrap()
            .insert(branch.to_string(), sha.to_string());
    }

    /// Current commit of a branch, if it exists.
    #[must_use]
    pub fn branch_sha(&self, branch: &str) -> Option<String> {
        self.branches.lock().unwrap().get(branch).cloned()
    }

    /// Every recorded call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Script every subsequent PR creation to fail with an API error.
    pub fn fail_pull_requests_with(&self, status: u16, message: &str) {
        *self.pr_failure.lock().unwrap() = Some((status, message.to_string()));
    }

    /// Script the committer logins returned for any PR.
    pub fn set_committers(&self, logins: &[&str]) {
        *self.committers.lock().unwrap() = logins.iter().map(ToString::to_string).collect();
    }

    /// Make the next `n` platform calls fail as unauthorized, simulating an
    /// expired installation token.
    pub fn reject_next_calls_as_unauthorized(&self, n: u32) {
        *self.unauthorized_remaining.lock().unwrap() = n;
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_token(&self) -> Result<(), HostError> {
        let mut remaining = self.unauthorized_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(HostError::Unauthorized("Bad credentials".into()));
        }
        Ok(())
    }
}

impl RepoHost for FakeHost {
    async fn get_branch(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
    ) -> Result<BranchRef, HostError> {
        self.record(Call::GetBranch { branch: branch.to_string() });
        self.check_token()?;
        self.branch_sha(branch)
            .map(|sha| BranchRef { ref_name: format!("refs/heads/{branch}"), sha })
            .ok_or_else(|| HostError::NotFound(format!("refs/heads/{branch}")))
    }

    async fn create_branch(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<BranchRef, HostError> {
        self.record(Call::CreateBranch { branch: branch.to_string(), sha: sha.to_string() });
        self.check_token()?;
        self.set_branch(branch, sha);
        Ok(BranchRef { ref_name: format!("refs/heads/{branch}"), sha: sha.to_string() })
    }

    async fn force_update_branch(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<BranchRef, HostError> {
        self.record(Call::ForceUpdate { branch: branch.to_string(), sha: sha.to_string() });
        self.check_token()?;
        self.set_branch(branch, sha);
        Ok(BranchRef { ref_name: format!("refs/heads/{branch}"), sha: sha.to_string() })
    }

    async fn create_pull_request(
        &self,
        _owner: &str,
        repo: &str,
        spec: &PullRequestSpec,
    ) -> Result<CreatedPullRequest, HostError> {
        self.record(Call::CreatePullRequest {
            head: spec.head.clone(),
            base: spec.base.clone(),
            title: spec.title.clone(),
        });
        self.check_token()?;
        if let Some((status, message)) = self.pr_failure.lock().unwrap().clone() {
            return Err(HostError::Api { status, message });
        }
        Ok(CreatedPullRequest {
            number: 1,
            html_url: format!("https://github.com/owner/{repo}/pull/1"),
        })
    }

    async fn list_pull_request_committers(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
    ) -> Result<Vec<String>, HostError> {
        self.record(Call::ListCommitters { number });
        self.check_token()?;
        Ok(self.committers.lock().unwrap().clone())
    }

    async fn request_reviewers(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
        reviewers: &[String],
    ) -> Result<(), HostError> {
        self.record(Call::RequestReviewers { number, reviewers: reviewers.to_vec() });
        self.check_token()?;
        Ok(())
    }
}

/// A [`ClientResolver`] handing out a shared [`FakeHost`], counting
/// resolutions and invalidations.
#[derive(Debug)]
pub struct FakeResolver {
    host: Arc<FakeHost>,
    resolves: Mutex<u32>,
    invalidations: Mutex<u32>,
}

impl FakeResolver {
    #[must_use]
    pub fn new(host: Arc<FakeHost>) -> Self {
        Self { host, resolves: Mutex::new(0), invalidations: Mutex::new(0) }
    }

    /// Number of times a client was resolved.
    #[must_use]
    pub fn resolve_count(&self) -> u32 {
        *self.resolves.lock().unwrap()
    }

    /// Number of times the cache was invalidated.
    #[must_use]
    pub fn invalidation_count(&self) -> u32 {
        *self.invalidations.lock().unwrap()
    }
}

impl ClientResolver for FakeResolver {
    type Host = Arc<FakeHost>;

    async fn resolve(&self, _installation_id: Option<u64>) -> Result<Self::Host, HostError> {
        *self.resolves.lock().unwrap() += 1;
        Ok(Arc::clone(&self.host))
    }

    async fn invalidate(&self, _installation_id: Option<u64>) {
        *self.invalidations.lock().unwrap() += 1;
    }
}
