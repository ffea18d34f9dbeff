//! GitHub API client.

use std::time::Duration;

use mergebot_core::{BranchRef, CreatedPullRequest, HostError, PullRequestSpec, RepoHost};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::types::{
    NewPullRequest, NewReference, PullRequest, PullRequestCommit, Reference, ReviewersRequest,
    UpdateReference,
};

/// Authenticated GitHub client scoped to one installation token.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    /// Default GitHub API URL.
    pub const DEFAULT_API_URL: &'static str = "https://api.github.com";

    /// Timeout applied to every outbound call so a hung remote cannot pin
    /// an event task indefinitely.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client for api.github.com.
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, Self::DEFAULT_API_URL)
    }

    /// Create a client with a custom API URL (for GitHub Enterprise).
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("mergebot"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Self::REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Make a GET request.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        Self::handle_response(path, response).await
    }

    /// Make a POST request.
    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(body)
            .send()
            .await?;

        Self::handle_response(path, response).await
    }

    /// Make a PATCH request.
    async fn patch<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .patch(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(body)
            .send()
            .await?;

        Self::handle_response(path, response).await
    }

    /// Handle API response.
    async fn handle_response<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.json().await?;
            return Ok(body);
        }

        match status.as_u16() {
            401 => Err(Error::AuthenticationFailed),
            403 if response
                .headers()
                .get("x-ratelimit-remaining")
                .is_some_and(|v| v == "0") =>
            {
                Err(Error::RateLimited)
            }
            404 => Err(Error::NotFound(path.to_string())),
            status_code => {
                let text = response.text().await.unwrap_or_default();
                Err(Error::ApiError {
                    status: status_code,
                    message: text,
                })
            }
        }
    }

    // === Ref Operations ===

    /// Get a branch's reference.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if the branch does not exist, or another
    /// error if the call fails.
    pub async fn get_ref(&self, owner: &str, repo: &str, branch: &str) -> Result<Reference> {
        self.get(&format!("/repos/{owner}/{repo}/git/ref/heads/{branch}"))
            .await
    }

    /// Create a branch pointing at `sha`.
    ///
    /// # Errors
    /// Returns error if the ref cannot be created.
    pub async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<Reference> {
        self.post(
            &format!("/repos/{owner}/{repo}/git/refs"),
            &NewReference {
                ref_name: format!("refs/heads/{branch}"),
                sha: sha.to_string(),
            },
        )
        .await
    }

    /// Move a branch to `sha`, optionally forcing a non-fast-forward
    /// update.
    ///
    /// # Errors
    /// Returns error if the ref cannot be updated.
    pub async fn update_ref(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<Reference> {
        self.patch(
            &format!("/repos/{owner}/{repo}/git/refs/heads/{branch}"),
            &UpdateReference {
                sha: sha.to_string(),
                force,
            },
        )
        .await
    }

    // === PR Operations ===

    /// Create a pull request.
    ///
    /// # Errors
    /// Returns error if PR creation fails, including the "already exists"
    /// validation rejection, which callers pattern-match on.
    pub async fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        pr: &NewPullRequest,
    ) -> Result<PullRequest> {
        self.post(&format!("/repos/{owner}/{repo}/pulls"), pr).await
    }

    /// List a pull request's commits.
    ///
    /// # Errors
    /// Returns error if the call fails.
    pub async fn list_pull_commits(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestCommit>> {
        self.get(&format!("/repos/{owner}/{repo}/pulls/{number}/commits"))
            .await
    }

    /// Request reviews on a pull request.
    ///
    /// # Errors
    /// Returns error if the call fails.
    pub async fn add_reviewers(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        request: &ReviewersRequest,
    ) -> Result<PullRequest> {
        self.post(
            &format!("/repos/{owner}/{repo}/pulls/{number}/requested_reviewers"),
            request,
        )
        .await
    }
}

impl RepoHost for GitHubClient {
    async fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> std::result::Result<BranchRef, HostError> {
        let reference = self.get_ref(owner, repo, branch).await?;
        Ok(BranchRef {
            ref_name: reference.ref_name,
            sha: reference.object.sha,
        })
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> std::result::Result<BranchRef, HostError> {
        let reference = self.create_ref(owner, repo, branch, sha).await?;
        Ok(BranchRef {
            ref_name: reference.ref_name,
            sha: reference.object.sha,
        })
    }

    async fn force_update_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> std::result::Result<BranchRef, HostError> {
        // The merge branch is disposable automation state, so the update is
        // always forced.
        let reference = self.update_ref(owner, repo, branch, sha, true).await?;
        Ok(BranchRef {
            ref_name: reference.ref_name,
            sha: reference.object.sha,
        })
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        spec: &PullRequestSpec,
    ) -> std::result::Result<CreatedPullRequest, HostError> {
        let pr = self
            .create_pull(
                owner,
                repo,
                &NewPullRequest {
                    title: spec.title.clone(),
                    body: spec.body.clone(),
                    head: spec.head.clone(),
                    base: spec.base.clone(),
                    maintainer_can_modify: spec.maintainer_can_modify,
                },
            )
            .await?;
        Ok(CreatedPullRequest {
            number: pr.number,
            html_url: pr.html_url,
        })
    }

    async fn list_pull_request_committers(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> std::result::Result<Vec<String>, HostError> {
        let commits = self.list_pull_commits(owner, repo, number).await?;
        Ok(commits
            .into_iter()
            .filter_map(|c| c.committer.map(|u| u.login))
            .collect())
    }

    async fn request_reviewers(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        reviewers: &[String],
    ) -> std::result::Result<(), HostError> {
        self.add_reviewers(
            owner,
            repo,
            number,
            &ReviewersRequest {
                reviewers: reviewers.to_vec(),
            },
        )
        .await?;
        Ok(())
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client =
            GitHubClient::with_base_url("ghs_token", "https://github.example.com/api/v3/").unwrap();

        assert_eq!(client.base_url, "https://github.example.com/api/v3");
    }

    #[test]
    fn debug_redacts_token() {
        let client = GitHubClient::new("ghs_sensitive").unwrap();

        let debug = format!("{client:?}");

        assert!(!debug.contains("ghs_sensitive"));
        assert!(debug.contains("[redacted]"));
    }
}
