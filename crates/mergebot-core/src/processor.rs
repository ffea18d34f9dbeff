//! Release event processing.
//!
//! Drives one push notification through filter, monitored-repository check,
//! branch reconciliation, and pull-request creation. Each event is
//! independent; there is no state carried across events.

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::PushEvent;
use crate::host::{ClientResolver, HostError, PullRequestSpec, RepoHost};
use crate::reconcile::reconcile;
use crate::repos::MonitoredRepos;

/// Body attached to every automatically created pull request.
const PR_BODY: &str = "This is an automatically created PR 🚀";

/// Terminal state of one processed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The pushed ref was not a release-branch push.
    Ignored,

    /// The repository is not in the monitored set.
    Unmonitored,

    /// A pull request was created.
    Created {
        /// PR number.
        number: u64,
        /// PR URL.
        html_url: String,
    },

    /// A pull request for this head/base pair already exists; the merge
    /// branch was still reconciled, so the existing PR reflects the push.
    AlreadyExists,
}

/// Processes push notifications into reconciled merge branches and pull
/// requests.
#[derive(Debug)]
pub struct ReleaseProcessor<R> {
    resolver: R,
    owner: String,
    release_branch: String,
    master_branch: String,
    merge_branch: String,
    repos: MonitoredRepos,
    assign_reviewers: bool,
}

impl<R: ClientResolver> ReleaseProcessor<R> {
    /// Build a processor from startup configuration and a client resolver.
    pub fn new(config: &Config, resolver: R) -> Self {
        Self {
            resolver,
            owner: config.owner.clone(),
            release_branch: config.release_branch.clone(),
            master_branch: config.master_branch.clone(),
            merge_branch: config.merge_branch(),
            repos: config.repos.clone(),
            assign_reviewers: config.assign_reviewers,
        }
    }

    /// Process one push notification to a terminal [`Outcome`].
    ///
    /// Events that fail the release filter or the monitored-repository
    /// check terminate without any platform call. A platform-signaled
    /// expired credential triggers one cache invalidation and one retry of
    /// the (idempotent) reconcile + PR sequence.
    ///
    /// # Errors
    /// Per-event failures from reconciliation or PR creation; see
    /// [`Error`]. The caller owns reporting — nothing here retries beyond
    /// the single re-authentication.
    pub async fn process(&self, event: &PushEvent) -> Result<Outcome> {
        if !self.is_release_push(&event.git_ref) {
            return Ok(Outcome::Ignored);
        }

        let repo = event.repository.name.as_str();
        if !self.repos.contains(repo) {
            info!(repo, "parsed push - unmonitored repo");
            return Ok(Outcome::Unmonitored);
        }

        let installation = event.installation_id();
        match self.converge(installation, repo).await {
            Err(e) if e.is_unauthorized() => {
                warn!(repo, error = %e, "credential rejected, re-authenticating and retrying once");
                self.resolver.invalidate(installation).await;
                self.converge(installation, repo).await
            }
            other => other,
        }
    }

    /// A push is a release push when the ref contains the release branch
    /// name (case-insensitively) and is not a push to the bot's own merge
    /// branch, which would feed back into itself.
    fn is_release_push(&self, git_ref: &str) -> bool {
        let git_ref = git_ref.to_lowercase();
        git_ref.contains(&self.release_branch.to_lowercase())
            && !git_ref.contains(&self.merge_branch.to_lowercase())
    }

    async fn converge(&self, installation: Option<u64>, repo: &str) -> Result<Outcome> {
        let host = self
            .resolver
            .resolve(installation)
            .await
            .map_err(Error::Credential)?;

        reconcile(&host, &self.owner, repo, &self.release_branch, &self.merge_branch).await?;

        let spec = PullRequestSpec {
            title: format!("Merge {}", self.release_branch),
            body: PR_BODY.to_string(),
            head: self.merge_branch.to_lowercase(),
            base: self.master_branch.clone(),
            maintainer_can_modify: true,
        };

        match host.create_pull_request(&self.owner, repo, &spec).await {
            Ok(pr) => {
                info!(repo, url = %pr.html_url, "created pull request");
                if self.assign_reviewers {
                    self.request_committer_reviews(&host, repo, pr.number).await;
                }
                Ok(Outcome::Created { number: pr.number, html_url: pr.html_url })
            }
            Err(e) if is_already_exists(&e) => {
                info!(
                    repo,
                    head = %spec.head,
                    base = %spec.base,
                    "pull request already exists, merge branch update is reflected"
                );
                Ok(Outcome::AlreadyExists)
            }
            Err(source) => Err(Error::PullRequest {
                head: spec.head,
                base: spec.base,
                source,
            }),
        }
    }

    /// Request the PR's recent committers as reviewers. Advisory: the PR
    /// already exists, so failures are logged rather than failing the
    /// event.
    async fn request_committer_reviews<H: RepoHost>(&self, host: &H, repo: &str, number: u64) {
        let committers = match host.list_pull_request_committers(&self.owner, repo, number).await {
            Ok(committers) => committers,
            Err(e) => {
                warn!(repo, number, error = %e, "unable to list commits for reviewer assignment");
                return;
            }
        };

        let mut reviewers: Vec<String> = committers;
        reviewers.sort();
        reviewers.dedup();
        if reviewers.is_empty() {
            return;
        }

        if let Err(e) = host.request_reviewers(&self.owner, repo, number, &reviewers).await {
            warn!(repo, number, error = %e, "unable to request reviewers");
        }
    }
}

/// The platform's "A pull request already exists" rejection is the
/// system's sole idempotence mechanism for PR creation; it is matched by
/// message text, as the status code is shared with other validation
/// failures.
fn is_already_exists(err: &HostError) -> bool {
    matches!(err, HostError::Api { message, .. } if message.contains("A pull request already exists"))
}
