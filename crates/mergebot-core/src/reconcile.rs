//! Branch reconciliation.
//!
//! Guarantees the merge (commit) branch exists and points at the base
//! branch's current head. The merge branch is disposable automation state,
//! so staleness is resolved by unconditional forced update rather than
//! merge or rebase, which keeps the operation idempotent and safe to run on
//! every matching push.

use tracing::info;

use crate::error::{Error, Result};
use crate::host::{BranchRef, RepoHost};

/// Make `commit_branch` point at `base_branch`'s current head, creating it
/// if absent.
///
/// The commit branch is looked up first; only if that lookup settles the
/// branch's existence is the base branch consulted. The returned reference
/// reflects the state just written. Reconciliation is a snapshot: two
/// concurrent calls race with last-writer-wins semantics (the platform
/// offers no compare-and-swap on ref updates).
///
/// # Errors
/// - [`Error::InvalidConfig`] when `commit_branch` is empty, equals
///   `base_branch`, or the branch must be created from an empty base name.
///   These are caller programming errors and fail before any network call
///   where detectable.
/// - [`Error::ReferenceLookup`] when a branch lookup fails for a reason
///   other than the commit branch being absent. The merge branch is left
///   untouched.
/// - [`Error::ReferenceWrite`] when the create or forced update is
///   rejected, with the platform's error text attached.
pub async fn reconcile<H: RepoHost>(
    host: &H,
    owner: &str,
    repo: &str,
    base_branch: &str,
    commit_branch: &str,
) -> Result<BranchRef> {
    if commit_branch.is_empty() {
        return Err(Error::InvalidConfig("commit branch must not be empty".into()));
    }
    if base_branch == commit_branch {
        return Err(Error::InvalidConfig(format!(
            "base branch and commit branch are both {commit_branch}"
        )));
    }

    match host.get_branch(owner, repo, commit_branch).await {
        Ok(stale) => {
            let base = lookup(host, owner, repo, base_branch).await?;
            info!(
                repo,
                branch = commit_branch,
                stale_sha = %stale.sha,
                new_sha = %base.sha,
                "found stale merge branch, updating"
            );
            host.force_update_branch(owner, repo, commit_branch, &base.sha)
                .await
                .map_err(|source| Error::ReferenceWrite {
                    branch: commit_branch.to_string(),
                    source,
                })
        }
        Err(e) if e.is_not_found() => {
            if base_branch.is_empty() {
                return Err(Error::InvalidConfig(
                    "cannot create the commit branch from an empty base branch".into(),
                ));
            }
            let base = lookup(host, owner, repo, base_branch).await?;
            info!(repo, branch = commit_branch, sha = %base.sha, "creating merge branch");
            host.create_branch(owner, repo, commit_branch, &base.sha)
                .await
                .map_err(|source| Error::ReferenceWrite {
                    branch: commit_branch.to_string(),
                    source,
                })
        }
        Err(source) => Err(Error::ReferenceLookup {
            branch: commit_branch.to_string(),
            source,
        }),
    }
}

async fn lookup<H: RepoHost>(
    host: &H,
    owner: &str,
    repo: &str,
    branch: &str,
) -> Result<BranchRef> {
    host.get_branch(owner, repo, branch)
        .await
        .map_err(|source| Error::ReferenceLookup {
            branch: branch.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::testing::{Call, FakeHost};

    const OWNER: &str = "snimmagadda1";
    const REPO: &str = "repo1";

    #[tokio::test]
    async fn creates_merge_branch_from_base_head() {
        let host = FakeHost::new();
        host.set_branch("release-2.0", "c0ffee");

        let branch = reconcile(&host, OWNER, REPO, "release-2.0", "merge-release-2.0")
            .await
            .unwrap();

        assert_eq!(branch.ref_name, "refs/heads/merge-release-2.0");
        assert_eq!(branch.sha, "c0ffee");
        assert_eq!(host.branch_sha("merge-release-2.0").as_deref(), Some("c0ffee"));
    }

    #[tokio::test]
    async fn force_updates_existing_merge_branch() {
        let host = FakeHost::new();
        host.set_branch("release-2.0", "c0ffee");
        host.set_branch("merge-release-2.0", "0ld5ha");

        let branch = reconcile(&host, OWNER, REPO, "release-2.0", "merge-release-2.0")
            .await
            .unwrap();

        assert_eq!(branch.sha, "c0ffee");
        assert!(host.calls().iter().any(|c| matches!(
            c,
            Call::ForceUpdate { branch, sha } if branch == "merge-release-2.0" && sha == "c0ffee"
        )));
    }

    #[tokio::test]
    async fn second_run_updates_instead_of_creating() {
        let host = FakeHost::new();
        host.set_branch("release-2.0", "c0ffee");

        reconcile(&host, OWNER, REPO, "release-2.0", "merge-release-2.0")
            .await
            .unwrap();
        let second = reconcile(&host, OWNER, REPO, "release-2.0", "merge-release-2.0")
            .await
            .unwrap();

        assert_eq!(second.sha, "c0ffee");
        let calls = host.calls();
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::CreateBranch { .. })).count(),
            1
        );
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::ForceUpdate { .. })).count(),
            1
        );
    }

    #[tokio::test]
    async fn equal_branches_fail_before_any_call() {
        let host = FakeHost::new();

        let err = reconcile(&host, OWNER, REPO, "release-2.0", "release-2.0")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_base_fails_without_creating() {
        let host = FakeHost::new();

        let err = reconcile(&host, OWNER, REPO, "", "merge-release-2.0")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(host.branch_sha("merge-release-2.0").is_none());
    }

    #[tokio::test]
    async fn missing_base_fails_without_creating() {
        let host = FakeHost::new();

        let err = reconcile(&host, OWNER, REPO, "release-2.0", "merge-release-2.0")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ReferenceLookup { ref branch, .. } if branch == "release-2.0"));
        assert!(host.branch_sha("merge-release-2.0").is_none());
        assert!(!host.calls().iter().any(|c| matches!(c, Call::CreateBranch { .. })));
    }
}
