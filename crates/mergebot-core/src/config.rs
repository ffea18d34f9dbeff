//! Process configuration.
//!
//! All configuration is read once at startup into an immutable [`Config`]
//! value, which is then passed into the credential manager and event
//! processor. Nothing here is consulted as ambient state after startup.

use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::repos::MonitoredRepos;

/// Enterprise deployment endpoints. Presence of this block switches the
/// credential manager into single-tenant mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterpriseConfig {
    /// Enterprise API base URL.
    pub api_url: String,

    /// Enterprise upload URL.
    pub upload_url: String,
}

/// Immutable process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub App numeric id.
    pub app_id: u64,

    /// Path to the App's private key PEM file.
    pub private_key_path: PathBuf,

    /// Owner (user or organization) of the monitored repositories.
    pub owner: String,

    /// Enterprise endpoints; `None` for github.com.
    pub enterprise: Option<EnterpriseConfig>,

    /// Branch whose pushes trigger automation.
    pub release_branch: String,

    /// Branch pull requests are opened into.
    pub master_branch: String,

    /// Shared secret for webhook signature verification; verification is
    /// skipped when unset.
    pub webhook_secret: Option<String>,

    /// Repositories the bot acts on.
    pub repos: MonitoredRepos,

    /// Whether to request recent committers as reviewers on created PRs.
    pub assign_reviewers: bool,

    /// Port the webhook listener binds to.
    pub port: u16,
}

impl Config {
    /// Branch the reconciler creates or fast-forwards, derived from the
    /// release branch.
    #[must_use]
    pub fn merge_branch(&self) -> String {
        format!("merge-{}", self.release_branch)
    }

    /// Load configuration from process environment variables.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] when a required variable is missing
    /// or malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a lookup function. Factored out of
    /// [`from_env`](Self::from_env) so tests can supply variables without
    /// touching the process environment.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] when a required variable is missing
    /// or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::InvalidConfig(format!("{key} must be set")))
        };

        let app_id = require("APP_ID")?
            .parse::<u64>()
            .map_err(|e| Error::InvalidConfig(format!("could not parse APP_ID: {e}")))?;

        let enterprise = match lookup("GITHUB_ENTERPRISE_URL").filter(|v| !v.is_empty()) {
            Some(api_url) => Some(EnterpriseConfig {
                upload_url: lookup("GITHUB_ENTERPRISE_UPLOAD_URL").unwrap_or_else(|| api_url.clone()),
                api_url,
            }),
            None => None,
        };

        let release_branch = require("RELEASE_BRANCH")?;
        let master_branch =
            lookup("MASTER_BRANCH").filter(|v| !v.is_empty()).unwrap_or_else(|| "master".into());

        if release_branch == master_branch {
            return Err(Error::InvalidConfig(format!(
                "RELEASE_BRANCH and MASTER_BRANCH are both {release_branch}"
            )));
        }

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::InvalidConfig(format!("could not parse PORT: {e}")))?,
            None => 3000,
        };

        Ok(Self {
            app_id,
            private_key_path: PathBuf::from(require("CERT_PATH")?),
            owner: require("OWNER")?,
            enterprise,
            release_branch,
            master_branch,
            webhook_secret: lookup("WEBHOOK_SECRET").filter(|v| !v.is_empty()),
            repos: MonitoredRepos::parse(&require("REPOS")?, ','),
            assign_reviewers: lookup("ASSIGN_REVIEWERS")
                .is_some_and(|v| v == "true" || v == "1"),
            port,
        })
    }
}
