//! Installation-scoped credential management.
//!
//! Exchanges the App identity for short-lived installation tokens and
//! caches the resulting clients per installation id. Two modes exist:
//! enterprise deployments bind the App to a single installation discovered
//! at startup, while github.com deployments authenticate per installation
//! id as it arrives on each event.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use mergebot_core::{ClientResolver, HostError};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::AppAuth;
use crate::client::GitHubClient;
use crate::error::{Error, Result};
use crate::types::{Installation, InstallationToken};

/// Tokens within this margin of expiry are treated as expired, so a client
/// handed out now stays valid for the duration of an event task.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// One fixed installation, resolved at startup.
    Enterprise { installation_id: u64 },
    /// Installation id arrives per event.
    PerInstallation,
}

#[derive(Debug, Clone)]
struct CachedClient {
    client: GitHubClient,
    expires_at: DateTime<Utc>,
}

impl CachedClient {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Obtains and caches installation-scoped [`GitHubClient`]s.
#[derive(Debug)]
pub struct CredentialManager {
    auth: AppAuth,
    http: reqwest::Client,
    api_base: String,
    mode: Mode,
    cache: RwLock<HashMap<u64, CachedClient>>,
}

impl CredentialManager {
    /// Multi-tenant manager for github.com: each event's installation id is
    /// exchanged for its own token.
    ///
    /// # Errors
    /// Returns error if the app-level HTTP client cannot be built.
    pub fn new(auth: AppAuth) -> Result<Self> {
        Self::with_mode(auth, GitHubClient::DEFAULT_API_URL, Mode::PerInstallation)
    }

    /// Single-tenant manager for an enterprise deployment: the owner's one
    /// installation is discovered now and used for every event.
    ///
    /// # Errors
    /// Returns [`Error::InstallationNotFound`] if the App is not installed
    /// for `owner`, or another error if the lookup fails. Callers treat
    /// this as fatal to startup.
    pub async fn enterprise(auth: AppAuth, api_url: &str, owner: &str) -> Result<Self> {
        let mut manager = Self::with_mode(auth, api_url, Mode::PerInstallation)?;

        let installation = manager.find_org_installation(owner).await?;
        info!(
            api_url,
            installation_id = installation.id,
            "initialized enterprise GitHub App client"
        );

        manager.mode = Mode::Enterprise {
            installation_id: installation.id,
        };
        Ok(manager)
    }

    fn with_mode(auth: AppAuth, api_base: &str, mode: Mode) -> Result<Self> {
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

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            auth,
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            mode,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Return a client authenticated for the given installation.
    ///
    /// In enterprise mode `installation_id` is ignored in favor of the
    /// installation discovered at startup. Cached clients are reused within
    /// their token's validity window and re-authenticated transparently
    /// once inside the expiry margin.
    ///
    /// # Errors
    /// Returns [`Error::MissingInstallationId`] when an event carries no
    /// installation id outside enterprise mode, or the token exchange
    /// failure otherwise.
    pub async fn resolve(&self, installation_id: Option<u64>) -> Result<GitHubClient> {
        let id = self.effective_id(installation_id)?;
        let now = Utc::now();

        if let Some(cached) = self.cache.read().await.get(&id) {
            if cached.is_fresh(now) {
                return Ok(cached.client.clone());
            }
        }

        let token = self.exchange_token(id).await?;
        let client = GitHubClient::with_base_url(token.token, &self.api_base)?;

        debug!(
            installation_id = id,
            expires_at = %token.expires_at,
            "exchanged installation token"
        );

        // Concurrent exchanges for the same installation are wasteful but
        // safe; last writer wins.
        self.cache.write().await.insert(
            id,
            CachedClient {
                client: client.clone(),
                expires_at: token.expires_at,
            },
        );

        Ok(client)
    }

    /// Drop the cached client for an installation so the next
    /// [`resolve`](Self::resolve) authenticates from scratch. Used when the
    /// transport signals an expired credential before its known expiry.
    pub async fn invalidate(&self, installation_id: Option<u64>) {
        if let Ok(id) = self.effective_id(installation_id) {
            self.cache.write().await.remove(&id);
        }
    }

    fn effective_id(&self, installation_id: Option<u64>) -> Result<u64> {
        match self.mode {
            Mode::Enterprise { installation_id } => Ok(installation_id),
            Mode::PerInstallation => installation_id.ok_or(Error::MissingInstallationId),
        }
    }

    /// Look up the App's installation for an organization or user account.
    async fn find_org_installation(&self, owner: &str) -> Result<Installation> {
        let response = self
            .http
            .get(format!("{}/orgs/{owner}/installation", self.api_base))
            .header(AUTHORIZATION, format!("Bearer {}", self.auth.jwt()?))
            .send()
            .await?;

        match response.status().as_u16() {
            status if (200..300).contains(&status) => Ok(response.json().await?),
            401 => Err(Error::AuthenticationFailed),
            404 => Err(Error::InstallationNotFound {
                owner: owner.to_string(),
            }),
            status => Err(Error::ApiError {
                status,
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Exchange the App JWT for an installation access token.
    async fn exchange_token(&self, installation_id: u64) -> Result<InstallationToken> {
        let response = self
            .http
            .post(format!(
                "{}/app/installations/{installation_id}/access_tokens",
                self.api_base
            ))
            .header(AUTHORIZATION, format!("Bearer {}", self.auth.jwt()?))
            .send()
            .await?;

        match response.status().as_u16() {
            status if (200..300).contains(&status) => Ok(response.json().await?),
            401 => Err(Error::AuthenticationFailed),
            404 => Err(Error::NotFound(format!("installation {installation_id}"))),
            status => Err(Error::ApiError {
                status,
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

impl ClientResolver for CredentialManager {
    type Host = GitHubClient;

    async fn resolve(&self, installation_id: Option<u64>) -> std::result::Result<GitHubClient, HostError> {
        Self::resolve(self, installation_id)
            .await
            .map_err(HostError::from)
    }

    async fn invalidate(&self, installation_id: Option<u64>) {
        Self::invalidate(self, installation_id).await;
    }
}
