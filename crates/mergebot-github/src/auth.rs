//! GitHub App identity.
//!
//! Signs the short-lived RS256 JWT that authenticates the bot as an App,
//! the first step of every installation token exchange.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;

use crate::error::{Error, Result};

/// JWT claims for GitHub App authentication.
#[derive(Debug, Serialize)]
struct Claims {
    /// Issued-at (Unix timestamp), backdated for clock skew.
    iat: u64,
    /// Expiration (Unix timestamp).
    exp: u64,
    /// Issuer: the App id.
    iss: String,
}

/// The App's numeric id and signing key.
pub struct AppAuth {
    app_id: u64,
    key: EncodingKey,
}

impl AppAuth {
    /// Load the App key from a PEM file.
    ///
    /// # Errors
    /// Returns [`Error::KeyMaterial`] if the file cannot be read and
    /// [`Error::Jwt`] if it is not a valid RSA PEM.
    pub fn from_pem_file(app_id: u64, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = fs::read(path).map_err(|source| Error::KeyMaterial {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(app_id, &pem)
    }

    /// Build the App identity from PEM key material.
    ///
    /// # Errors
    /// Returns [`Error::Jwt`] if the material is not a valid RSA PEM.
    pub fn from_pem(app_id: u64, pem: &[u8]) -> Result<Self> {
        Ok(Self {
            app_id,
            key: EncodingKey::from_rsa_pem(pem)?,
        })
    }

    /// The App's numeric id.
    #[must_use]
    pub const fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Sign a JWT valid for ten minutes, issued 60 seconds in the past to
    /// absorb clock skew between this host and GitHub.
    ///
    /// # Errors
    /// Returns [`Error::Jwt`] if signing fails or [`Error::Clock`] if the
    /// system clock is unusable.
    pub fn jwt(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| Error::Clock)?
            .as_secs();

        let claims = Claims {
            iat: now.saturating_sub(60),
            exp: now + 600,
            iss: self.app_id.to_string(),
        };

        Ok(encode(&Header::new(Algorithm::RS256), &claims, &self.key)?)
    }
}

impl std::fmt::Debug for AppAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppAuth")
            .field("app_id", &self.app_id)
            .field("key", &"[redacted]")
            .finish()
    }
}
