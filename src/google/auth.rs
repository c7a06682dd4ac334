use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Seconds before the real expiry at which a token is treated as expired
const EXPIRY_SKEW_SECS: i64 = 300;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry time as seconds since Unix epoch
    pub expires_at: i64,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// Check if the access token is expired or about to expire (within 5 minutes)
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.expires_at < (now + EXPIRY_SKEW_SECS)
    }

    /// Whether this credential was issued for every scope in `scopes`
    pub fn covers(&self, scopes: &[&str]) -> bool {
        scopes
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }
}

/// The two ways of obtaining a fresh credential from the identity provider
#[async_trait]
pub trait TokenEndpoint {
    async fn refresh(&self, refresh_token: &str, scopes: &[&str]) -> Result<Credential>;

    async fn authorize(&self, scopes: &[&str]) -> Result<Credential>;
}

/// JSON token cache on local disk, overwritten in place
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to read tokens file: {}", e)))?;

        let credential: Credential = serde_json::from_str(&contents)
            .map_err(|e| AppError::Auth(format!("Failed to parse tokens: {}", e)))?;

        Ok(Some(credential))
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Auth(format!("Failed to create token cache directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(credential)
            .map_err(|e| AppError::Auth(format!("Failed to serialize tokens: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to create tokens file: {}", e)))?;

        file.write_all(contents.as_bytes())
            .map_err(|e| AppError::Auth(format!("Failed to write tokens file: {}", e)))?;

        Ok(())
    }

    /// Delete the cache file, if there is one
    #[instrument(name = "Clearing cached Google tokens", skip_all)]
    pub fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            debug!("No Google tokens to clear");
            return Ok(());
        }

        fs::remove_file(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to delete tokens file: {}", e)))?;
        info!("Cleared Google cached tokens");

        Ok(())
    }
}

pub struct CredentialStore<E> {
    cache: TokenCache,
    endpoint: E,
}

impl<E> CredentialStore<E>
where
    E: TokenEndpoint + Sync,
{
    pub fn new(cache: TokenCache, endpoint: E) -> Self {
        Self { cache, endpoint }
    }

    /// Get a valid credential, refreshing or re-authorizing as needed
    #[instrument(name = "Resolving Google credential", skip_all)]
    pub async fn resolve(&self, scopes: &[&str]) -> Result<Credential> {
        let cached = match self.cache.load()? {
            Some(credential) if credential.covers(scopes) => Some(credential),
            Some(_) => {
                debug!("Cached credential does not cover the requested scopes");
                None
            }
            None => {
                debug!("No cached credential found");
                None
            }
        };

        if let Some(credential) = cached {
            if !credential.is_expired() {
                debug!("Using cached Google credential");
                return Ok(credential);
            }

            if let Some(refresh_token) = credential.refresh_token {
                debug!("Access token expired, refreshing...");
                let mut refreshed = self.endpoint.refresh(&refresh_token, scopes).await?;
                if refreshed.refresh_token.is_none() {
                    refreshed.refresh_token = Some(refresh_token);
                }
                self.cache.save(&refreshed)?;
                debug!("Token refresh successful");
                return Ok(refreshed);
            }

            debug!("Access token expired and no refresh token is cached");
        }

        let credential = self.endpoint.authorize(scopes).await?;
        self.cache.save(&credential)?;
        info!(path = ?self.cache.path(), "Saved new Google credential");

        Ok(credential)
    }
}
