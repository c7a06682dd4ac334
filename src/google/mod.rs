pub mod auth;
mod installed;
mod service_account;

use crate::config::{GoogleAuthMode, GoogleConfig};
use crate::error::Result;
use auth::{CredentialStore, TokenCache};
use installed::InstalledFlow;
use service_account::ServiceAccountKeyFile;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

// One cached user token serves both Sheets and Gmail
const USER_SCOPES: &[&str] = &[SPREADSHEETS_SCOPE, GMAIL_SEND_SCOPE];
const SERVICE_ACCOUNT_SCOPES: &[&str] = &[SPREADSHEETS_SCOPE, DRIVE_FILE_SCOPE];

/// Source of Google access tokens, chosen by the configured auth mode
pub enum GoogleAuth {
    User(CredentialStore<InstalledFlow>),
    ServiceAccount(ServiceAccountKeyFile),
}

impl GoogleAuth {
    pub fn from_config(config: &GoogleConfig) -> Result<Self> {
        match config.auth_mode {
            GoogleAuthMode::User => {
                let flow = InstalledFlow::new(config.client_secret_file())?;
                let cache = TokenCache::new(config.token_file()?);
                Ok(GoogleAuth::User(CredentialStore::new(cache, flow)))
            }
            GoogleAuthMode::ServiceAccount => Ok(GoogleAuth::ServiceAccount(
                ServiceAccountKeyFile::new(config.service_account_file()?)?,
            )),
        }
    }

    pub fn mode(&self) -> GoogleAuthMode {
        match self {
            GoogleAuth::User(_) => GoogleAuthMode::User,
            GoogleAuth::ServiceAccount(_) => GoogleAuthMode::ServiceAccount,
        }
    }

    /// Bearer token valid for this mode's full scope set
    pub async fn access_token(&self) -> Result<String> {
        match self {
            GoogleAuth::User(store) => Ok(store.resolve(USER_SCOPES).await?.access_token),
            GoogleAuth::ServiceAccount(key_file) => {
                key_file.access_token(SERVICE_ACCOUNT_SCOPES).await
            }
        }
    }
}

/// Delete the cached user token at the configured location
pub fn clear_tokens(config: &GoogleConfig) -> Result<()> {
    TokenCache::new(config.token_file()?).clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_user_mode_defers_missing_client_secret_until_needed() {
        let dir = TempDir::new().unwrap();
        let config = GoogleConfig {
            client_secret_file: Some(dir.path().join("gcp-secret.json")),
            token_file: Some(dir.path().join("tokens.json")),
            ..Default::default()
        };

        // No cached token, so the consent flow needs the missing file
        let auth = GoogleAuth::from_config(&config).unwrap();
        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_service_account_mode_requires_key_file() {
        let dir = TempDir::new().unwrap();
        let config = GoogleConfig {
            auth_mode: GoogleAuthMode::ServiceAccount,
            service_account_file: Some(dir.path().join("missing.json")),
            ..Default::default()
        };
        let err = GoogleAuth::from_config(&config).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_user_mode_uses_valid_cache_without_secret_file() {
        let dir = TempDir::new().unwrap();
        let token_file = dir.path().join("tokens.json");
        let cache = TokenCache::new(&token_file);
        cache
            .save(&auth::Credential {
                access_token: "cached-token".to_string(),
                refresh_token: None,
                expires_at: chrono::Utc::now().timestamp() + 3600,
                scopes: USER_SCOPES.iter().map(|s| s.to_string()).collect(),
            })
            .unwrap();

        // Only the token location is set; the client secret falls back to its default
        let config = GoogleConfig {
            token_file: Some(token_file),
            ..Default::default()
        };
        let auth = GoogleAuth::from_config(&config).unwrap();

        assert_eq!(auth.mode(), GoogleAuthMode::User);
        assert_eq!(auth.access_token().await.unwrap(), "cached-token");
    }
}
