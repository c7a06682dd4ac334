use crate::error::{AppError, Result};
use std::path::PathBuf;
use tracing::instrument;
use yup_oauth2::ServiceAccountAuthenticator;

/// Service account key file. Tokens are derived per call and never cached.
#[derive(Debug, Clone)]
pub struct ServiceAccountKeyFile {
    path: PathBuf,
}

impl ServiceAccountKeyFile {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "Service account key file not found at {:?}",
                path
            )));
        }

        Ok(Self { path })
    }

    #[instrument(name = "Authenticating with service account", skip_all)]
    pub async fn access_token(&self, scopes: &[&str]) -> Result<String> {
        let key = yup_oauth2::read_service_account_key(&self.path)
            .await
            .map_err(|e| AppError::Config(format!("Failed to read service account key: {}", e)))?;

        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to build authenticator: {}", e)))?;

        let token = auth
            .token(scopes)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to get token: {}", e)))?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| AppError::Auth("Service account token response was empty".to_string()))
    }
}
