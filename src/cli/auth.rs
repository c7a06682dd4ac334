use crate::config::Config;
use crate::error::Result;
use crate::google::{self, GoogleAuth};
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum AuthProvider {
    /// Authenticate with Google (Sheets + Gmail)
    Google,
}

impl AuthProvider {
    pub async fn execute(&self, reset: bool) -> Result<()> {
        match self {
            AuthProvider::Google => authenticate_google(reset).await,
        }
    }
}

async fn authenticate_google(reset: bool) -> Result<()> {
    let config = Config::load()?;

    if reset {
        google::clear_tokens(&config.google)?;
    }

    let auth = GoogleAuth::from_config(&config.google)?;
    let _token = auth.access_token().await?;

    info!(mode = ?auth.mode(), "Google authentication verified");

    Ok(())
}
