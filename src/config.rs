use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR_PREFIX: &str = "sheet-relay";
const DEFAULT_CLIENT_SECRET_FILE: &str = "gcp-secret.json";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub google: GoogleConfig,
    pub mail: MailConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoogleAuthMode {
    /// Installed-app OAuth with a cached user token
    #[default]
    User,
    /// Service account key, no interactive consent and no token cache
    ServiceAccount,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GoogleConfig {
    pub auth_mode: GoogleAuthMode,
    pub client_secret_file: Option<PathBuf>,
    pub service_account_file: Option<PathBuf>,
    pub token_file: Option<PathBuf>,
}

impl GoogleConfig {
    /// OAuth client file, `gcp-secret.json` in the working directory unless set
    pub fn client_secret_file(&self) -> PathBuf {
        self.client_secret_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT_SECRET_FILE))
    }

    pub fn service_account_file(&self) -> Result<PathBuf> {
        self.service_account_file.clone().ok_or_else(|| {
            AppError::Config(
                "GOOGLE_APPLICATION_CREDENTIALS is not set. It must point to a service account \
                 JSON file."
                    .to_string(),
            )
        })
    }

    /// Token cache location, defaulting to the XDG cache directory
    pub fn token_file(&self) -> Result<PathBuf> {
        match &self.token_file {
            Some(path) => Ok(path.clone()),
            None => Config::cache_file("google_tokens.json"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MailTransport {
    /// Gmail REST API using the Google credential
    #[default]
    GmailApi,
    /// SMTP submission with STARTTLS and an app password
    Smtp,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MailConfig {
    pub transport: MailTransport,
    pub sender: Option<String>,
    pub app_password: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::default(),
            sender: None,
            app_password: None,
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }
}

impl MailConfig {
    /// Sender address and app password, both required for SMTP
    pub fn smtp_credentials(&self) -> Result<(String, String)> {
        match (&self.sender, &self.app_password) {
            (Some(sender), Some(password)) if !sender.is_empty() && !password.is_empty() => {
                Ok((sender.clone(), password.clone()))
            }
            _ => Err(AppError::Config(
                "GMAIL_SENDER and/or GMAIL_APP_PASSWORD are not set. Create an App Password in \
                 your Google Account and set both."
                    .to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
        }
    }
}

impl TelegramConfig {
    pub fn bot_token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))
    }
}

impl Config {
    /// Load the optional config file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            toml::from_str(&contents)
                .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Override file values with whatever `lookup` returns for the known variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(mode) = lookup("GOOGLE_AUTH_MODE") {
            self.google.auth_mode = match mode.as_str() {
                "user" => GoogleAuthMode::User,
                "service_account" => GoogleAuthMode::ServiceAccount,
                other => {
                    return Err(AppError::Config(format!(
                        "Unknown GOOGLE_AUTH_MODE '{}', expected 'user' or 'service_account'",
                        other
                    )));
                }
            };
        }
        if let Some(path) = lookup("GOOGLE_OAUTH_CLIENT_SECRET_FILE") {
            self.google.client_secret_file = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("GOOGLE_APPLICATION_CREDENTIALS") {
            self.google.service_account_file = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("GOOGLE_TOKEN_FILE") {
            self.google.token_file = Some(PathBuf::from(path));
        }

        if let Some(transport) = lookup("MAIL_TRANSPORT") {
            self.mail.transport = match transport.as_str() {
                "gmail_api" => MailTransport::GmailApi,
                "smtp" => MailTransport::Smtp,
                other => {
                    return Err(AppError::Config(format!(
                        "Unknown MAIL_TRANSPORT '{}', expected 'gmail_api' or 'smtp'",
                        other
                    )));
                }
            };
        }
        if let Some(sender) = lookup("GMAIL_SENDER") {
            self.mail.sender = Some(sender);
        }
        if let Some(password) = lookup("GMAIL_APP_PASSWORD") {
            self.mail.app_password = Some(password);
        }

        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }

        Ok(())
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get the cache directory path
    pub fn cache_dir() -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.get_cache_home()
            .ok_or_else(|| AppError::Config("Failed to determine cache directory".to_string()))
    }

    /// Get a cache file path
    pub fn cache_file(filename: &str) -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.place_cache_file(filename)
            .map_err(|e| AppError::Config(format!("Failed to create cache file path: {}", e)))
    }
}
