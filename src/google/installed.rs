use super::auth::{Credential, TokenEndpoint};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use oauth2::{
    AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, StandardRevocableToken,
    TokenResponse, TokenUrl,
    basic::{
        BasicClient, BasicErrorResponse, BasicRevocationErrorResponse,
        BasicTokenIntrospectionResponse, BasicTokenResponse,
    },
};
use reqwest::redirect::Policy;
use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;
use tiny_http::{Response, Server};
use tracing::{debug, instrument};
use url::Url;

const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

// Type alias for the client when Auth and Token URLs are set
type ConfiguredClient = Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,    // HasAuthUrl
    EndpointNotSet, // HasDeviceAuthUrl
    EndpointNotSet, // HasIntrospectionUrl
    EndpointNotSet, // HasRevocationUrl
    EndpointSet,    // HasTokenUrl
>;

/// Installed-app OAuth flow driven by a downloaded client secret file.
///
/// The secret file is only read when a refresh or a consent is needed, so a
/// valid cached credential keeps working without it.
pub struct InstalledFlow {
    secret_path: PathBuf,
    http_client: reqwest::Client,
}

impl InstalledFlow {
    pub fn new(secret_path: PathBuf) -> Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .redirect(Policy::none())
            .build()
            .map_err(|e| AppError::Auth(format!("Failed to build reqwest client: {}", e)))?;

        Ok(Self {
            secret_path,
            http_client,
        })
    }

    fn client(&self) -> Result<ConfiguredClient> {
        if !self.secret_path.exists() {
            return Err(AppError::Config(format!(
                "Missing OAuth client file: {:?}. Download it from the Google Cloud Console \
                 (OAuth client for a desktop app).",
                self.secret_path
            )));
        }

        let contents = fs::read(&self.secret_path)?;
        let secret = yup_oauth2::parse_application_secret(contents).map_err(|e| {
            AppError::Config(format!(
                "Failed to parse OAuth client file {:?}: {}",
                self.secret_path, e
            ))
        })?;

        let auth_url = AuthUrl::new(secret.auth_uri)
            .map_err(|e| AppError::Auth(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(secret.token_uri)
            .map_err(|e| AppError::Auth(format!("Invalid token URL: {}", e)))?;

        Ok(BasicClient::new(ClientId::new(secret.client_id))
            .set_client_secret(ClientSecret::new(secret.client_secret))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url))
    }
}

#[async_trait]
impl TokenEndpoint for InstalledFlow {
    #[instrument(name = "Refreshing Google token", skip_all)]
    async fn refresh(&self, refresh_token: &str, scopes: &[&str]) -> Result<Credential> {
        let token_result = self
            .client()?
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to refresh token: {:?}", e)))?;

        Ok(credential_from_response(&token_result, scopes))
    }

    #[instrument(name = "Running Google consent flow", skip_all)]
    async fn authorize(&self, scopes: &[&str]) -> Result<Credential> {
        let client = self.client()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        // Ephemeral port, picked by the OS
        let server = Server::http("127.0.0.1:0")
            .map_err(|e| AppError::Auth(format!("Failed to bind callback listener: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| AppError::Auth("Callback listener has no IP address".to_string()))?;

        let redirect_url = RedirectUrl::new(format!("http://localhost:{}/", port))
            .map_err(|e| AppError::Auth(format!("Invalid redirect URL: {}", e)))?;
        debug!(port, "Listening for OAuth callback");

        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes.iter().map(|s| Scope::new(s.to_string())))
            .set_pkce_challenge(pkce_challenge)
            .set_redirect_uri(Cow::Borrowed(&redirect_url))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        // stdout is reserved for tool output
        eprintln!("Open this URL in your browser:\n{}", auth_url);
        eprintln!();
        eprintln!("Waiting for authorization...");

        let code = loop {
            let request = server
                .recv()
                .map_err(|e| AppError::Auth(format!("Failed to receive request: {}", e)))?;

            let callback_url = format!("http://localhost:{}{}", port, request.url());
            let url = Url::parse(&callback_url)
                .map_err(|e| AppError::Auth(format!("Failed to parse callback URL: {}", e)))?;

            match parse_callback(&url, csrf_token.secret()) {
                Ok(None) => {
                    // Browsers also ask for /favicon.ico and the like
                    let _ = request.respond(Response::empty(404));
                }
                Ok(Some(code)) => {
                    let response = Response::from_string(
                        "Authentication successful! You can close this window.",
                    );
                    request
                        .respond(response)
                        .map_err(|e| AppError::Auth(format!("Failed to send response: {}", e)))?;
                    break code;
                }
                Err(e) => {
                    let _ = request.respond(Response::from_string(
                        "Authentication failed. Check the terminal for details.",
                    ));
                    return Err(e);
                }
            }
        };
        drop(server);

        let token_result = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .set_redirect_uri(Cow::Owned(redirect_url))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to exchange code: {:?}", e)))?;

        Ok(credential_from_response(&token_result, scopes))
    }
}

/// Pull the authorization code out of a redirect, checking the CSRF state.
///
/// Returns `Ok(None)` for requests that are not an OAuth redirect at all.
fn parse_callback(url: &Url, expected_state: &str) -> Result<Option<String>> {
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(AppError::Auth(format!("Authorization denied: {}", error)));
    }

    let Some(code) = param("code") else {
        return Ok(None);
    };

    let state = param("state").ok_or_else(|| AppError::Auth("No state in callback".to_string()))?;
    if state != expected_state {
        return Err(AppError::Auth("CSRF token mismatch".to_string()));
    }

    Ok(Some(code))
}

fn credential_from_response(token_result: &BasicTokenResponse, requested: &[&str]) -> Credential {
    let expires_in = token_result
        .expires_in()
        .map(|d| d.as_secs() as i64)
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

    // Google omits `scope` on some refresh responses
    let scopes = match token_result.scopes() {
        Some(granted) if !granted.is_empty() => granted.iter().map(|s| s.as_str().to_owned()).collect(),
        _ => requested.iter().map(|s| s.to_string()).collect(),
    };

    Credential {
        access_token: token_result.access_token().secret().clone(),
        refresh_token: token_result.refresh_token().map(|t| t.secret().clone()),
        expires_at: chrono::Utc::now().timestamp() + expires_in,
        scopes,
    }
}
