//! OAuth 2.0 token endpoint flows.
//!
//! - **Username-Password Flow** - For trusted integrations holding user credentials
//! - **Refresh Token Flow** - For renewing an access token from a stored refresh token
//! - **JWT Bearer Flow** - For server-to-server integration (see jwt.rs)

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::credentials::{require_env, Authenticator, SalesforceCredentials};
use crate::error::{Error, ErrorKind, Result};

/// OAuth 2.0 configuration for a connected app.
///
/// `consumer_secret` is redacted in Debug output to prevent accidental
/// exposure in logs.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Consumer key (client_id).
    pub consumer_key: String,
    /// Consumer secret (client_secret). Optional for some flows.
    consumer_secret: Option<String>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

impl OAuthConfig {
    /// Create a new OAuth config.
    pub fn new(consumer_key: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: None,
        }
    }

    /// Set the consumer secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.consumer_secret = Some(secret.into());
        self
    }

    pub(crate) fn consumer_secret(&self) -> Option<&str> {
        self.consumer_secret.as_deref()
    }
}

/// OAuth client talking to the `/services/oauth2/token` endpoint.
#[derive(Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Create a new OAuth client.
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Get the OAuth config.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Exchange a username and password for an access token.
    ///
    /// The password is not logged to prevent credential exposure.
    #[instrument(skip(self, password))]
    pub async fn password(
        &self,
        username: &str,
        password: &str,
        login_url: &str,
    ) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", "password"),
            ("client_id", self.config.consumer_key.as_str()),
            ("username", username),
            ("password", password),
        ];

        if let Some(secret) = self.config.consumer_secret() {
            params.push(("client_secret", secret));
        }

        self.request_token(&params, login_url).await
    }

    /// Refresh an access token using a refresh token.
    ///
    /// The refresh_token parameter is not logged to prevent credential exposure.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
        login_url: &str,
    ) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.consumer_key.as_str()),
        ];

        if let Some(secret) = self.config.consumer_secret() {
            params.push(("client_secret", secret));
        }

        self.request_token(&params, login_url).await
    }

    async fn request_token(&self, params: &[(&str, &str)], login_url: &str) -> Result<TokenResponse> {
        post_token_form(&self.http_client, params, login_url).await
    }
}

/// POST a form to the token endpoint and parse the token response.
pub(crate) async fn post_token_form(
    http_client: &reqwest::Client,
    params: &[(&str, &str)],
    login_url: &str,
) -> Result<TokenResponse> {
    let body = serde_urlencoded::to_string(params)?;

    let response = http_client
        .post(token_endpoint(login_url))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<OAuthErrorResponse>(&body) {
            Ok(error) => Error::new(ErrorKind::OAuth {
                error: error.error,
                description: error.error_description,
            }),
            Err(_) => Error::new(ErrorKind::Http(format!(
                "token endpoint returned status {}",
                status.as_u16()
            ))),
        });
    }

    debug!(status = status.as_u16(), "Token issued");
    Ok(serde_json::from_str(&body)?)
}

fn token_endpoint(login_url: &str) -> String {
    format!("{}/services/oauth2/token", login_url.trim_end_matches('/'))
}

/// Username-password flow as a credential source.
#[derive(Clone)]
pub struct PasswordFlow {
    client: OAuthClient,
    login_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for PasswordFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordFlow")
            .field("client", &self.client)
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl PasswordFlow {
    /// Create a password flow against the production login URL.
    pub fn new(
        config: OAuthConfig,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client: OAuthClient::new(config),
            login_url: crate::PRODUCTION_LOGIN_URL.to_string(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Use a different login URL (sandbox, My Domain).
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    /// Load the flow from environment variables.
    ///
    /// Required environment variables:
    /// - `SF_CLIENT_ID`
    /// - `SF_USERNAME`
    /// - `SF_PASSWORD`
    ///
    /// Optional:
    /// - `SF_LOGIN_URL` (default: production login URL)
    /// - `SF_CLIENT_SECRET`
    /// - `SF_SECURITY_TOKEN` (appended to the password)
    pub fn from_env() -> Result<Self> {
        let mut config = OAuthConfig::new(require_env("SF_CLIENT_ID")?);
        if let Ok(secret) = std::env::var("SF_CLIENT_SECRET") {
            config = config.with_secret(secret);
        }

        let username = require_env("SF_USERNAME")?;
        let mut password = require_env("SF_PASSWORD")?;
        if let Ok(security_token) = std::env::var("SF_SECURITY_TOKEN") {
            password.push_str(&security_token);
        }

        let mut flow = Self::new(config, username, password);
        if let Ok(login_url) = std::env::var("SF_LOGIN_URL") {
            flow = flow.with_login_url(login_url);
        }

        Ok(flow)
    }

    /// The login URL tokens are requested from.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }
}

impl Authenticator for PasswordFlow {
    async fn authenticate(&self) -> Result<SalesforceCredentials> {
        let token = self
            .client
            .password(&self.username, &self.password, &self.login_url)
            .await?;
        Ok(token.to_credentials())
    }
}

/// Refresh-token flow as a credential source.
#[derive(Clone)]
pub struct RefreshTokenFlow {
    client: OAuthClient,
    login_url: String,
    refresh_token: String,
}

impl std::fmt::Debug for RefreshTokenFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenFlow")
            .field("client", &self.client)
            .field("login_url", &self.login_url)
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

impl RefreshTokenFlow {
    /// Create a refresh-token flow against the production login URL.
    pub fn new(config: OAuthConfig, refresh_token: impl Into<String>) -> Self {
        Self {
            client: OAuthClient::new(config),
            login_url: crate::PRODUCTION_LOGIN_URL.to_string(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Use a different login URL (sandbox, My Domain).
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }
}

impl Authenticator for RefreshTokenFlow {
    async fn authenticate(&self) -> Result<SalesforceCredentials> {
        let token = self
            .client
            .refresh_token(&self.refresh_token, &self.login_url)
            .await?;

        // The endpoint usually does not rotate the refresh token.
        let mut creds = token.to_credentials();
        if creds.refresh_token().is_none() {
            creds = creds.with_refresh_token(&self.refresh_token);
        }
        Ok(creds)
    }
}

/// Token response from OAuth.
///
/// Sensitive fields like `access_token` and `refresh_token` are redacted
/// in Debug output to prevent accidental exposure in logs.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token (if requested).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Instance URL.
    pub instance_url: String,
    /// User ID URL.
    #[serde(default)]
    pub id: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Scopes granted.
    #[serde(default)]
    pub scope: Option<String>,
    /// Signature for verification.
    #[serde(default)]
    pub signature: Option<String>,
    /// Issued at timestamp.
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl TokenResponse {
    /// Convert to SalesforceCredentials.
    pub fn to_credentials(&self) -> SalesforceCredentials {
        let mut creds = SalesforceCredentials::new(&self.instance_url, &self.access_token);

        if let Some(ref rt) = self.refresh_token {
            creds = creds.with_refresh_token(rt);
        }

        creds
    }
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}
