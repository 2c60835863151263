//! JWT Bearer authentication flow.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tracing::debug;

use crate::credentials::{Authenticator, SalesforceCredentials};
use crate::error::Result;
use crate::oauth::post_token_form;

/// JWT Bearer authentication for server-to-server integration.
///
/// This flow is ideal for automated processes that don't require user interaction.
/// Requires a connected app with a certificate configured.
#[derive(Clone)]
pub struct JwtAuth {
    /// Consumer key (client_id) from the connected app.
    consumer_key: String,
    /// Username of the Salesforce user to authenticate as.
    username: String,
    /// Private key for signing the JWT (PEM format).
    private_key: Vec<u8>,
    /// Token expiration duration (default: 3 minutes).
    expiration: Duration,
    login_url: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth")
            .field("consumer_key", &self.consumer_key)
            .field("username", &self.username)
            .field("private_key", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .field("login_url", &self.login_url)
            .finish_non_exhaustive()
    }
}

impl JwtAuth {
    /// Create a new JWT authenticator against the production login URL.
    ///
    /// # Arguments
    ///
    /// * `consumer_key` - The consumer key from the connected app
    /// * `username` - The Salesforce username to authenticate as
    /// * `private_key` - The private key in PEM format (RSA)
    pub fn new(
        consumer_key: impl Into<String>,
        username: impl Into<String>,
        private_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            username: username.into(),
            private_key: private_key.into(),
            expiration: Duration::minutes(3),
            login_url: crate::PRODUCTION_LOGIN_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Load the private key from a file.
    pub fn from_key_file(
        consumer_key: impl Into<String>,
        username: impl Into<String>,
        key_path: impl AsRef<std::path::Path>,
    ) -> Result<Self> {
        let private_key = std::fs::read(key_path.as_ref())?;
        Ok(Self::new(consumer_key, username, private_key))
    }

    /// Set the JWT expiration duration.
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Use a different login URL. It is also the assertion audience.
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    /// Generate a signed JWT assertion.
    fn generate_assertion(&self) -> Result<String> {
        let now = Utc::now();
        let exp = now + self.expiration;

        let claims = JwtClaims {
            iss: &self.consumer_key,
            sub: &self.username,
            aud: &self.login_url,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(&self.private_key)?;

        Ok(encode(&header, &claims, &key)?)
    }
}

impl Authenticator for JwtAuth {
    async fn authenticate(&self) -> Result<SalesforceCredentials> {
        let assertion = self.generate_assertion()?;

        debug!(login_url = %self.login_url, "Authenticating with JWT Bearer flow");

        let token = post_token_form(
            &self.http_client,
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ],
            &self.login_url,
        )
        .await?;

        Ok(token.to_credentials())
    }
}

/// JWT claims for Salesforce OAuth.
#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    /// Issuer (consumer key).
    iss: &'a str,
    /// Subject (username).
    sub: &'a str,
    /// Audience (login URL).
    aud: &'a str,
    /// Expiration time (Unix timestamp).
    exp: i64,
    /// Issued at time (Unix timestamp).
    iat: i64,
}
