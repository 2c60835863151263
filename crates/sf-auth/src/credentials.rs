//! Bearer credentials and the sources that produce them.
//!
//! All credential types implement custom Debug to redact sensitive data.

use std::future::Future;

use crate::error::{Error, ErrorKind, Result};

/// Produces a fresh bearer credential.
///
/// Called by [`AuthenticatedConnection`](crate::AuthenticatedConnection) on
/// the first request and again whenever the remote side rejects the cached
/// access token.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self) -> impl Future<Output = Result<SalesforceCredentials>> + Send;
}

/// Salesforce bearer credentials.
///
/// Sensitive fields (access_token, refresh_token) are redacted in Debug output
/// to prevent accidental exposure in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SalesforceCredentials {
    instance_url: String,
    access_token: String,
    refresh_token: Option<String>,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl SalesforceCredentials {
    /// Create new credentials with the given values.
    ///
    /// A trailing slash on the instance URL is dropped.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        let instance_url = instance_url.into().trim_end_matches('/').to_string();
        Self {
            instance_url,
            access_token: access_token.into(),
            refresh_token: None,
        }
    }

    /// Create credentials with a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Base URL every request of this session is addressed to.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// The bearer token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the refresh token if available.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns true if the credentials appear to be valid (non-empty).
    pub fn is_valid(&self) -> bool {
        !self.instance_url.is_empty() && !self.access_token.is_empty()
    }

    /// Load credentials from environment variables.
    ///
    /// Required environment variables:
    /// - `SF_INSTANCE_URL`
    /// - `SF_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `SF_REFRESH_TOKEN`
    pub fn from_env() -> Result<Self> {
        let instance_url = require_env("SF_INSTANCE_URL")?;
        let access_token = require_env("SF_ACCESS_TOKEN")?;

        let mut creds = Self::new(instance_url, access_token);
        if let Ok(rt) = std::env::var("SF_REFRESH_TOKEN") {
            creds = creds.with_refresh_token(rt);
        }

        Ok(creds)
    }
}

/// Fixed credentials authenticate to themselves. A rejected token stays
/// rejected, so renewal attempts run out quickly.
impl Authenticator for SalesforceCredentials {
    async fn authenticate(&self) -> Result<SalesforceCredentials> {
        if !self.is_valid() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "instance URL and access token are required".to_string(),
            )));
        }
        Ok(self.clone())
    }
}

pub(crate) fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|e| Error::with_source(ErrorKind::EnvVar(name.to_string()), e))
}
