//! A [`Connection`] that attaches, caches and renews a bearer credential.

use std::time::Duration;

use busbar_sf_client::{
    execute_with_retry, Connection, Error as ClientError, ErrorKind as ClientErrorKind,
    RequestOptions, Result as ClientResult, RetryConfig, SfHttpClient,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};

use crate::credentials::{Authenticator, SalesforceCredentials};

/// Error codes of transient server-side conditions worth retrying even
/// though they arrive as 400/500 responses.
const TRANSIENT_CONDITIONS: [&str; 2] = ["UNABLE_TO_LOCK_ROW", "QUERY_TIMEOUT"];

/// Retry and re-authentication budgets of an [`AuthenticatedConnection`].
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Retries of a failed request after the initial attempt.
    pub max_retries: u32,
    /// Credential renewals allowed per attempt before giving up.
    pub max_auth_retries: u32,
    /// Base unit of the exponential backoff between retries.
    pub backoff_factor: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            max_auth_retries: 3,
            backoff_factor: Duration::from_millis(50),
        }
    }
}

impl ConnectionConfig {
    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the maximum number of credential renewals per attempt.
    pub fn with_max_auth_retries(mut self, retries: u32) -> Self {
        self.max_auth_retries = retries;
        self
    }

    /// Set the backoff factor.
    pub fn with_backoff_factor(mut self, factor: Duration) -> Self {
        self.backoff_factor = factor;
        self
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::default()
            .with_max_retries(self.max_retries)
            .with_backoff_factor(self.backoff_factor)
    }
}

/// Connection that authenticates lazily and renews on HTTP 401.
///
/// The credential is fetched on the first request and cached. Every
/// request URL is resolved against the cached instance URL and carries the
/// cached access token. Renewals are serialized: tasks that were waiting
/// on a renewal reuse its result instead of starting another one.
///
/// ```rust,ignore
/// use busbar_sf_auth::{AuthenticatedConnection, PasswordFlow};
/// use busbar_sf_client::{Connection, RequestOptions};
///
/// let connection = AuthenticatedConnection::new(PasswordFlow::from_env()?)?;
/// let limits = connection
///     .request(RequestOptions::get("/services/data/v62.0/limits"))
///     .await?;
/// ```
pub struct AuthenticatedConnection<A, C = SfHttpClient> {
    authenticator: A,
    inner: C,
    config: ConnectionConfig,
    credentials: RwLock<Option<SalesforceCredentials>>,
    renewal: Mutex<()>,
}

impl<A: std::fmt::Debug, C: std::fmt::Debug> std::fmt::Debug for AuthenticatedConnection<A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedConnection")
            .field("authenticator", &self.authenticator)
            .field("inner", &self.inner)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<A: Authenticator> AuthenticatedConnection<A> {
    /// Create a connection over a default HTTP client.
    pub fn new(authenticator: A) -> ClientResult<Self> {
        Ok(Self::with_connection(
            authenticator,
            SfHttpClient::default_client()?,
        ))
    }
}

impl<A: Authenticator, C: Connection> AuthenticatedConnection<A, C> {
    /// Create a connection over the given inner connection.
    pub fn with_connection(authenticator: A, inner: C) -> Self {
        Self {
            authenticator,
            inner,
            config: ConnectionConfig::default(),
            credentials: RwLock::new(None),
            renewal: Mutex::new(()),
        }
    }

    /// Replace the retry configuration.
    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the retry configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Current credential, authenticating first if none is cached.
    pub async fn credentials(&self) -> ClientResult<SalesforceCredentials> {
        if let Some(creds) = self.credentials.read().await.as_ref() {
            return Ok(creds.clone());
        }
        self.renew(None).await
    }

    /// Fetch a new credential unless another task already replaced `stale`.
    async fn renew(&self, stale: Option<&str>) -> ClientResult<SalesforceCredentials> {
        let _guard = self.renewal.lock().await;

        if let Some(current) = self.credentials.read().await.as_ref() {
            if stale.is_none_or(|token| token != current.access_token()) {
                return Ok(current.clone());
            }
        }

        info!("Renewing Salesforce credentials");
        let creds = self.authenticator.authenticate().await.map_err(|err| {
            error!(error = %err, "Credential renewal failed");
            ClientError::from(err)
        })?;

        *self.credentials.write().await = Some(creds.clone());
        debug!(instance_url = %creds.instance_url(), "Credentials cached");
        Ok(creds)
    }

    /// One attempt of the retry budget. Failures other than exhausted
    /// renewals are logged with the request options.
    async fn request_once(&self, options: &RequestOptions) -> ClientResult<serde_json::Value> {
        self.send_authenticated(options).await.map_err(|err| {
            if !err.is_auth_retries_exhausted() {
                error!(options = ?options, error = %err, "Request failed");
            }
            err
        })
    }

    /// Send with the cached credential, renewing on 401.
    async fn send_authenticated(
        &self,
        options: &RequestOptions,
    ) -> ClientResult<serde_json::Value> {
        let mut creds = self.credentials().await?;
        let mut auth_retries = 0;

        loop {
            let request = options
                .clone()
                .with_url(resolve_url(creds.instance_url(), &options.url))
                .bearer_auth(creds.access_token());

            match self.inner.request(request).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_auth_expired() => {
                    if auth_retries >= self.config.max_auth_retries {
                        error!(
                            attempts = auth_retries,
                            options = ?options,
                            error = %err,
                            "Authentication retries exhausted"
                        );
                        return Err(ClientError::with_source(
                            ClientErrorKind::AuthenticationRetriesExhausted {
                                attempts: auth_retries,
                            },
                            err,
                        ));
                    }

                    auth_retries += 1;
                    debug!(attempt = auth_retries, "Access token rejected");
                    let stale = creds.access_token().to_string();
                    creds = self.renew(Some(&stale)).await?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Send a request with authentication and retries.
    ///
    /// When the retry budget is spent the last error is returned unchanged.
    #[instrument(skip(self, options), fields(method = options.method.as_str(), url = %options.url))]
    pub async fn execute(&self, options: RequestOptions) -> ClientResult<serde_json::Value> {
        execute_with_retry(
            &self.config.retry_config(),
            || self.request_once(&options),
            is_retryable,
        )
        .await
    }
}

impl<A: Authenticator, C: Connection> Connection for AuthenticatedConnection<A, C> {
    async fn request(&self, options: RequestOptions) -> ClientResult<serde_json::Value> {
        self.execute(options).await
    }
}

/// Retry predicate of authenticated requests.
///
/// - 403, 404 and 410 are final.
/// - 400 and 500 are retried only for row-lock contention and query timeouts.
/// - Exhausted authentication retries are final.
/// - Everything else is retried.
pub fn is_retryable(err: &ClientError, attempt: u32) -> bool {
    let retryable = match err.status() {
        Some(403 | 404 | 410) => false,
        Some(400 | 500) => {
            let message = err.to_string();
            TRANSIENT_CONDITIONS
                .iter()
                .any(|condition| message.contains(condition))
        }
        _ => !err.is_auth_retries_exhausted(),
    };

    if retryable {
        error!(attempt, error = %err, "Retryable request failure");
    }
    retryable
}

/// Resolve a request URL against the instance URL.
///
/// Absolute URLs are kept, `/`-prefixed paths are appended to the instance
/// URL and anything else is joined with a `/`.
pub fn resolve_url(instance_url: &str, url: &str) -> String {
    if url.starts_with("https://") || url.starts_with("http://") {
        url.to_string()
    } else if url.starts_with('/') {
        format!("{}{}", instance_url, url)
    } else {
        format!("{}/{}", instance_url, url)
    }
}
