//! Raw HTTP transport over reqwest.

use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{Error, ErrorKind, Result};
use crate::request::RequestOptions;
use crate::response::parse_response;

/// HTTP client for Salesforce APIs.
///
/// Sends exactly one HTTP request per call. Requests must carry an absolute
/// URL; credentials, URL resolution and retries are layered on top by
/// other connections.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SfHttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed);

        let inner = builder
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute a single request and parse the JSON body.
    #[instrument(skip(self, request), fields(method = request.method.as_str(), url = %request.url))]
    pub async fn execute(&self, request: RequestOptions) -> Result<serde_json::Value> {
        let mut url = url::Url::parse(&request.url)?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        let mut req = self.inner.request(request.method.to_reqwest(), url);

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(ref body) = request.json {
            req = req.json(body);
        }

        if self.config.log_requests {
            debug!("Sending request");
        }

        let response = req.send().await?;
        let status = response.status().as_u16();

        if self.config.log_requests {
            let content_length = response.content_length();
            if response.status().is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }
        }

        let body = response.text().await?;
        parse_response(status, &body)
    }
}

impl Connection for SfHttpClient {
    async fn request(&self, options: RequestOptions) -> Result<serde_json::Value> {
        self.execute(options).await
    }
}
