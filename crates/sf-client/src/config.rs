//! Transport settings of [`SfHttpClient`](crate::SfHttpClient).

use std::time::Duration;

/// Settings of the reqwest client behind [`SfHttpClient`](crate::SfHttpClient).
///
/// Retries and re-authentication are configured on the connection that
/// wraps the transport, not here.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on one request, including reading the body.
    pub timeout: Duration,
    /// Upper bound on establishing the TCP/TLS connection.
    pub connect_timeout: Duration,
    /// How long an unused pooled connection is kept.
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
    /// Send `Accept-Encoding: gzip, deflate`; large query pages compress well.
    pub accept_compressed: bool,
    /// Emit a debug event per request and response.
    pub log_requests: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: crate::USER_AGENT.to_string(),
            accept_compressed: true,
            log_requests: true,
        }
    }
}

impl ClientConfig {
    /// Start from the defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    pub fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Replace the `busbar-sf-mapper/<version>` user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.accept_compressed = enabled;
        self
    }

    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.config.log_requests = enabled;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
