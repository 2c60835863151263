//! # sf-auth
//!
//! Salesforce authentication: credential sources and a self-renewing
//! authenticated connection.
//!
//! ## Security
//!
//! - Sensitive data (tokens, secrets, passwords, private keys) are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - Error messages sanitize any credential data
//!
//! ## Supported Authentication Methods
//!
//! - **OAuth 2.0 Username-Password Flow** - For trusted integrations
//! - **OAuth 2.0 Refresh Token Flow** - For renewing from a stored refresh token
//! - **OAuth 2.0 JWT Bearer Flow** - For server-to-server integration
//! - **Fixed credentials** - An access token obtained elsewhere
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_auth::{AuthenticatedConnection, JwtAuth, PasswordFlow};
//! use busbar_sf_client::{Connection, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Username-password flow configured from SF_* environment variables
//!     let connection = AuthenticatedConnection::new(PasswordFlow::from_env()?)?;
//!
//!     // JWT Bearer Flow (server-to-server)
//!     let jwt = JwtAuth::from_key_file("consumer_key", "user@example.com", "server.key")?;
//!     let jwt_connection = AuthenticatedConnection::new(jwt)?;
//!
//!     let limits = connection
//!         .request(RequestOptions::get("/services/data/v62.0/limits"))
//!         .await?;
//!     println!("{limits}");
//!
//!     Ok(())
//! }
//! ```

mod connection;
mod credentials;
mod error;
mod jwt;
mod oauth;

pub use connection::{is_retryable, resolve_url, AuthenticatedConnection, ConnectionConfig};
pub use credentials::{Authenticator, SalesforceCredentials};
pub use error::{Error, ErrorKind, Result};
pub use jwt::JwtAuth;
pub use oauth::{OAuthClient, OAuthConfig, PasswordFlow, RefreshTokenFlow, TokenResponse};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
