//! The request seam shared by transports, authentication and the mapper.

use std::future::Future;

use crate::error::Result;
use crate::request::RequestOptions;

/// Sends a request and returns the parsed JSON body.
///
/// Implemented by the raw [`SfHttpClient`](crate::SfHttpClient) and by
/// decorators that add credentials or retries around another connection.
/// Empty response bodies come back as `Value::Null`.
pub trait Connection: Send + Sync {
    fn request(
        &self,
        options: RequestOptions,
    ) -> impl Future<Output = Result<serde_json::Value>> + Send;
}

impl<C: Connection> Connection for std::sync::Arc<C> {
    fn request(
        &self,
        options: RequestOptions,
    ) -> impl Future<Output = Result<serde_json::Value>> + Send {
        (**self).request(options)
    }
}

impl<C: Connection> Connection for &C {
    fn request(
        &self,
        options: RequestOptions,
    ) -> impl Future<Output = Result<serde_json::Value>> + Send {
        (**self).request(options)
    }
}
