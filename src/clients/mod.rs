//! # Remote Service Clients
//!
//! The two network dependencies of a session, each behind an async trait so
//! the orchestrator can be tested with [`crate::mock`] doubles:
//!
//! - [`Describer`]: photo in, caption out ([`ReplicateDescriber`])
//! - [`Composer`]: caption in, poem out ([`OpenAiComposer`])
//!
//! Clients make exactly one request per call. Timeouts are applied by the
//! HTTP client; retrying is the orchestrator's decision, not theirs.

pub mod composition;
pub mod description;
pub mod error;

pub use composition::*;
pub use description::*;
pub use error::*;

use crate::model::{Caption, PhotoRef, Poem};
use async_trait::async_trait;
use std::time::Duration;

/// Turns a photo into a short natural-language caption.
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe(&self, photo: &PhotoRef) -> Result<Caption, RemoteError>;
}

/// Turns a caption into a poem.
#[async_trait]
pub trait Composer: Send + Sync {
    async fn compose(&self, caption: &Caption) -> Result<Poem, RemoteError>;
}

/// Builds the shared HTTP client used by both services.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, RemoteError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RemoteError::Unreachable(format!("HTTP client setup failed: {}", e)))
}

/// Joins a service base URL and an API path under `/v1`.
///
/// Base URLs are accepted with or without the trailing `/v1`.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    format!("{}/v1/{}", base, path.trim_start_matches('/'))
}

/// Reads an error response into a `Service` error.
pub(crate) async fn service_error(service: &str, response: reqwest::Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    RemoteError::Service(format!("{} returned {}: {}", service, status, body.trim()))
}
