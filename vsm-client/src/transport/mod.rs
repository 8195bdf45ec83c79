//! Transport layer shared by the resource clients.
//!
//! Resource clients never talk HTTP themselves: they build paths and hand them
//! to a [`ResourceTransport`]. [`HttpTransport`] is the reqwest-backed
//! implementation; tests inject their own.

mod config;
mod http;
mod resource;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::VsmResult;

pub use config::VsmConfig;
pub use http::HttpTransport;
pub use resource::{Resource, ResourceId, ResourceRef};

/// Generic resource operations a client delegates to.
///
/// Implementations own request execution, response decoding and error
/// classification. Errors are passed through by callers unchanged.
#[async_trait]
pub trait ResourceTransport: Send + Sync {
    /// Fetch `path` (relative to the endpoint, query included) and decode the
    /// array stored under `envelope_key` in the response body.
    async fn list_resources(&self, path: &str, envelope_key: &str) -> VsmResult<Vec<Resource>>;

    /// Delete a single resource.
    async fn delete(&self, target: &ResourceRef) -> VsmResult<()>;

    /// Send `fields` as the new values of a single resource.
    async fn update(&self, target: &ResourceRef, fields: &Map<String, Value>) -> VsmResult<()>;

    /// Delete a single resource regardless of its current state.
    async fn force_delete(&self, target: &ResourceRef) -> VsmResult<()>;
}
