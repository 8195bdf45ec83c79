//! # vsm-client - Rust bindings for the VSM storage-management API
//!
//! A thin async client for the performance metrics surface of a VSM
//! controller. Read calls translate an optional filter mapping into a query
//! string and hand the request to a [`transport::ResourceTransport`]; the
//! mutation calls forward a record's id to the same transport.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vsm_client::prelude::*;
//!
//! # async fn example() -> VsmResult<()> {
//! let config = VsmConfig::new("http://vsm-controller:8778/v1/admin", "my-keystone-token");
//! let client = MetricsQueryClient::connect(config)?;
//!
//! let filters = FilterOptions::new()
//!     .with("metrics_name", "osd_op_r_latency")
//!     .with("timestamp_start", 1_700_000_000)
//!     .with("host", ""); // empty values are not sent
//!
//! for sample in client.get_latency(Some(&filters)).await? {
//!     println!("{sample}: {:?}", sample.get("metrics_value"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`performance_metrics`**: [`MetricsQueryClient`](performance_metrics::MetricsQueryClient),
//!   filter mappings and metric records
//! - **`transport`**: the `ResourceTransport` trait and its reqwest-backed
//!   `HttpTransport`
//! - **`error`**: the crate-wide [`VsmError`](error::VsmError)
//! - **`logging`**: optional tracing-subscriber setup
//!
//! The client owns no error policy of its own: anything the transport returns
//! reaches the caller unchanged. Inject a custom transport with
//! [`MetricsQueryClient::new`](performance_metrics::MetricsQueryClient::new).

pub mod error;
pub mod logging;
pub mod performance_metrics;
pub mod prelude;
pub mod security;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_helpers;
