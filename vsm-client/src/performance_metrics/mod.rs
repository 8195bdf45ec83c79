//! Performance metrics: the `/performance_metrics` listing endpoints and the
//! pass-through mutations on individual samples.

mod client;
mod filters;
mod types;

pub use client::MetricsQueryClient;
pub use filters::{FilterOptions, FilterValue};
pub use types::MetricRecord;
