//! Prelude for commonly used types in vsm-client.

pub use crate::error::{VsmError, VsmResult};
pub use crate::performance_metrics::{FilterOptions, FilterValue, MetricRecord, MetricsQueryClient};
pub use crate::transport::{HttpTransport, ResourceId, ResourceTransport, VsmConfig};
