use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::{VsmError, VsmResult};
use crate::performance_metrics::filters::path_with_query;
use crate::performance_metrics::{FilterOptions, MetricRecord};
use crate::transport::{HttpTransport, ResourceId, ResourceRef, ResourceTransport, VsmConfig};

const COLLECTION: &str = "performance_metrics";
const MEMBER_KEY: &str = "performance_metric";
const ENVELOPE_KEY: &str = "performance_metrics";

const LIST_PATH: &str = "/performance_metrics/get_list";
// The service spells these two routes this way; they must be sent verbatim.
const IOPS_OR_BANDWIDTH_PATH: &str = "/performance_metrics/get_iops_or_banwidth";
const LATENCY_PATH: &str = "/performance_metrics/get_lantency";

/// Client for the `/performance_metrics` resource.
///
/// Holds nothing but a handle to the transport, so it is cheap to clone and
/// safe to share between tasks.
#[derive(Clone)]
pub struct MetricsQueryClient {
    transport: Arc<dyn ResourceTransport>,
}

impl MetricsQueryClient {
    /// Create a client on top of an existing transport.
    pub fn new(transport: Arc<dyn ResourceTransport>) -> Self {
        Self { transport }
    }

    /// Create a client backed by a fresh [`HttpTransport`].
    pub fn connect(config: VsmConfig) -> VsmResult<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// List performance metrics matching `filters`.
    pub async fn list(&self, filters: Option<&FilterOptions>) -> VsmResult<Vec<MetricRecord>> {
        self.fetch(LIST_PATH, filters).await
    }

    /// List IOPS or bandwidth samples matching `filters`.
    pub async fn get_iops_or_bandwidth(
        &self,
        filters: Option<&FilterOptions>,
    ) -> VsmResult<Vec<MetricRecord>> {
        self.fetch(IOPS_OR_BANDWIDTH_PATH, filters).await
    }

    /// List latency samples matching `filters`.
    pub async fn get_latency(
        &self,
        filters: Option<&FilterOptions>,
    ) -> VsmResult<Vec<MetricRecord>> {
        self.fetch(LATENCY_PATH, filters).await
    }

    /// Delete a metric record.
    pub async fn delete(&self, id: &ResourceId) -> VsmResult<()> {
        self.transport.delete(&Self::target(id)).await
    }

    /// Update a metric record. `fields` are sent as given; the service decides
    /// which of them it accepts.
    pub async fn update(&self, id: &ResourceId, fields: &Map<String, Value>) -> VsmResult<()> {
        self.transport.update(&Self::target(id), fields).await
    }

    /// Delete a metric record regardless of its current state.
    pub async fn force_delete(&self, id: &ResourceId) -> VsmResult<()> {
        self.transport.force_delete(&Self::target(id)).await
    }

    /// All listed metrics whose fields equal every entry of `criteria`.
    pub async fn find_all(&self, criteria: &Map<String, Value>) -> VsmResult<Vec<MetricRecord>> {
        let mut records = self.list(None).await?;
        records.retain(|record| record.matches(criteria));
        Ok(records)
    }

    /// The single listed metric matching `criteria`.
    ///
    /// # Errors
    ///
    /// [`VsmError::NotFound`] when nothing matches and
    /// [`VsmError::NoUniqueMatch`] when more than one record does.
    pub async fn find(&self, criteria: &Map<String, Value>) -> VsmResult<MetricRecord> {
        let mut matches = self.find_all(criteria).await?;
        let wanted = Value::Object(criteria.clone());
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(VsmError::NotFound {
                message: format!("No PerformanceMetrics matching {wanted}"),
            }),
            n => Err(VsmError::NoUniqueMatch {
                message: format!("{n} PerformanceMetrics match {wanted}"),
            }),
        }
    }

    #[instrument(skip(self, filters))]
    async fn fetch(
        &self,
        base_path: &'static str,
        filters: Option<&FilterOptions>,
    ) -> VsmResult<Vec<MetricRecord>> {
        let path = path_with_query(base_path, filters)?;
        debug!(%path, "Listing performance metrics");

        let resources = self.transport.list_resources(&path, ENVELOPE_KEY).await?;
        Ok(resources.into_iter().map(MetricRecord::from).collect())
    }

    fn target(id: &ResourceId) -> ResourceRef {
        ResourceRef::new(COLLECTION, MEMBER_KEY, id.clone())
    }
}
