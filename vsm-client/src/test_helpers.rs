//! In-process transport double for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{VsmError, VsmResult};
use crate::transport::{Resource, ResourceRef, ResourceTransport};

/// One call as seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    List { path: String, envelope_key: String },
    Delete(ResourceRef),
    Update(ResourceRef, Map<String, Value>),
    ForceDelete(ResourceRef),
}

/// Records every call and answers lists with a canned set of resources.
#[derive(Default)]
pub struct RecordingTransport {
    resources: Vec<Resource>,
    failing_status: Option<u16>,
    calls: Mutex<Vec<TransportCall>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer list calls with these resources, decoded from JSON.
    pub fn with_resources(mut self, resources: Value) -> Self {
        self.resources = serde_json::from_value(resources).expect("invalid test resources");
        self
    }

    /// Fail every call with a server error of the given status.
    pub fn failing_with(mut self, status: u16) -> Self {
        self.failing_status = Some(status);
        self
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: TransportCall) -> VsmResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failing_status {
            Some(status) => Err(VsmError::ServerError {
                status,
                message: "injected failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceTransport for RecordingTransport {
    async fn list_resources(&self, path: &str, envelope_key: &str) -> VsmResult<Vec<Resource>> {
        self.record(TransportCall::List {
            path: path.to_string(),
            envelope_key: envelope_key.to_string(),
        })?;
        Ok(self.resources.clone())
    }

    async fn delete(&self, target: &ResourceRef) -> VsmResult<()> {
        self.record(TransportCall::Delete(target.clone()))
    }

    async fn update(&self, target: &ResourceRef, fields: &Map<String, Value>) -> VsmResult<()> {
        self.record(TransportCall::Update(target.clone(), fields.clone()))
    }

    async fn force_delete(&self, target: &ResourceRef) -> VsmResult<()> {
        self.record(TransportCall::ForceDelete(target.clone()))
    }
}
