use std::collections::BTreeMap;

use appdeck_core::AppResult;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Outbound request built by a `submit` action targeting an api.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSubmitRequest {
    /// Endpoint after binding interpolation.
    pub endpoint: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// Headers after binding interpolation.
    pub headers: BTreeMap<String, String>,
    /// Parameter values collected from the form.
    pub fields: Map<String, Value>,
}

/// Port for the action-to-network boundary.
///
/// `Ok` selects the `onSuccess` branch, any error selects `onError`.
#[async_trait]
pub trait ApiSubmitGateway: Send + Sync {
    /// Sends one submission.
    async fn submit(&self, request: ApiSubmitRequest) -> AppResult<()>;
}
