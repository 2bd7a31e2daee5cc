mod apps;
mod preview;

use serde::Serialize;
use ts_rs::TS;

pub use apps::{
    AppDocumentResponse, CreateAppInstanceRequest, InsertSnippetRequest, UpdateDocumentRequest,
};
pub use preview::{
    PressComponentRequest, PreviewResponse, SetFormValueRequest, TableResponse,
};

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}
