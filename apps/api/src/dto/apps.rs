use appdeck_application::PreviewRuntime;
use appdeck_domain::DocumentParseError;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for app instance creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-app-instance-request.ts"
)]
pub struct CreateAppInstanceRequest {
    pub document: String,
}

/// Incoming payload replacing the editor text.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-document-request.ts"
)]
pub struct UpdateDocumentRequest {
    pub document: String,
}

/// Incoming payload inserting snippet components.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/insert-snippet-request.ts"
)]
pub struct InsertSnippetRequest {
    #[serde(default)]
    pub target_screen_id: Option<String>,
    pub snippet: String,
}

/// Position and message of a rejected document.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/document-parse-error-response.ts"
)]
pub struct DocumentParseErrorResponse {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<&DocumentParseError> for DocumentParseErrorResponse {
    fn from(value: &DocumentParseError) -> Self {
        Self {
            message: value.message().to_owned(),
            line: value.line(),
            column: value.column(),
        }
    }
}

/// Editor view of one app instance.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/app-document-response.ts"
)]
pub struct AppDocumentResponse {
    pub app_instance_id: String,
    pub document: String,
    pub parse_error: Option<DocumentParseErrorResponse>,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl From<&PreviewRuntime> for AppDocumentResponse {
    fn from(runtime: &PreviewRuntime) -> Self {
        Self {
            app_instance_id: runtime.app_instance_id().to_string(),
            document: runtime.document_text().to_owned(),
            parse_error: runtime.parse_error().map(DocumentParseErrorResponse::from),
            can_undo: runtime.can_undo(),
            can_redo: runtime.can_redo(),
        }
    }
}
