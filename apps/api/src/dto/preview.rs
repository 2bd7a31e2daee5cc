use std::collections::BTreeMap;

use appdeck_application::PreviewView;
use appdeck_core::AppError;
use appdeck_domain::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Incoming form field value.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/set-form-value-request.ts"
)]
pub struct SetFormValueRequest {
    #[ts(type = "unknown")]
    pub value: Value,
}

/// Incoming component press; `itemId` selects the list record in scope.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/press-component-request.ts"
)]
pub struct PressComponentRequest {
    #[serde(default)]
    pub item_id: Option<String>,
}

/// One rendered preview frame.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/preview-response.ts"
)]
pub struct PreviewResponse {
    #[ts(type = "Record<string, unknown>")]
    pub screen: Value,
    pub current_screen_id: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub session_user: Option<Value>,
    #[ts(type = "Record<string, unknown>")]
    pub form: BTreeMap<String, Value>,
    #[ts(type = "Record<string, unknown> | null")]
    pub popup: Option<Value>,
}

impl TryFrom<PreviewView> for PreviewResponse {
    type Error = AppError;

    fn try_from(view: PreviewView) -> Result<Self, Self::Error> {
        let serialize = |value: serde_json::Result<Value>| {
            value.map_err(|error| {
                AppError::Internal(format!("failed to serialize preview frame: {error}"))
            })
        };

        Ok(Self {
            screen: serialize(serde_json::to_value(&view.screen))?,
            current_screen_id: view.navigation.screen_id().map(ToOwned::to_owned),
            session_user: view.session_user,
            form: view.form,
            popup: view
                .popup
                .as_ref()
                .map(|popup| serialize(serde_json::to_value(popup)))
                .transpose()?,
        })
    }
}

/// Records of one data store table.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/table-response.ts"
)]
pub struct TableResponse {
    pub table: String,
    #[ts(type = "Array<Record<string, unknown>>")]
    pub records: Vec<Value>,
}

impl TableResponse {
    pub fn new(table: String, records: &[Record]) -> Self {
        Self {
            table,
            records: records.iter().map(Record::to_value).collect(),
        }
    }
}
