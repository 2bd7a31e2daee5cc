use appdeck_core::{AppInstanceId, AppResult};
use appdeck_domain::DataStoreSnapshot;
use async_trait::async_trait;

/// Persisted state of one app instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAppInstance {
    /// Raw document text as last saved.
    pub document_text: String,
    /// Data store tables as last saved.
    pub data_store: DataStoreSnapshot,
}

impl StoredAppInstance {
    /// Overwrites the parts a save input carries.
    pub fn apply(&mut self, input: SaveAppInstanceInput) {
        if let Some(document_text) = input.document_text {
            self.document_text = document_text;
        }
        if let Some(data_store) = input.data_store {
            self.data_store = data_store;
        }
    }
}

/// Partial save payload; absent parts keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveAppInstanceInput {
    /// Replacement document text.
    pub document_text: Option<String>,
    /// Replacement data store snapshot.
    pub data_store: Option<DataStoreSnapshot>,
}

impl SaveAppInstanceInput {
    /// Folds a newer input over this one; newer parts win.
    pub fn merge(&mut self, newer: SaveAppInstanceInput) {
        if newer.document_text.is_some() {
            self.document_text = newer.document_text;
        }
        if newer.data_store.is_some() {
            self.data_store = newer.data_store;
        }
    }

    /// Returns whether the input carries nothing to save.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.document_text.is_none() && self.data_store.is_none()
    }
}

/// Persistence collaborator for app instance documents and data.
#[async_trait]
pub trait AppInstanceRepository: Send + Sync {
    /// Loads one app instance.
    async fn load_app_instance(
        &self,
        app_instance_id: AppInstanceId,
    ) -> AppResult<Option<StoredAppInstance>>;

    /// Saves the provided parts of one app instance, creating it when absent.
    async fn save_app_instance(
        &self,
        app_instance_id: AppInstanceId,
        input: SaveAppInstanceInput,
    ) -> AppResult<()>;
}
