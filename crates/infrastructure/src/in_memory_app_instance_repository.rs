use std::collections::HashMap;

use appdeck_application::{AppInstanceRepository, SaveAppInstanceInput, StoredAppInstance};
use appdeck_core::{AppError, AppInstanceId, AppResult};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory persistence collaborator for app instance documents and data.
#[derive(Debug, Default)]
pub struct InMemoryAppInstanceRepository {
    instances: RwLock<HashMap<AppInstanceId, StoredAppInstance>>,
}

impl InMemoryAppInstanceRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppInstanceRepository for InMemoryAppInstanceRepository {
    async fn load_app_instance(
        &self,
        app_instance_id: AppInstanceId,
    ) -> AppResult<Option<StoredAppInstance>> {
        Ok(self.instances.read().await.get(&app_instance_id).cloned())
    }

    async fn save_app_instance(
        &self,
        app_instance_id: AppInstanceId,
        input: SaveAppInstanceInput,
    ) -> AppResult<()> {
        let mut instances = self.instances.write().await;

        match instances.get_mut(&app_instance_id) {
            Some(stored) => stored.apply(input),
            None => {
                let document_text = input.document_text.ok_or_else(|| {
                    AppError::Validation(format!(
                        "app instance '{app_instance_id}' must be created with a document"
                    ))
                })?;
                instances.insert(
                    app_instance_id,
                    StoredAppInstance {
                        document_text,
                        data_store: input.data_store.unwrap_or_default(),
                    },
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use appdeck_application::{AppInstanceRepository, SaveAppInstanceInput};
    use appdeck_core::{AppError, AppInstanceId};
    use appdeck_domain::{DataStoreSnapshot, Record};
    use serde_json::json;

    use super::InMemoryAppInstanceRepository;

    fn snapshot_with_task() -> DataStoreSnapshot {
        let record = Record::from_value(json!({"id": "a", "title": "x"}))
            .unwrap_or_else(|_| unreachable!());
        DataStoreSnapshot::new([("tasks".to_owned(), vec![record])].into_iter().collect())
    }

    #[tokio::test]
    async fn creating_requires_document_text() {
        let repository = InMemoryAppInstanceRepository::new();
        let result = repository
            .save_app_instance(
                AppInstanceId::new(),
                SaveAppInstanceInput {
                    document_text: None,
                    data_store: Some(snapshot_with_task()),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn partial_saves_keep_other_parts() {
        let repository = InMemoryAppInstanceRepository::new();
        let app_instance_id = AppInstanceId::new();

        let created = repository
            .save_app_instance(
                app_instance_id,
                SaveAppInstanceInput {
                    document_text: Some("{}".to_owned()),
                    data_store: None,
                },
            )
            .await;
        assert!(created.is_ok());

        let saved = repository
            .save_app_instance(
                app_instance_id,
                SaveAppInstanceInput {
                    document_text: None,
                    data_store: Some(snapshot_with_task()),
                },
            )
            .await;
        assert!(saved.is_ok());

        let stored = repository
            .load_app_instance(app_instance_id)
            .await
            .unwrap_or_default()
            .unwrap_or_else(|| unreachable!());
        assert_eq!(stored.document_text, "{}");
        assert_eq!(stored.data_store, snapshot_with_task());
        assert!(
            repository
                .load_app_instance(AppInstanceId::new())
                .await
                .unwrap_or_default()
                .is_none()
        );
    }
}
