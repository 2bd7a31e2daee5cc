use std::collections::{BTreeMap, HashMap};

use appdeck_application::DataStoreRepository;
use appdeck_core::{AppError, AppInstanceId, AppResult};
use appdeck_domain::{DataStoreSnapshot, Record};
use async_trait::async_trait;
use tokio::sync::RwLock;

type Tables = BTreeMap<String, Vec<Record>>;

/// In-memory data store keyed by app instance, then by table name.
///
/// Records keep insertion order inside their table.
#[derive(Debug, Default)]
pub struct InMemoryDataStore {
    apps: RwLock<HashMap<AppInstanceId, Tables>>,
}

impl InMemoryDataStore {
    /// Creates an empty data store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of app instances holding at least one table.
    pub async fn app_instance_count(&self) -> usize {
        self.apps.read().await.len()
    }
}

#[async_trait]
impl DataStoreRepository for InMemoryDataStore {
    async fn get_table(
        &self,
        app_instance_id: AppInstanceId,
        table: &str,
    ) -> AppResult<Vec<Record>> {
        Ok(self
            .apps
            .read()
            .await
            .get(&app_instance_id)
            .and_then(|tables| tables.get(table))
            .cloned()
            .unwrap_or_default())
    }

    async fn set_table(
        &self,
        app_instance_id: AppInstanceId,
        table: &str,
        records: Vec<Record>,
    ) -> AppResult<()> {
        self.apps
            .write()
            .await
            .entry(app_instance_id)
            .or_default()
            .insert(table.to_owned(), records);
        Ok(())
    }

    async fn insert(
        &self,
        app_instance_id: AppInstanceId,
        table: &str,
        record: Record,
    ) -> AppResult<()> {
        let mut apps = self.apps.write().await;
        let records = apps
            .entry(app_instance_id)
            .or_default()
            .entry(table.to_owned())
            .or_default();

        if records.iter().any(|existing| existing.id() == record.id()) {
            return Err(AppError::Conflict(format!(
                "record '{}' already exists in table '{table}' for app instance '{app_instance_id}'",
                record.id()
            )));
        }

        records.push(record);
        Ok(())
    }

    async fn delete_by_id(
        &self,
        app_instance_id: AppInstanceId,
        table: &str,
        record_id: &str,
    ) -> AppResult<bool> {
        let mut apps = self.apps.write().await;
        let Some(records) = apps
            .get_mut(&app_instance_id)
            .and_then(|tables| tables.get_mut(table))
        else {
            return Ok(false);
        };

        match records.iter().position(|record| record.id() == record_id) {
            Some(position) => {
                records.remove(position);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ensure_table(&self, app_instance_id: AppInstanceId, table: &str) -> AppResult<()> {
        self.apps
            .write()
            .await
            .entry(app_instance_id)
            .or_default()
            .entry(table.to_owned())
            .or_default();
        Ok(())
    }

    async fn snapshot(&self, app_instance_id: AppInstanceId) -> AppResult<DataStoreSnapshot> {
        let tables = self
            .apps
            .read()
            .await
            .get(&app_instance_id)
            .cloned()
            .unwrap_or_default();
        Ok(DataStoreSnapshot::new(tables))
    }

    async fn restore(
        &self,
        app_instance_id: AppInstanceId,
        snapshot: DataStoreSnapshot,
    ) -> AppResult<()> {
        let tables = snapshot.into_tables();
        let mut apps = self.apps.write().await;
        if tables.is_empty() {
            apps.remove(&app_instance_id);
        } else {
            apps.insert(app_instance_id, tables);
        }
        Ok(())
    }
}
