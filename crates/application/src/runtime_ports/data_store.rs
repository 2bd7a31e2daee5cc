use appdeck_core::{AppInstanceId, AppResult};
use appdeck_domain::{DataStoreSnapshot, Record};
use async_trait::async_trait;

/// Per-app-instance table-of-records store.
///
/// Every mutation is scoped to one table of one app instance and never touches
/// any other table or app instance.
#[async_trait]
pub trait DataStoreRepository: Send + Sync {
    /// Returns the records of one table, or an empty list when it is missing.
    async fn get_table(&self, app_instance_id: AppInstanceId, table: &str)
    -> AppResult<Vec<Record>>;

    /// Replaces the records of one table.
    async fn set_table(
        &self,
        app_instance_id: AppInstanceId,
        table: &str,
        records: Vec<Record>,
    ) -> AppResult<()>;

    /// Appends one record, creating the table and app scope when absent.
    async fn insert(
        &self,
        app_instance_id: AppInstanceId,
        table: &str,
        record: Record,
    ) -> AppResult<()>;

    /// Removes at most one record by id and reports whether one was removed.
    async fn delete_by_id(
        &self,
        app_instance_id: AppInstanceId,
        table: &str,
        record_id: &str,
    ) -> AppResult<bool>;

    /// Creates an empty table when it does not exist yet.
    async fn ensure_table(&self, app_instance_id: AppInstanceId, table: &str) -> AppResult<()>;

    /// Returns a copy of every table of one app instance.
    async fn snapshot(&self, app_instance_id: AppInstanceId) -> AppResult<DataStoreSnapshot>;

    /// Replaces every table of one app instance.
    async fn restore(
        &self,
        app_instance_id: AppInstanceId,
        snapshot: DataStoreSnapshot,
    ) -> AppResult<()>;
}
