use appdeck_core::{AppInstanceId, AppResult};
use async_trait::async_trait;

use super::persistence::StoredAppInstance;

/// Process-lifetime cache for loaded app instances.
#[async_trait]
pub trait AppInstanceCache: Send + Sync {
    /// Returns a cached app instance when present and fresh.
    async fn get_app_instance(
        &self,
        app_instance_id: AppInstanceId,
    ) -> AppResult<Option<StoredAppInstance>>;

    /// Stores one app instance with ttl.
    async fn set_app_instance(
        &self,
        app_instance_id: AppInstanceId,
        app_instance: StoredAppInstance,
        ttl_seconds: u32,
    ) -> AppResult<()>;

    /// Drops one cached app instance.
    async fn invalidate(&self, app_instance_id: AppInstanceId) -> AppResult<()>;

    /// Drops every cached app instance.
    async fn clear(&self) -> AppResult<()>;
}
