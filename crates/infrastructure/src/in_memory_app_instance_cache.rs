use std::collections::HashMap;
use std::time::{Duration, Instant};

use appdeck_application::{AppInstanceCache, StoredAppInstance};
use appdeck_core::{AppInstanceId, AppResult};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct AppInstanceCacheEntry {
    app_instance: StoredAppInstance,
    expires_at: Instant,
}

/// In-memory TTL cache for loaded app instances.
#[derive(Debug, Default)]
pub struct InMemoryAppInstanceCache {
    entries: RwLock<HashMap<AppInstanceId, AppInstanceCacheEntry>>,
}

impl InMemoryAppInstanceCache {
    /// Creates an empty in-memory app instance cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppInstanceCache for InMemoryAppInstanceCache {
    async fn get_app_instance(
        &self,
        app_instance_id: AppInstanceId,
    ) -> AppResult<Option<StoredAppInstance>> {
        {
            let entries = self.entries.read().await;
            match entries.get(&app_instance_id) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.app_instance.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(&app_instance_id)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(&app_instance_id);
        }

        Ok(None)
    }

    async fn set_app_instance(
        &self,
        app_instance_id: AppInstanceId,
        app_instance: StoredAppInstance,
        ttl_seconds: u32,
    ) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        self.entries.write().await.insert(
            app_instance_id,
            AppInstanceCacheEntry {
                app_instance,
                expires_at,
            },
        );

        Ok(())
    }

    async fn invalidate(&self, app_instance_id: AppInstanceId) -> AppResult<()> {
        self.entries.write().await.remove(&app_instance_id);
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
