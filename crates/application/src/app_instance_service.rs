use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use appdeck_core::{AppError, AppInstanceId, AppResult};
use appdeck_domain::DataStoreSnapshot;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::action_dispatcher::ActionDispatcher;
use crate::debounced_persistence::DebouncedPersistence;
use crate::preview_runtime::PreviewRuntime;
use crate::runtime_ports::{
    AppInstanceCache, AppInstanceRepository, SaveAppInstanceInput, StoredAppInstance,
};

#[cfg(test)]
mod tests;

/// Preview runtime shared between requests; the mutex is the single writer.
pub type SharedPreviewRuntime = Arc<Mutex<PreviewRuntime>>;

/// Application service managing app instances and their open runtimes.
#[derive(Clone)]
pub struct AppInstanceService {
    repository: Arc<dyn AppInstanceRepository>,
    dispatcher: ActionDispatcher,
    persistence: Arc<DebouncedPersistence>,
    cache: Option<Arc<dyn AppInstanceCache>>,
    cache_ttl_seconds: u32,
    runtimes: Arc<RwLock<HashMap<AppInstanceId, SharedPreviewRuntime>>>,
}

impl AppInstanceService {
    /// Creates an app instance service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AppInstanceRepository>,
        dispatcher: ActionDispatcher,
        save_debounce: Duration,
    ) -> Self {
        Self {
            persistence: Arc::new(DebouncedPersistence::new(
                repository.clone(),
                save_debounce,
            )),
            repository,
            dispatcher,
            cache: None,
            cache_ttl_seconds: 0,
            runtimes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Adds optional app instance caching.
    #[must_use]
    pub fn with_app_instance_cache(
        mut self,
        cache: Arc<dyn AppInstanceCache>,
        ttl_seconds: u32,
    ) -> Self {
        if ttl_seconds > 0 {
            self.cache = Some(cache);
            self.cache_ttl_seconds = ttl_seconds;
        }
        self
    }

    /// Creates and persists a new app instance with an empty data store.
    pub async fn create_app_instance(&self, document_text: String) -> AppResult<AppInstanceId> {
        let app_instance_id = AppInstanceId::new();
        self.repository
            .save_app_instance(
                app_instance_id,
                SaveAppInstanceInput {
                    document_text: Some(document_text),
                    data_store: Some(DataStoreSnapshot::default()),
                },
            )
            .await?;

        info!(%app_instance_id, "created app instance");
        Ok(app_instance_id)
    }

    /// Returns the open runtime of an app instance, loading it when needed.
    pub async fn open_runtime(
        &self,
        app_instance_id: AppInstanceId,
    ) -> AppResult<SharedPreviewRuntime> {
        if let Some(runtime) = self.runtimes.read().await.get(&app_instance_id) {
            return Ok(runtime.clone());
        }

        let mut runtimes = self.runtimes.write().await;
        if let Some(runtime) = runtimes.get(&app_instance_id) {
            return Ok(runtime.clone());
        }

        // Unsaved parts of a previous runtime win over the stored copy.
        let unsaved = self.persistence.pending_input(app_instance_id).await;
        let mut stored = self.load_app_instance(app_instance_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("app instance '{app_instance_id}' does not exist"))
        })?;
        if let Some(unsaved) = unsaved {
            debug!(%app_instance_id, "reopening with unsaved state");
            stored.apply(unsaved);
        }
        self.dispatcher
            .data_store()
            .restore(app_instance_id, stored.data_store)
            .await?;

        let runtime = PreviewRuntime::load(
            app_instance_id,
            self.dispatcher.clone(),
            stored.document_text,
        )
        .await?;
        let runtime = Arc::new(Mutex::new(runtime));
        runtimes.insert(app_instance_id, runtime.clone());

        info!(%app_instance_id, "opened preview runtime");
        Ok(runtime)
    }

    /// Closes an open runtime, saving its state and discarding its session.
    pub async fn close_runtime(&self, app_instance_id: AppInstanceId) -> AppResult<bool> {
        let Some(runtime) = self.runtimes.write().await.remove(&app_instance_id) else {
            return Ok(false);
        };

        let runtime = runtime.lock().await;
        self.schedule_save(&runtime).await?;
        if !self.persistence.flush_app_instance(app_instance_id).await {
            warn!(%app_instance_id, "closed runtime with an unsaved state");
        }

        info!(%app_instance_id, "closed preview runtime");
        Ok(true)
    }

    /// Queues a debounced save of a runtime's document and data store.
    pub async fn schedule_save(&self, runtime: &PreviewRuntime) -> AppResult<()> {
        let app_instance_id = runtime.app_instance_id();
        let data_store = runtime.snapshot().await?;
        self.persistence
            .schedule(
                app_instance_id,
                SaveAppInstanceInput {
                    document_text: Some(runtime.document_text().to_owned()),
                    data_store: Some(data_store),
                },
            )
            .await;

        if let Some(cache) = &self.cache
            && let Err(error) = cache.invalidate(app_instance_id).await
        {
            warn!(%app_instance_id, error = %error, "failed to invalidate app instance cache");
        }

        Ok(())
    }

    /// Sends the api submits queued on a runtime and applies their outcomes.
    ///
    /// The runtime lock is released while a request is in flight, so other
    /// commands proceed and may supersede it. Branches that queue further
    /// submits are drained too. Every submit is completed; the first branch
    /// error is returned afterwards.
    pub async fn run_api_submits(&self, runtime: &SharedPreviewRuntime) -> AppResult<()> {
        let mut first_error = None;
        loop {
            let submits = runtime.lock().await.take_api_submits();
            if submits.is_empty() {
                break;
            }

            for submit in submits {
                let succeeded = self.dispatcher.send_api_submit(&submit).await;

                let mut runtime = runtime.lock().await;
                let completed = runtime.complete_api_submit(submit, succeeded).await;
                let settled = runtime.settle().await;
                self.schedule_save(&runtime).await?;
                if let Err(error) = completed.and(settled) {
                    first_error.get_or_insert(error);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Saves pending entries whose debounce window elapsed.
    pub async fn flush_due_saves(&self) -> usize {
        self.persistence.flush_due().await
    }

    /// Saves every pending entry.
    pub async fn flush_all_saves(&self) -> usize {
        self.persistence.flush_all().await
    }

    async fn load_app_instance(
        &self,
        app_instance_id: AppInstanceId,
    ) -> AppResult<Option<StoredAppInstance>> {
        if let Some(cache) = &self.cache {
            match cache.get_app_instance(app_instance_id).await {
                Ok(Some(stored)) => return Ok(Some(stored)),
                Ok(None) => {}
                Err(error) => {
                    warn!(%app_instance_id, error = %error, "app instance cache read failed");
                }
            }
        }

        let stored = self.repository.load_app_instance(app_instance_id).await?;
        if let (Some(cache), Some(stored)) = (&self.cache, &stored)
            && let Err(error) = cache
                .set_app_instance(app_instance_id, stored.clone(), self.cache_ttl_seconds)
                .await
        {
            warn!(%app_instance_id, error = %error, "app instance cache write failed");
        }

        Ok(stored)
    }
}
