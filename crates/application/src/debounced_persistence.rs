use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use appdeck_core::AppInstanceId;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::runtime_ports::{AppInstanceRepository, SaveAppInstanceInput};

#[derive(Debug)]
struct PendingSave {
    input: SaveAppInstanceInput,
    due_at: Instant,
}

/// Coalescing save queue in front of the persistence collaborator.
///
/// Each schedule call for an app instance merges into the pending entry and
/// restarts its debounce window. Failed saves are logged and requeued so the
/// in-memory state stays authoritative until a save succeeds. Saves of one app
/// instance run one at a time in the order their entries left the queue.
pub struct DebouncedPersistence {
    repository: Arc<dyn AppInstanceRepository>,
    debounce: Duration,
    pending: Mutex<HashMap<AppInstanceId, PendingSave>>,
    save_guards: Mutex<HashMap<AppInstanceId, Arc<Mutex<()>>>>,
}

impl DebouncedPersistence {
    /// Creates a queue with the given debounce window.
    #[must_use]
    pub fn new(repository: Arc<dyn AppInstanceRepository>, debounce: Duration) -> Self {
        Self {
            repository,
            debounce,
            pending: Mutex::new(HashMap::new()),
            save_guards: Mutex::new(HashMap::new()),
        }
    }

    /// Queues a save for one app instance.
    pub async fn schedule(&self, app_instance_id: AppInstanceId, input: SaveAppInstanceInput) {
        if input.is_empty() {
            return;
        }

        let due_at = Instant::now() + self.debounce;
        let mut pending = self.pending.lock().await;
        match pending.get_mut(&app_instance_id) {
            Some(entry) => {
                entry.input.merge(input);
                entry.due_at = due_at;
            }
            None => {
                pending.insert(app_instance_id, PendingSave { input, due_at });
            }
        }
    }

    /// Returns the number of app instances with a pending save.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Returns the unsaved parts of one app instance.
    ///
    /// Waits for an in-flight save of that instance, so a failed save is
    /// already back in the queue when this returns.
    pub async fn pending_input(&self, app_instance_id: AppInstanceId) -> Option<SaveAppInstanceInput> {
        let guard = self.save_guard(app_instance_id).await;
        let _in_flight = guard.lock().await;
        self.pending
            .lock()
            .await
            .get(&app_instance_id)
            .map(|entry| entry.input.clone())
    }

    /// Saves every entry whose debounce window elapsed; returns saved count.
    pub async fn flush_due(&self) -> usize {
        let now = Instant::now();
        let due_ids: Vec<AppInstanceId> = self
            .pending
            .lock()
            .await
            .iter()
            .filter(|(_, entry)| entry.due_at <= now)
            .map(|(app_instance_id, _)| *app_instance_id)
            .collect();

        let mut saved = 0;
        for app_instance_id in due_ids {
            if self.flush_entry(app_instance_id, Some(now)).await {
                saved += 1;
            }
        }
        saved
    }

    /// Saves the pending entry of one app instance now; returns whether it saved.
    pub async fn flush_app_instance(&self, app_instance_id: AppInstanceId) -> bool {
        self.flush_entry(app_instance_id, None).await
    }

    /// Saves every pending entry regardless of its window; returns saved count.
    pub async fn flush_all(&self) -> usize {
        let ids: Vec<AppInstanceId> = self.pending.lock().await.keys().copied().collect();

        let mut saved = 0;
        for app_instance_id in ids {
            if self.flush_entry(app_instance_id, None).await {
                saved += 1;
            }
        }
        saved
    }

    async fn save_guard(&self, app_instance_id: AppInstanceId) -> Arc<Mutex<()>> {
        self.save_guards
            .lock()
            .await
            .entry(app_instance_id)
            .or_default()
            .clone()
    }

    /// Takes the entry under the instance guard, so a later entry never
    /// overtakes an earlier one still being saved.
    async fn flush_entry(&self, app_instance_id: AppInstanceId, due_by: Option<Instant>) -> bool {
        let guard = self.save_guard(app_instance_id).await;
        let _in_flight = guard.lock().await;

        let input = {
            let mut pending = self.pending.lock().await;
            let due = pending
                .get(&app_instance_id)
                .is_some_and(|entry| due_by.is_none_or(|now| entry.due_at <= now));
            if !due {
                return false;
            }
            pending.remove(&app_instance_id).map(|entry| entry.input)
        };
        let Some(input) = input else {
            return false;
        };

        match self
            .repository
            .save_app_instance(app_instance_id, input.clone())
            .await
        {
            Ok(()) => {
                debug!(%app_instance_id, "saved app instance");
                true
            }
            Err(error) => {
                warn!(%app_instance_id, error = %error, "failed to save app instance");
                self.requeue(app_instance_id, input).await;
                false
            }
        }
    }

    async fn requeue(&self, app_instance_id: AppInstanceId, mut input: SaveAppInstanceInput) {
        let mut pending = self.pending.lock().await;
        let due_at = Instant::now() + self.debounce;
        if let Some(newer) = pending.remove(&app_instance_id) {
            input.merge(newer.input);
        }
        pending.insert(app_instance_id, PendingSave { input, due_at });
    }
}
