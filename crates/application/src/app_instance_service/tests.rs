use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use appdeck_core::{AppError, AppInstanceId, AppResult};
use appdeck_domain::{Action, Record};
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{Mutex, Notify};

use crate::action_dispatcher::ActionDispatcher;
use crate::navigation::NavigationState;
use crate::runtime_ports::{
    ApiSubmitGateway, ApiSubmitRequest, AppInstanceCache, DataStoreRepository,
    SequentialRecordIdGenerator, StoredAppInstance,
};
use crate::test_support::{FakeAppInstanceRepository, Harness};

use super::AppInstanceService;

#[derive(Default)]
struct FakeAppInstanceCache {
    entries: Mutex<HashMap<AppInstanceId, StoredAppInstance>>,
    invalidations: Mutex<Vec<AppInstanceId>>,
}

#[async_trait]
impl AppInstanceCache for FakeAppInstanceCache {
    async fn get_app_instance(
        &self,
        app_instance_id: AppInstanceId,
    ) -> AppResult<Option<StoredAppInstance>> {
        Ok(self.entries.lock().await.get(&app_instance_id).cloned())
    }

    async fn set_app_instance(
        &self,
        app_instance_id: AppInstanceId,
        app_instance: StoredAppInstance,
        _ttl_seconds: u32,
    ) -> AppResult<()> {
        self.entries
            .lock()
            .await
            .insert(app_instance_id, app_instance);
        Ok(())
    }

    async fn invalidate(&self, app_instance_id: AppInstanceId) -> AppResult<()> {
        self.entries.lock().await.remove(&app_instance_id);
        self.invalidations.lock().await.push(app_instance_id);
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

fn document_text() -> String {
    json!({
        "app": {"databaseSchema": {"tasks": [{"name": "title"}]}},
        "screens": {"home": {"components": []}},
        "initialScreen": "home"
    })
    .to_string()
}

fn service(harness: &Harness, repository: Arc<FakeAppInstanceRepository>) -> AppInstanceService {
    AppInstanceService::new(repository, harness.dispatcher.clone(), Duration::ZERO)
}

#[tokio::test]
async fn open_runtime_requires_existing_instance() {
    let harness = Harness::new(true);
    let service = service(&harness, Arc::new(FakeAppInstanceRepository::default()));

    let result = service.open_runtime(AppInstanceId::new()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn runtimes_are_shared_per_instance() {
    let harness = Harness::new(true);
    let service = service(&harness, Arc::new(FakeAppInstanceRepository::default()));
    let app_instance_id = service
        .create_app_instance(document_text())
        .await
        .unwrap_or_else(|_| unreachable!());

    let first = service
        .open_runtime(app_instance_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    let second = service
        .open_runtime(app_instance_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn close_saves_state_and_reopen_restores_data_without_session() {
    let harness = Harness::new(true);
    let repository = Arc::new(FakeAppInstanceRepository::default());
    let service = service(&harness, repository.clone());
    let app_instance_id = service
        .create_app_instance(document_text())
        .await
        .unwrap_or_else(|_| unreachable!());

    {
        let runtime = service
            .open_runtime(app_instance_id)
            .await
            .unwrap_or_else(|_| unreachable!());
        let mut runtime = runtime.lock().await;
        runtime.set_form_value("draft", json!("Buy milk"));
        let inserted = harness
            .data_store
            .insert(
                app_instance_id,
                "tasks",
                Record::from_value(json!({"id": "t1", "title": "Buy milk"}))
                    .unwrap_or_else(|_| unreachable!()),
            )
            .await;
        assert!(inserted.is_ok());
    }

    assert!(service.close_runtime(app_instance_id).await.unwrap_or_default());
    assert!(!service.close_runtime(app_instance_id).await.unwrap_or(true));

    let stored = repository
        .instances
        .lock()
        .await
        .get(&app_instance_id)
        .cloned();
    assert_eq!(
        stored.map(|stored| stored.data_store.table("tasks").len()),
        Some(1)
    );

    let restored = harness.data_store.restore(app_instance_id, Default::default()).await;
    assert!(restored.is_ok());

    let runtime = service
        .open_runtime(app_instance_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    let runtime = runtime.lock().await;
    assert_eq!(runtime.table("tasks").await.unwrap_or_default().len(), 1);
    assert!(runtime.state().session().is_none());
    assert!(runtime.state().form().is_empty());
}

#[tokio::test]
async fn cached_instances_are_invalidated_on_save() {
    let harness = Harness::new(true);
    let cache = Arc::new(FakeAppInstanceCache::default());
    let service = service(&harness, Arc::new(FakeAppInstanceRepository::default()))
        .with_app_instance_cache(cache.clone(), 30);
    let app_instance_id = service
        .create_app_instance(document_text())
        .await
        .unwrap_or_else(|_| unreachable!());

    let runtime = service
        .open_runtime(app_instance_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(cache.entries.lock().await.contains_key(&app_instance_id));

    let runtime = runtime.lock().await;
    assert!(service.schedule_save(&runtime).await.is_ok());
    assert!(!cache.entries.lock().await.contains_key(&app_instance_id));
    assert_eq!(*cache.invalidations.lock().await, vec![app_instance_id]);
    assert_eq!(service.flush_due_saves().await, 1);
    assert_eq!(service.flush_all_saves().await, 0);
}

#[tokio::test]
async fn reopening_after_failed_close_keeps_unsaved_records() {
    let harness = Harness::new(true);
    let repository = Arc::new(FakeAppInstanceRepository::default());
    let service = service(&harness, repository.clone());
    let app_instance_id = service
        .create_app_instance(document_text())
        .await
        .unwrap_or_else(|_| unreachable!());
    let add_task = Action::from(json!({
        "type": "submit", "target": "database", "table": "tasks", "fields": {"title": "draft"}
    }));

    {
        let runtime = service
            .open_runtime(app_instance_id)
            .await
            .unwrap_or_else(|_| unreachable!());
        let mut runtime = runtime.lock().await;
        runtime.set_form_value("draft", json!("Buy milk"));
        assert!(runtime.dispatch(&add_task).await.is_ok());
        assert_eq!(runtime.table("tasks").await.unwrap_or_default().len(), 1);
    }

    repository.failing.store(true, Ordering::SeqCst);
    assert!(service.close_runtime(app_instance_id).await.unwrap_or_default());

    let runtime = service
        .open_runtime(app_instance_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    {
        let runtime = runtime.lock().await;
        assert_eq!(runtime.table("tasks").await.unwrap_or_default().len(), 1);
        assert!(service.schedule_save(&runtime).await.is_ok());
    }

    repository.failing.store(false, Ordering::SeqCst);
    assert_eq!(service.flush_all_saves().await, 1);
    let stored = repository
        .instances
        .lock()
        .await
        .get(&app_instance_id)
        .cloned();
    assert_eq!(
        stored.map(|stored| stored.data_store.table("tasks").len()),
        Some(1)
    );
}

/// Holds every submission until released.
#[derive(Default)]
struct GatedApiGateway {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl ApiSubmitGateway for GatedApiGateway {
    async fn submit(&self, _request: ApiSubmitRequest) -> AppResult<()> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

fn gated_service(harness: &Harness, gateway: Arc<GatedApiGateway>) -> AppInstanceService {
    let dispatcher = ActionDispatcher::new(
        harness.data_store.clone(),
        gateway,
        Arc::new(SequentialRecordIdGenerator::default()),
    );
    AppInstanceService::new(
        Arc::new(FakeAppInstanceRepository::default()),
        dispatcher,
        Duration::ZERO,
    )
}

fn api_document_text() -> String {
    json!({
        "screens": {
            "home": {"components": []},
            "saved": {"components": []},
            "other": {"components": []}
        },
        "initialScreen": "home"
    })
    .to_string()
}

fn save_action() -> Action {
    Action::from(json!({
        "type": "submit",
        "endpoint": "https://api.example.test/save",
        "onSuccess": {"type": "navigate", "target": "saved"}
    }))
}

#[tokio::test]
async fn api_submits_run_without_holding_the_runtime() {
    let harness = Harness::new(true);
    let gateway = Arc::new(GatedApiGateway::default());
    let service = gated_service(&harness, gateway.clone());
    let app_instance_id = service
        .create_app_instance(api_document_text())
        .await
        .unwrap_or_else(|_| unreachable!());
    let runtime = service
        .open_runtime(app_instance_id)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(runtime.lock().await.dispatch(&save_action()).await.is_ok());
    let in_flight = {
        let service = service.clone();
        let runtime = runtime.clone();
        tokio::spawn(async move { service.run_api_submits(&runtime).await })
    };
    gateway.entered.notified().await;

    assert!(runtime.try_lock().is_ok());
    gateway.release.notify_one();
    assert!(matches!(in_flight.await, Ok(Ok(()))));

    let runtime = runtime.lock().await;
    assert_eq!(
        runtime.state().navigation(),
        &NavigationState::OnScreen("saved".to_owned())
    );
}

#[tokio::test]
async fn newer_dispatch_wins_over_in_flight_api_submit() {
    let harness = Harness::new(true);
    let gateway = Arc::new(GatedApiGateway::default());
    let service = gated_service(&harness, gateway.clone());
    let app_instance_id = service
        .create_app_instance(api_document_text())
        .await
        .unwrap_or_else(|_| unreachable!());
    let runtime = service
        .open_runtime(app_instance_id)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(runtime.lock().await.dispatch(&save_action()).await.is_ok());
    let in_flight = {
        let service = service.clone();
        let runtime = runtime.clone();
        tokio::spawn(async move { service.run_api_submits(&runtime).await })
    };
    gateway.entered.notified().await;

    let go_other = Action::from(json!({"type": "navigate", "target": "other"}));
    assert!(runtime.lock().await.dispatch(&go_other).await.is_ok());
    gateway.release.notify_one();
    assert!(matches!(in_flight.await, Ok(Ok(()))));

    let runtime = runtime.lock().await;
    assert_eq!(
        runtime.state().navigation(),
        &NavigationState::OnScreen("other".to_owned())
    );
}
