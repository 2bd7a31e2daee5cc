use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use appdeck_core::{AppError, AppInstanceId, AppResult};
use appdeck_domain::{DataStoreSnapshot, Record};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::action_dispatcher::ActionDispatcher;
use crate::runtime_ports::{
    ApiSubmitGateway, ApiSubmitRequest, AppInstanceRepository, DataStoreRepository,
    RuntimeEvent, RuntimeEventRecord, RuntimeEventSink, SaveAppInstanceInput,
    SequentialRecordIdGenerator, StoredAppInstance,
};

#[derive(Default)]
pub(crate) struct FakeDataStore {
    apps: Mutex<HashMap<AppInstanceId, BTreeMap<String, Vec<Record>>>>,
}

#[async_trait]
impl DataStoreRepository for FakeDataStore {
    async fn get_table(
        &self,
        app_instance_id: AppInstanceId,
        table: &str,
    ) -> AppResult<Vec<Record>> {
        Ok(self
            .apps
            .lock()
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
            .lock()
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
        let mut apps = self.apps.lock().await;
        let records = apps
            .entry(app_instance_id)
            .or_default()
            .entry(table.to_owned())
            .or_default();
        if records.iter().any(|existing| existing.id() == record.id()) {
            return Err(AppError::Conflict(format!(
                "record '{}' already exists",
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
        let mut apps = self.apps.lock().await;
        let Some(records) = apps
            .get_mut(&app_instance_id)
            .and_then(|tables| tables.get_mut(table))
        else {
            return Ok(false);
        };
        let Some(position) = records.iter().position(|record| record.id() == record_id) else {
            return Ok(false);
        };
        records.remove(position);
        Ok(true)
    }

    async fn ensure_table(&self, app_instance_id: AppInstanceId, table: &str) -> AppResult<()> {
        self.apps
            .lock()
            .await
            .entry(app_instance_id)
            .or_default()
            .entry(table.to_owned())
            .or_default();
        Ok(())
    }

    async fn snapshot(&self, app_instance_id: AppInstanceId) -> AppResult<DataStoreSnapshot> {
        Ok(DataStoreSnapshot::new(
            self.apps
                .lock()
                .await
                .get(&app_instance_id)
                .cloned()
                .unwrap_or_default(),
        ))
    }

    async fn restore(
        &self,
        app_instance_id: AppInstanceId,
        snapshot: DataStoreSnapshot,
    ) -> AppResult<()> {
        self.apps
            .lock()
            .await
            .insert(app_instance_id, snapshot.into_tables());
        Ok(())
    }
}

pub(crate) struct FakeApiGateway {
    succeed: AtomicBool,
    pub(crate) requests: Mutex<Vec<ApiSubmitRequest>>,
}

impl FakeApiGateway {
    pub(crate) fn succeeding(succeed: bool) -> Self {
        Self {
            succeed: AtomicBool::new(succeed),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ApiSubmitGateway for FakeApiGateway {
    async fn submit(&self, request: ApiSubmitRequest) -> AppResult<()> {
        self.requests.lock().await.push(request);
        if self.succeed.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Internal("endpoint unavailable".to_owned()))
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingEventSink {
    pub(crate) events: Mutex<Vec<RuntimeEvent>>,
}

#[async_trait]
impl RuntimeEventSink for RecordingEventSink {
    async fn publish(&self, record: RuntimeEventRecord) -> AppResult<()> {
        self.events.lock().await.push(record.event);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAppInstanceRepository {
    pub(crate) instances: Mutex<HashMap<AppInstanceId, StoredAppInstance>>,
    pub(crate) failing: AtomicBool,
}

#[async_trait]
impl AppInstanceRepository for FakeAppInstanceRepository {
    async fn load_app_instance(
        &self,
        app_instance_id: AppInstanceId,
    ) -> AppResult<Option<StoredAppInstance>> {
        Ok(self.instances.lock().await.get(&app_instance_id).cloned())
    }

    async fn save_app_instance(
        &self,
        app_instance_id: AppInstanceId,
        input: SaveAppInstanceInput,
    ) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("storage offline".to_owned()));
        }

        let mut instances = self.instances.lock().await;
        let stored = instances
            .entry(app_instance_id)
            .or_insert_with(|| StoredAppInstance {
                document_text: "{}".to_owned(),
                data_store: DataStoreSnapshot::default(),
            });
        stored.apply(input);
        Ok(())
    }
}

/// Dispatcher wired to fakes with sequential record ids.
pub(crate) struct Harness {
    pub(crate) data_store: Arc<FakeDataStore>,
    pub(crate) api_gateway: Arc<FakeApiGateway>,
    pub(crate) events: Arc<RecordingEventSink>,
    pub(crate) dispatcher: ActionDispatcher,
}

impl Harness {
    pub(crate) fn new(api_succeeds: bool) -> Self {
        let data_store = Arc::new(FakeDataStore::default());
        let api_gateway = Arc::new(FakeApiGateway::succeeding(api_succeeds));
        let events = Arc::new(RecordingEventSink::default());
        let dispatcher = ActionDispatcher::new(
            data_store.clone(),
            api_gateway.clone(),
            Arc::new(SequentialRecordIdGenerator::default()),
        )
        .with_event_sink(events.clone());

        Self {
            data_store,
            api_gateway,
            events,
            dispatcher,
        }
    }
}
