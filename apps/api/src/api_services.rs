use std::sync::Arc;

use appdeck_application::{
    ActionDispatcher, ApiSubmitGateway, AppInstanceService, RecordIdGenerator,
    UuidRecordIdGenerator,
};
use appdeck_core::AppError;
use appdeck_infrastructure::{
    HttpApiSubmitGateway, InMemoryAppInstanceCache, InMemoryAppInstanceRepository,
    InMemoryDataStore, SimulatedApiSubmitGateway, TracingRuntimeEventSink,
};

use crate::api_config::{ApiConfig, ApiSubmitMode};
use crate::state::AppState;

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    Ok(build_app_state_with(
        config,
        build_api_submit_gateway(config.api_submit_mode)?,
        Arc::new(UuidRecordIdGenerator),
    ))
}

pub fn build_app_state_with(
    config: &ApiConfig,
    api_gateway: Arc<dyn ApiSubmitGateway>,
    record_ids: Arc<dyn RecordIdGenerator>,
) -> AppState {
    let dispatcher = ActionDispatcher::new(
        Arc::new(InMemoryDataStore::new()),
        api_gateway,
        record_ids,
    )
    .with_event_sink(Arc::new(TracingRuntimeEventSink::new()))
    .with_max_chain_depth(config.max_action_chain_depth);

    let app_instance_service = AppInstanceService::new(
        Arc::new(InMemoryAppInstanceRepository::new()),
        dispatcher,
        config.save_debounce,
    )
    .with_app_instance_cache(
        Arc::new(InMemoryAppInstanceCache::new()),
        config.app_cache_ttl_seconds,
    );

    AppState {
        app_instance_service,
    }
}

fn build_api_submit_gateway(mode: ApiSubmitMode) -> Result<Arc<dyn ApiSubmitGateway>, AppError> {
    Ok(match mode {
        ApiSubmitMode::Simulated {
            success_percent,
            latency_ms,
        } => Arc::new(SimulatedApiSubmitGateway::new(success_percent, latency_ms)),
        ApiSubmitMode::Http {
            timeout_ms,
            max_attempts,
            retry_backoff_ms,
        } => Arc::new(HttpApiSubmitGateway::new(
            HttpApiSubmitGateway::client_with_timeout(timeout_ms)?,
            max_attempts,
            retry_backoff_ms,
        )),
    })
}
