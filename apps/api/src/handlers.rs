pub mod apps;
pub mod health;
pub mod preview;

use appdeck_application::{PreviewRuntime, SharedPreviewRuntime};
use appdeck_core::{AppInstanceId, AppResult};

use crate::error::ApiResult;
use crate::state::AppState;

async fn open_runtime(state: &AppState, app_instance_id: &str) -> ApiResult<SharedPreviewRuntime> {
    let app_instance_id = app_instance_id.parse::<AppInstanceId>()?;
    Ok(state
        .app_instance_service
        .open_runtime(app_instance_id)
        .await?)
}

/// Settles deferred redirects and schedules a save after a command.
///
/// Effects a failed command already applied are still saved before its
/// error is returned.
async fn finish_command(
    state: &AppState,
    runtime: &mut PreviewRuntime,
    outcome: AppResult<()>,
) -> ApiResult<()> {
    let settled = runtime.settle().await;
    state.app_instance_service.schedule_save(runtime).await?;
    outcome?;
    settled?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use std::sync::Arc;
    use std::time::Duration;

    use appdeck_application::SequentialRecordIdGenerator;
    use appdeck_infrastructure::SimulatedApiSubmitGateway;

    use crate::api_config::ApiConfig;
    use crate::api_services::build_app_state_with;

    let config = ApiConfig {
        save_debounce: Duration::ZERO,
        ..ApiConfig::default()
    };
    build_app_state_with(
        &config,
        Arc::new(SimulatedApiSubmitGateway::always_succeeding()),
        Arc::new(SequentialRecordIdGenerator::default()),
    )
}
