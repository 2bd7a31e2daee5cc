use axum::Json;
use axum::extract::{Path, State};

use appdeck_application::{PreviewRuntime, SharedPreviewRuntime};
use appdeck_domain::Action;
use serde_json::Value;

use crate::dto::{PressComponentRequest, PreviewResponse, SetFormValueRequest, TableResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{finish_command, open_runtime};

#[cfg(test)]
mod tests;

async fn preview_response(runtime: &PreviewRuntime) -> ApiResult<Json<PreviewResponse>> {
    let view = runtime.render().await?;
    Ok(Json(PreviewResponse::try_from(view)?))
}

/// Runs api submits a dispatch queued, with the runtime unlocked, then renders.
async fn dispatch_response(
    state: &AppState,
    runtime: SharedPreviewRuntime,
    outcome: ApiResult<()>,
) -> ApiResult<Json<PreviewResponse>> {
    let submitted = state.app_instance_service.run_api_submits(&runtime).await;
    outcome?;
    submitted?;

    let runtime = runtime.lock().await;
    preview_response(&runtime).await
}

pub async fn preview_handler(
    State(state): State<AppState>,
    Path(app_instance_id): Path<String>,
) -> ApiResult<Json<PreviewResponse>> {
    let runtime = open_runtime(&state, app_instance_id.as_str()).await?;
    let mut runtime = runtime.lock().await;

    // A freshly opened runtime may still owe its initial redirect.
    runtime.settle().await?;
    preview_response(&runtime).await
}

pub async fn set_form_value_handler(
    State(state): State<AppState>,
    Path((app_instance_id, field_id)): Path<(String, String)>,
    Json(payload): Json<SetFormValueRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let runtime = open_runtime(&state, app_instance_id.as_str()).await?;
    let mut runtime = runtime.lock().await;

    runtime.set_form_value(field_id, payload.value);
    finish_command(&state, &mut runtime, Ok(())).await?;
    preview_response(&runtime).await
}

pub async fn press_component_handler(
    State(state): State<AppState>,
    Path((app_instance_id, component_id)): Path<(String, String)>,
    payload: Option<Json<PressComponentRequest>>,
) -> ApiResult<Json<PreviewResponse>> {
    let shared = open_runtime(&state, app_instance_id.as_str()).await?;
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();

    let outcome = {
        let mut runtime = shared.lock().await;
        let outcome = runtime
            .press_component(component_id.as_str(), payload.item_id.as_deref())
            .await;
        finish_command(&state, &mut runtime, outcome).await
    };
    dispatch_response(&state, shared, outcome).await
}

pub async fn dispatch_action_handler(
    State(state): State<AppState>,
    Path(app_instance_id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<PreviewResponse>> {
    let shared = open_runtime(&state, app_instance_id.as_str()).await?;
    let action = Action::from(payload);

    let outcome = {
        let mut runtime = shared.lock().await;
        let outcome = runtime.dispatch(&action).await;
        finish_command(&state, &mut runtime, outcome).await
    };
    dispatch_response(&state, shared, outcome).await
}

pub async fn press_popup_button_handler(
    State(state): State<AppState>,
    Path((app_instance_id, index)): Path<(String, usize)>,
) -> ApiResult<Json<PreviewResponse>> {
    let shared = open_runtime(&state, app_instance_id.as_str()).await?;

    let outcome = {
        let mut runtime = shared.lock().await;
        let outcome = runtime.press_popup_button(index).await;
        finish_command(&state, &mut runtime, outcome).await
    };
    dispatch_response(&state, shared, outcome).await
}

pub async fn dismiss_popup_handler(
    State(state): State<AppState>,
    Path(app_instance_id): Path<String>,
) -> ApiResult<Json<PreviewResponse>> {
    let runtime = open_runtime(&state, app_instance_id.as_str()).await?;
    let mut runtime = runtime.lock().await;

    runtime.dismiss_popup();
    finish_command(&state, &mut runtime, Ok(())).await?;
    preview_response(&runtime).await
}

pub async fn table_handler(
    State(state): State<AppState>,
    Path((app_instance_id, table)): Path<(String, String)>,
) -> ApiResult<Json<TableResponse>> {
    let runtime = open_runtime(&state, app_instance_id.as_str()).await?;
    let runtime = runtime.lock().await;

    let records = runtime.table(table.as_str()).await?;
    Ok(Json(TableResponse::new(table, &records)))
}
