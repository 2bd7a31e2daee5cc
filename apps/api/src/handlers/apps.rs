use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use appdeck_core::{AppError, AppInstanceId};
use chrono::Utc;

use crate::dto::{
    AppDocumentResponse, CreateAppInstanceRequest, InsertSnippetRequest, UpdateDocumentRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{finish_command, open_runtime};

#[cfg(test)]
mod tests;

pub async fn create_app_instance_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateAppInstanceRequest>,
) -> ApiResult<(StatusCode, Json<AppDocumentResponse>)> {
    let app_instance_id = state
        .app_instance_service
        .create_app_instance(payload.document)
        .await?;
    let runtime = state
        .app_instance_service
        .open_runtime(app_instance_id)
        .await?;
    let runtime = runtime.lock().await;

    Ok((
        StatusCode::CREATED,
        Json(AppDocumentResponse::from(&*runtime)),
    ))
}

pub async fn get_app_instance_handler(
    State(state): State<AppState>,
    Path(app_instance_id): Path<String>,
) -> ApiResult<Json<AppDocumentResponse>> {
    let runtime = open_runtime(&state, app_instance_id.as_str()).await?;
    let runtime = runtime.lock().await;
    Ok(Json(AppDocumentResponse::from(&*runtime)))
}

pub async fn update_document_handler(
    State(state): State<AppState>,
    Path(app_instance_id): Path<String>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> ApiResult<Json<AppDocumentResponse>> {
    let runtime = open_runtime(&state, app_instance_id.as_str()).await?;
    let mut runtime = runtime.lock().await;

    let outcome = runtime.edit_document(payload.document).await;
    finish_command(&state, &mut runtime, outcome).await?;

    Ok(Json(AppDocumentResponse::from(&*runtime)))
}

pub async fn undo_handler(
    State(state): State<AppState>,
    Path(app_instance_id): Path<String>,
) -> ApiResult<Json<AppDocumentResponse>> {
    let runtime = open_runtime(&state, app_instance_id.as_str()).await?;
    let mut runtime = runtime.lock().await;

    let outcome = runtime.undo().await.map(|_| ());
    finish_command(&state, &mut runtime, outcome).await?;

    Ok(Json(AppDocumentResponse::from(&*runtime)))
}

pub async fn redo_handler(
    State(state): State<AppState>,
    Path(app_instance_id): Path<String>,
) -> ApiResult<Json<AppDocumentResponse>> {
    let runtime = open_runtime(&state, app_instance_id.as_str()).await?;
    let mut runtime = runtime.lock().await;

    let outcome = runtime.redo().await.map(|_| ());
    finish_command(&state, &mut runtime, outcome).await?;

    Ok(Json(AppDocumentResponse::from(&*runtime)))
}

pub async fn insert_snippet_handler(
    State(state): State<AppState>,
    Path(app_instance_id): Path<String>,
    Json(payload): Json<InsertSnippetRequest>,
) -> ApiResult<Json<AppDocumentResponse>> {
    let runtime = open_runtime(&state, app_instance_id.as_str()).await?;
    let mut runtime = runtime.lock().await;

    let outcome = runtime
        .insert_snippet(
            payload.target_screen_id.as_deref(),
            payload.snippet.as_str(),
            Utc::now().timestamp_millis(),
        )
        .await;
    finish_command(&state, &mut runtime, outcome).await?;

    Ok(Json(AppDocumentResponse::from(&*runtime)))
}

pub async fn close_runtime_handler(
    State(state): State<AppState>,
    Path(app_instance_id): Path<String>,
) -> ApiResult<StatusCode> {
    let app_instance_id = app_instance_id.parse::<AppInstanceId>()?;
    if state
        .app_instance_service
        .close_runtime(app_instance_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "app instance '{app_instance_id}' has no open runtime"
        ))
        .into())
    }
}
