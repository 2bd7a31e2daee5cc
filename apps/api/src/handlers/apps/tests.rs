use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;

use crate::dto::{CreateAppInstanceRequest, InsertSnippetRequest, UpdateDocumentRequest};
use crate::handlers::test_state;
use crate::state::AppState;

use super::{
    close_runtime_handler, create_app_instance_handler, get_app_instance_handler,
    insert_snippet_handler, redo_handler, undo_handler, update_document_handler,
};

fn document() -> serde_json::Value {
    json!({
        "app": {"name": "Tasks"},
        "screens": {"home": {"title": "Home", "components": []}},
        "initialScreen": "home"
    })
}

async fn create(state: &AppState) -> String {
    let created = create_app_instance_handler(
        State(state.clone()),
        Json(CreateAppInstanceRequest {
            document: document().to_string(),
        }),
    )
    .await;
    let (status, Json(response)) = created.unwrap_or_else(|_| unreachable!());
    assert_eq!(status, StatusCode::CREATED);
    assert!(response.parse_error.is_none());
    response.app_instance_id
}

#[tokio::test]
async fn invalid_edits_return_unprocessable_and_keep_text() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let result = update_document_handler(
        State(state.clone()),
        Path(app_instance_id.clone()),
        Json(UpdateDocumentRequest {
            document: "{\"screens\":".to_owned(),
        }),
    )
    .await;
    assert_eq!(
        result.err().map(|error| error.status()),
        Some(StatusCode::UNPROCESSABLE_ENTITY)
    );

    let Json(response) = get_app_instance_handler(State(state), Path(app_instance_id))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(response.document, "{\"screens\":");
    assert!(response.parse_error.is_some());
    assert!(!response.can_undo);
}

#[tokio::test]
async fn edits_can_be_undone_and_redone() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let mut edited = document();
    edited["screens"]["home"]["title"] = json!("Welcome");
    let Json(response) = update_document_handler(
        State(state.clone()),
        Path(app_instance_id.clone()),
        Json(UpdateDocumentRequest {
            document: edited.to_string(),
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert!(response.can_undo);

    let Json(response) = undo_handler(State(state.clone()), Path(app_instance_id.clone()))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!response.can_undo);
    assert!(response.can_redo);
    assert!(!response.document.contains("Welcome"));

    let Json(response) = redo_handler(State(state), Path(app_instance_id))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(response.document.contains("Welcome"));
}

#[tokio::test]
async fn snippets_target_existing_screens_only() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let missing = insert_snippet_handler(
        State(state.clone()),
        Path(app_instance_id.clone()),
        Json(InsertSnippetRequest {
            target_screen_id: Some("nowhere".to_owned()),
            snippet: json!({"id": "cta", "type": "button"}).to_string(),
        }),
    )
    .await;
    assert_eq!(
        missing.err().map(|error| error.status()),
        Some(StatusCode::NOT_FOUND)
    );

    let Json(response) = insert_snippet_handler(
        State(state),
        Path(app_instance_id),
        Json(InsertSnippetRequest {
            target_screen_id: None,
            snippet: json!([{"id": "cta", "type": "button"}]).to_string(),
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert!(response.document.contains("\"cta_"));
    assert!(response.can_undo);
}

#[tokio::test]
async fn closing_runtime_reports_missing_runtimes() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let closed = close_runtime_handler(State(state.clone()), Path(app_instance_id.clone())).await;
    assert_eq!(closed.ok(), Some(StatusCode::NO_CONTENT));

    let again = close_runtime_handler(State(state.clone()), Path(app_instance_id)).await;
    assert_eq!(
        again.err().map(|error| error.status()),
        Some(StatusCode::NOT_FOUND)
    );

    let invalid = close_runtime_handler(State(state), Path("not-an-id".to_owned())).await;
    assert_eq!(
        invalid.err().map(|error| error.status()),
        Some(StatusCode::BAD_REQUEST)
    );
}
