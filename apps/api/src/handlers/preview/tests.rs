use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::dto::{CreateAppInstanceRequest, PressComponentRequest, SetFormValueRequest};
use crate::handlers::apps::create_app_instance_handler;
use crate::handlers::test_state;
use crate::state::AppState;

use super::{
    dismiss_popup_handler, dispatch_action_handler, press_component_handler,
    press_popup_button_handler, preview_handler, set_form_value_handler, table_handler,
};

fn document() -> Value {
    json!({
        "app": {
            "name": "Tasks",
            "databaseSchema": {"tasks": [{"name": "title"}, {"name": "done", "default": false}]},
            "authentication": {"userTable": "users", "authRedirectScreen": "login"}
        },
        "screens": {
            "home": {"title": "Home", "components": [
                {"id": "newTask", "type": "input"},
                {"id": "add", "type": "button", "action": {
                    "type": "submit", "target": "database", "table": "tasks",
                    "fields": {"title": "newTask"},
                    "onSuccess": {"type": "popup", "message": "Task added", "buttons": [
                        {"text": "OK"},
                        {"text": "Account", "action": {"type": "navigate", "target": "account"}}
                    ]}
                }},
                {"id": "tasks", "type": "list", "dataSource": "tasks", "components": [
                    {"id": "taskTitle", "type": "text", "text": "{{title}}"},
                    {"id": "removeTask", "type": "button", "action": {
                        "type": "deleteRecord", "table": "tasks", "recordId": "{{item.id}}"
                    }}
                ]}
            ]},
            "account": {"requiresAuth": true, "components": []},
            "login": {"components": []}
        },
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
    let (_, Json(response)) = created.unwrap_or_else(|_| unreachable!());
    response.app_instance_id
}

#[tokio::test]
async fn preview_starts_on_initial_screen() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let Json(frame) = preview_handler(State(state), Path(app_instance_id))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(frame.current_screen_id.as_deref(), Some("home"));
    assert_eq!(frame.screen["kind"], json!("screen"));
    assert!(frame.session_user.is_none());
}

#[tokio::test]
async fn submitting_form_inserts_record_and_raises_popup() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let typed = set_form_value_handler(
        State(state.clone()),
        Path((app_instance_id.clone(), "newTask".to_owned())),
        Json(SetFormValueRequest {
            value: json!("Buy milk"),
        }),
    )
    .await;
    assert!(typed.is_ok());

    let Json(frame) = press_component_handler(
        State(state.clone()),
        Path((app_instance_id.clone(), "add".to_owned())),
        None,
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert!(frame.form.is_empty());
    assert_eq!(
        frame.popup.as_ref().map(|popup| popup["message"].clone()),
        Some(json!("Task added"))
    );
    assert_eq!(
        frame.screen["components"][2]["items"][0]["components"][0]["props"]["text"],
        json!("Buy milk")
    );

    let Json(table) = table_handler(
        State(state),
        Path((app_instance_id, "tasks".to_owned())),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(table.records.len(), 1);
    assert_eq!(table.records[0]["title"], json!("Buy milk"));
    assert_eq!(table.records[0]["done"], json!(false));
}

#[tokio::test]
async fn popup_button_into_guarded_screen_settles_on_redirect() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let raised = dispatch_action_handler(
        State(state.clone()),
        Path(app_instance_id.clone()),
        Json(json!({"type": "popup", "message": "Go?", "buttons": [
            {"text": "Go", "action": {"type": "navigate", "target": "account"}}
        ]})),
    )
    .await;
    assert!(raised.is_ok());

    let missing = press_popup_button_handler(
        State(state.clone()),
        Path((app_instance_id.clone(), 3)),
    )
    .await;
    assert_eq!(
        missing.err().map(|error| error.status()),
        Some(StatusCode::NOT_FOUND)
    );

    let Json(frame) = press_popup_button_handler(
        State(state.clone()),
        Path((app_instance_id.clone(), 0)),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert!(frame.popup.is_none());
    assert_eq!(frame.current_screen_id.as_deref(), Some("login"));

    let Json(frame) = dismiss_popup_handler(State(state), Path(app_instance_id))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(frame.popup.is_none());
}

#[tokio::test]
async fn pressing_list_children_requires_item_scope() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let result = press_component_handler(
        State(state.clone()),
        Path((app_instance_id.clone(), "removeTask".to_owned())),
        Some(Json(PressComponentRequest::default())),
    )
    .await;
    assert_eq!(
        result.err().map(|error| error.status()),
        Some(StatusCode::BAD_REQUEST)
    );

    let unknown = press_component_handler(
        State(state),
        Path((app_instance_id, "ghost".to_owned())),
        None,
    )
    .await;
    assert_eq!(
        unknown.err().map(|error| error.status()),
        Some(StatusCode::NOT_FOUND)
    );
}

#[tokio::test]
async fn runaway_chains_are_unprocessable() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let mut chain = json!({"type": "goBack"});
    for _ in 0..60 {
        chain = json!({
            "type": "submit", "target": "database", "table": "tasks",
            "fields": {}, "onSuccess": chain
        });
    }

    let result = dispatch_action_handler(
        State(state.clone()),
        Path(app_instance_id.clone()),
        Json(chain),
    )
    .await;
    assert_eq!(
        result.err().map(|error| error.status()),
        Some(StatusCode::UNPROCESSABLE_ENTITY)
    );

    let Json(table) = table_handler(State(state), Path((app_instance_id, "tasks".to_owned())))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(table.records.len(), 51);
}

#[tokio::test]
async fn api_submit_branch_is_applied_before_responding() {
    let state = test_state();
    let app_instance_id = create(&state).await;

    let submitted = dispatch_action_handler(
        State(state.clone()),
        Path(app_instance_id.clone()),
        Json(json!({
            "type": "submit",
            "endpoint": "https://api.example.test/tasks",
            "onSuccess": {"type": "popup", "message": "Synced"}
        })),
    )
    .await;
    let Json(frame) = submitted.unwrap_or_else(|_| unreachable!());
    assert_eq!(frame.popup.map(|popup| popup["message"].clone()), Some(json!("Synced")));
}
