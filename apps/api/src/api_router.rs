use axum::Router;
use axum::routing::{delete, get, post, put};
use appdeck_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let editor_routes = Router::new()
        .route(
            "/api/apps",
            post(handlers::apps::create_app_instance_handler),
        )
        .route(
            "/api/apps/{app_instance_id}",
            get(handlers::apps::get_app_instance_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/document",
            put(handlers::apps::update_document_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/undo",
            post(handlers::apps::undo_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/redo",
            post(handlers::apps::redo_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/snippets",
            post(handlers::apps::insert_snippet_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/runtime",
            delete(handlers::apps::close_runtime_handler),
        );

    let preview_routes = Router::new()
        .route(
            "/api/apps/{app_instance_id}/preview",
            get(handlers::preview::preview_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/form/{field_id}",
            put(handlers::preview::set_form_value_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/components/{component_id}/press",
            post(handlers::preview::press_component_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/actions",
            post(handlers::preview::dispatch_action_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/popup",
            delete(handlers::preview::dismiss_popup_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/popup/buttons/{index}",
            post(handlers::preview::press_popup_button_handler),
        )
        .route(
            "/api/apps/{app_instance_id}/tables/{table}",
            get(handlers::preview::table_handler),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(editor_routes)
        .merge(preview_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
