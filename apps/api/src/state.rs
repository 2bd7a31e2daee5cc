use appdeck_application::AppInstanceService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub app_instance_service: AppInstanceService,
}
