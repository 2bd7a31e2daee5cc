//! Application services and ports.

#![forbid(unsafe_code)]

mod action_dispatcher;
mod app_instance_service;
mod debounced_persistence;
mod history;
mod navigation;
mod preview_runtime;
mod runtime_ports;
mod runtime_state;
mod view_renderer;

#[cfg(test)]
mod test_support;

pub use action_dispatcher::{
    ActionDispatcher, DEFAULT_MAX_CHAIN_DEPTH, DispatchScope, PendingApiSubmit,
};
pub use app_instance_service::{AppInstanceService, SharedPreviewRuntime};
pub use debounced_persistence::DebouncedPersistence;
pub use history::History;
pub use navigation::{NavigationState, ScreenResolution, resolve_screen};
pub use preview_runtime::{PreviewRuntime, PreviewView};
pub use runtime_ports::{
    ApiSubmitGateway, ApiSubmitRequest, AppInstanceCache, AppInstanceRepository,
    DataStoreRepository, RecordIdGenerator, RuntimeEvent, RuntimeEventRecord, RuntimeEventSink,
    SaveAppInstanceInput, SequentialRecordIdGenerator, StoredAppInstance, UuidRecordIdGenerator,
};
pub use runtime_state::{ActivePopup, FormState, RuntimeState, Session};
pub use view_renderer::{ComponentView, ListItemView, ScreenView, ViewRenderer, list_data_sources};
