use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use appdeck_core::{AppError, AppInstanceId, AppResult};
use appdeck_domain::{
    Action, AppDefinition, AuthConfig, AuthLoginAction, AuthLogoutAction, AuthSignupAction,
    DeleteRecordAction, Record, SubmitAction, SubmitTarget,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::navigation::NavigationState;
use crate::runtime_ports::{
    ApiSubmitGateway, ApiSubmitRequest, DataStoreRepository, RecordIdGenerator, RuntimeEvent,
    RuntimeEventRecord, RuntimeEventSink,
};
use crate::runtime_state::{ActivePopup, FormState, RuntimeState, Session};

mod auth;
mod submit;


/// Default bound on nested follow-up dispatches.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 50;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read-only inputs of one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchScope<'a> {
    app_instance_id: AppInstanceId,
    document: &'a AppDefinition,
    item: Option<&'a Record>,
}

impl<'a> DispatchScope<'a> {
    /// Creates a scope without a list item.
    #[must_use]
    pub fn new(app_instance_id: AppInstanceId, document: &'a AppDefinition) -> Self {
        Self {
            app_instance_id,
            document,
            item: None,
        }
    }

    /// Scopes bindings to a list item record.
    #[must_use]
    pub fn with_item(mut self, item: Option<&'a Record>) -> Self {
        self.item = item;
        self
    }
}

/// An api submit queued by a dispatch, awaiting its network round trip.
#[derive(Debug, Clone)]
pub struct PendingApiSubmit {
    request: ApiSubmitRequest,
    on_success: Option<Action>,
    on_error: Option<Action>,
    item: Option<Record>,
    depth: usize,
    generation: u64,
}

impl PendingApiSubmit {
    /// Returns the outbound request.
    #[must_use]
    pub fn request(&self) -> &ApiSubmitRequest {
        &self.request
    }
}

/// Interprets actions against the runtime state and the data store.
///
/// Malformed or unknown actions are logged and ignored. Follow-up actions run
/// one level deeper than their parent; past the configured depth the dispatch
/// fails with [`AppError::ActionChain`] and effects already applied stand.
/// Api submits are only queued in the state; see
/// [`ActionDispatcher::send_api_submit`] and
/// [`ActionDispatcher::complete_api_submit`].
#[derive(Clone)]
pub struct ActionDispatcher {
    data_store: Arc<dyn DataStoreRepository>,
    api_gateway: Arc<dyn ApiSubmitGateway>,
    record_ids: Arc<dyn RecordIdGenerator>,
    event_sink: Option<Arc<dyn RuntimeEventSink>>,
    max_chain_depth: usize,
}

impl ActionDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        data_store: Arc<dyn DataStoreRepository>,
        api_gateway: Arc<dyn ApiSubmitGateway>,
        record_ids: Arc<dyn RecordIdGenerator>,
    ) -> Self {
        Self {
            data_store,
            api_gateway,
            record_ids,
            event_sink: None,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }

    /// Adds a sink receiving runtime events.
    #[must_use]
    pub fn with_event_sink(mut self, event_sink: Arc<dyn RuntimeEventSink>) -> Self {
        self.event_sink = Some(event_sink);
        self
    }

    /// Overrides the follow-up nesting bound.
    #[must_use]
    pub fn with_max_chain_depth(mut self, max_chain_depth: usize) -> Self {
        self.max_chain_depth = max_chain_depth;
        self
    }

    /// Returns the data store the dispatcher mutates.
    #[must_use]
    pub fn data_store(&self) -> &Arc<dyn DataStoreRepository> {
        &self.data_store
    }

    /// Dispatches one root action.
    pub async fn dispatch(
        &self,
        action: &Action,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
    ) -> AppResult<()> {
        self.dispatch_at_depth(action, scope, state, 0).await
    }

    fn dispatch_at_depth<'a>(
        &'a self,
        action: &'a Action,
        scope: DispatchScope<'a>,
        state: &'a mut RuntimeState,
        depth: usize,
    ) -> BoxFuture<'a, AppResult<()>> {
        Box::pin(async move {
            if depth > self.max_chain_depth {
                warn!(
                    action_type = action.action_type(),
                    depth, "action chain exceeded nesting bound"
                );
                self.emit(scope, RuntimeEvent::ChainAborted { depth }).await;
                return Err(AppError::ActionChain { depth });
            }

            match action {
                Action::Navigate(navigate) => {
                    self.navigate(navigate.target.clone(), scope, state).await;
                    Ok(())
                }
                Action::Popup(popup) => {
                    let context = state.template_context(scope.item);
                    state.popup = Some(ActivePopup::from_action(popup, &context));
                    self.emit(
                        scope,
                        RuntimeEvent::PopupOpened {
                            variant: popup.variant.clone(),
                        },
                    )
                    .await;
                    Ok(())
                }
                Action::GoBack(_) => {
                    self.go_back(scope, state).await;
                    Ok(())
                }
                Action::Submit(submit) => self.submit(submit, scope, state, depth).await,
                Action::DeleteRecord(delete) => self.delete_record(delete, scope, state).await,
                Action::AuthLogin(login) => self.login(login, scope, state, depth).await,
                Action::AuthSignup(signup) => self.signup(signup, scope, state, depth).await,
                Action::AuthLogout(logout) => self.logout(logout, scope, state, depth).await,
                Action::Unsupported(unsupported) => {
                    self.ignore(scope, action.action_type(), unsupported.reason.as_str())
                        .await;
                    Ok(())
                }
            }
        })
    }

    async fn follow_up(
        &self,
        action: Option<&Action>,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
        depth: usize,
    ) -> AppResult<()> {
        match action {
            Some(action) => self.dispatch_at_depth(action, scope, state, depth + 1).await,
            None => Ok(()),
        }
    }

    async fn navigate(&self, screen_id: String, scope: DispatchScope<'_>, state: &mut RuntimeState) {
        state.navigation = NavigationState::OnScreen(screen_id.clone());
        self.emit(scope, RuntimeEvent::Navigated { screen_id }).await;
    }

    async fn go_back(&self, scope: DispatchScope<'_>, state: &mut RuntimeState) {
        match scope.document.initial_screen() {
            Some(initial_screen) => {
                self.navigate(initial_screen.to_owned(), scope, state)
                    .await;
            }
            None => state.navigation = NavigationState::Unresolved,
        }
    }

    async fn delete_record(
        &self,
        delete: &DeleteRecordAction,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
    ) -> AppResult<()> {
        let record_id = state
            .template_context(scope.item)
            .interpolate(delete.record_id.as_str());
        if record_id.trim().is_empty() || delete.table.trim().is_empty() {
            self.ignore(scope, "deleteRecord", "table or record id resolved to an empty value")
                .await;
            return Ok(());
        }

        let removed = self
            .data_store
            .delete_by_id(scope.app_instance_id, delete.table.as_str(), record_id.as_str())
            .await?;
        self.emit(
            scope,
            RuntimeEvent::RecordDeleted {
                table: delete.table.clone(),
                record_id,
                removed,
            },
        )
        .await;

        Ok(())
    }

    async fn ignore(&self, scope: DispatchScope<'_>, action_type: &str, reason: &str) {
        warn!(action_type, reason, "ignoring action");
        self.emit(
            scope,
            RuntimeEvent::ActionIgnored {
                action_type: action_type.to_owned(),
                reason: reason.to_owned(),
            },
        )
        .await;
    }

    async fn emit(&self, scope: DispatchScope<'_>, event: RuntimeEvent) {
        let Some(event_sink) = self.event_sink.as_ref() else {
            return;
        };

        if let Err(error) = event_sink
            .publish(RuntimeEventRecord::now(scope.app_instance_id, event))
            .await
        {
            warn!(error = %error, "failed to publish runtime event");
        }
    }
}

/// Collects `target field <- form value` pairs, omitting absent form values.
fn collect_form_fields(mapping: &BTreeMap<String, String>, form: &FormState) -> Map<String, Value> {
    mapping
        .iter()
        .filter_map(|(field, form_field_id)| {
            form.get(form_field_id.as_str())
                .map(|value| (field.clone(), value.clone()))
        })
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}
