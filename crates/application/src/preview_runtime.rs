use std::collections::BTreeMap;

use appdeck_core::{AppError, AppInstanceId, AppResult};
use appdeck_domain::{
    Action, AppDefinition, DataStoreSnapshot, DocumentParseError, NavigateAction, Record,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::action_dispatcher::{ActionDispatcher, DispatchScope, PendingApiSubmit};
use crate::history::History;
use crate::navigation::{NavigationState, ScreenResolution, resolve_screen};
use crate::runtime_state::{ActivePopup, RuntimeState};
use crate::view_renderer::{ScreenView, ViewRenderer, list_data_sources};

mod editor;
mod interaction;


/// Upper bound on redirects settled after one command.
const MAX_SETTLE_STEPS: usize = 8;

/// Everything the preview surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewView {
    /// Rendered screen.
    pub screen: ScreenView,
    /// Navigation position.
    pub navigation: NavigationState,
    /// Session user record, when logged in.
    pub session_user: Option<Value>,
    /// Form buffer.
    pub form: BTreeMap<String, Value>,
    /// Raised popup.
    pub popup: Option<ActivePopup>,
}

/// Single-writer state container of one app instance preview.
///
/// Owns the editable document with its undo history and the transient
/// interpreter state. The session lives only as long as the runtime.
pub struct PreviewRuntime {
    app_instance_id: AppInstanceId,
    dispatcher: ActionDispatcher,
    document_text: String,
    parse_error: Option<DocumentParseError>,
    /// Starts at the first document that parsed; absent until then.
    history: Option<History<AppDefinition>>,
    state: RuntimeState,
}

impl PreviewRuntime {
    /// Creates a runtime from stored document text.
    ///
    /// Invalid text is kept for editing and reported through
    /// [`PreviewRuntime::parse_error`]; the preview waits until a valid edit.
    pub async fn load(
        app_instance_id: AppInstanceId,
        dispatcher: ActionDispatcher,
        document_text: String,
    ) -> AppResult<Self> {
        let (document, parse_error) = match AppDefinition::parse(document_text.as_str()) {
            Ok(document) => (Some(document), None),
            Err(error) => {
                debug!(%app_instance_id, error = %error, "stored document does not parse");
                (None, Some(error))
            }
        };

        let runtime = Self {
            app_instance_id,
            dispatcher,
            document_text,
            parse_error,
            history: document.map(History::new),
            state: RuntimeState::default(),
        };
        runtime.ensure_schema_tables().await?;

        Ok(runtime)
    }

    /// Returns the app instance id.
    #[must_use]
    pub fn app_instance_id(&self) -> AppInstanceId {
        self.app_instance_id
    }

    /// Returns the editor text.
    #[must_use]
    pub fn document_text(&self) -> &str {
        self.document_text.as_str()
    }

    /// Returns the last valid document.
    #[must_use]
    pub fn document(&self) -> Option<&AppDefinition> {
        self.history.as_ref().map(History::present)
    }

    /// Returns the error of the last rejected edit.
    #[must_use]
    pub fn parse_error(&self) -> Option<&DocumentParseError> {
        self.parse_error.as_ref()
    }

    /// Returns whether an undo step exists.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(History::can_undo)
    }

    /// Returns whether a redo step exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(History::can_redo)
    }

    /// Returns the interpreter state.
    #[must_use]
    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    /// Resolves the current screen without side effects.
    #[must_use]
    pub fn resolution(&self) -> ScreenResolution {
        resolve_screen(
            self.document(),
            &self.state.navigation,
            self.state.session.is_some(),
        )
    }

    /// Executes redirects scheduled by the last resolution.
    pub async fn settle(&mut self) -> AppResult<()> {
        for _ in 0..MAX_SETTLE_STEPS {
            let ScreenResolution::Redirect(target) = self.resolution() else {
                return Ok(());
            };

            debug!(app_instance_id = %self.app_instance_id, target = %target, "redirecting guarded screen");
            let redirect = Action::Navigate(NavigateAction { target });
            let Some(document) = self.history.as_ref().map(History::present) else {
                return Ok(());
            };
            self.dispatcher
                .dispatch(
                    &redirect,
                    DispatchScope::new(self.app_instance_id, document),
                    &mut self.state,
                )
                .await?;
        }

        Ok(())
    }

    /// Renders the current frame.
    pub async fn render(&self) -> AppResult<PreviewView> {
        let resolution = self.resolution();
        let screen = match (self.document(), &resolution) {
            (Some(document), ScreenResolution::Screen(screen_id)) => {
                let mut tables = BTreeMap::new();
                if let Some(screen) = document.screen(screen_id) {
                    for table in list_data_sources(screen) {
                        let records = self.table(table.as_str()).await?;
                        tables.insert(table, records);
                    }
                }
                ViewRenderer::new(document, &tables, &self.state).render(&resolution)
            }
            (Some(document), _) => {
                let tables = BTreeMap::new();
                ViewRenderer::new(document, &tables, &self.state).render(&resolution)
            }
            (None, _) => ScreenView::Waiting,
        };

        Ok(PreviewView {
            screen,
            navigation: self.state.navigation.clone(),
            session_user: self
                .state
                .session
                .as_ref()
                .map(|session| session.user().to_value()),
            form: self.state.form.values().clone(),
            popup: self.state.popup.clone(),
        })
    }

    /// Returns the records of one table.
    pub async fn table(&self, table: &str) -> AppResult<Vec<Record>> {
        self.dispatcher
            .data_store()
            .get_table(self.app_instance_id, table)
            .await
    }

    /// Returns a copy of every table of this app instance.
    pub async fn snapshot(&self) -> AppResult<DataStoreSnapshot> {
        self.dispatcher
            .data_store()
            .snapshot(self.app_instance_id)
            .await
    }
}

fn missing_document(app_instance_id: AppInstanceId) -> AppError {
    AppError::Conflict(format!(
        "app instance '{app_instance_id}' has no valid document"
    ))
}
