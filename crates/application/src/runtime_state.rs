use std::collections::BTreeMap;

use appdeck_domain::{PopupAction, PopupButton, Record, TemplateContext};
use serde::Serialize;
use serde_json::Value;

use crate::action_dispatcher::PendingApiSubmit;
use crate::navigation::NavigationState;

/// Simulated logged-in user, distinct from any platform identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: Record,
}

impl Session {
    /// Opens a session for a user record.
    #[must_use]
    pub fn new(user: Record) -> Self {
        Self { user }
    }

    /// Returns the session user.
    #[must_use]
    pub fn user(&self) -> &Record {
        &self.user
    }
}

/// Transient input buffer keyed by form field id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormState {
    values: BTreeMap<String, Value>,
}

impl FormState {
    /// Sets one field value.
    pub fn set(&mut self, field_id: impl Into<String>, value: Value) {
        self.values.insert(field_id.into(), value);
    }

    /// Returns one field value.
    #[must_use]
    pub fn get(&self, field_id: &str) -> Option<&Value> {
        self.values.get(field_id)
    }

    /// Removes one field value.
    pub fn remove(&mut self, field_id: &str) -> Option<Value> {
        self.values.remove(field_id)
    }

    /// Removes every field value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Returns all values.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Returns whether no field holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Popup currently raised over the preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePopup {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    message: String,
    variant: String,
    buttons: Vec<PopupButton>,
}

impl ActivePopup {
    /// Builds the popup for an action, interpolating title and message.
    #[must_use]
    pub fn from_action(action: &PopupAction, context: &TemplateContext) -> Self {
        Self {
            title: action.title.as_deref().map(|title| context.interpolate(title)),
            message: context.interpolate(action.message.as_str()),
            variant: action.variant.clone(),
            buttons: action.buttons.clone(),
        }
    }

    /// Returns the heading.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the body text.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the presentation variant.
    #[must_use]
    pub fn variant(&self) -> &str {
        self.variant.as_str()
    }

    /// Returns the custom buttons.
    #[must_use]
    pub fn buttons(&self) -> &[PopupButton] {
        &self.buttons
    }
}

/// Mutable interpreter state of one preview runtime.
#[derive(Debug, Clone, Default)]
pub struct RuntimeState {
    pub(crate) navigation: NavigationState,
    pub(crate) session: Option<Session>,
    pub(crate) form: FormState,
    pub(crate) popup: Option<ActivePopup>,
    /// Bumped by every root dispatch; api submits issued under an older value
    /// are superseded.
    pub(crate) dispatch_generation: u64,
    pub(crate) pending_api_submits: Vec<PendingApiSubmit>,
}

impl RuntimeState {
    /// Returns the navigation position.
    #[must_use]
    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    /// Returns the active session.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns the form buffer.
    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Returns the raised popup.
    #[must_use]
    pub fn popup(&self) -> Option<&ActivePopup> {
        self.popup.as_ref()
    }

    /// Builds the binding scope for templates, optionally scoped to a record.
    #[must_use]
    pub fn template_context(&self, item: Option<&Record>) -> TemplateContext {
        TemplateContext::new()
            .with_session_user(self.session.as_ref().map(Session::user))
            .with_record(item)
            .with_form_values(self.form.values())
    }
}
