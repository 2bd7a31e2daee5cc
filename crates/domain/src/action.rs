use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative state transition attached to interactive components.
///
/// Payloads that carry an unknown `type` or miss required fields deserialize
/// into [`Action::Unsupported`] instead of failing the whole document, so the
/// dispatcher can log and ignore them at press time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Action {
    /// Moves the navigation state to another screen or auth pseudo-screen.
    Navigate(NavigateAction),
    /// Raises a non-blocking modal description.
    Popup(PopupAction),
    /// Returns to the document's initial screen.
    GoBack(GoBackAction),
    /// Submits form values to the data store or an external endpoint.
    Submit(SubmitAction),
    /// Removes one record from a data store table.
    DeleteRecord(DeleteRecordAction),
    /// Evaluates credentials against the configured user table.
    AuthLogin(AuthLoginAction),
    /// Registers a new user record and opens a session for it.
    AuthSignup(AuthSignupAction),
    /// Clears the current session.
    AuthLogout(AuthLogoutAction),
    /// Authored payload the runtime cannot interpret.
    Unsupported(UnsupportedAction),
}

impl Action {
    /// Returns the stable action type tag.
    #[must_use]
    pub fn action_type(&self) -> &str {
        match self {
            Self::Navigate(_) => "navigate",
            Self::Popup(_) => "popup",
            Self::GoBack(_) => "goBack",
            Self::Submit(_) => "submit",
            Self::DeleteRecord(_) => "deleteRecord",
            Self::AuthLogin(_) => "auth:login",
            Self::AuthSignup(_) => "auth:signup",
            Self::AuthLogout(_) => "auth:logout",
            Self::Unsupported(unsupported) => unsupported
                .action_type
                .as_deref()
                .unwrap_or("<untagged>"),
        }
    }

    /// Returns whether the action belongs to the `auth:*` family.
    #[must_use]
    pub fn is_auth_action(&self) -> bool {
        matches!(
            self,
            Self::AuthLogin(_) | Self::AuthSignup(_) | Self::AuthLogout(_)
        )
    }
}

/// Payload of a `navigate` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateAction {
    /// Screen id or `auth:` pseudo-screen id.
    pub target: String,
}

/// Payload of a `popup` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupAction {
    /// Optional popup heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Popup body text.
    #[serde(default)]
    pub message: String,
    /// Presentation variant such as `info` or `error`.
    #[serde(default = "default_popup_variant")]
    pub variant: String,
    /// Custom buttons; an empty list means a single implicit dismiss button.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<PopupButton>,
}

fn default_popup_variant() -> String {
    "info".to_owned()
}

/// One popup button with an optional nested action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupButton {
    /// Button caption.
    #[serde(alias = "label")]
    pub text: String,
    /// Optional presentation style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Action dispatched when the button is pressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Box<Action>>,
}

/// Payload of a `goBack` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoBackAction {}

/// Destination of a `submit` action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitTarget {
    /// Append a record to a data store table.
    Database,
    /// Send the values to an external endpoint (legacy default).
    #[default]
    Api,
}

/// Payload of a `submit` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAction {
    /// Submission destination.
    #[serde(default)]
    pub target: SubmitTarget,
    /// Target table for database submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Endpoint URL for API submissions; may contain `{{field}}` bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// HTTP method for API submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Header templates for API submissions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Map of record field or parameter name to form field id.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Follow-up action on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<Box<Action>>,
    /// Follow-up action on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<Box<Action>>,
}

/// Payload of a `deleteRecord` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecordAction {
    /// Table holding the record.
    pub table: String,
    /// Record id, usually an `{{item.id}}` binding.
    pub record_id: String,
}

/// Form field ids used by `auth:login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFields {
    /// Form field id holding the email.
    pub email: String,
    /// Form field id holding the password.
    pub password: String,
}

/// Payload of an `auth:login` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthLoginAction {
    /// Form field mapping for the credentials.
    pub fields: LoginFields,
    /// Follow-up action when the credentials do not match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<Box<Action>>,
}

/// Payload of an `auth:signup` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSignupAction {
    /// Map of user table field to form field id.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Follow-up action when the email is already registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<Box<Action>>,
}

/// Payload of an `auth:logout` action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthLogoutAction {
    /// Follow-up action replacing the default return to the initial screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<Box<Action>>,
}

/// Authored action payload kept verbatim because it could not be interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsupportedAction {
    /// Authored `type` tag, when one was present.
    pub action_type: Option<String>,
    /// Why the payload was not understood.
    pub reason: String,
    /// Original JSON payload.
    pub payload: Value,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum ActionPayload {
    #[serde(rename = "navigate")]
    Navigate(NavigateAction),
    #[serde(rename = "popup")]
    Popup(PopupAction),
    #[serde(rename = "goBack")]
    GoBack(GoBackAction),
    #[serde(rename = "submit")]
    Submit(SubmitAction),
    #[serde(rename = "deleteRecord")]
    DeleteRecord(DeleteRecordAction),
    #[serde(rename = "auth:login")]
    AuthLogin(AuthLoginAction),
    #[serde(rename = "auth:signup")]
    AuthSignup(AuthSignupAction),
    #[serde(rename = "auth:logout")]
    AuthLogout(AuthLogoutAction),
}

impl From<Value> for Action {
    fn from(value: Value) -> Self {
        let action_type = value
            .get("type")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        match serde_json::from_value::<ActionPayload>(value.clone()) {
            Ok(ActionPayload::Navigate(action)) => Self::Navigate(action),
            Ok(ActionPayload::Popup(action)) => Self::Popup(action),
            Ok(ActionPayload::GoBack(action)) => Self::GoBack(action),
            Ok(ActionPayload::Submit(action)) => Self::Submit(action),
            Ok(ActionPayload::DeleteRecord(action)) => Self::DeleteRecord(action),
            Ok(ActionPayload::AuthLogin(action)) => Self::AuthLogin(action),
            Ok(ActionPayload::AuthSignup(action)) => Self::AuthSignup(action),
            Ok(ActionPayload::AuthLogout(action)) => Self::AuthLogout(action),
            Err(error) => Self::Unsupported(UnsupportedAction {
                action_type,
                reason: error.to_string(),
                payload: value,
            }),
        }
    }
}

impl From<Action> for Value {
    fn from(action: Action) -> Self {
        let payload = match action {
            Action::Navigate(action) => ActionPayload::Navigate(action),
            Action::Popup(action) => ActionPayload::Popup(action),
            Action::GoBack(action) => ActionPayload::GoBack(action),
            Action::Submit(action) => ActionPayload::Submit(action),
            Action::DeleteRecord(action) => ActionPayload::DeleteRecord(action),
            Action::AuthLogin(action) => ActionPayload::AuthLogin(action),
            Action::AuthSignup(action) => ActionPayload::AuthSignup(action),
            Action::AuthLogout(action) => ActionPayload::AuthLogout(action),
            Action::Unsupported(unsupported) => return unsupported.payload,
        };

        serde_json::to_value(payload).unwrap_or(Value::Null)
    }
}
