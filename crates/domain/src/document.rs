use std::collections::{BTreeMap, HashSet};

use appdeck_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Component;
use crate::template::resolve_theme;

/// Prefix reserved for authentication pseudo-screens such as `auth:login`.
pub const AUTH_SCREEN_PREFIX: &str = "auth:";

/// Returns whether a screen id names an authentication pseudo-screen.
#[must_use]
pub fn is_auth_screen_id(screen_id: &str) -> bool {
    screen_id.starts_with(AUTH_SCREEN_PREFIX)
}

/// Parsed app definition document.
///
/// Unknown fields at every level are preserved so that re-serializing a
/// document never drops authored data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<Value>,
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    screens: BTreeMap<String, Screen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initial_screen: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// App-wide settings under the `app` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    theme: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    design_tokens: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    database_schema: BTreeMap<String, TableSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authentication: Option<AuthConfig>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Simulated authentication configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default = "default_user_table")]
    user_table: String,
    #[serde(default = "default_email_field")]
    email_field: String,
    #[serde(default = "default_password_field")]
    password_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    post_login_screen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_redirect_screen: Option<String>,
}

fn default_user_table() -> String {
    "users".to_owned()
}

fn default_email_field() -> String {
    "email".to_owned()
}

fn default_password_field() -> String {
    "password".to_owned()
}

impl AuthConfig {
    /// Creates an auth configuration for `user_table` with default field names.
    #[must_use]
    pub fn new(user_table: impl Into<String>) -> Self {
        Self {
            user_table: user_table.into(),
            email_field: default_email_field(),
            password_field: default_password_field(),
            post_login_screen: None,
            auth_redirect_screen: None,
        }
    }

    /// Sets the screen opened after login or signup.
    #[must_use]
    pub fn with_post_login_screen(mut self, screen_id: impl Into<String>) -> Self {
        self.post_login_screen = Some(screen_id.into());
        self
    }

    /// Sets the screen guarded screens redirect to.
    #[must_use]
    pub fn with_auth_redirect_screen(mut self, screen_id: impl Into<String>) -> Self {
        self.auth_redirect_screen = Some(screen_id.into());
        self
    }

    /// Returns the table holding user records.
    #[must_use]
    pub fn user_table(&self) -> &str {
        self.user_table.as_str()
    }

    /// Returns the user field compared against the submitted email.
    #[must_use]
    pub fn email_field(&self) -> &str {
        self.email_field.as_str()
    }

    /// Returns the user field compared against the submitted password.
    #[must_use]
    pub fn password_field(&self) -> &str {
        self.password_field.as_str()
    }

    /// Returns the screen opened after a successful login or signup.
    #[must_use]
    pub fn post_login_screen(&self) -> Option<&str> {
        self.post_login_screen.as_deref()
    }

    /// Returns the screen guarded screens redirect to without a session.
    #[must_use]
    pub fn auth_redirect_screen(&self) -> Option<&str> {
        self.auth_redirect_screen.as_deref()
    }
}

/// Field definitions of one data store table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableSchema {
    /// `{ "fields": [...] }` form.
    Fields {
        /// Ordered field definitions.
        fields: Vec<FieldDefinition>,
    },
    /// Bare `[...]` form.
    List(Vec<FieldDefinition>),
}

impl TableSchema {
    /// Returns the field definitions.
    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        match self {
            Self::Fields { fields } | Self::List(fields) => fields,
        }
    }

    /// Returns `(field, default)` pairs for fields declaring a default value.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields().iter().filter_map(|field| {
            field
                .default
                .as_ref()
                .map(|value| (field.name.as_str(), value))
        })
    }
}

/// One table field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Informational field type such as `string` or `number`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Whether the field is the table's primary key.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary_key: bool,
    /// Value used when a submission does not provide the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Named navigable page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    requires_auth: bool,
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_color: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Screen {
    /// Creates an empty screen.
    #[must_use]
    pub fn new(title: Option<String>) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }

    /// Marks the screen as reachable only with an active session.
    #[must_use]
    pub fn requiring_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Appends one component.
    #[must_use]
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Returns the screen title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns whether the screen requires an active session.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Returns the ordered root components.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Returns the background color, possibly a `$token` reference.
    #[must_use]
    pub fn background_color(&self) -> Option<&str> {
        self.background_color.as_deref()
    }

    /// Returns the path from a root component to the component with `id`.
    #[must_use]
    pub fn component_path(&self, id: &str) -> Option<Vec<&Component>> {
        self.components
            .iter()
            .find_map(|component| component.path_to(id))
    }

    pub(crate) fn components_mut(&mut self) -> &mut Vec<Component> {
        &mut self.components
    }
}

/// Parse failure for authored document text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct DocumentParseError {
    message: String,
    line: usize,
    column: usize,
}

impl DocumentParseError {
    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the 1-based line, or 0 when the error is not positional.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the 1-based column, or 0 when the error is not positional.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    fn structural(message: String) -> Self {
        Self {
            message,
            line: 0,
            column: 0,
        }
    }
}

impl From<serde_json::Error> for DocumentParseError {
    fn from(error: serde_json::Error) -> Self {
        Self {
            message: error.to_string(),
            line: error.line(),
            column: error.column(),
        }
    }
}

impl From<DocumentParseError> for AppError {
    fn from(error: DocumentParseError) -> Self {
        AppError::Parse(error.to_string())
    }
}

impl AppDefinition {
    /// Parses and validates raw document text.
    ///
    /// Missing `screens` or `initialScreen` is valid and yields an app without
    /// screens. An `initialScreen` naming neither a screen nor an `auth:`
    /// pseudo-screen is rejected.
    pub fn parse(raw: &str) -> Result<Self, DocumentParseError> {
        let document: Self = serde_json::from_str(raw)?;
        document.validate()?;
        Ok(document)
    }

    fn validate(&self) -> Result<(), DocumentParseError> {
        if let Some(initial_screen) = self.initial_screen.as_deref()
            && !is_auth_screen_id(initial_screen)
            && !self.screens.contains_key(initial_screen)
        {
            return Err(DocumentParseError::structural(format!(
                "initialScreen '{initial_screen}' does not match any screen"
            )));
        }

        Ok(())
    }

    /// Serializes the document as pretty-printed JSON text.
    pub fn to_json_text(&self) -> AppResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|error| AppError::Internal(format!("failed to serialize document: {error}")))
    }

    /// Adds a screen, replacing any screen with the same id.
    #[must_use]
    pub fn with_screen(mut self, screen_id: impl Into<String>, screen: Screen) -> Self {
        self.screens.insert(screen_id.into(), screen);
        self
    }

    /// Sets the initial screen.
    #[must_use]
    pub fn with_initial_screen(mut self, screen_id: impl Into<String>) -> Self {
        self.initial_screen = Some(screen_id.into());
        self
    }

    /// Sets the authentication configuration.
    #[must_use]
    pub fn with_authentication(mut self, authentication: AuthConfig) -> Self {
        self.app.authentication = Some(authentication);
        self
    }

    /// Returns the informational version value.
    #[must_use]
    pub fn version(&self) -> Option<&Value> {
        self.version.as_ref()
    }

    /// Returns the app name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.app.name.as_deref()
    }

    /// Returns the raw theme map.
    #[must_use]
    pub fn theme(&self) -> &Map<String, Value> {
        &self.app.theme
    }

    /// Returns the theme with `$token` values resolved.
    #[must_use]
    pub fn resolved_theme(&self) -> Map<String, Value> {
        resolve_theme(&self.app.theme, &self.app.design_tokens)
    }

    /// Returns the flat design-token map.
    #[must_use]
    pub fn design_tokens(&self) -> &Map<String, Value> {
        &self.app.design_tokens
    }

    /// Returns table schemas keyed by table name.
    #[must_use]
    pub fn database_schema(&self) -> &BTreeMap<String, TableSchema> {
        &self.app.database_schema
    }

    /// Returns the schema of one table.
    #[must_use]
    pub fn table_schema(&self, table: &str) -> Option<&TableSchema> {
        self.app.database_schema.get(table)
    }

    /// Returns the simulated authentication configuration.
    #[must_use]
    pub fn authentication(&self) -> Option<&AuthConfig> {
        self.app.authentication.as_ref()
    }

    /// Returns screens keyed by id.
    #[must_use]
    pub fn screens(&self) -> &BTreeMap<String, Screen> {
        &self.screens
    }

    /// Returns one screen.
    #[must_use]
    pub fn screen(&self, screen_id: &str) -> Option<&Screen> {
        self.screens.get(screen_id)
    }

    /// Returns the initial screen id.
    #[must_use]
    pub fn initial_screen(&self) -> Option<&str> {
        self.initial_screen.as_deref()
    }

    /// Returns every component id used anywhere in the document.
    #[must_use]
    pub fn component_ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        for screen in self.screens.values() {
            for component in screen.components() {
                component.visit(&mut |node| {
                    ids.insert(node.id().to_owned());
                });
            }
        }
        ids
    }

    pub(crate) fn screen_mut(&mut self, screen_id: &str) -> Option<&mut Screen> {
        self.screens.get_mut(screen_id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AppDefinition, is_auth_screen_id};

    #[test]
    fn empty_object_is_a_valid_document() {
        let document = AppDefinition::parse("{}").unwrap_or_else(|_| unreachable!());
        assert!(document.screens().is_empty());
        assert!(document.initial_screen().is_none());
    }

    #[test]
    fn invalid_json_reports_position() {
        let error = AppDefinition::parse("{\n  \"screens\": ").err();
        assert!(error.is_some_and(|error| error.line() == 2));
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(AppDefinition::parse("[1, 2]").is_err());
    }

    #[test]
    fn unknown_initial_screen_is_rejected() {
        let error = AppDefinition::parse(r#"{"screens": {}, "initialScreen": "home"}"#).err();
        assert!(error.is_some_and(|error| error.message().contains("home")));
    }

    #[test]
    fn auth_pseudo_initial_screen_is_accepted() {
        let document = AppDefinition::parse(r#"{"initialScreen": "auth:login"}"#);
        assert!(document.is_ok());
        assert!(is_auth_screen_id("auth:signup"));
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({
            "version": "1.0",
            "generator": "studio",
            "app": {"name": "Tasks", "locale": "en"},
            "screens": {"home": {"title": "Home", "layout": "stack", "components": []}},
            "initialScreen": "home"
        });
        let document =
            AppDefinition::parse(&raw.to_string()).unwrap_or_else(|_| unreachable!());
        let serialized = serde_json::to_value(&document).unwrap_or_default();
        assert_eq!(serialized, raw);
    }

    #[test]
    fn schema_accepts_both_table_forms() {
        let document = AppDefinition::parse(
            &json!({
                "app": {"databaseSchema": {
                    "tasks": {"fields": [{"name": "id", "type": "string", "primaryKey": true},
                                         {"name": "done", "type": "boolean", "default": false}]},
                    "users": [{"name": "email", "type": "string"}]
                }}
            })
            .to_string(),
        )
        .unwrap_or_else(|_| unreachable!());

        let tasks = document.table_schema("tasks").map(|schema| schema.fields().len());
        assert_eq!(tasks, Some(2));
        let defaults: Vec<(&str, &serde_json::Value)> = document
            .table_schema("tasks")
            .map(|schema| schema.defaults().collect())
            .unwrap_or_default();
        assert_eq!(defaults, vec![("done", &json!(false))]);
        assert_eq!(
            document.table_schema("users").map(|schema| schema.fields().len()),
            Some(1)
        );
    }

    #[test]
    fn authentication_defaults_field_names() {
        let document = AppDefinition::parse(
            r#"{"app": {"authentication": {"userTable": "members", "postLoginScreen": "home"}},
                "screens": {"home": {}}, "initialScreen": "home"}"#,
        )
        .unwrap_or_else(|_| unreachable!());
        let auth = document.authentication();
        assert_eq!(auth.map(|auth| auth.user_table()), Some("members"));
        assert_eq!(auth.map(|auth| auth.email_field()), Some("email"));
        assert_eq!(auth.map(|auth| auth.password_field()), Some("password"));
        assert_eq!(auth.and_then(|auth| auth.post_login_screen()), Some("home"));
    }

    #[test]
    fn component_ids_cover_nested_trees() {
        let document = AppDefinition::parse(
            &json!({
                "screens": {
                    "a": {"components": [{"id": "x", "type": "card", "components": [{"id": "y", "type": "text"}]}]},
                    "b": {"components": [{"id": "z", "type": "divider"}]}
                }
            })
            .to_string(),
        )
        .unwrap_or_else(|_| unreachable!());
        let ids = document.component_ids();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("y"));
    }
}
