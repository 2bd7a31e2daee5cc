use std::collections::{BTreeMap, BTreeSet};

use appdeck_domain::template::{
    design_token_name, display_value, has_bindings, resolve_design_token,
};
use appdeck_domain::{AppDefinition, Component, ComponentKind, Record, Screen, TemplateContext};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::navigation::ScreenResolution;
use crate::runtime_state::RuntimeState;

/// What the preview shows for the current navigation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScreenView {
    /// Nothing is shown yet.
    Waiting,
    /// An authentication pseudo-screen.
    #[serde(rename_all = "camelCase")]
    AuthScreen {
        /// Pseudo-screen id such as `auth:login`.
        screen_id: String,
    },
    /// A rendered document screen.
    #[serde(rename_all = "camelCase")]
    Screen {
        /// Screen id.
        screen_id: String,
        /// Interpolated title.
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Token-resolved background color.
        #[serde(skip_serializing_if = "Option::is_none")]
        background_color: Option<Value>,
        /// Rendered root components.
        components: Vec<ComponentView>,
    },
}

/// Rendered component node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentView {
    /// Component id.
    pub id: String,
    /// Component type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Resolved props.
    pub props: Map<String, Value>,
    /// Current form value for input-like components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Type of the attached action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    /// Record id when rendered inside a list item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Rendered children.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentView>,
    /// Children repeated per record for lists bound to a table.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ListItemView>,
}

/// Children of a list rendered for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemView {
    /// Record id.
    pub item_id: String,
    /// Rendered children.
    pub components: Vec<ComponentView>,
}

/// Returns the tables bound by list components of a screen.
#[must_use]
pub fn list_data_sources(screen: &Screen) -> BTreeSet<String> {
    let mut tables = BTreeSet::new();
    for component in screen.components() {
        component.visit(&mut |node| {
            if node.kind() == &ComponentKind::List
                && let Some(table) = node.data_source()
            {
                tables.insert(table.to_owned());
            }
        });
    }
    tables
}

/// Renders resolved screens against runtime state and prefetched tables.
pub struct ViewRenderer<'a> {
    document: &'a AppDefinition,
    tables: &'a BTreeMap<String, Vec<Record>>,
    state: &'a RuntimeState,
}

impl<'a> ViewRenderer<'a> {
    /// Creates a renderer.
    #[must_use]
    pub fn new(
        document: &'a AppDefinition,
        tables: &'a BTreeMap<String, Vec<Record>>,
        state: &'a RuntimeState,
    ) -> Self {
        Self {
            document,
            tables,
            state,
        }
    }

    /// Renders a resolution; pending redirects render as waiting.
    #[must_use]
    pub fn render(&self, resolution: &ScreenResolution) -> ScreenView {
        match resolution {
            ScreenResolution::Waiting | ScreenResolution::Redirect(_) => ScreenView::Waiting,
            ScreenResolution::AuthScreen(screen_id) => ScreenView::AuthScreen {
                screen_id: screen_id.clone(),
            },
            ScreenResolution::Screen(screen_id) => match self.document.screen(screen_id) {
                Some(screen) => self.render_screen(screen_id, screen),
                None => ScreenView::Waiting,
            },
        }
    }

    fn render_screen(&self, screen_id: &str, screen: &Screen) -> ScreenView {
        let context = self.state.template_context(None);
        let title = screen
            .title()
            .map(|title| display_value(&self.resolve_value(&Value::String(title.to_owned()), &context)));
        let background_color = screen.background_color().map(|color| {
            resolve_design_token(
                &Value::String(color.to_owned()),
                self.document.design_tokens(),
            )
            .clone()
        });

        ScreenView::Screen {
            screen_id: screen_id.to_owned(),
            title,
            background_color,
            components: screen
                .components()
                .iter()
                .map(|component| self.render_component(component, &context, None))
                .collect(),
        }
    }

    fn render_component(
        &self,
        component: &Component,
        context: &TemplateContext,
        item_id: Option<&str>,
    ) -> ComponentView {
        let props = component
            .props()
            .iter()
            .map(|(name, value)| (name.clone(), self.resolve_value(value, context)))
            .collect();

        let mut view = ComponentView {
            id: component.id().to_owned(),
            kind: component.kind().as_str().to_owned(),
            props,
            value: component
                .kind()
                .is_form_field()
                .then(|| self.state.form().get(component.id()).cloned())
                .flatten(),
            action_type: component
                .action()
                .map(|action| action.action_type().to_owned()),
            item_id: item_id.map(ToOwned::to_owned),
            components: Vec::new(),
            items: Vec::new(),
        };

        let bound_table = (component.kind() == &ComponentKind::List)
            .then(|| component.data_source())
            .flatten();
        match bound_table {
            Some(table) => {
                let records = self.tables.get(table).map(Vec::as_slice).unwrap_or_default();
                view.items = records
                    .iter()
                    .map(|record| {
                        let item_context = self.state.template_context(Some(record));
                        ListItemView {
                            item_id: record.id().to_owned(),
                            components: component
                                .components()
                                .iter()
                                .map(|child| {
                                    self.render_component(child, &item_context, Some(record.id()))
                                })
                                .collect(),
                        }
                    })
                    .collect();
            }
            None => {
                view.components = component
                    .components()
                    .iter()
                    .map(|child| self.render_component(child, context, item_id))
                    .collect();
            }
        }

        view
    }

    /// Token references are resolved only; other strings are interpolated only.
    ///
    /// Nested objects and arrays are walked so every string leaf follows the
    /// same rule.
    fn resolve_value(&self, value: &Value, context: &TemplateContext) -> Value {
        match value {
            Value::String(text) if design_token_name(text).is_some() => {
                resolve_design_token(value, self.document.design_tokens()).clone()
            }
            Value::String(text) if has_bindings(text) => Value::String(context.interpolate(text)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_value(item, context))
                    .collect(),
            ),
            Value::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, field)| (key.clone(), self.resolve_value(field, context)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}
