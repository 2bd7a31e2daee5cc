use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Action;

/// Component type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    /// Static or bound text.
    Text,
    /// Pressable button.
    Button,
    /// Text input bound to a form field.
    Input,
    /// Repeats its children once per record of a data source table.
    List,
    /// Visual grouping card.
    Card,
    /// Layout container.
    Container,
    /// Image.
    Image,
    /// Horizontal divider.
    Divider,
    /// Date input bound to a form field.
    DatePicker,
    /// Time input bound to a form field.
    TimePicker,
    /// Any other authored type, kept verbatim.
    Other(String),
}

impl ComponentKind {
    /// Returns the authored type tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Button => "button",
            Self::Input => "input",
            Self::List => "list",
            Self::Card => "card",
            Self::Container => "container",
            Self::Image => "image",
            Self::Divider => "divider",
            Self::DatePicker => "datepicker",
            Self::TimePicker => "timepicker",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Returns whether the kind binds a form field.
    #[must_use]
    pub fn is_form_field(&self) -> bool {
        matches!(self, Self::Input | Self::DatePicker | Self::TimePicker)
    }
}

impl From<String> for ComponentKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => Self::Text,
            "button" => Self::Button,
            "input" => Self::Input,
            "list" => Self::List,
            "card" => Self::Card,
            "container" => Self::Container,
            "image" => Self::Image,
            "divider" => Self::Divider,
            "datepicker" => Self::DatePicker,
            "timepicker" => Self::TimePicker,
            _ => Self::Other(value),
        }
    }
}

impl From<ComponentKind> for String {
    fn from(value: ComponentKind) -> Self {
        match value {
            ComponentKind::Other(value) => value,
            other => other.as_str().to_owned(),
        }
    }
}

/// One node of a screen's component tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    id: String,
    #[serde(rename = "type")]
    kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "onPress")]
    action: Option<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    components: Vec<Component>,
    #[serde(flatten)]
    props: Map<String, Value>,
}

impl Component {
    /// Creates a component node.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            kind,
            action: None,
            components: Vec::new(),
            props: Map::new(),
        }
    }

    /// Adds an action to the component.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Adds one child component.
    #[must_use]
    pub fn with_child(mut self, child: Component) -> Self {
        self.components.push(child);
        self
    }

    /// Adds one authored property.
    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>, value: Value) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// Returns the component id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the component type.
    #[must_use]
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Returns the attached action.
    #[must_use]
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Returns ordered child components.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Returns authored properties other than id, type, action and children.
    #[must_use]
    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    /// Returns one authored string property.
    #[must_use]
    pub fn prop_str(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(Value::as_str)
    }

    /// Returns the data source table of a list component.
    ///
    /// Accepts `"dataSource": "tasks"` or `"dataSource": {"table": "tasks"}`.
    #[must_use]
    pub fn data_source(&self) -> Option<&str> {
        match self.props.get("dataSource")? {
            Value::String(table) => Some(table.as_str()),
            Value::Object(source) => source.get("table").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Returns the path from this node to the component with `id`, inclusive.
    #[must_use]
    pub fn path_to(&self, id: &str) -> Option<Vec<&Component>> {
        if self.id == id {
            return Some(vec![self]);
        }

        self.components.iter().find_map(|child| {
            child.path_to(id).map(|mut path| {
                path.insert(0, self);
                path
            })
        })
    }

    /// Visits this node and every descendant in pre-order.
    pub fn visit<'a>(&'a self, visitor: &mut impl FnMut(&'a Component)) {
        visitor(self);
        for child in &self.components {
            child.visit(visitor);
        }
    }

    pub(crate) fn rewrite_ids(&mut self, rewrite: &mut impl FnMut(&str) -> String) {
        self.id = rewrite(self.id.as_str());
        for child in &mut self.components {
            child.rewrite_ids(rewrite);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Component, ComponentKind};

    fn component(value: serde_json::Value) -> Component {
        serde_json::from_value(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn unknown_component_type_round_trips() {
        let node = component(json!({"id": "map1", "type": "map", "zoom": 3}));
        assert_eq!(node.kind(), &ComponentKind::Other("map".to_owned()));

        let serialized = serde_json::to_value(&node).unwrap_or_default();
        assert_eq!(serialized, json!({"id": "map1", "type": "map", "zoom": 3}));
    }

    #[test]
    fn component_requires_id() {
        let node = serde_json::from_value::<Component>(json!({"type": "text"}));
        assert!(node.is_err());
    }

    #[test]
    fn path_to_returns_ancestors() {
        let node = component(json!({
            "id": "list1",
            "type": "list",
            "dataSource": {"table": "tasks"},
            "components": [
                {"id": "row", "type": "card", "components": [
                    {"id": "delete", "type": "button", "action": {"type": "goBack"}}
                ]}
            ]
        }));

        let path = node.path_to("delete").unwrap_or_default();
        let ids: Vec<&str> = path.iter().map(|node| node.id()).collect();
        assert_eq!(ids, vec!["list1", "row", "delete"]);
        assert_eq!(node.data_source(), Some("tasks"));
        assert!(path[2].action().is_some());
    }

    #[test]
    fn on_press_alias_is_accepted() {
        let node = component(json!({
            "id": "b", "type": "button", "onPress": {"type": "navigate", "target": "home"}
        }));
        assert!(node.action().is_some());
    }
}
