//! Design-token and `{{path}}` binding resolution.
//!
//! The two passes are deliberately independent: a token literal is never
//! interpolated and interpolation output is never scanned again.

use serde_json::{Map, Value};

use crate::Record;

/// Prefix marking a design-token reference.
pub const DESIGN_TOKEN_PREFIX: char = '$';

/// Resolves a `$name` design-token reference.
///
/// Returns the token literal when `value` is a string starting with `$` and the
/// name exists in `tokens`; otherwise returns `value` unchanged.
#[must_use]
pub fn resolve_design_token<'a>(value: &'a Value, tokens: &'a Map<String, Value>) -> &'a Value {
    value
        .as_str()
        .and_then(design_token_name)
        .and_then(|name| tokens.get(name))
        .unwrap_or(value)
}

/// Returns the referenced token name when `value` is a `$name` reference.
#[must_use]
pub fn design_token_name(value: &str) -> Option<&str> {
    value
        .strip_prefix(DESIGN_TOKEN_PREFIX)
        .filter(|name| !name.is_empty())
}

/// Resolves every top-level value of a theme map through the design tokens.
#[must_use]
pub fn resolve_theme(theme: &Map<String, Value>, tokens: &Map<String, Value>) -> Map<String, Value> {
    theme
        .iter()
        .map(|(key, value)| (key.clone(), resolve_design_token(value, tokens).clone()))
        .collect()
}

/// Substitutes `{{path}}` occurrences by walking `path` through `context`.
///
/// Unresolved paths render as an empty string. An unterminated `{{` is kept as
/// literal text.
#[must_use]
pub fn interpolate(template: &str, context: &Value) -> String {
    interpolate_with(template, |path| value_by_path(context, path))
}

fn interpolate_with<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a Value>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let (head, after_head) = rest.split_at(start);
        result.push_str(head);

        let Some(end_relative) = after_head.find("}}") else {
            result.push_str(after_head);
            rest = "";
            break;
        };

        let path = after_head[2..end_relative].trim();
        if let Some(value) = lookup(path) {
            result.push_str(display_value(value).as_str());
        }

        rest = &after_head[end_relative + 2..];
    }

    result.push_str(rest);
    result
}

/// Returns whether `value` contains at least one `{{` binding opener.
#[must_use]
pub fn has_bindings(value: &str) -> bool {
    value.contains("{{")
}

/// Walks a dot-separated path through objects and array indices.
#[must_use]
pub fn value_by_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current_value = value;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }

        current_value = match current_value {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current_value)
}

/// Renders a JSON value as display text.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(content) => content.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Lookup scope for `{{path}}` bindings.
///
/// Paths resolve against `session`, `item` and `form` first, then against the
/// bare fields of the scoped record, then against bare form values.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    root: Map<String, Value>,
}

impl TemplateContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the session user as `session.user`.
    #[must_use]
    pub fn with_session_user(mut self, user: Option<&Record>) -> Self {
        let session = match user {
            Some(user) => {
                let mut session = Map::new();
                session.insert("user".to_owned(), user.to_value());
                Value::Object(session)
            }
            None => Value::Null,
        };
        self.root.insert("session".to_owned(), session);
        self
    }

    /// Adds a record as `item` and exposes its fields at the top level.
    #[must_use]
    pub fn with_record(mut self, record: Option<&Record>) -> Self {
        if let Some(record) = record {
            self.root.insert("item".to_owned(), record.to_value());
            for (field, value) in record.fields() {
                self.root
                    .entry(field.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        self
    }

    /// Adds form values as `form` and exposes them at the top level.
    #[must_use]
    pub fn with_form_values<'a>(
        mut self,
        values: impl IntoIterator<Item = (&'a String, &'a Value)>,
    ) -> Self {
        let mut form = Map::new();
        for (field, value) in values {
            form.insert(field.clone(), value.clone());
        }

        for (field, value) in &form {
            self.root
                .entry(field.clone())
                .or_insert_with(|| value.clone());
        }
        self.root.insert("form".to_owned(), Value::Object(form));
        self
    }

    /// Looks up one binding path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            Some((head, tail)) => value_by_path(self.root.get(head)?, tail),
            None => self.root.get(path),
        }
    }

    /// Interpolates one template string against this context.
    #[must_use]
    pub fn interpolate(&self, template: &str) -> String {
        if !has_bindings(template) {
            return template.to_owned();
        }

        interpolate_with(template, |path| self.lookup(path))
    }
}
