use appdeck_core::AppError;
use serde_json::Value;
use thiserror::Error;

use crate::{AppDefinition, Component, DocumentParseError};

/// Failure while inserting a snippet into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnippetError {
    /// Snippet text is not a component or an array of components.
    #[error("invalid snippet: {0}")]
    InvalidSnippet(String),
    /// Current document text does not parse.
    #[error("invalid document: {0}")]
    InvalidDocument(DocumentParseError),
    /// Neither an explicit target nor a usable initial screen exists.
    #[error("cannot determine target screen{}", target_suffix(.0.as_deref()))]
    MissingTargetScreen(Option<String>),
}

fn target_suffix(target: Option<&str>) -> String {
    target.map(|id| format!(" '{id}'")).unwrap_or_default()
}

impl From<SnippetError> for AppError {
    fn from(error: SnippetError) -> Self {
        match error {
            SnippetError::InvalidDocument(error) => error.into(),
            SnippetError::InvalidSnippet(_) => AppError::Validation(error.to_string()),
            SnippetError::MissingTargetScreen(_) => AppError::NotFound(error.to_string()),
        }
    }
}

/// Inserts snippet components into a screen of the document.
///
/// `snippet_text` holds one component object or an array of them. Every
/// inserted id, nested ids included, is rewritten to `{id}_{stamp}_{index}`
/// with `index` counting inserted nodes in pre-order; a `_{n}` suffix is added
/// when the rewritten id is still taken. Components are appended to
/// `target_screen_id`, falling back to the initial screen.
pub fn insert_snippet(
    document_text: &str,
    target_screen_id: Option<&str>,
    snippet_text: &str,
    stamp: i64,
) -> Result<AppDefinition, SnippetError> {
    let mut document =
        AppDefinition::parse(document_text).map_err(SnippetError::InvalidDocument)?;
    let mut components = parse_snippet(snippet_text)?;

    let target = target_screen_id
        .or(document.initial_screen())
        .map(ToOwned::to_owned);
    let Some(target) = target else {
        return Err(SnippetError::MissingTargetScreen(None));
    };
    if document.screen(target.as_str()).is_none() {
        return Err(SnippetError::MissingTargetScreen(Some(target)));
    }

    let mut taken = document.component_ids();
    let mut index = 0_usize;
    for component in &mut components {
        component.rewrite_ids(&mut |id| {
            let base = format!("{id}_{stamp}_{index}");
            index += 1;

            let mut candidate = base.clone();
            let mut attempt = 1_usize;
            while taken.contains(candidate.as_str()) {
                candidate = format!("{base}_{attempt}");
                attempt += 1;
            }
            taken.insert(candidate.clone());
            candidate
        });
    }

    let Some(screen) = document.screen_mut(target.as_str()) else {
        return Err(SnippetError::MissingTargetScreen(Some(target)));
    };
    screen.components_mut().extend(components);

    Ok(document)
}

fn parse_snippet(snippet_text: &str) -> Result<Vec<Component>, SnippetError> {
    let value: Value = serde_json::from_str(snippet_text)
        .map_err(|error| SnippetError::InvalidSnippet(error.to_string()))?;

    let components = match value {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value::<Component>)
            .collect::<Result<Vec<_>, _>>(),
        Value::Object(_) => serde_json::from_value::<Component>(value).map(|component| vec![component]),
        other => {
            return Err(SnippetError::InvalidSnippet(format!(
                "expected a component object or array, got {other}"
            )));
        }
    }
    .map_err(|error| SnippetError::InvalidSnippet(error.to_string()))?;

    if components.is_empty() {
        return Err(SnippetError::InvalidSnippet(
            "snippet contains no components".to_owned(),
        ));
    }

    Ok(components)
}
