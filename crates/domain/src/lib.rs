//! App definition document model and pure interpreter rules.

#![forbid(unsafe_code)]

mod action;
mod component;
mod document;
mod record;
mod snippet;
pub mod template;

pub use action::{
    Action, AuthLoginAction, AuthLogoutAction, AuthSignupAction, DeleteRecordAction,
    GoBackAction, LoginFields, NavigateAction, PopupAction, PopupButton, SubmitAction,
    SubmitTarget, UnsupportedAction,
};
pub use component::{Component, ComponentKind};
pub use document::{
    AUTH_SCREEN_PREFIX, AppDefinition, AppSettings, AuthConfig, DocumentParseError,
    FieldDefinition, Screen, TableSchema, is_auth_screen_id,
};
pub use record::{DataStoreSnapshot, RECORD_ID_FIELD, Record};
pub use snippet::{SnippetError, insert_snippet};
pub use template::TemplateContext;
