use appdeck_domain::{AppDefinition, is_auth_screen_id};
use serde::Serialize;

/// Current position of the preview navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "screenId", rename_all = "camelCase")]
pub enum NavigationState {
    /// Nothing has been navigated yet; the initial screen applies.
    #[default]
    Unresolved,
    /// A screen id or `auth:` pseudo-screen id.
    OnScreen(String),
}

impl NavigationState {
    /// Returns the explicit current screen id.
    #[must_use]
    pub fn screen_id(&self) -> Option<&str> {
        match self {
            Self::Unresolved => None,
            Self::OnScreen(screen_id) => Some(screen_id.as_str()),
        }
    }
}

/// Outcome of resolving what the preview should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenResolution {
    /// Nothing can be shown yet.
    Waiting,
    /// An authentication pseudo-screen.
    AuthScreen(String),
    /// A document screen that may be rendered.
    Screen(String),
    /// A guarded screen is current without a session; navigation must move to
    /// the target before anything is shown.
    Redirect(String),
}

/// Resolves the screen to show without mutating anything.
///
/// A current id missing from the document falls back to the initial screen.
/// A screen requiring auth without a session yields [`ScreenResolution::Redirect`]
/// when a redirect screen is configured and [`ScreenResolution::Waiting`]
/// otherwise.
#[must_use]
pub fn resolve_screen(
    document: Option<&AppDefinition>,
    navigation: &NavigationState,
    has_session: bool,
) -> ScreenResolution {
    let Some(document) = document else {
        return ScreenResolution::Waiting;
    };

    let candidates = [navigation.screen_id(), document.initial_screen()];
    for screen_id in candidates.into_iter().flatten() {
        if is_auth_screen_id(screen_id) {
            return ScreenResolution::AuthScreen(screen_id.to_owned());
        }

        let Some(screen) = document.screen(screen_id) else {
            continue;
        };

        if screen.requires_auth() && !has_session {
            return match document
                .authentication()
                .and_then(|auth| auth.auth_redirect_screen())
            {
                Some(target) if target != screen_id => ScreenResolution::Redirect(target.to_owned()),
                _ => ScreenResolution::Waiting,
            };
        }

        return ScreenResolution::Screen(screen_id.to_owned());
    }

    ScreenResolution::Waiting
}
