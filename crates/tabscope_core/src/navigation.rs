use url::Url;

use crate::effect::Effect;
use crate::state::{RequestStepDetail, TabNavigationState};
use crate::status::{
    is_redirect, INFERRED_SUCCESS, STATUS_BAD_REDIRECT_TARGET, STATUS_MISSING_LOCATION,
    STATUS_NAVIGATION_ERROR,
};

/// Navigation error codes that are not real failures (user abort, blocked by an extension).
pub const IGNORED_NAVIGATION_ERRORS: [&str; 2] = ["net::ERR_ABORTED", "net::ERR_BLOCKED_BY_CLIENT"];

/// Main-frame navigation lifecycle events for a single tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Committed {
        url: String,
    },
    HeadersReceived {
        url: String,
        status_code: i32,
        /// Raw value of the redirect target header, if any.
        location: Option<String>,
    },
    Completed {
        url: String,
    },
    ErrorOccurred {
        url: String,
        error: String,
    },
}

pub fn is_ignored_error(error: &str) -> bool {
    IGNORED_NAVIGATION_ERRORS.contains(&error)
}

/// Pure update function: applies a navigation event to a tab's prior state.
///
/// Returns the next state (`None` when there is still nothing to track) and the
/// effects the caller must carry out, in order.
pub fn update(
    prior: Option<TabNavigationState>,
    event: NavigationEvent,
) -> (Option<TabNavigationState>, Vec<Effect>) {
    match event {
        NavigationEvent::Committed { url } => (
            Some(TabNavigationState::begin(&url)),
            vec![
                Effect::DiscardTabState,
                Effect::PersistNavigation,
                Effect::RefreshBadge,
            ],
        ),
        NavigationEvent::HeadersReceived {
            url,
            status_code,
            location,
        } => {
            // A completed state means this response starts a new logical navigation
            // whose commit we have not seen.
            let mut state = match prior {
                Some(state) if !state.completed && state.has_steps() => state,
                _ => TabNavigationState::begin(&url),
            };
            record_response(&mut state, &url, status_code, location.as_deref());
            (
                Some(state),
                vec![Effect::PersistNavigation, Effect::RefreshBadge],
            )
        }
        NavigationEvent::Completed { url } => {
            let Some(mut state) = prior else {
                return (None, Vec::new());
            };
            if state.error.is_none() {
                state.settle_step(
                    &url,
                    RequestStepDetail {
                        status_code: INFERRED_SUCCESS,
                        redirect_url: None,
                        error: None,
                    },
                );
            }
            state.completed = true;
            (
                Some(state),
                vec![Effect::PersistNavigation, Effect::RefreshBadge],
            )
        }
        NavigationEvent::ErrorOccurred { url, error } => {
            if is_ignored_error(&error) {
                return (prior, Vec::new());
            }
            // Same rule as for responses: a finished navigation is not extended.
            let mut state = match prior {
                Some(state) if !state.completed && state.has_steps() => state,
                _ => TabNavigationState::begin(&url),
            };
            let marked = state.settle_step(
                &url,
                RequestStepDetail {
                    status_code: STATUS_NAVIGATION_ERROR,
                    redirect_url: None,
                    error: Some(error.clone()),
                },
            );
            if !marked {
                if let Some(step) = state.request_details.get_mut(&url) {
                    step.error.get_or_insert_with(|| error.clone());
                }
            }
            state.error = Some(error);
            state.completed = true;
            (
                Some(state),
                vec![Effect::PersistNavigation, Effect::RefreshBadge],
            )
        }
    }
}

fn record_response(
    state: &mut TabNavigationState,
    url: &str,
    status_code: i32,
    location: Option<&str>,
) {
    let detail = if is_redirect(status_code) {
        match location {
            Some(raw) => match resolve_redirect(url, raw) {
                Some(target) => RequestStepDetail {
                    status_code,
                    redirect_url: Some(target),
                    error: None,
                },
                None => RequestStepDetail {
                    status_code: STATUS_BAD_REDIRECT_TARGET,
                    redirect_url: None,
                    error: Some(format!("Redirect URL parse error: {raw}")),
                },
            },
            None => RequestStepDetail {
                status_code: STATUS_MISSING_LOCATION,
                redirect_url: None,
                error: Some(format!(
                    "Redirect status {status_code} but no Location header."
                )),
            },
        }
    } else {
        RequestStepDetail {
            status_code,
            redirect_url: None,
            error: None,
        }
    };

    let target = detail.redirect_url.clone();
    if state.settle_step(url, detail) {
        if let Some(target) = target {
            state.expect_step(&target);
        }
    }
}

/// Resolves a redirect target against the URL that produced it.
pub fn resolve_redirect(request_url: &str, location: &str) -> Option<String> {
    let resolved = match Url::parse(request_url) {
        Ok(base) => base.join(location),
        Err(_) => Url::parse(location),
    };
    resolved.ok().map(String::from)
}
