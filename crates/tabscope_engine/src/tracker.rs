use tabscope_core::status::{STATUS_BAD_REDIRECT_TARGET, STATUS_MISSING_LOCATION};
use tabscope_core::{
    reconstruct, update, Effect, NavigationEvent, RedirectChain, StateKind, TabId,
    TabNavigationState,
};
use tabscope_logging::{ts_debug, ts_warn};

use crate::cache::TabRecordCache;
use crate::store::SessionRecords;

/// Outcome of applying one navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: Option<TabNavigationState>,
    pub effects: Vec<Effect>,
}

/// Owns the per-tab navigation records and their cache.
pub struct NavigationTracker {
    records: TabRecordCache<TabNavigationState>,
}

impl NavigationTracker {
    pub fn new(records: SessionRecords) -> Self {
        Self {
            records: TabRecordCache::new(StateKind::Navigation, records),
        }
    }

    /// Loads the tab's state and applies `event` to it. Nothing is written;
    /// the caller carries out the returned effects.
    pub async fn advance(&self, tab_id: TabId, event: NavigationEvent) -> Transition {
        let prior = match &event {
            // A commit never looks at what came before.
            NavigationEvent::Committed { .. } => None,
            _ => self.records.load(tab_id).await,
        };
        let had_prior = prior.is_some();
        let label = event_label(&event);
        let response_url = match &event {
            NavigationEvent::HeadersReceived { url, .. } => Some(url.clone()),
            _ => None,
        };
        let (state, effects) = update(prior, event);

        if let (Some(state), Some(url)) = (&state, &response_url) {
            if let Some(step) = state.step(url).filter(|step| is_bad_redirect(step.status_code)) {
                ts_warn!(
                    "[nav] tab {} {}: {}",
                    tab_id,
                    url,
                    step.error.as_deref().unwrap_or("unusable redirect")
                );
            }
        }

        if effects.is_empty() {
            if had_prior || label != "completed" {
                ts_debug!("[nav] tab {} ignored {} event", tab_id, label);
            } else {
                ts_warn!(
                    "[nav] tab {} completed without tracked navigation state",
                    tab_id
                );
            }
        } else if let Some(state) = &state {
            ts_debug!(
                "[nav] tab {} after {}: {} steps, completed={}",
                tab_id,
                label,
                state.request_details.len(),
                state.completed
            );
        }
        Transition { state, effects }
    }

    pub async fn persist(&self, tab_id: TabId, state: &TabNavigationState) {
        self.records.store(tab_id, state).await;
    }

    pub async fn state(&self, tab_id: TabId) -> Option<TabNavigationState> {
        self.records.load(tab_id).await
    }

    pub async fn redirect_chain(&self, tab_id: TabId) -> RedirectChain {
        let state = self.records.load(tab_id).await;
        let chain = reconstruct(state.as_ref());
        if state.is_none() {
            ts_debug!("[nav] tab {} has no navigation state to replay", tab_id);
        }
        chain
    }

    pub fn forget(&self, tab_id: TabId) {
        self.records.forget(tab_id);
    }

    pub fn forget_all(&self) {
        self.records.forget_all();
    }
}

fn is_bad_redirect(status: i32) -> bool {
    status == STATUS_BAD_REDIRECT_TARGET || status == STATUS_MISSING_LOCATION
}

fn event_label(event: &NavigationEvent) -> &'static str {
    match event {
        NavigationEvent::Committed { .. } => "committed",
        NavigationEvent::HeadersReceived { .. } => "headers",
        NavigationEvent::Completed { .. } => "completed",
        NavigationEvent::ErrorOccurred { .. } => "error",
    }
}
