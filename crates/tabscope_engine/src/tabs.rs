use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tabscope_core::{Badge, BrowserEvent, Request, TabId, MAIN_FRAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: TabId,
    pub url: Option<String>,
}

/// The slice of the browser's tab API the coordinator relies on.
#[async_trait]
pub trait TabsApi: Send + Sync {
    async fn active_tab(&self) -> Option<TabInfo>;
    async fn tab_exists(&self, tab_id: TabId) -> bool;
    async fn open_tab_ids(&self) -> Vec<TabId>;
    async fn set_badge(&self, tab_id: TabId, badge: &Badge);
}

pub type BadgeSink = Box<dyn Fn(TabId, &Badge) + Send + Sync>;

#[derive(Default)]
struct RegistryState {
    open: BTreeMap<TabId, Option<String>>,
    active: Option<TabId>,
}

/// Tab model rebuilt from the tab events the host forwards.
///
/// Call [`TabRegistry::observe`] with every browser event, and
/// [`TabRegistry::observe_request`] with every request, before handing it to
/// the coordinator. A `tabsSnapshot` event replaces the open set.
pub struct TabRegistry {
    state: Mutex<RegistryState>,
    sink: BadgeSink,
}

impl TabRegistry {
    pub fn new(sink: BadgeSink) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            sink,
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn observe(&self, event: &BrowserEvent) {
        let mut state = self.state();
        match event {
            BrowserEvent::TabActivated { tab_id } => {
                state.open.entry(*tab_id).or_default();
                state.active = Some(*tab_id);
            }
            BrowserEvent::TabUpdated {
                tab_id,
                active,
                url,
                ..
            } => {
                let entry = state.open.entry(*tab_id).or_default();
                if url.is_some() {
                    entry.clone_from(url);
                }
                if *active {
                    state.active = Some(*tab_id);
                }
            }
            BrowserEvent::NavigationCommitted {
                tab_id,
                frame_id,
                url,
            } if *frame_id == MAIN_FRAME && *tab_id >= 0 => {
                state.open.insert(*tab_id, Some(url.clone()));
            }
            BrowserEvent::TabRemoved { tab_id } => {
                state.open.remove(tab_id);
                if state.active == Some(*tab_id) {
                    state.active = None;
                }
            }
            BrowserEvent::TabsSnapshot { tab_ids } => {
                let mut open = BTreeMap::new();
                for id in tab_ids {
                    let url = state.open.remove(id).flatten();
                    open.insert(*id, url);
                }
                state.open = open;
                if state.active.is_some_and(|id| !state.open.contains_key(&id)) {
                    state.active = None;
                }
            }
            // Any other event naming a tab means the tab is still there.
            _ => {
                if let Some(tab_id) = event.tab_id() {
                    state.open.entry(tab_id).or_default();
                }
            }
        }
    }

    /// Requests name the tab the UI is showing, so that tab is open.
    pub fn observe_request(&self, request: &Request) {
        if let Some(tab_id) = request.tab_id().filter(|id| *id >= 0) {
            self.state().open.entry(tab_id).or_default();
        }
    }
}

#[async_trait]
impl TabsApi for TabRegistry {
    async fn active_tab(&self) -> Option<TabInfo> {
        let state = self.state();
        let id = state.active?;
        Some(TabInfo {
            id,
            url: state.open.get(&id).cloned().flatten(),
        })
    }

    async fn tab_exists(&self, tab_id: TabId) -> bool {
        self.state().open.contains_key(&tab_id)
    }

    async fn open_tab_ids(&self) -> Vec<TabId> {
        self.state().open.keys().copied().collect()
    }

    async fn set_badge(&self, tab_id: TabId, badge: &Badge) {
        (self.sink)(tab_id, badge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TabRegistry {
        TabRegistry::new(Box::new(|_, _| {}))
    }

    #[tokio::test]
    async fn tracks_activation_urls_and_removal() {
        let tabs = registry();
        tabs.observe(&BrowserEvent::TabActivated { tab_id: 4 });
        tabs.observe(&BrowserEvent::NavigationCommitted {
            tab_id: 4,
            frame_id: MAIN_FRAME,
            url: "https://a.test/".into(),
        });
        tabs.observe(&BrowserEvent::TabUpdated {
            tab_id: 9,
            status: Some("loading".into()),
            active: false,
            url: None,
        });

        assert_eq!(
            tabs.active_tab().await,
            Some(TabInfo {
                id: 4,
                url: Some("https://a.test/".into())
            })
        );
        assert_eq!(tabs.open_tab_ids().await, vec![4, 9]);

        tabs.observe(&BrowserEvent::TabRemoved { tab_id: 4 });
        assert_eq!(tabs.active_tab().await, None);
        assert!(!tabs.tab_exists(4).await);
        assert!(tabs.tab_exists(9).await);
    }

    #[tokio::test]
    async fn tab_scoped_events_and_requests_keep_tabs_open() {
        let tabs = registry();
        tabs.observe(&BrowserEvent::NavigationErrorOccurred {
            tab_id: 7,
            frame_id: MAIN_FRAME,
            url: "http://x.test/".into(),
            error: "net::ERR_NAME_NOT_RESOLVED".into(),
        });
        tabs.observe(&BrowserEvent::HeadersReceived {
            tab_id: 8,
            frame_id: 2,
            url: "https://b.test/frame".into(),
            status_code: 200,
            response_headers: Vec::new(),
        });
        tabs.observe(&BrowserEvent::HeadersReceived {
            tab_id: -1,
            frame_id: MAIN_FRAME,
            url: "https://b.test/worker".into(),
            status_code: 200,
            response_headers: Vec::new(),
        });
        tabs.observe_request(&Request::GetPsiDataForTab { tab_id: 12 });
        tabs.observe_request(&Request::ContentScriptLoaded);

        assert_eq!(tabs.open_tab_ids().await, vec![7, 8, 12]);
    }

    #[tokio::test]
    async fn snapshot_replaces_open_set_and_keeps_urls() {
        let tabs = registry();
        tabs.observe(&BrowserEvent::TabUpdated {
            tab_id: 2,
            status: None,
            active: true,
            url: Some("https://a.test/".into()),
        });
        tabs.observe(&BrowserEvent::TabActivated { tab_id: 5 });

        tabs.observe(&BrowserEvent::TabsSnapshot {
            tab_ids: vec![2, 3],
        });

        assert_eq!(tabs.open_tab_ids().await, vec![2, 3]);
        assert_eq!(tabs.active_tab().await, None);
        tabs.observe(&BrowserEvent::TabActivated { tab_id: 2 });
        assert_eq!(
            tabs.active_tab().await.and_then(|tab| tab.url),
            Some("https://a.test/".into())
        );
    }
}
