#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use tabscope_core::{Badge, BrowserEvent, HttpHeader, ProbeFailure, TabId, MAIN_FRAME};
use tabscope_engine::{
    Coordinator, CoordinatorSettings, MemorySessionStore, Prober, SessionStore, TabInfo, TabsApi,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tabscope_logging::initialize_for_tests);
}

#[derive(Default)]
struct FakeTabsState {
    open: Vec<TabId>,
    active: Option<TabInfo>,
    badges: Vec<(TabId, Badge)>,
}

/// Tab API double that records every badge it is asked to show.
#[derive(Default)]
pub struct FakeTabs {
    state: Mutex<FakeTabsState>,
}

impl FakeTabs {
    pub fn with_open(ids: &[TabId]) -> Arc<Self> {
        let tabs = Self::default();
        tabs.state.lock().unwrap().open = ids.to_vec();
        Arc::new(tabs)
    }

    pub fn activate(&self, id: TabId, url: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        if !state.open.contains(&id) {
            state.open.push(id);
        }
        state.active = Some(TabInfo {
            id,
            url: url.map(str::to_string),
        });
    }

    pub fn close(&self, id: TabId) {
        let mut state = self.state.lock().unwrap();
        state.open.retain(|open| *open != id);
        if state.active.as_ref().is_some_and(|tab| tab.id == id) {
            state.active = None;
        }
    }

    pub fn badges(&self) -> Vec<(TabId, Badge)> {
        self.state.lock().unwrap().badges.clone()
    }

    pub fn last_badge(&self, id: TabId) -> Option<Badge> {
        self.badges()
            .into_iter()
            .rev()
            .find(|(tab, _)| *tab == id)
            .map(|(_, badge)| badge)
    }
}

#[async_trait]
impl TabsApi for FakeTabs {
    async fn active_tab(&self) -> Option<TabInfo> {
        self.state.lock().unwrap().active.clone()
    }

    async fn tab_exists(&self, tab_id: TabId) -> bool {
        self.state.lock().unwrap().open.contains(&tab_id)
    }

    async fn open_tab_ids(&self) -> Vec<TabId> {
        self.state.lock().unwrap().open.clone()
    }

    async fn set_badge(&self, tab_id: TabId, badge: &Badge) {
        self.state
            .lock()
            .unwrap()
            .badges
            .push((tab_id, badge.clone()));
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ProbeReply {
    Status(u16),
    Fail(ProbeFailure),
    /// Never answers; only the scheduler's timeout ends the probe.
    Hang,
}

/// Prober double answering from a fixed table; unknown URLs get 200.
#[derive(Default)]
pub struct FakeProber {
    replies: HashMap<String, ProbeReply>,
    calls: Mutex<Vec<String>>,
}

impl FakeProber {
    pub fn new(replies: &[(&str, ProbeReply)]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies
                .iter()
                .map(|(url, reply)| (url.to_string(), *reply))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, url: &str) -> Result<u16, ProbeFailure> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.replies.get(url).copied() {
            Some(ProbeReply::Status(status)) => Ok(status),
            Some(ProbeReply::Fail(failure)) => Err(failure),
            Some(ProbeReply::Hang) => std::future::pending().await,
            None => Ok(200),
        }
    }
}

pub fn test_settings() -> CoordinatorSettings {
    CoordinatorSettings {
        crawl_delay: Duration::from_millis(750),
        probe_timeout: Duration::from_secs(10),
        cleanup_interval: Duration::from_secs(15 * 60),
        badge_settle_delay: Duration::from_millis(250),
        user_agent: "tabscope-tests".to_string(),
    }
}

pub struct Harness {
    pub coordinator: Coordinator,
    pub store: Arc<MemorySessionStore>,
    pub tabs: Arc<FakeTabs>,
    pub prober: Arc<FakeProber>,
}

impl Harness {
    pub fn new(tabs: Arc<FakeTabs>, prober: Arc<FakeProber>) -> Self {
        init_logging();
        let store = Arc::new(MemorySessionStore::new());
        let coordinator = Coordinator::new(
            store.clone(),
            tabs.clone(),
            prober.clone(),
            test_settings(),
        );
        Self {
            coordinator,
            store,
            tabs,
            prober,
        }
    }

    pub async fn send(&self, event: BrowserEvent) {
        self.coordinator.handle_event(event).await;
    }

    pub async fn stored_keys(&self) -> Vec<String> {
        let mut keys = self.store.keys().await.unwrap();
        keys.sort();
        keys
    }
}

pub fn committed(tab_id: TabId, url: &str) -> BrowserEvent {
    BrowserEvent::NavigationCommitted {
        tab_id,
        frame_id: MAIN_FRAME,
        url: url.to_string(),
    }
}

pub fn headers(tab_id: TabId, url: &str, status_code: i32, location: Option<&str>) -> BrowserEvent {
    BrowserEvent::HeadersReceived {
        tab_id,
        frame_id: MAIN_FRAME,
        url: url.to_string(),
        status_code,
        response_headers: location
            .map(|target| vec![HttpHeader::new("Location", target)])
            .unwrap_or_default(),
    }
}

pub fn completed(tab_id: TabId, url: &str) -> BrowserEvent {
    BrowserEvent::NavigationCompleted {
        tab_id,
        frame_id: MAIN_FRAME,
        url: url.to_string(),
    }
}

pub fn failed(tab_id: TabId, url: &str, error: &str) -> BrowserEvent {
    BrowserEvent::NavigationErrorOccurred {
        tab_id,
        frame_id: MAIN_FRAME,
        url: url.to_string(),
        error: error.to_string(),
    }
}
