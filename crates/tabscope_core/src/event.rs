use serde::{Deserialize, Serialize};

use crate::navigation::NavigationEvent;
use crate::TabId;

/// Frame id the browser assigns to a tab's top-level document.
pub const MAIN_FRAME: i32 = 0;

/// Name of the periodic alarm that triggers the cleanup sweep.
pub const CLEANUP_ALARM: &str = "tabDataCleanup";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Platform events consumed by the background coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BrowserEvent {
    HeadersReceived {
        tab_id: TabId,
        frame_id: i32,
        url: String,
        status_code: i32,
        #[serde(default)]
        response_headers: Vec<HttpHeader>,
    },
    NavigationCommitted {
        tab_id: TabId,
        frame_id: i32,
        url: String,
    },
    NavigationCompleted {
        tab_id: TabId,
        frame_id: i32,
        url: String,
    },
    NavigationErrorOccurred {
        tab_id: TabId,
        frame_id: i32,
        url: String,
        error: String,
    },
    TabActivated {
        tab_id: TabId,
    },
    TabUpdated {
        tab_id: TabId,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        active: bool,
        #[serde(default)]
        url: Option<String>,
    },
    TabRemoved {
        tab_id: TabId,
    },
    /// Every tab the browser reports as open, from a full tab query.
    TabsSnapshot {
        tab_ids: Vec<TabId>,
    },
    AlarmFired {
        name: String,
    },
    /// Browser (re)started the background process.
    Startup,
}

impl BrowserEvent {
    /// The tab this event belongs to, if it names a real tab.
    pub fn tab_id(&self) -> Option<TabId> {
        let tab_id = match self {
            BrowserEvent::HeadersReceived { tab_id, .. }
            | BrowserEvent::NavigationCommitted { tab_id, .. }
            | BrowserEvent::NavigationCompleted { tab_id, .. }
            | BrowserEvent::NavigationErrorOccurred { tab_id, .. }
            | BrowserEvent::TabActivated { tab_id }
            | BrowserEvent::TabUpdated { tab_id, .. }
            | BrowserEvent::TabRemoved { tab_id } => *tab_id,
            _ => return None,
        };
        (tab_id >= 0).then_some(tab_id)
    }

    /// The navigation-tracking view of this event, for main-frame events of real tabs.
    pub fn navigation(&self) -> Option<(TabId, NavigationEvent)> {
        let (tab_id, frame_id, event) = match self {
            BrowserEvent::HeadersReceived {
                tab_id,
                frame_id,
                url,
                status_code,
                response_headers,
            } => (
                *tab_id,
                *frame_id,
                NavigationEvent::HeadersReceived {
                    url: url.clone(),
                    status_code: *status_code,
                    location: location_header(response_headers),
                },
            ),
            BrowserEvent::NavigationCommitted {
                tab_id,
                frame_id,
                url,
            } => (
                *tab_id,
                *frame_id,
                NavigationEvent::Committed { url: url.clone() },
            ),
            BrowserEvent::NavigationCompleted {
                tab_id,
                frame_id,
                url,
            } => (
                *tab_id,
                *frame_id,
                NavigationEvent::Completed { url: url.clone() },
            ),
            BrowserEvent::NavigationErrorOccurred {
                tab_id,
                frame_id,
                url,
                error,
            } => (
                *tab_id,
                *frame_id,
                NavigationEvent::ErrorOccurred {
                    url: url.clone(),
                    error: error.clone(),
                },
            ),
            _ => return None,
        };
        if frame_id != MAIN_FRAME || tab_id < 0 {
            return None;
        }
        Some((tab_id, event))
    }
}

fn location_header(headers: &[HttpHeader]) -> Option<String> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case("location"))
        .and_then(|header| header.value.clone())
        .filter(|value| !value.is_empty())
}
