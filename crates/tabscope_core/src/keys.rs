use std::fmt;

use crate::TabId;

/// The kinds of per-tab records kept in the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Navigation,
    Crawl,
    Performance,
}

impl StateKind {
    pub const ALL: [StateKind; 3] = [StateKind::Navigation, StateKind::Crawl, StateKind::Performance];

    fn prefix(self) -> &'static str {
        match self {
            StateKind::Navigation => "nav",
            StateKind::Crawl => "crawl",
            StateKind::Performance => "psi",
        }
    }
}

/// Session store key: `<prefix>:<tabId>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub kind: StateKind,
    pub tab_id: TabId,
}

impl StateKey {
    pub fn new(kind: StateKind, tab_id: TabId) -> Self {
        Self { kind, tab_id }
    }

    pub fn navigation(tab_id: TabId) -> Self {
        Self::new(StateKind::Navigation, tab_id)
    }

    pub fn crawl(tab_id: TabId) -> Self {
        Self::new(StateKind::Crawl, tab_id)
    }

    pub fn performance(tab_id: TabId) -> Self {
        Self::new(StateKind::Performance, tab_id)
    }

    /// Every key that may hold state for `tab_id`.
    pub fn all_for(tab_id: TabId) -> [StateKey; 3] {
        StateKind::ALL.map(|kind| Self::new(kind, tab_id))
    }

    /// Parses a stored key. Unknown prefixes and malformed ids yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (prefix, id) = raw.split_once(':')?;
        let kind = StateKind::ALL
            .into_iter()
            .find(|kind| kind.prefix() == prefix)?;
        let tab_id = id.parse().ok()?;
        Some(Self { kind, tab_id })
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.tab_id)
    }
}
