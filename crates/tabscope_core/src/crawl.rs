use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::state::{CrawlState, LinkResult, LinkTarget};

/// Reply to a crawl start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartStatus {
    Started,
    AlreadyRunning,
    NoValidLinks,
}

/// Why a link probe produced no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    Timeout,
    /// Connection, DNS or malformed URL.
    Network,
    Other,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => write!(f, "Timeout"),
            ProbeFailure::Network => write!(f, "Net/URL Err"),
            ProbeFailure::Other => write!(f, "Fetch Err"),
        }
    }
}

/// Keeps only absolute `http`/`https` links, in their original order.
pub fn crawlable_links(links: &[LinkTarget]) -> Vec<LinkTarget> {
    links
        .iter()
        .filter(|link| {
            Url::parse(&link.href)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false)
        })
        .map(|link| LinkTarget::new(link.href.clone()))
        .collect()
}

impl CrawlState {
    /// Snapshot returned when a tab has no crawl.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Starts a crawl over `links`, unless one is already running for the tab
    /// or none of the links can be probed.
    pub fn start(prior: Option<&CrawlState>, links: &[LinkTarget]) -> Result<Self, StartStatus> {
        if prior.is_some_and(|state| state.is_running) {
            return Err(StartStatus::AlreadyRunning);
        }
        let links = crawlable_links(links);
        if links.is_empty() {
            return Err(StartStatus::NoValidLinks);
        }
        Ok(Self {
            is_running: true,
            links,
            current_index: 0,
            results: Default::default(),
            error: None,
        })
    }

    /// The link the next probe should target, while the crawl is running.
    pub fn current_link(&self) -> Option<&LinkTarget> {
        if !self.is_running {
            return None;
        }
        self.links.get(self.current_index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.links.len()
    }

    /// Records the outcome for the current link and advances the cursor.
    ///
    /// Returns `false` without changing anything if there is no current link.
    pub fn record_probe(&mut self, outcome: Result<u16, ProbeFailure>) -> bool {
        let Some(link) = self.current_link() else {
            return false;
        };
        let url = link.href.clone();
        let result = match outcome {
            Ok(status) => LinkResult {
                status: Some(status),
                error: None,
            },
            Err(failure) => LinkResult {
                status: None,
                error: Some(failure.to_string()),
            },
        };
        self.results.insert(url, result);
        self.current_index += 1;
        if self.is_exhausted() {
            self.is_running = false;
        }
        true
    }

    /// Stops the crawl without touching the cursor or results.
    pub fn halt(&mut self) {
        self.is_running = false;
    }
}
