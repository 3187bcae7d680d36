use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::STATUS_PENDING;

/// Browser tab identifier. Negative values mean "not associated with a tab".
pub type TabId = i32;

/// What is known about one URL visited during a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStepDetail {
    pub status_code: i32,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RequestStepDetail {
    pub fn pending() -> Self {
        Self {
            status_code: STATUS_PENDING,
            redirect_url: None,
            error: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status_code == STATUS_PENDING
    }
}

/// Redirect chain state for the current navigation of one tab.
///
/// `request_details` forms a chain: every URL has at most one `redirect_url`,
/// so replaying from `first_url` is deterministic (but may cycle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabNavigationState {
    pub first_url: String,
    #[serde(default)]
    pub request_details: BTreeMap<String, RequestStepDetail>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl TabNavigationState {
    /// Fresh state anchored at `url`, with that URL awaiting a response.
    pub fn begin(url: &str) -> Self {
        let mut request_details = BTreeMap::new();
        request_details.insert(url.to_string(), RequestStepDetail::pending());
        Self {
            first_url: url.to_string(),
            request_details,
            completed: false,
            error: None,
        }
    }

    pub fn step(&self, url: &str) -> Option<&RequestStepDetail> {
        self.request_details.get(url)
    }

    pub fn has_steps(&self) -> bool {
        !self.first_url.is_empty() && !self.request_details.is_empty()
    }

    /// Writes a step outcome unless the step has already settled.
    ///
    /// A step may only be overwritten while it is pending (or absent). Returns
    /// whether the write happened.
    pub fn settle_step(&mut self, url: &str, detail: RequestStepDetail) -> bool {
        match self.request_details.get(url) {
            Some(existing) if !existing.is_pending() => false,
            _ => {
                self.request_details.insert(url.to_string(), detail);
                true
            }
        }
    }

    /// Registers `url` as a known next hop awaiting its own response.
    pub fn expect_step(&mut self, url: &str) {
        self.request_details
            .entry(url.to_string())
            .or_insert_with(RequestStepDetail::pending);
    }
}

/// A link submitted for crawling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub href: String,
}

impl LinkTarget {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// Outcome of probing a single link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResult {
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// Progress of the background link crawl for one tab.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlState {
    pub is_running: bool,
    #[serde(default)]
    pub links: Vec<LinkTarget>,
    #[serde(default)]
    pub current_index: usize,
    #[serde(default)]
    pub results: BTreeMap<String, LinkResult>,
    #[serde(default)]
    pub error: Option<String>,
}
