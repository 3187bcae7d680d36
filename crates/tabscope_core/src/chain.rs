//! Redirect chain reconstruction.
//!
//! Replays a tab's recorded steps from `first_url`, following `redirect_url`
//! links, and summarises the outcome. This never fails: every inconsistency in
//! the stored data is reported through a sentinel status.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::state::TabNavigationState;
use crate::status::{
    is_redirect, MAX_REDIRECT_HOPS, STATUS_LOOP, STATUS_MISSING_STEP, STATUS_NAVIGATION_ERROR,
    STATUS_UNKNOWN,
};

pub const NO_STATE_ERROR: &str = "No navigation data recorded for this tab";
const LOOP_ERROR: &str = "Loop detected";
const HOP_LIMIT_ERROR: &str = "Redirect limit reached";
const MISSING_STEP_ERROR: &str = "Missing step details";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStep {
    pub url: String,
    pub status: i32,
    pub error: Option<String>,
}

/// Why the replay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainEnd {
    /// Reached a step with no further redirect.
    #[default]
    Complete,
    /// A URL was revisited.
    Loop,
    /// `MAX_REDIRECT_HOPS` steps were replayed and the chain still continued.
    HopLimit,
    /// A referenced step had no recorded details.
    MissingStep,
    /// There was nothing to replay.
    NoState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectChain {
    pub chain: Vec<ChainStep>,
    pub completed: bool,
    pub error: Option<String>,
    pub final_status: i32,
    #[serde(skip)]
    pub end: ChainEnd,
}

impl RedirectChain {
    fn without_steps(completed: bool, error: Option<String>) -> Self {
        let final_status = if error.is_some() {
            STATUS_NAVIGATION_ERROR
        } else {
            STATUS_UNKNOWN
        };
        Self {
            chain: Vec::new(),
            completed,
            error: Some(error.unwrap_or_else(|| NO_STATE_ERROR.to_string())),
            final_status,
            end: ChainEnd::NoState,
        }
    }
}

/// `final_status` precedence: navigation error, then loop or hop limit, then the
/// first redirect-class status.
pub fn reconstruct(state: Option<&TabNavigationState>) -> RedirectChain {
    let Some(state) = state else {
        return RedirectChain::without_steps(false, None);
    };
    if state.first_url.is_empty() {
        return RedirectChain::without_steps(state.completed, state.error.clone());
    }

    let mut chain: Vec<ChainStep> = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(state.first_url.clone());
    let mut end = ChainEnd::Complete;

    while let Some(url) = current.take() {
        if chain.len() == MAX_REDIRECT_HOPS {
            end = ChainEnd::HopLimit;
            break;
        }
        if !visited.insert(url.clone()) {
            end = ChainEnd::Loop;
            break;
        }
        match state.step(&url) {
            Some(detail) => {
                current = detail.redirect_url.clone();
                chain.push(ChainStep {
                    url,
                    status: detail.status_code,
                    error: detail.error.clone(),
                });
            }
            None => {
                chain.push(ChainStep {
                    url,
                    status: STATUS_MISSING_STEP,
                    error: Some(MISSING_STEP_ERROR.to_string()),
                });
                end = ChainEnd::MissingStep;
            }
        }
    }

    let marker = match end {
        ChainEnd::Loop => Some(LOOP_ERROR),
        ChainEnd::HopLimit => Some(HOP_LIMIT_ERROR),
        _ => None,
    };
    if let (Some(message), Some(last)) = (marker, chain.last_mut()) {
        last.status = STATUS_LOOP;
        last.error = Some(message.to_string());
    }

    let final_status = if state.error.is_some() {
        STATUS_NAVIGATION_ERROR
    } else if marker.is_some() {
        STATUS_LOOP
    } else {
        priority_status(&chain)
    };

    RedirectChain {
        chain,
        completed: state.completed,
        error: state.error.clone(),
        final_status,
        end,
    }
}

/// The status that best describes a chain: the first redirect if the page
/// redirected at all, otherwise the status of the last step.
pub fn priority_status(chain: &[ChainStep]) -> i32 {
    chain
        .iter()
        .map(|step| step.status)
        .find(|status| is_redirect(*status))
        .or_else(|| chain.last().map(|step| step.status))
        .unwrap_or(STATUS_UNKNOWN)
}
