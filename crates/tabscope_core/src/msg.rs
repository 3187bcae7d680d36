use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::RedirectChain;
use crate::crawl::StartStatus;
use crate::state::{CrawlState, LinkTarget};
use crate::TabId;

pub const PSI_SAVED: &str = "psi_saved";
pub const PSI_SAVE_ERROR: &str = "psi_save_error";
pub const PING_ACK: &str = "Background received ping";

/// Requests the UI layer and content collaborator send to the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    GetRedirectChain {
        tab_id: TabId,
    },
    StartCrawlingForTab {
        tab_id: TabId,
        #[serde(default)]
        links: Vec<LinkTarget>,
    },
    GetCrawlStatusForTab {
        tab_id: TabId,
    },
    SavePsiDataForTab {
        tab_id: TabId,
        psi_data: Value,
    },
    GetPsiDataForTab {
        tab_id: TabId,
    },
    ContentScriptLoaded,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::GetRedirectChain { .. } => "getRedirectChain",
            Request::StartCrawlingForTab { .. } => "startCrawlingForTab",
            Request::GetCrawlStatusForTab { .. } => "getCrawlStatusForTab",
            Request::SavePsiDataForTab { .. } => "savePsiDataForTab",
            Request::GetPsiDataForTab { .. } => "getPsiDataForTab",
            Request::ContentScriptLoaded => "contentScriptLoaded",
        }
    }

    pub fn tab_id(&self) -> Option<TabId> {
        match self {
            Request::GetRedirectChain { tab_id }
            | Request::StartCrawlingForTab { tab_id, .. }
            | Request::GetCrawlStatusForTab { tab_id }
            | Request::SavePsiDataForTab { tab_id, .. }
            | Request::GetPsiDataForTab { tab_id } => Some(*tab_id),
            Request::ContentScriptLoaded => None,
        }
    }
}

/// Coordinator replies, serialized to the shapes the UI layer expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    RedirectChain(RedirectChain),
    CrawlStarted {
        status: StartStatus,
    },
    CrawlStatus(CrawlState),
    PsiData {
        #[serde(rename = "psiData")]
        psi_data: Option<Value>,
    },
    Status {
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Response {
    pub fn status(status: impl Into<String>) -> Self {
        Response::Status {
            status: status.into(),
            error: None,
        }
    }
}
