//! Tabscope core: per-tab navigation and crawl state, redirect chain
//! reconstruction and badge derivation. Pure, no I/O.
mod badge;
mod chain;
mod crawl;
mod effect;
mod event;
mod keys;
mod msg;
mod navigation;
mod state;
pub mod status;

pub use badge::{derive_badge, is_internal_page, Badge, BadgeColor};
pub use chain::{priority_status, reconstruct, ChainEnd, ChainStep, RedirectChain, NO_STATE_ERROR};
pub use crawl::{crawlable_links, ProbeFailure, StartStatus};
pub use effect::Effect;
pub use event::{BrowserEvent, HttpHeader, CLEANUP_ALARM, MAIN_FRAME};
pub use keys::{StateKey, StateKind};
pub use msg::{Request, Response, PING_ACK, PSI_SAVED, PSI_SAVE_ERROR};
pub use navigation::{is_ignored_error, resolve_redirect, update, NavigationEvent};
pub use state::{CrawlState, LinkResult, LinkTarget, RequestStepDetail, TabId, TabNavigationState};
