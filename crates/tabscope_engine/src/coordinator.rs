//! Background coordinator: routes browser events and UI requests to the
//! tracker, crawl scheduler, badge presenter and cleanup sweep.

use std::sync::Arc;

use serde_json::Value;
use tabscope_core::{
    BrowserEvent, CrawlState, Effect, LinkTarget, NavigationEvent, RedirectChain, Request,
    Response, StartStatus, StateKey, StateKind, TabId, CLEANUP_ALARM, PING_ACK, PSI_SAVED,
    PSI_SAVE_ERROR,
};
use tabscope_logging::{ts_debug, ts_info, ts_warn};

use crate::badge::BadgePresenter;
use crate::cache::TabRecordCache;
use crate::cleanup::CleanupSupervisor;
use crate::probe::Prober;
use crate::scheduler::CrawlScheduler;
use crate::settings::CoordinatorSettings;
use crate::store::{SessionRecords, SessionStore};
use crate::tabs::TabsApi;
use crate::tracker::{NavigationTracker, Transition};

pub struct Coordinator {
    settings: CoordinatorSettings,
    records: SessionRecords,
    tracker: NavigationTracker,
    crawler: CrawlScheduler,
    performance: TabRecordCache<Value>,
    badges: BadgePresenter,
    cleanup: CleanupSupervisor,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        tabs: Arc<dyn TabsApi>,
        prober: Arc<dyn Prober>,
        settings: CoordinatorSettings,
    ) -> Self {
        let records = SessionRecords::new(store.clone());
        Self {
            tracker: NavigationTracker::new(records.clone()),
            crawler: CrawlScheduler::new(records.clone(), prober, &settings),
            performance: TabRecordCache::new(StateKind::Performance, records.clone()),
            badges: BadgePresenter::new(tabs.clone()),
            cleanup: CleanupSupervisor::new(store, tabs),
            records,
            settings,
        }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub async fn handle_event(&self, event: BrowserEvent) {
        if let Some((tab_id, navigation)) = event.navigation() {
            self.on_navigation(tab_id, navigation).await;
            return;
        }
        match event {
            BrowserEvent::TabActivated { tab_id } => self.on_tab_activated(tab_id).await,
            BrowserEvent::TabUpdated {
                tab_id,
                status,
                active,
                ..
            } => self.on_tab_updated(tab_id, status.as_deref(), active).await,
            BrowserEvent::TabRemoved { tab_id } => self.on_tab_removed(tab_id).await,
            BrowserEvent::AlarmFired { name } => self.on_alarm(&name).await,
            BrowserEvent::Startup => self.on_startup(),
            BrowserEvent::TabsSnapshot { tab_ids } => {
                ts_debug!("[tabs] snapshot of {} open tabs", tab_ids.len())
            }
            // Sub-frame and tab-less navigation events.
            _ => {}
        }
    }

    pub async fn handle_request(&self, request: Request) -> Response {
        ts_debug!("[msg] {}", request.action());
        match request {
            Request::GetRedirectChain { tab_id } => {
                Response::RedirectChain(self.redirect_chain(tab_id).await)
            }
            Request::StartCrawlingForTab { tab_id, links } => Response::CrawlStarted {
                status: self.start_crawl(tab_id, &links).await,
            },
            Request::GetCrawlStatusForTab { tab_id } => {
                Response::CrawlStatus(self.crawl_status(tab_id).await)
            }
            Request::SavePsiDataForTab { tab_id, psi_data } => {
                self.save_performance(tab_id, psi_data).await
            }
            Request::GetPsiDataForTab { tab_id } => Response::PsiData {
                psi_data: self.performance.load(tab_id).await,
            },
            Request::ContentScriptLoaded => Response::status(PING_ACK),
        }
    }

    async fn on_navigation(&self, tab_id: TabId, event: NavigationEvent) {
        if let NavigationEvent::Committed { url } = &event {
            ts_info!("[nav] tab {} committed {}", tab_id, url);
        }
        let Transition { state, effects } = self.tracker.advance(tab_id, event).await;
        for effect in effects {
            match effect {
                Effect::DiscardTabState => self.discard_tab(tab_id).await,
                Effect::PersistNavigation => {
                    if let Some(state) = &state {
                        self.tracker.persist(tab_id, state).await;
                    }
                }
                Effect::RefreshBadge => self.badges.refresh(tab_id, state.as_ref()).await,
            }
        }
    }

    async fn on_tab_activated(&self, tab_id: TabId) {
        let state = self.tracker.state(tab_id).await;
        self.badges.refresh(tab_id, state.as_ref()).await;
    }

    async fn on_tab_updated(&self, tab_id: TabId, status: Option<&str>, active: bool) {
        if !active || !matches!(status, Some("loading" | "complete")) {
            return;
        }
        tokio::time::sleep(self.settings.badge_settle_delay).await;
        let state = self.tracker.state(tab_id).await;
        self.badges.refresh(tab_id, state.as_ref()).await;
    }

    async fn on_tab_removed(&self, tab_id: TabId) {
        ts_info!("[tabs] tab {} closed, dropping its records", tab_id);
        self.discard_tab(tab_id).await;
    }

    async fn on_alarm(&self, name: &str) {
        if name != CLEANUP_ALARM {
            ts_warn!("[alarm] ignoring unknown alarm {:?}", name);
            return;
        }
        for tab_id in self.cleanup.sweep().await {
            self.crawler.cancel(tab_id);
            self.forget_tab(tab_id);
        }
    }

    fn on_startup(&self) {
        ts_info!("[coordinator] startup, dropping in-memory caches");
        self.tracker.forget_all();
        self.crawler.forget_all();
        self.performance.forget_all();
    }

    async fn redirect_chain(&self, tab_id: TabId) -> RedirectChain {
        self.tracker.redirect_chain(tab_id).await
    }

    async fn start_crawl(&self, tab_id: TabId, links: &[LinkTarget]) -> StartStatus {
        self.crawler.start(tab_id, links).await
    }

    async fn crawl_status(&self, tab_id: TabId) -> CrawlState {
        self.crawler.status(tab_id).await
    }

    async fn save_performance(&self, tab_id: TabId, data: Value) -> Response {
        match self.performance.try_store(tab_id, &data).await {
            Ok(()) => Response::status(PSI_SAVED),
            Err(err) => {
                ts_warn!("[psi] tab {} save failed: {}", tab_id, err);
                Response::Status {
                    status: PSI_SAVE_ERROR.to_string(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// Stops the tab's crawl and deletes all three of its records.
    async fn discard_tab(&self, tab_id: TabId) {
        self.crawler.cancel(tab_id);
        self.forget_tab(tab_id);
        self.records.remove(&StateKey::all_for(tab_id)).await;
    }

    fn forget_tab(&self, tab_id: TabId) {
        self.tracker.forget(tab_id);
        self.crawler.forget(tab_id);
        self.performance.forget(tab_id);
    }
}
