use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tabscope_core::{CrawlState, LinkTarget, ProbeFailure, StartStatus, StateKind, TabId};
use tabscope_logging::{ts_debug, ts_info, ts_warn};
use tokio_util::sync::CancellationToken;

use crate::cache::TabRecordCache;
use crate::probe::Prober;
use crate::settings::CoordinatorSettings;
use crate::store::SessionRecords;

struct CrawlTask {
    generation: u64,
    token: CancellationToken,
}

struct Inner {
    records: TabRecordCache<CrawlState>,
    prober: Arc<dyn Prober>,
    crawl_delay: Duration,
    probe_timeout: Duration,
    tasks: Mutex<HashMap<TabId, CrawlTask>>,
    next_generation: AtomicU64,
}

/// Runs one probing task per tab, persisting progress after every link.
#[derive(Clone)]
pub struct CrawlScheduler {
    inner: Arc<Inner>,
}

impl CrawlScheduler {
    pub fn new(
        records: SessionRecords,
        prober: Arc<dyn Prober>,
        settings: &CoordinatorSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                records: TabRecordCache::new(StateKind::Crawl, records),
                prober,
                crawl_delay: settings.crawl_delay,
                probe_timeout: settings.probe_timeout,
                tasks: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TabId, CrawlTask>> {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds a crawl over `links` and spawns its task. Must be called from
    /// within a tokio runtime.
    pub async fn start(&self, tab_id: TabId, links: &[LinkTarget]) -> StartStatus {
        let prior = self.inner.records.load(tab_id).await;
        let state = match CrawlState::start(prior.as_ref(), links) {
            Ok(state) => state,
            Err(StartStatus::AlreadyRunning) => {
                // Persisted as running but nobody is probing: the process restarted
                // mid-crawl. Pick up at the stored cursor.
                if !self.is_active(tab_id) {
                    ts_info!("[crawl] tab {} resuming orphaned crawl", tab_id);
                    self.spawn(tab_id);
                }
                return StartStatus::AlreadyRunning;
            }
            Err(status) => {
                ts_warn!("[crawl] tab {} not started: {:?}", tab_id, status);
                return status;
            }
        };

        ts_info!(
            "[crawl] tab {} starting over {} links",
            tab_id,
            state.links.len()
        );
        self.inner.records.store(tab_id, &state).await;
        self.spawn(tab_id);
        StartStatus::Started
    }

    /// Current persisted snapshot, read past the cache.
    pub async fn status(&self, tab_id: TabId) -> CrawlState {
        self.inner
            .records
            .load_fresh(tab_id)
            .await
            .unwrap_or_else(CrawlState::idle)
    }

    pub fn is_active(&self, tab_id: TabId) -> bool {
        self.tasks()
            .get(&tab_id)
            .is_some_and(|task| !task.token.is_cancelled())
    }

    /// Signals the tab's task to stop. Returns whether a task was running.
    pub fn cancel(&self, tab_id: TabId) -> bool {
        match self.tasks().remove(&tab_id) {
            Some(task) => {
                ts_debug!("[crawl] tab {} cancelled", tab_id);
                task.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn forget(&self, tab_id: TabId) {
        self.inner.records.forget(tab_id);
    }

    pub fn forget_all(&self) {
        self.inner.records.forget_all();
    }

    fn spawn(&self, tab_id: TabId) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = self.tasks().insert(
            tab_id,
            CrawlTask {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run(tab_id, &token).await;
            scheduler.release(tab_id, generation);
        });
    }

    fn release(&self, tab_id: TabId, generation: u64) {
        let mut tasks = self.tasks();
        if tasks
            .get(&tab_id)
            .is_some_and(|task| task.generation == generation)
        {
            tasks.remove(&tab_id);
        }
    }

    async fn run(&self, tab_id: TabId, token: &CancellationToken) {
        let inner = &self.inner;
        loop {
            if token.is_cancelled() {
                return;
            }
            let Some(mut state) = inner.records.load(tab_id).await else {
                ts_debug!("[crawl] tab {} state gone, stopping", tab_id);
                return;
            };
            let Some(link) = state.current_link().cloned() else {
                if state.is_running {
                    state.halt();
                    inner.records.store(tab_id, &state).await;
                }
                return;
            };
            let index = state.current_index;

            let outcome =
                match tokio::time::timeout(inner.probe_timeout, inner.prober.probe(&link.href))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ProbeFailure::Timeout),
                };
            ts_debug!(
                "[crawl] tab {} link {} {} -> {:?}",
                tab_id,
                index,
                link.href,
                outcome
            );

            if token.is_cancelled() {
                ts_debug!("[crawl] tab {} cancelled, dropping probe result", tab_id);
                return;
            }
            let Some(mut state) = inner.records.load(tab_id).await else {
                return;
            };
            if !state.is_running || state.current_index != index {
                ts_debug!("[crawl] tab {} superseded while probing", tab_id);
                return;
            }
            state.record_probe(outcome);
            inner.records.store(tab_id, &state).await;

            if !state.is_running {
                ts_info!(
                    "[crawl] tab {} finished, {} results",
                    tab_id,
                    state.results.len()
                );
                return;
            }

            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(inner.crawl_delay) => {}
            }
        }
    }
}
