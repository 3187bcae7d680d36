use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tabscope_core::{StateKey, TabId};
use tabscope_logging::{ts_error, ts_info};

use crate::store::SessionStore;
use crate::tabs::TabsApi;

/// Periodic sweep that deletes records of tabs that are no longer open.
pub struct CleanupSupervisor {
    store: Arc<dyn SessionStore>,
    tabs: Arc<dyn TabsApi>,
}

impl CleanupSupervisor {
    pub fn new(store: Arc<dyn SessionStore>, tabs: Arc<dyn TabsApi>) -> Self {
        Self { store, tabs }
    }

    /// Removes every `nav:`/`crawl:`/`psi:` key whose tab is closed and returns
    /// the ids of those tabs. Keys outside the three prefixes are left alone.
    pub async fn sweep(&self) -> BTreeSet<TabId> {
        let open: HashSet<TabId> = self.tabs.open_tab_ids().await.into_iter().collect();
        let keys = match self.store.keys().await {
            Ok(keys) => keys,
            Err(err) => {
                ts_error!("[cleanup] failed to list session keys: {}", err);
                return BTreeSet::new();
            }
        };

        let mut stale_tabs = BTreeSet::new();
        let stale_keys: Vec<String> = keys
            .into_iter()
            .filter(|raw| match StateKey::parse(raw) {
                Some(key) if !open.contains(&key.tab_id) => {
                    stale_tabs.insert(key.tab_id);
                    true
                }
                _ => false,
            })
            .collect();

        if stale_keys.is_empty() {
            return stale_tabs;
        }
        if let Err(err) = self.store.remove(&stale_keys).await {
            ts_error!("[cleanup] failed to remove stale keys: {}", err);
            return BTreeSet::new();
        }
        ts_info!(
            "[cleanup] removed {} keys for {} closed tabs",
            stale_keys.len(),
            stale_tabs.len()
        );
        stale_tabs
    }
}
