use std::sync::Arc;

use tabscope_core::{derive_badge, is_internal_page, Badge, TabId, TabNavigationState};
use tabscope_logging::ts_debug;

use crate::tabs::TabsApi;

/// Applies derived badges to the browser's toolbar.
pub struct BadgePresenter {
    tabs: Arc<dyn TabsApi>,
}

impl BadgePresenter {
    pub fn new(tabs: Arc<dyn TabsApi>) -> Self {
        Self { tabs }
    }

    /// Re-renders the badge if `tab_id` is the active tab. For any other tab
    /// this only checks that the tab still exists.
    pub async fn refresh(&self, tab_id: TabId, state: Option<&TabNavigationState>) {
        if tab_id < 0 {
            return;
        }
        let active = self.tabs.active_tab().await;
        let Some(active) = active.filter(|tab| tab.id == tab_id) else {
            if !self.tabs.tab_exists(tab_id).await {
                ts_debug!("[badge] tab {} is gone, nothing to render", tab_id);
            }
            return;
        };

        let badge = match active.url.as_deref() {
            Some(url) if is_internal_page(url) => Badge::cleared(),
            _ => derive_badge(state),
        };
        ts_debug!("[badge] tab {} -> {:?} {}", tab_id, badge.text, badge.color.hex());
        self.tabs.set_badge(tab_id, &badge).await;
    }
}
