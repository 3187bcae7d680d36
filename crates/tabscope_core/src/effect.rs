/// Side effects requested by the navigation `update` function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Drop every record held for the tab (navigation, crawl, performance cache)
    /// and stop any crawl in progress.
    DiscardTabState,
    /// Write the resulting navigation state to the session store.
    PersistNavigation,
    /// Re-derive the toolbar badge.
    RefreshBadge,
}
