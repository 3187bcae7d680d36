use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Pause between two link probes of the same crawl.
    pub crawl_delay: Duration,
    /// Hard limit on a single probe.
    pub probe_timeout: Duration,
    /// Period of the stale-tab cleanup sweep.
    pub cleanup_interval: Duration,
    /// Wait before re-deriving the badge after a tab update, so navigation
    /// events for the same load land first.
    pub badge_settle_delay: Duration,
    pub user_agent: String,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            crawl_delay: Duration::from_millis(750),
            probe_timeout: Duration::from_secs(10),
            cleanup_interval: Duration::from_secs(15 * 60),
            badge_settle_delay: Duration::from_millis(250),
            user_agent: concat!("tabscope/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
