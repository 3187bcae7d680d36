mod config;
mod host;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use log::LevelFilter;
use tabscope_engine::{
    Coordinator, CoordinatorHandle, FileSessionStore, ReqwestProber, SessionStore, TabRegistry,
};
use tabscope_logging::{ts_info, ts_warn, LogDestination};

use self::config::AppConfig;
use self::host::{Host, HostOutput};

const LOG_FILE: &str = "./tabscope.log";

/// Runs the native host until stdin closes.
pub fn run() -> anyhow::Result<()> {
    let config_path = config::config_path();
    let loaded = config::load(&config_path);
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let log_file = Path::new(LOG_FILE);
    let destination = if config.log_to_terminal {
        LogDestination::Both(log_file)
    } else {
        LogDestination::File(log_file)
    };
    tabscope_logging::initialize(destination, LevelFilter::Info);
    if let Err(err) = &loaded {
        ts_warn!("[config] {}; falling back to defaults", err);
    }
    ts_info!("[host] starting with {:?}", config);

    let store = open_store(&config)?;
    let settings = config.settings();
    let prober = ReqwestProber::new(settings.probe_timeout, &settings.user_agent)
        .context("building the HTTP client")?;

    let output = HostOutput::new(Box::new(io::stdout()));
    let tabs = Arc::new(TabRegistry::new(output.badge_sink()));
    let coordinator = Coordinator::new(store, tabs.clone(), Arc::new(prober), settings);
    let handle =
        CoordinatorHandle::spawn(coordinator).context("starting the coordinator thread")?;

    let host = Host::new(handle, tabs, output);
    let stdin = io::stdin();
    let served = host.serve(stdin.lock());
    host.shutdown();
    let forwarded = served.context("reading from stdin")?;
    ts_info!("[host] stdin closed after {} envelopes", forwarded);
    Ok(())
}

fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    let dir = config.session_dir.clone();
    let store = if config.clear_session_on_start {
        FileSessionStore::open_fresh(dir)
    } else {
        FileSessionStore::open(dir)
    }
    .with_context(|| format!("opening session directory {:?}", config.session_dir))?;
    Ok(Arc::new(store))
}
