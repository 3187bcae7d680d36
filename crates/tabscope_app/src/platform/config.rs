//! Host configuration read from `tabscope.ron`.
//!
//! Every field is optional. The file location defaults to `./tabscope.ron`
//! and can be overridden with the `TABSCOPE_CONFIG` environment variable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tabscope_engine::CoordinatorSettings;
use thiserror::Error;

const CONFIG_ENV: &str = "TABSCOPE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "./tabscope.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session_dir: PathBuf,
    /// A host start normally means the browser started, which ends the session.
    pub clear_session_on_start: bool,
    pub crawl_delay_ms: u64,
    pub probe_timeout_ms: u64,
    pub cleanup_interval_secs: u64,
    pub log_to_terminal: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = CoordinatorSettings::default();
        Self {
            session_dir: PathBuf::from("./tabscope-session"),
            clear_session_on_start: true,
            crawl_delay_ms: duration_millis(settings.crawl_delay),
            probe_timeout_ms: duration_millis(settings.probe_timeout),
            cleanup_interval_secs: settings.cleanup_interval.as_secs(),
            log_to_terminal: false,
        }
    }
}

impl AppConfig {
    pub fn settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            crawl_delay: Duration::from_millis(self.crawl_delay_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            cleanup_interval: Duration::from_secs(self.cleanup_interval_secs.max(1)),
            ..CoordinatorSettings::default()
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Reads the config at `path`. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
