//! Tabscope engine: session storage, probing and the background coordinator.
mod badge;
mod cache;
mod cleanup;
mod coordinator;
mod file_store;
mod handle;
mod persist;
mod probe;
mod scheduler;
mod settings;
mod store;
mod tabs;
mod tracker;

pub use badge::BadgePresenter;
pub use cache::TabRecordCache;
pub use cleanup::CleanupSupervisor;
pub use coordinator::Coordinator;
pub use file_store::FileSessionStore;
pub use handle::{CoordinatorHandle, Reply};
pub use persist::{ensure_session_dir, AtomicFileWriter};
pub use probe::{Prober, ReqwestProber};
pub use scheduler::CrawlScheduler;
pub use settings::CoordinatorSettings;
pub use store::{MemorySessionStore, SessionRecords, SessionStore, StoreError};
pub use tabs::{BadgeSink, TabInfo, TabRegistry, TabsApi};
pub use tracker::{NavigationTracker, Transition};
