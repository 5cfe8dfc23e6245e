use std::sync::Arc;

use crate::clock::{Clock, FixedClock, SystemClock};
use crate::config::{AppConfig, Presets};
use crate::storage::{build_storage, LocalStorage, PersistenceGateway, StorageClient, StorageMode};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: PersistenceGateway,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        Self::from_config(AppConfig::from_env()?, Arc::new(SystemClock))
    }

    /// `clock` decides what "today" means for storage windows such as
    /// `weekly_data` as well as for the callers.
    pub fn from_config(config: AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let storage = build_storage(&config, clock.clone())?;
        Ok(Self::from_parts(Arc::new(config), storage, clock))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            storage: PersistenceGateway::new(storage),
            clock,
        }
    }

    /// In-memory local storage and a clock pinned to 2025-06-10 12:00 UTC.
    pub fn fake() -> Self {
        let clock = Arc::new(FixedClock::at_date(time::macros::date!(2025 - 06 - 10)))
            as Arc<dyn Clock>;

        let config = Arc::new(AppConfig {
            api_base_url: "http://127.0.0.1:9/api".into(),
            storage_mode: StorageMode::Local,
            local_store_path: "unused.json".into(),
            csrf_cookie: None,
            http_connect_timeout_secs: 1,
            presets: Presets::default(),
        });

        let storage = Arc::new(LocalStorage::in_memory(clock.clone())) as Arc<dyn StorageClient>;
        Self::from_parts(config, storage, clock)
    }
}
