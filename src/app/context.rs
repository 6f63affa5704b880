use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, TrackerError};
use crate::config::Config;
use crate::refresh::{ChromeSession, RefreshConfig, RefreshController};
use crate::store::sqlite::SqliteStore;

pub type ChromeController = RefreshController<ChromeSession, SqliteStore>;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub config: Config,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.database_path.clone() {
            Some(p) => {
                if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                p
            }
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Ok(Self { store, config })
    }

    pub fn in_memory() -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Ok(Self {
            store,
            config: Config::default(),
        })
    }

    /// Build a controller over a fresh Chrome session using `refresh` settings.
    pub fn refresh_controller(&self, refresh: RefreshConfig) -> ChromeController {
        let session = ChromeSession::new(refresh.clone());
        RefreshController::new(session, self.store.clone(), refresh)
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TrackerError::Config("Could not find data directory".into()))?;
        let tracker_dir = data_dir.join("blogger-tracker");
        std::fs::create_dir_all(&tracker_dir)?;
        Ok(tracker_dir.join("tracker.db"))
    }
}
