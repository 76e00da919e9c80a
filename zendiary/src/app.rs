//! Application state and initialization
//!
//! Opens the data directory, the database and the settings file once at
//! startup and hands them to the commands through `AppState`.

use crate::config::{DATABASE_FILE, DEFAULT_DATA_DIR};
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{PersistentStore, SessionController, SettingsService};
use std::path::PathBuf;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub store: PersistentStore,
    pub settings: SettingsService,
}

impl AppState {
    pub async fn initialize(data_dir: PathBuf) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("App data directory: {:?}", data_dir);

        tokio::fs::create_dir_all(&data_dir).await?;

        let pool = create_pool(&data_dir.join(DATABASE_FILE)).await?;
        let store = PersistentStore::new(Repository::new(pool));
        let settings = SettingsService::new(data_dir.clone());

        tracing::info!("Application initialized successfully");

        Ok(Self {
            data_dir,
            store,
            settings,
        })
    }

    /// Hydrate a session from the store; every mutation is written back
    pub async fn open_session(&self) -> Result<SessionController<PersistentStore>> {
        let state = self.store.load_state().await?;
        Ok(SessionController::new(state, self.store.clone()))
    }
}

/// Data directory from the command line or environment, else the default
pub fn resolve_data_dir(configured: Option<PathBuf>) -> PathBuf {
    configured.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_creates_database() {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("nested");

        let app = AppState::initialize(data_dir.clone()).await.unwrap();

        assert!(data_dir.join(DATABASE_FILE).exists());
        assert!(app.open_session().await.unwrap().entries().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_share_the_store() {
        let temp = TempDir::new().unwrap();
        let app = AppState::initialize(temp.path().to_path_buf()).await.unwrap();

        let mut session = app.open_session().await.unwrap();
        session.add_reminder("Evening", "21:00").await.unwrap();

        let reopened = app.open_session().await.unwrap();
        assert_eq!(reopened.reminders().len(), 1);
    }

    #[test]
    fn test_resolve_data_dir() {
        assert_eq!(resolve_data_dir(None), PathBuf::from("zendiary-data"));
        assert_eq!(
            resolve_data_dir(Some(PathBuf::from("/tmp/diary"))),
            PathBuf::from("/tmp/diary")
        );
    }
}
