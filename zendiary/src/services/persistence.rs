//! Persistent store
//!
//! Loads the session state from the key-value repository at startup and
//! writes back whichever slice changed after every committed mutation.

use crate::config::{ENTRIES_KEY, LAST_SYNC_KEY, REMINDERS_KEY, USER_KEY};
use crate::database::{DiaryEntry, Reminder, Repository, User};
use crate::error::Result;
use crate::services::entries::EntryRepository;
use crate::services::session::{Change, SessionState, StateObserver};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone)]
pub struct PersistentStore {
    repo: Repository,
}

impl PersistentStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Read everything; missing keys load as empty
    pub async fn load_state(&self) -> Result<SessionState> {
        let entries: Vec<DiaryEntry> = self.read(ENTRIES_KEY).await?.unwrap_or_default();
        let reminders: Vec<Reminder> = self.read(REMINDERS_KEY).await?.unwrap_or_default();
        let user: Option<User> = self.read(USER_KEY).await?;

        tracing::info!(
            "Loaded {} entries, {} reminders, user: {}",
            entries.len(),
            reminders.len(),
            user.as_ref().map(|u| u.email.as_str()).unwrap_or("none")
        );

        Ok(SessionState {
            entries: EntryRepository::new(entries),
            reminders,
            user,
        })
    }

    /// Just the reminder list, as currently stored
    pub async fn load_reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self.read(REMINDERS_KEY).await?.unwrap_or_default())
    }

    pub async fn save_entries(&self, entries: &[DiaryEntry]) -> Result<()> {
        self.write(ENTRIES_KEY, &entries).await
    }

    pub async fn save_reminders(&self, reminders: &[Reminder]) -> Result<()> {
        self.write(REMINDERS_KEY, &reminders).await
    }

    /// `None` removes the stored user
    pub async fn save_user(&self, user: Option<&User>) -> Result<()> {
        match user {
            Some(user) => self.write(USER_KEY, user).await,
            None => self.repo.remove(USER_KEY).await,
        }
    }

    /// Time of the last completed sync, as stored
    pub async fn last_sync(&self) -> Result<Option<String>> {
        self.repo.get(LAST_SYNC_KEY).await
    }

    pub async fn set_last_sync(&self, timestamp: &str) -> Result<()> {
        self.repo.set(LAST_SYNC_KEY, timestamp).await
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.repo.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.repo.set(key, &json).await
    }
}

impl StateObserver for PersistentStore {
    async fn committed(&self, change: Change, state: &SessionState) -> Result<()> {
        match change {
            Change::Entries => self.save_entries(state.entries.all()).await,
            Change::Reminders => self.save_reminders(&state.reminders).await,
            Change::User => self.save_user(state.user.as_ref()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, Mood};
    use crate::services::session::SessionController;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_store() -> PersistentStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        PersistentStore::new(Repository::new(pool))
    }

    fn entry(id: &str) -> DiaryEntry {
        DiaryEntry {
            id: id.to_string(),
            title: "Trip".to_string(),
            content: "Beach day".to_string(),
            date: "2024-05-20T10:00:00Z".parse().unwrap(),
            mood: Mood::Peaceful,
            tags: vec!["travel".to_string()],
            media: Vec::new(),
            is_favorite: true,
            location: None,
        }
    }

    #[tokio::test]
    async fn test_empty_store_loads_empty_state() {
        let store = create_test_store().await;

        let state = store.load_state().await.unwrap();

        assert_eq!(state, SessionState::default());
        assert!(store.last_sync().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_controller_changes_survive_reload() {
        let store = create_test_store().await;

        {
            let mut session = SessionController::new(store.load_state().await.unwrap(), store.clone());
            session.login("ada@example.com").await.unwrap();
            session.upsert_entry(entry("1")).await.unwrap();
            session.add_reminder("Evening", "21:00").await.unwrap();
        }

        let state = store.load_state().await.unwrap();
        assert_eq!(state.entries.all(), &[entry("1")]);
        assert_eq!(state.reminders[0].title, "Evening");
        assert_eq!(state.user.unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_logout_removes_user_key() {
        let store = create_test_store().await;
        let mut session = SessionController::new(SessionState::default(), store.clone());

        session.login("ada@example.com").await.unwrap();
        session.logout().await.unwrap();

        assert!(store.repo.get(USER_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_use_camel_case_keys() {
        let store = create_test_store().await;

        store.save_entries(&[entry("1")]).await.unwrap();

        let raw = store.repo.get(ENTRIES_KEY).await.unwrap().unwrap();
        assert!(raw.contains("\"isFavorite\":true"));
        assert!(raw.contains("\"mood\":\"peaceful\""));
    }

    #[tokio::test]
    async fn test_corrupt_value_is_an_error() {
        let store = create_test_store().await;
        store.repo.set(REMINDERS_KEY, "[{broken").await.unwrap();

        assert!(store.load_state().await.is_err());
    }

    #[tokio::test]
    async fn test_last_sync_round_trip() {
        let store = create_test_store().await;

        store.set_last_sync("2024-05-20T10:00:00Z").await.unwrap();

        assert_eq!(
            store.last_sync().await.unwrap().as_deref(),
            Some("2024-05-20T10:00:00Z")
        );
    }
}
