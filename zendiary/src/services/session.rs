//! Session controller
//!
//! The application state (entries, reminders, current user) and every
//! mutation of it. Each mutation is applied in memory first, then the
//! reminder list is republished to subscribers and the observer is told
//! what changed. Observer failures are returned to the caller but never
//! roll back the in-memory change.

use crate::database::{DiaryEntry, Reminder, User};
use crate::error::{AppError, Result};
use crate::services::entries::{EntryRepository, Upsert};
use chrono::{DateTime, Utc};
use std::future::Future;
use tokio::sync::watch;

/// Which slice of the state a mutation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Entries,
    Reminders,
    User,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub entries: EntryRepository,
    pub reminders: Vec<Reminder>,
    pub user: Option<User>,
}

/// Notified after every committed mutation
pub trait StateObserver: Send + Sync {
    fn committed(
        &self,
        change: Change,
        state: &SessionState,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// No observer
impl StateObserver for () {
    async fn committed(&self, _change: Change, _state: &SessionState) -> Result<()> {
        Ok(())
    }
}

pub struct SessionController<O = ()> {
    state: SessionState,
    observer: O,
    reminders_tx: watch::Sender<Vec<Reminder>>,
}

impl<O: StateObserver> SessionController<O> {
    pub fn new(state: SessionState, observer: O) -> Self {
        let (reminders_tx, _) = watch::channel(state.reminders.clone());
        Self {
            state,
            observer,
            reminders_tx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn entries(&self) -> &EntryRepository {
        &self.state.entries
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.state.reminders
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    /// Receiver that always holds the current reminder list
    pub fn subscribe_reminders(&self) -> watch::Receiver<Vec<Reminder>> {
        self.reminders_tx.subscribe()
    }

    /// Id for an entry created at `now`, unique in the repository
    pub fn fresh_entry_id(&self, now: DateTime<Utc>) -> String {
        self.state.entries.fresh_id(now)
    }

    // ===== User =====

    pub async fn login(&mut self, email: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::Generic("Email is required".to_string()));
        }

        let user = User::from_email(email);
        tracing::info!("Logged in as {}", user.email);

        self.state.user = Some(user.clone());
        self.commit(Change::User).await?;
        Ok(user)
    }

    pub async fn logout(&mut self) -> Result<()> {
        if let Some(user) = self.state.user.take() {
            tracing::info!("Logged out {}", user.email);
            self.commit(Change::User).await?;
        }
        Ok(())
    }

    pub async fn update_user(&mut self, user: User) -> Result<()> {
        if self.state.user.is_none() {
            return Err(AppError::NotLoggedIn);
        }
        self.state.user = Some(user);
        self.commit(Change::User).await
    }

    // ===== Entries =====

    pub async fn upsert_entry(&mut self, entry: DiaryEntry) -> Result<Upsert> {
        let id = entry.id.clone();
        let outcome = self.state.entries.upsert(entry);
        tracing::debug!("Entry {} {:?}", id, outcome);

        self.commit(Change::Entries).await?;
        Ok(outcome)
    }

    pub async fn delete_entry(&mut self, id: &str) -> Result<()> {
        if !self.state.entries.delete(id) {
            return Err(AppError::EntryNotFound(id.to_string()));
        }
        tracing::debug!("Deleted entry {}", id);

        self.commit(Change::Entries).await
    }

    /// Flip one entry's favorite flag. An absent id changes nothing.
    pub async fn toggle_favorite(&mut self, id: &str) -> Result<Option<bool>> {
        let Some(favorite) = self.state.entries.toggle_favorite(id) else {
            tracing::debug!("Favorite toggle for unknown entry {}", id);
            return Ok(None);
        };

        self.commit(Change::Entries).await?;
        Ok(Some(favorite))
    }

    // ===== Reminders =====

    pub async fn add_reminder(&mut self, title: &str, time: &str) -> Result<Reminder> {
        let mut reminder = Reminder::new(title, time)?;
        while self.find_reminder(&reminder.id).is_some() {
            reminder.id = bump_id(&reminder.id);
        }

        tracing::info!("Added reminder {} at {}", reminder.id, reminder.time);
        self.state.reminders.push(reminder.clone());
        self.commit(Change::Reminders).await?;
        Ok(reminder)
    }

    /// Replace a reminder by id
    pub async fn update_reminder(&mut self, reminder: Reminder) -> Result<()> {
        let existing = self
            .state
            .reminders
            .iter_mut()
            .find(|r| r.id == reminder.id)
            .ok_or_else(|| AppError::ReminderNotFound(reminder.id.clone()))?;
        *existing = reminder;

        self.commit(Change::Reminders).await
    }

    pub async fn set_reminder_active(&mut self, id: &str, active: bool) -> Result<()> {
        let reminder = self
            .state
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::ReminderNotFound(id.to_string()))?;
        reminder.active = active;
        tracing::debug!("Reminder {} active: {}", id, active);

        self.commit(Change::Reminders).await
    }

    /// Flip a reminder's active flag and return the new value
    pub async fn toggle_reminder(&mut self, id: &str) -> Result<bool> {
        let active = !self
            .find_reminder(id)
            .ok_or_else(|| AppError::ReminderNotFound(id.to_string()))?
            .active;
        self.set_reminder_active(id, active).await?;
        Ok(active)
    }

    pub async fn delete_reminder(&mut self, id: &str) -> Result<()> {
        let before = self.state.reminders.len();
        self.state.reminders.retain(|r| r.id != id);
        if self.state.reminders.len() == before {
            return Err(AppError::ReminderNotFound(id.to_string()));
        }
        tracing::info!("Deleted reminder {}", id);

        self.commit(Change::Reminders).await
    }

    fn find_reminder(&self, id: &str) -> Option<&Reminder> {
        self.state.reminders.iter().find(|r| r.id == id)
    }

    async fn commit(&self, change: Change) -> Result<()> {
        if change == Change::Reminders {
            self.reminders_tx.send_replace(self.state.reminders.clone());
        }

        self.observer.committed(change, &self.state).await.map_err(|e| {
            tracing::error!("Failed to persist {:?}: {}", change, e);
            e
        })
    }
}

fn bump_id(id: &str) -> String {
    match id.parse::<i64>() {
        Ok(millis) => (millis + 1).to_string(),
        Err(_) => format!("{}-1", id),
    }
}
