//! Cloud sync simulator
//!
//! Scripted backup to a cloud drive. Nothing leaves the machine; the
//! simulator walks a fixed sequence of phases, reports each one through a
//! progress callback and records the completion time in the store. A run
//! can stop at a version conflict, which the caller resolves to resume
//! the upload.

use crate::error::{AppError, Result};
use crate::services::persistence::PersistentStore;
use crate::services::settings::SyncSettings;
use chrono::{Duration as ChronoDuration, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PHASES: [(f64, &str); 5] = [
    (5.0, "Checking connection..."),
    (15.0, "Authenticating with Google Drive API..."),
    (25.0, "Listing files in \"ZenDiary_Vault\"..."),
    (40.0, "Scanning local memory files..."),
    (55.0, "Comparing local and cloud versions..."),
];

const UPLOAD_START: f64 = 55.0;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Snapshot reported to the progress callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_syncing: bool,
    /// 0 to 100
    pub progress: f64,
    pub last_sync: Option<String>,
    pub status: String,
    #[serde(default)]
    pub has_conflict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_details: Option<ConflictDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetails {
    pub file_name: String,
    pub local_date: String,
    pub cloud_date: String,
}

impl ConflictDetails {
    /// Today's journal file, with the cloud copy one hour older than the local one
    fn now() -> Self {
        let local = Local::now();
        let cloud = local - ChronoDuration::hours(1);
        Self {
            file_name: format!("Journal_{}.json", local.format("%Y_%m_%d")),
            local_date: local.format(TIMESTAMP_FORMAT).to_string(),
            cloud_date: cloud.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    KeepLocal,
    KeepCloud,
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Resolution::KeepLocal),
            "cloud" => Ok(Resolution::KeepCloud),
            other => Err(format!("Unknown resolution '{}', expected local or cloud", other)),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::KeepLocal => f.write_str("local"),
            Resolution::KeepCloud => f.write_str("cloud"),
        }
    }
}

/// Clears the in-flight flag when dropped
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::SyncInProgress)?;
        Ok(Self { flag: flag.clone() })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A run halted on a conflict. Keeps the sync marked in flight until it
/// is resolved or dropped.
#[derive(Debug)]
pub struct PendingConflict {
    pub details: ConflictDetails,
    status: SyncStatus,
    _guard: InFlightGuard,
}

impl PendingConflict {
    /// The "Conflict Detected" status the run stopped at
    pub fn status(&self) -> &SyncStatus {
        &self.status
    }
}

#[derive(Debug)]
pub enum SyncOutcome {
    Synchronized(SyncStatus),
    Conflict(PendingConflict),
}

/// Where the time of the last completed sync is kept
pub trait SyncLedger: Send + Sync {
    fn last_sync(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set_last_sync(&self, timestamp: &str) -> impl Future<Output = Result<()>> + Send;
}

impl SyncLedger for PersistentStore {
    async fn last_sync(&self) -> Result<Option<String>> {
        PersistentStore::last_sync(self).await
    }

    async fn set_last_sync(&self, timestamp: &str) -> Result<()> {
        PersistentStore::set_last_sync(self, timestamp).await
    }
}

pub trait SyncService: Send + Sync {
    /// Run a sync. With `conflict` set the run stops at a version conflict.
    fn sync<F>(&self, on_progress: F, conflict: bool) -> impl Future<Output = Result<SyncOutcome>> + Send
    where
        F: FnMut(&SyncStatus) + Send;

    /// Pick a side of a conflict and finish the upload
    fn resolve<F>(
        &self,
        pending: PendingConflict,
        resolution: Resolution,
        on_progress: F,
    ) -> impl Future<Output = Result<SyncStatus>> + Send
    where
        F: FnMut(&SyncStatus) + Send;
}

#[derive(Clone)]
pub struct DriveSyncSimulator<L = PersistentStore> {
    store: L,
    settings: SyncSettings,
    in_flight: Arc<AtomicBool>,
}

impl<L: SyncLedger> DriveSyncSimulator<L> {
    pub fn new(store: L, settings: SyncSettings) -> Self {
        Self {
            store,
            settings,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn step_delay(&self) -> Duration {
        let jitter = rand::thread_rng().gen_range(0..=self.settings.step_jitter_ms);
        Duration::from_millis(self.settings.step_delay_ms.saturating_add(jitter))
    }

    async fn upload<F>(&self, mut status: SyncStatus, on_progress: &mut F) -> Result<SyncStatus>
    where
        F: FnMut(&SyncStatus) + Send,
    {
        status.is_syncing = true;
        status.has_conflict = false;
        status.conflict_details = None;

        let total = self.settings.upload_batches;
        for i in 1..=total {
            status.progress = UPLOAD_START + (f64::from(i) / f64::from(total)) * (100.0 - UPLOAD_START);
            status.status = format!("Uploading memory {} of {}...", i, total);
            on_progress(&status);
            tokio::time::sleep(Duration::from_millis(self.settings.upload_delay_ms)).await;
        }

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.store.set_last_sync(&timestamp).await?;

        let done = SyncStatus {
            is_syncing: false,
            progress: 100.0,
            last_sync: Some(timestamp),
            status: "Cloud Synchronized".to_string(),
            has_conflict: false,
            conflict_details: None,
        };
        on_progress(&done);

        tracing::info!("Sync complete");
        Ok(done)
    }
}

impl<L: SyncLedger> SyncService for DriveSyncSimulator<L> {
    async fn sync<F>(&self, mut on_progress: F, conflict: bool) -> Result<SyncOutcome>
    where
        F: FnMut(&SyncStatus) + Send,
    {
        let guard = InFlightGuard::acquire(&self.in_flight)?;
        tracing::info!("Starting sync");

        let mut status = SyncStatus {
            is_syncing: true,
            progress: 0.0,
            last_sync: self.store.last_sync().await?,
            status: "Initializing...".to_string(),
            has_conflict: false,
            conflict_details: None,
        };

        for (progress, text) in PHASES {
            status.progress = progress;
            status.status = text.to_string();
            on_progress(&status);
            tokio::time::sleep(self.step_delay()).await;
        }

        if conflict {
            let details = ConflictDetails::now();
            tracing::warn!("Sync conflict on {}", details.file_name);

            let status = SyncStatus {
                is_syncing: false,
                status: "Conflict Detected".to_string(),
                has_conflict: true,
                conflict_details: Some(details.clone()),
                ..status
            };
            on_progress(&status);

            return Ok(SyncOutcome::Conflict(PendingConflict {
                details,
                status,
                _guard: guard,
            }));
        }

        let done = self.upload(status, &mut on_progress).await;
        drop(guard);
        done.map(SyncOutcome::Synchronized)
    }

    async fn resolve<F>(
        &self,
        pending: PendingConflict,
        resolution: Resolution,
        mut on_progress: F,
    ) -> Result<SyncStatus>
    where
        F: FnMut(&SyncStatus) + Send,
    {
        let PendingConflict {
            details,
            mut status,
            _guard: guard,
        } = pending;

        tracing::info!("Resolving conflict on {}: keep {}", details.file_name, resolution);

        status.is_syncing = true;
        status.has_conflict = false;
        status.conflict_details = None;
        status.status = format!("Keeping {} version of {}...", resolution, details.file_name);
        on_progress(&status);

        let done = self.upload(status, &mut on_progress).await;
        drop(guard);
        done
    }
}
