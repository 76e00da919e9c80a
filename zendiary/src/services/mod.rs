//! Services module
//!
//! Business logic that sits between the command surface and the store.

pub mod analysis;
pub mod capture;
pub mod dictation;
pub mod editor;
pub mod entries;
pub mod feed;
pub mod persistence;
pub mod reminders;
pub mod session;
pub mod settings;
pub mod sync;

pub use analysis::{AnalysisService, ConfiguredAnalysis, HttpAnalysisService, Suggestion};
pub use capture::{CaptureSession, CaptureState, RecordingKind};
pub use dictation::Dictation;
pub use editor::{AttachReport, Draft, Editor, SelectedFile};
pub use entries::{EntryRepository, Upsert};
pub use feed::{FeedFilter, MonthGroup};
pub use persistence::PersistentStore;
pub use reminders::{
    Clock, LogSink, Nudge, NudgeBanner, NudgeSink, ReminderScheduler, ReminderSource, SystemClock,
};
pub use session::{Change, SessionController, SessionState, StateObserver};
pub use settings::{AppSettings, SettingsService};
pub use sync::{DriveSyncSimulator, Resolution, SyncLedger, SyncOutcome, SyncService, SyncStatus};
