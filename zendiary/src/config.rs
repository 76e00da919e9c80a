//! Application configuration constants
//!
//! Central location for resource limits, timer intervals, storage keys
//! and capture profiles used throughout the application.

use std::time::Duration;

// ===== Attachment Limits =====

/// Maximum number of image attachments on a single entry
pub const MAX_IMAGES_PER_ENTRY: usize = 50;

/// Maximum video size in megabytes (shown to the user)
pub const MAX_VIDEO_SIZE_MB: u64 = 250;

/// Maximum video size in bytes (250 MiB)
pub const MAX_VIDEO_SIZE_BYTES: u64 = MAX_VIDEO_SIZE_MB * 1024 * 1024;

// ===== Capture =====

/// Preferred recorder profile for camera recordings
pub const PREFERRED_VIDEO_MIME: &str = "video/webm;codecs=vp8,opus";

/// Preferred recorder profile for voice recordings
pub const PREFERRED_AUDIO_MIME: &str = "audio/webm;codecs=opus";

/// Container type of a finished camera recording
pub const VIDEO_CONTAINER_MIME: &str = "video/webm";

/// Container type of a finished voice recording
pub const AUDIO_CONTAINER_MIME: &str = "audio/webm";

/// Ideal camera preview width
pub const CAMERA_IDEAL_WIDTH: u32 = 1280;

/// Ideal camera preview height
pub const CAMERA_IDEAL_HEIGHT: u32 = 720;

/// Recorder timeslice; the recorder hands over one encoded chunk per slice
pub const RECORDER_TIMESLICE: Duration = Duration::from_secs(1);

/// Interval of the recording duration counter
pub const RECORDING_TICK: Duration = Duration::from_secs(1);

/// Dictation language
pub const DICTATION_LANG: &str = "en-US";

// ===== Editor =====

/// Title given to entries saved without one
pub const UNTITLED_ENTRY_TITLE: &str = "Untitled Entry";

/// One-shot geolocation timeout
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(8);

// ===== Reminders =====

/// How often configured reminders are compared to the wall clock
pub const REMINDER_TICK: Duration = Duration::from_secs(60);

/// How long a reminder banner stays up before dismissing itself
pub const NUDGE_DISMISS_AFTER: Duration = Duration::from_secs(8);

/// Haptic pulse length when a reminder fires
pub const NUDGE_VIBRATION_MS: u32 = 200;

/// Weekdays assigned to new reminders (0 = Sunday)
pub const ALL_WEEKDAYS: [u8; 7] = [0, 1, 2, 3, 4, 5, 6];

// ===== Persistent Store Keys =====

pub const ENTRIES_KEY: &str = "zendiary_data";
pub const REMINDERS_KEY: &str = "zendiary_reminders";
pub const USER_KEY: &str = "zendiary_user";
pub const LAST_SYNC_KEY: &str = "zendiary_last_sync";

// ===== Files =====

/// SQLite database file inside the data directory
pub const DATABASE_FILE: &str = "zendiary.sqlite";

/// Settings file inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "ZENDIARY_DATA_DIR";

/// Data directory used when nothing else is configured
pub const DEFAULT_DATA_DIR: &str = "zendiary-data";
