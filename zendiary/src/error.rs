//! Error types for ZenDiary
//!
//! All errors use thiserror for structured error handling.
//! Every error maps onto one of the user-facing failure classes through
//! [`AppError::category`], which decides whether the caller alerts or only logs.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0} access denied or not available.")]
    PermissionDenied(String),

    #[error("{0} is not supported on this device.")]
    Unsupported(String),

    #[error("Maximum of {max} images reached for this entry.")]
    TooManyImages { max: usize },

    #[error("Video exceeds {max_mb}MB limit and cannot be attached.")]
    VideoTooLarge { size: u64, max_mb: u64 },

    #[error("Unsupported attachment type: {0}")]
    UnsupportedMedia(String),

    #[error("{0}")]
    Location(#[from] LocationError),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Analysis service error: {0}")]
    Analysis(String),

    #[error("A sync is already in progress")]
    SyncInProgress,

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Reminder not found: {0}")]
    ReminderNotFound(String),

    #[error("Invalid reminder time '{0}', expected HH:MM")]
    InvalidReminderTime(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("{0}")]
    Generic(String),
}

/// Why a geolocation request failed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied. Please enable it in your settings.")]
    PermissionDenied,

    #[error("Location information is unavailable.")]
    PositionUnavailable,

    #[error("The request to get your location timed out.")]
    Timeout,
}

/// How a failure should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Camera, microphone or geolocation denied: alert, abort, state unchanged
    Permission,
    /// Too many images or an oversized video: alert, drop the offending item
    ResourceLimit,
    /// Analysis or sync backend failed: log only
    ExternalService,
    /// The host has no such capability: alert at the point of use
    Unsupported,
    /// Storage, IO and bookkeeping failures
    Internal,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::PermissionDenied(_) => ErrorCategory::Permission,
            AppError::Location(LocationError::PermissionDenied) => ErrorCategory::Permission,
            AppError::Location(_) => ErrorCategory::ExternalService,
            AppError::TooManyImages { .. }
            | AppError::VideoTooLarge { .. }
            | AppError::UnsupportedMedia(_) => ErrorCategory::ResourceLimit,
            AppError::Analysis(_) | AppError::Http(_) | AppError::SyncInProgress => {
                ErrorCategory::ExternalService
            }
            AppError::Unsupported(_) => ErrorCategory::Unsupported,
            _ => ErrorCategory::Internal,
        }
    }

    /// Whether the caller should show this error to the user instead of only logging it
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self.category(),
            ErrorCategory::ExternalService | ErrorCategory::Internal
        ) || matches!(self, AppError::Location(_))
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
