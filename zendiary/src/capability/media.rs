//! Camera and microphone access

use super::{Availability, DeviceError};
use crate::config::{CAMERA_IDEAL_HEIGHT, CAMERA_IDEAL_WIDTH};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

/// What a capture stream must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub video: Option<VideoConstraints>,
    pub audio: bool,
}

impl StreamConstraints {
    /// Front camera with sound, for preview and video recording
    pub fn camera() -> Self {
        Self {
            video: Some(VideoConstraints {
                facing_mode: FacingMode::User,
                ideal_width: CAMERA_IDEAL_WIDTH,
                ideal_height: CAMERA_IDEAL_HEIGHT,
            }),
            audio: true,
        }
    }

    /// Microphone only, for voice notes
    pub fn microphone() -> Self {
        Self {
            video: None,
            audio: true,
        }
    }
}

/// A live hardware stream
pub trait MediaStream: Send + Sync {
    fn has_video(&self) -> bool;

    fn is_live(&self) -> bool;

    /// Stop every hardware track. Calling it on a stopped stream does nothing.
    fn stop_tracks(&mut self);
}

/// Encoder attached to a stream
pub trait MediaRecorder: Send + Sync {
    /// Begin encoding; one chunk is produced per `timeslice`
    fn start(&mut self, timeslice: Duration) -> Result<(), DeviceError>;

    /// Chunks produced since the previous call
    fn take_chunks(&mut self) -> Vec<Vec<u8>>;

    /// Stop encoding and flush whatever is left
    fn stop(&mut self) -> Vec<Vec<u8>>;

    fn is_active(&self) -> bool;
}

pub trait MediaDevices: Send + Sync {
    type Stream: MediaStream;
    type Recorder: MediaRecorder;

    fn availability(&self) -> Availability;

    /// Prompt for and open a stream matching `constraints`
    fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = Result<Self::Stream, DeviceError>> + Send;

    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Build a recorder for `stream`; `None` lets the platform pick its default encoding
    fn create_recorder(
        &self,
        stream: &Self::Stream,
        mime_type: Option<&str>,
    ) -> Result<Self::Recorder, DeviceError>;
}
