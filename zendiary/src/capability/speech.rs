//! Speech-to-text

use super::{Availability, DeviceError};
use crate::config::DICTATION_LANG;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub continuous: bool,
    pub interim_results: bool,
    pub lang: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            lang: DICTATION_LANG.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub transcript: String,
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Segments recognized since the previous result event
    Result(Vec<TranscriptSegment>),
    /// The recognizer stopped on its own
    End,
}

/// A running recognition
pub trait RecognitionSession: Send + Sync {
    /// Next pending event, if any
    fn poll_event(&mut self) -> Option<RecognitionEvent>;

    fn stop(&mut self);
}

pub trait SpeechRecognizer: Send + Sync {
    type Session: RecognitionSession;

    fn availability(&self) -> Availability;

    fn start(&self, config: &RecognitionConfig) -> Result<Self::Session, DeviceError>;
}
