//! Dictation
//!
//! Speech-to-text that runs alongside any capture state. Only finalized
//! segments reach the entry text.

use crate::capability::{
    Availability, DeviceError, Platform, RecognitionConfig, RecognitionEvent, RecognitionSession,
    SpeechRecognizer,
};
use crate::error::{AppError, Result};
use std::sync::Arc;

type SessionOf<P> = <<P as Platform>::Speech as SpeechRecognizer>::Session;

pub struct Dictation<P: Platform> {
    platform: Arc<P>,
    session: Option<SessionOf<P>>,
}

impl<P: Platform> Dictation<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self {
            platform,
            session: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.session.is_some()
    }

    /// Start listening, or stop if already listening. Returns the new listening state.
    pub fn toggle(&mut self) -> Result<bool> {
        if self.is_listening() {
            self.stop();
            return Ok(false);
        }

        let recognizer = self.platform.speech();
        match recognizer.availability() {
            Availability::Available => {}
            Availability::Unavailable => {
                return Err(AppError::Unsupported("Speech recognition".to_string()))
            }
            Availability::Denied => return Err(AppError::PermissionDenied("Microphone".to_string())),
        }

        let session = recognizer
            .start(&RecognitionConfig::default())
            .map_err(|e| match e {
                DeviceError::Denied => AppError::PermissionDenied("Microphone".to_string()),
                _ => AppError::Unsupported("Speech recognition".to_string()),
            })?;

        self.session = Some(session);
        tracing::debug!("Dictation started");
        Ok(true)
    }

    /// Apply pending recognizer events to `content`. Returns the number of segments appended.
    pub fn pump(&mut self, content: &mut String) -> usize {
        let mut appended = 0;

        while let Some(session) = self.session.as_mut() {
            let Some(event) = session.poll_event() else {
                break;
            };

            match event {
                RecognitionEvent::Result(segments) => {
                    let finalized: String = segments
                        .iter()
                        .filter(|s| s.is_final)
                        .map(|s| s.transcript.as_str())
                        .collect();

                    if !finalized.is_empty() {
                        append_transcript(content, &finalized);
                        appended += 1;
                    }
                }
                RecognitionEvent::End => {
                    self.session = None;
                    tracing::debug!("Dictation ended by recognizer");
                }
            }
        }

        appended
    }

    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
            tracing::debug!("Dictation stopped");
        }
    }
}

impl<P: Platform> Drop for Dictation<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn append_transcript(content: &mut String, transcript: &str) {
    if !content.is_empty() {
        content.push(' ');
    }
    content.push_str(transcript);
}
