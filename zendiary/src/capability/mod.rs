//! Device capabilities
//!
//! Camera, microphone, speech recognition and geolocation are host
//! features the diary cannot assume. Each one is a trait reporting its
//! [`Availability`] up front and failing acquisition with a
//! [`DeviceError`]; a [`Platform`] bundles one implementation of each so
//! the editor can be handed a real host, the headless one, or a fake.

pub mod geolocation;
pub mod headless;
pub mod media;
pub mod speech;

#[cfg(test)]
pub(crate) mod fake;

pub use geolocation::{Geolocator, PositionOptions};
pub use headless::HeadlessPlatform;
pub use media::{MediaDevices, MediaRecorder, MediaStream, StreamConstraints};
pub use speech::{RecognitionConfig, RecognitionEvent, RecognitionSession, SpeechRecognizer};

use thiserror::Error;

/// Whether a capability can be used right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    /// The host has no such device or API
    Unavailable,
    /// The user refused the permission prompt
    Denied,
}

/// Why acquiring a device failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("permission denied")]
    Denied,

    #[error("device not available")]
    Unavailable,

    #[error("{0}")]
    Failed(String),
}

/// One implementation of every capability the editor uses
pub trait Platform: Send + Sync + 'static {
    type Media: MediaDevices;
    type Speech: SpeechRecognizer;
    type Geo: Geolocator;

    fn media(&self) -> &Self::Media;
    fn speech(&self) -> &Self::Speech;
    fn geolocation(&self) -> &Self::Geo;
}
