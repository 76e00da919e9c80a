//! Scriptable devices for unit tests

use super::media::{MediaDevices, MediaRecorder, MediaStream, StreamConstraints};
use super::speech::{RecognitionConfig, RecognitionEvent, RecognitionSession, SpeechRecognizer};
use super::{Availability, DeviceError, Geolocator, Platform, PositionOptions};
use crate::database::Location;
use crate::error::LocationError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) struct FakePlatform {
    pub media: FakeMedia,
    pub speech: FakeSpeech,
    pub geo: FakeGeo,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            media: FakeMedia::default(),
            speech: FakeSpeech::default(),
            geo: FakeGeo::default(),
        }
    }
}

impl Platform for FakePlatform {
    type Media = FakeMedia;
    type Speech = FakeSpeech;
    type Geo = FakeGeo;

    fn media(&self) -> &FakeMedia {
        &self.media
    }

    fn speech(&self) -> &FakeSpeech {
        &self.speech
    }

    fn geolocation(&self) -> &FakeGeo {
        &self.geo
    }
}

// ===== Media =====

pub(crate) struct FakeMedia {
    pub availability: Availability,
    /// Error returned by the permission prompt instead of a stream
    pub prompt_error: Option<DeviceError>,
    pub supports_preferred: bool,
    /// Chunks every recorder flushes on stop
    pub recording: Vec<Vec<u8>>,
    /// One-shot replacement for `recording`, moved into the next recorder
    pub next_recording: Mutex<Option<Vec<Vec<u8>>>>,
    /// Live flag of every stream handed out, in order
    pub streams: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
    /// MIME type requested for each recorder
    pub recorder_types: Arc<Mutex<Vec<Option<String>>>>,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self {
            availability: Availability::Available,
            prompt_error: None,
            supports_preferred: true,
            recording: vec![b"chunk-1".to_vec(), b"chunk-2".to_vec()],
            next_recording: Mutex::new(None),
            streams: Arc::new(Mutex::new(Vec::new())),
            recorder_types: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeMedia {
    pub fn live_streams(&self) -> usize {
        self.streams
            .lock()
            .unwrap()
            .iter()
            .filter(|live| live.load(Ordering::SeqCst))
            .count()
    }

    pub fn opened_streams(&self) -> usize {
        self.streams.lock().unwrap().len()
    }
}

pub(crate) struct FakeStream {
    video: bool,
    live: Arc<AtomicBool>,
}

impl MediaStream for FakeStream {
    fn has_video(&self) -> bool {
        self.video
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop_tracks(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

pub(crate) struct FakeRecorder {
    active: bool,
    output: Vec<Vec<u8>>,
}

impl MediaRecorder for FakeRecorder {
    fn start(&mut self, _timeslice: Duration) -> Result<(), DeviceError> {
        self.active = true;
        Ok(())
    }

    fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        if self.active && !self.output.is_empty() {
            vec![self.output.remove(0)]
        } else {
            Vec::new()
        }
    }

    fn stop(&mut self) -> Vec<Vec<u8>> {
        self.active = false;
        std::mem::take(&mut self.output)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl MediaDevices for FakeMedia {
    type Stream = FakeStream;
    type Recorder = FakeRecorder;

    fn availability(&self) -> Availability {
        self.availability
    }

    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<FakeStream, DeviceError> {
        if let Some(err) = &self.prompt_error {
            return Err(err.clone());
        }

        let live = Arc::new(AtomicBool::new(true));
        self.streams.lock().unwrap().push(live.clone());

        Ok(FakeStream {
            video: constraints.video.is_some(),
            live,
        })
    }

    fn is_type_supported(&self, _mime_type: &str) -> bool {
        self.supports_preferred
    }

    fn create_recorder(
        &self,
        _stream: &FakeStream,
        mime_type: Option<&str>,
    ) -> Result<FakeRecorder, DeviceError> {
        self.recorder_types
            .lock()
            .unwrap()
            .push(mime_type.map(str::to_string));

        let output = self
            .next_recording
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| self.recording.clone());

        Ok(FakeRecorder {
            active: false,
            output,
        })
    }
}

// ===== Speech =====

pub(crate) struct FakeSpeech {
    pub availability: Availability,
    pub events: Arc<Mutex<VecDeque<RecognitionEvent>>>,
    pub stopped: Arc<AtomicBool>,
}

impl Default for FakeSpeech {
    fn default() -> Self {
        Self {
            availability: Availability::Available,
            events: Arc::new(Mutex::new(VecDeque::new())),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl FakeSpeech {
    pub fn push(&self, event: RecognitionEvent) {
        self.events.lock().unwrap().push_back(event);
    }
}

pub(crate) struct FakeRecognition {
    events: Arc<Mutex<VecDeque<RecognitionEvent>>>,
    stopped: Arc<AtomicBool>,
}

impl RecognitionSession for FakeRecognition {
    fn poll_event(&mut self) -> Option<RecognitionEvent> {
        self.events.lock().unwrap().pop_front()
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

impl SpeechRecognizer for FakeSpeech {
    type Session = FakeRecognition;

    fn availability(&self) -> Availability {
        self.availability
    }

    fn start(&self, _config: &RecognitionConfig) -> Result<FakeRecognition, DeviceError> {
        match self.availability {
            Availability::Available => {
                self.stopped.store(false, Ordering::SeqCst);
                Ok(FakeRecognition {
                    events: self.events.clone(),
                    stopped: self.stopped.clone(),
                })
            }
            Availability::Denied => Err(DeviceError::Denied),
            Availability::Unavailable => Err(DeviceError::Unavailable),
        }
    }
}

// ===== Geolocation =====

pub(crate) struct FakeGeo {
    pub availability: Availability,
    pub result: Result<Location, LocationError>,
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl Default for FakeGeo {
    fn default() -> Self {
        Self {
            availability: Availability::Available,
            result: Ok(Location {
                lat: 48.8566,
                lng: 2.3522,
            }),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Geolocator for FakeGeo {
    fn availability(&self) -> Availability {
        self.availability
    }

    async fn current_position(&self, _options: &PositionOptions) -> Result<Location, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result
    }
}
