//! A host with no devices at all
//!
//! Used by the command-line front end. Every capability reports
//! [`Availability::Unavailable`]; the stream, recorder and session types
//! are uninhabited because they can never be produced.

use super::media::{MediaDevices, MediaRecorder, MediaStream, StreamConstraints};
use super::speech::{RecognitionConfig, RecognitionEvent, RecognitionSession, SpeechRecognizer};
use super::{Availability, DeviceError, Geolocator, Platform, PositionOptions};
use crate::database::Location;
use crate::error::LocationError;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessPlatform;

#[derive(Debug)]
pub enum NoStream {}

#[derive(Debug)]
pub enum NoRecorder {}

#[derive(Debug)]
pub enum NoRecognition {}

impl MediaStream for NoStream {
    fn has_video(&self) -> bool {
        match *self {}
    }

    fn is_live(&self) -> bool {
        match *self {}
    }

    fn stop_tracks(&mut self) {
        match *self {}
    }
}

impl MediaRecorder for NoRecorder {
    fn start(&mut self, _timeslice: Duration) -> Result<(), DeviceError> {
        match *self {}
    }

    fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        match *self {}
    }

    fn stop(&mut self) -> Vec<Vec<u8>> {
        match *self {}
    }

    fn is_active(&self) -> bool {
        match *self {}
    }
}

impl RecognitionSession for NoRecognition {
    fn poll_event(&mut self) -> Option<RecognitionEvent> {
        match *self {}
    }

    fn stop(&mut self) {
        match *self {}
    }
}

impl MediaDevices for HeadlessPlatform {
    type Stream = NoStream;
    type Recorder = NoRecorder;

    fn availability(&self) -> Availability {
        Availability::Unavailable
    }

    async fn get_user_media(
        &self,
        _constraints: &StreamConstraints,
    ) -> Result<NoStream, DeviceError> {
        Err(DeviceError::Unavailable)
    }

    fn is_type_supported(&self, _mime_type: &str) -> bool {
        false
    }

    fn create_recorder(
        &self,
        stream: &NoStream,
        _mime_type: Option<&str>,
    ) -> Result<NoRecorder, DeviceError> {
        match *stream {}
    }
}

impl SpeechRecognizer for HeadlessPlatform {
    type Session = NoRecognition;

    fn availability(&self) -> Availability {
        Availability::Unavailable
    }

    fn start(&self, _config: &RecognitionConfig) -> Result<NoRecognition, DeviceError> {
        Err(DeviceError::Unavailable)
    }
}

impl Geolocator for HeadlessPlatform {
    fn availability(&self) -> Availability {
        Availability::Unavailable
    }

    async fn current_position(&self, _options: &PositionOptions) -> Result<Location, LocationError> {
        Err(LocationError::PositionUnavailable)
    }
}

impl Platform for HeadlessPlatform {
    type Media = Self;
    type Speech = Self;
    type Geo = Self;

    fn media(&self) -> &Self {
        self
    }

    fn speech(&self) -> &Self {
        self
    }

    fn geolocation(&self) -> &Self {
        self
    }
}
