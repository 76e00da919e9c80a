//! Capture service
//!
//! Camera preview, video and voice recording. The session exclusively owns
//! the hardware stream, the recorder and the duration ticker, and releases
//! all of them on every exit path: stop, close, or drop.
//!
//! States: `Idle -> Previewing -> Recording(Video) -> Previewing`, and
//! `Idle -> Recording(Audio) -> Idle`.

use crate::capability::{
    Availability, DeviceError, MediaDevices, MediaRecorder, MediaStream, Platform,
    StreamConstraints,
};
use crate::config::{
    AUDIO_CONTAINER_MIME, MAX_VIDEO_SIZE_BYTES, MAX_VIDEO_SIZE_MB, PREFERRED_AUDIO_MIME,
    PREFERRED_VIDEO_MIME, RECORDER_TIMESLICE, RECORDING_TICK, VIDEO_CONTAINER_MIME,
};
use crate::database::{MediaAttachment, MediaKind};
use crate::error::{AppError, Result};
use crate::storage::data_uri;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingKind {
    Video,
    Audio,
}

impl RecordingKind {
    fn device_name(self) -> &'static str {
        match self {
            RecordingKind::Video => "Camera",
            RecordingKind::Audio => "Microphone",
        }
    }

    fn preferred_mime(self) -> &'static str {
        match self {
            RecordingKind::Video => PREFERRED_VIDEO_MIME,
            RecordingKind::Audio => PREFERRED_AUDIO_MIME,
        }
    }

    fn container_mime(self) -> &'static str {
        match self {
            RecordingKind::Video => VIDEO_CONTAINER_MIME,
            RecordingKind::Audio => AUDIO_CONTAINER_MIME,
        }
    }
}

impl From<RecordingKind> for MediaKind {
    fn from(kind: RecordingKind) -> Self {
        match kind {
            RecordingKind::Video => MediaKind::Video,
            RecordingKind::Audio => MediaKind::Audio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Previewing,
    Recording(RecordingKind),
}

/// Videos up to and including the ceiling are accepted
pub(crate) fn ensure_video_fits(size: u64) -> Result<()> {
    if size > MAX_VIDEO_SIZE_BYTES {
        return Err(AppError::VideoTooLarge {
            size,
            max_mb: MAX_VIDEO_SIZE_MB,
        });
    }
    Ok(())
}

type StreamOf<P> = <<P as Platform>::Media as MediaDevices>::Stream;
type RecorderOf<P> = <<P as Platform>::Media as MediaDevices>::Recorder;

struct ActiveRecording<R> {
    kind: RecordingKind,
    recorder: R,
    chunks: Vec<Vec<u8>>,
    elapsed: Arc<AtomicU64>,
    ticker: JoinHandle<()>,
}

/// Camera/microphone session owned by one editor
pub struct CaptureSession<P: Platform> {
    platform: Arc<P>,
    stream: Option<StreamOf<P>>,
    preview_open: bool,
    recording: Option<ActiveRecording<RecorderOf<P>>>,
}

impl<P: Platform> CaptureSession<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self {
            platform,
            stream: None,
            preview_open: false,
            recording: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        match (&self.recording, self.preview_open) {
            (Some(active), _) => CaptureState::Recording(active.kind),
            (None, true) => CaptureState::Previewing,
            (None, false) => CaptureState::Idle,
        }
    }

    /// The live stream to show on the preview surface
    pub fn preview_stream(&self) -> Option<&StreamOf<P>> {
        if self.preview_open {
            self.stream.as_ref().filter(|s| s.is_live())
        } else {
            None
        }
    }

    /// Whole seconds recorded so far
    pub fn elapsed_secs(&self) -> u64 {
        self.recording
            .as_ref()
            .map(|active| active.elapsed.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Open the front camera with sound and enter `Previewing`
    pub async fn open_camera_preview(&mut self) -> Result<()> {
        if self.preview_open {
            return Ok(());
        }
        if self.recording.is_some() {
            return Err(AppError::Capture(
                "Stop the current recording before opening the camera".to_string(),
            ));
        }

        let stream = self
            .acquire(RecordingKind::Video, &StreamConstraints::camera())
            .await?;

        self.stream = Some(stream);
        self.preview_open = true;

        tracing::info!("Camera preview opened");
        Ok(())
    }

    /// Start recording. Video needs an open preview; audio opens the microphone itself.
    pub async fn start_recording(&mut self, kind: RecordingKind) -> Result<()> {
        if self.recording.is_some() {
            return Err(AppError::Capture(
                "A recording is already in progress".to_string(),
            ));
        }

        match kind {
            RecordingKind::Video => {
                if !self.preview_open || self.stream.is_none() {
                    return Err(AppError::Capture(
                        "Open the camera before recording video".to_string(),
                    ));
                }
            }
            RecordingKind::Audio => {
                if self.preview_open {
                    return Err(AppError::Capture(
                        "Close the camera before recording a voice note".to_string(),
                    ));
                }
                let stream = self
                    .acquire(RecordingKind::Audio, &StreamConstraints::microphone())
                    .await?;
                self.stream = Some(stream);
            }
        }

        let recorder = match self.init_recorder(kind) {
            Ok(recorder) => recorder,
            Err(e) => {
                if kind == RecordingKind::Audio {
                    self.release_stream();
                }
                return Err(e);
            }
        };

        let elapsed = Arc::new(AtomicU64::new(0));
        let ticker = spawn_ticker(elapsed.clone());

        self.recording = Some(ActiveRecording {
            kind,
            recorder,
            chunks: Vec::new(),
            elapsed,
            ticker,
        });

        tracing::info!("Started {:?} recording", kind);
        Ok(())
    }

    /// Move chunks the recorder produced so far into the session buffer
    pub fn collect_chunks(&mut self) {
        if let Some(active) = self.recording.as_mut() {
            let chunks = active.recorder.take_chunks();
            active
                .chunks
                .extend(chunks.into_iter().filter(|c| !c.is_empty()));
        }
    }

    /// Finish the recording and turn it into an attachment.
    ///
    /// Audio releases the microphone; video keeps the camera preview open.
    /// Videos over the size ceiling are discarded.
    pub async fn stop_recording(&mut self) -> Result<Option<MediaAttachment>> {
        let Some(mut active) = self.recording.take() else {
            return Ok(None);
        };

        active.ticker.abort();
        let duration = active.elapsed.load(Ordering::Relaxed);

        let mut chunks = active.chunks;
        chunks.extend(
            active
                .recorder
                .stop()
                .into_iter()
                .filter(|c| !c.is_empty()),
        );

        if active.kind == RecordingKind::Audio {
            self.release_stream();
        }

        let size: u64 = chunks.iter().map(|c| c.len() as u64).sum();

        if active.kind == RecordingKind::Video {
            ensure_video_fits(size).inspect_err(|_| {
                tracing::warn!("Discarding {} byte video recording", size);
            })?;
        }

        if size == 0 {
            tracing::warn!("{:?} recording produced no data", active.kind);
            return Ok(None);
        }

        let mime = active.kind.container_mime();
        let url = tokio::task::spawn_blocking(move || data_uri::encode(mime, &chunks.concat()))
            .await
            .map_err(|e| AppError::Capture(format!("Failed to encode recording: {}", e)))?;

        tracing::info!(
            "Finished {:?} recording ({}s, {} bytes)",
            active.kind,
            duration,
            size
        );

        Ok(Some(MediaAttachment {
            id: Uuid::new_v4().to_string(),
            kind: active.kind.into(),
            url,
            thumbnail_url: None,
            duration: Some(duration),
            size: Some(size),
        }))
    }

    /// Stop everything and return to `Idle`. Safe to call at any time.
    pub fn close_everything(&mut self) {
        if let Some(mut active) = self.recording.take() {
            active.ticker.abort();
            if active.recorder.is_active() {
                active.recorder.stop();
            }
            tracing::debug!("Discarded unfinished {:?} recording", active.kind);
        }

        self.release_stream();
        self.preview_open = false;
    }

    async fn acquire(
        &self,
        kind: RecordingKind,
        constraints: &StreamConstraints,
    ) -> Result<StreamOf<P>> {
        let devices = self.platform.media();
        let device = kind.device_name();

        match devices.availability() {
            Availability::Available => {}
            Availability::Unavailable => return Err(AppError::Unsupported(device.to_string())),
            Availability::Denied => return Err(AppError::PermissionDenied(device.to_string())),
        }

        devices.get_user_media(constraints).await.map_err(|e| {
            tracing::error!("{} access failed: {}", device, e);
            match e {
                DeviceError::Denied | DeviceError::Unavailable => {
                    AppError::PermissionDenied(device.to_string())
                }
                DeviceError::Failed(msg) => AppError::Capture(msg),
            }
        })
    }

    fn init_recorder(&self, kind: RecordingKind) -> Result<RecorderOf<P>> {
        let devices = self.platform.media();
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| AppError::Capture("No capture stream".to_string()))?;

        if kind == RecordingKind::Video && !stream.has_video() {
            return Err(AppError::Capture("Camera stream has no video track".to_string()));
        }

        let preferred = kind.preferred_mime();
        let mime = devices.is_type_supported(preferred).then_some(preferred);
        if mime.is_none() {
            tracing::debug!("{} unsupported, using platform default", preferred);
        }

        let mut recorder = devices
            .create_recorder(stream, mime)
            .map_err(|e| AppError::Capture(format!("Failed to create recorder: {}", e)))?;

        recorder
            .start(RECORDER_TIMESLICE)
            .map_err(|e| AppError::Capture(format!("Failed to start recorder: {}", e)))?;

        Ok(recorder)
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            tracing::debug!("Released capture stream");
        }
    }
}

impl<P: Platform> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        self.close_everything();
    }
}

fn spawn_ticker(elapsed: Arc<AtomicU64>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + RECORDING_TICK;
        let mut interval = tokio::time::interval_at(start, RECORDING_TICK);
        loop {
            interval.tick().await;
            elapsed.fetch_add(1, Ordering::Relaxed);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::fake::FakePlatform;
    use std::time::Duration;

    fn session_with(platform: FakePlatform) -> (CaptureSession<FakePlatform>, Arc<FakePlatform>) {
        let platform = Arc::new(platform);
        (CaptureSession::new(platform.clone()), platform)
    }

    #[tokio::test]
    async fn test_preview_then_video_recording() {
        let (mut session, platform) = session_with(FakePlatform::new());

        session.open_camera_preview().await.unwrap();
        assert_eq!(session.state(), CaptureState::Previewing);
        assert!(session.preview_stream().is_some());

        session.start_recording(RecordingKind::Video).await.unwrap();
        assert_eq!(session.state(), CaptureState::Recording(RecordingKind::Video));

        let attachment = session.stop_recording().await.unwrap().unwrap();
        assert_eq!(attachment.kind, MediaKind::Video);
        assert_eq!(attachment.size, Some(14));
        assert!(attachment.url.starts_with("data:video/webm;base64,"));

        // the preview survives for an immediate re-record
        assert_eq!(session.state(), CaptureState::Previewing);
        assert_eq!(platform.media.live_streams(), 1);

        session.close_everything();
        assert_eq!(session.state(), CaptureState::Idle);
        assert_eq!(platform.media.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_video_requires_preview() {
        let (mut session, platform) = session_with(FakePlatform::new());

        let result = session.start_recording(RecordingKind::Video).await;

        assert!(matches!(result, Err(AppError::Capture(_))));
        assert_eq!(session.state(), CaptureState::Idle);
        assert_eq!(platform.media.opened_streams(), 0);
    }

    #[tokio::test]
    async fn test_audio_recording_releases_microphone() {
        let (mut session, platform) = session_with(FakePlatform::new());

        session.start_recording(RecordingKind::Audio).await.unwrap();
        assert_eq!(platform.media.live_streams(), 1);

        let attachment = session.stop_recording().await.unwrap().unwrap();

        assert_eq!(attachment.kind, MediaKind::Audio);
        assert!(attachment.url.starts_with("data:audio/webm;base64,"));
        assert_eq!(session.state(), CaptureState::Idle);
        assert_eq!(platform.media.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_permission_denied_leaves_state_unchanged() {
        let mut platform = FakePlatform::new();
        platform.media.prompt_error = Some(DeviceError::Denied);
        let (mut session, _platform) = session_with(platform);

        let result = session.open_camera_preview().await;

        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
        assert_eq!(session.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_unavailable_camera_is_unsupported() {
        let mut platform = FakePlatform::new();
        platform.media.availability = Availability::Unavailable;
        let (mut session, _platform) = session_with(platform);

        let result = session.start_recording(RecordingKind::Audio).await;

        assert!(matches!(result, Err(AppError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let (mut session, platform) = session_with(FakePlatform::new());

        session.start_recording(RecordingKind::Audio).await.unwrap();
        let again = session.start_recording(RecordingKind::Audio).await;

        assert!(again.is_err());
        assert_eq!(platform.media.opened_streams(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_default_encoding() {
        let mut platform = FakePlatform::new();
        platform.media.supports_preferred = false;
        let (mut session, platform) = session_with(platform);

        session.start_recording(RecordingKind::Audio).await.unwrap();

        assert_eq!(*platform.media.recorder_types.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_oversized_video_is_discarded() {
        let platform = FakePlatform::new();
        *platform.media.next_recording.lock().unwrap() =
            Some(vec![vec![0u8; MAX_VIDEO_SIZE_BYTES as usize + 1]]);
        let (mut session, _platform) = session_with(platform);

        session.open_camera_preview().await.unwrap();
        session.start_recording(RecordingKind::Video).await.unwrap();
        let result = session.stop_recording().await;

        assert!(matches!(result, Err(AppError::VideoTooLarge { .. })));
        assert_eq!(session.state(), CaptureState::Previewing);
    }

    #[tokio::test]
    async fn test_video_at_the_ceiling_is_kept() {
        let platform = FakePlatform::new();
        *platform.media.next_recording.lock().unwrap() =
            Some(vec![vec![0u8; MAX_VIDEO_SIZE_BYTES as usize]]);
        let (mut session, _platform) = session_with(platform);

        session.open_camera_preview().await.unwrap();
        session.start_recording(RecordingKind::Video).await.unwrap();
        let attachment = session.stop_recording().await.unwrap().unwrap();

        assert_eq!(attachment.size, Some(MAX_VIDEO_SIZE_BYTES));
    }

    #[test]
    fn test_video_ceiling_is_inclusive() {
        assert!(ensure_video_fits(MAX_VIDEO_SIZE_BYTES).is_ok());
        assert!(matches!(
            ensure_video_fits(MAX_VIDEO_SIZE_BYTES + 1),
            Err(AppError::VideoTooLarge { max_mb: 250, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_counts_seconds() {
        let (mut session, _platform) = session_with(FakePlatform::new());

        session.start_recording(RecordingKind::Audio).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(session.elapsed_secs(), 3);

        let attachment = session.stop_recording().await.unwrap().unwrap();
        assert_eq!(attachment.duration, Some(3));
    }

    #[tokio::test]
    async fn test_collected_chunks_are_kept() {
        let (mut session, _platform) = session_with(FakePlatform::new());

        session.start_recording(RecordingKind::Audio).await.unwrap();
        session.collect_chunks();
        let attachment = session.stop_recording().await.unwrap().unwrap();

        let (_, data) = data_uri::decode(&attachment.url).unwrap();
        assert_eq!(data, b"chunk-1chunk-2");
    }

    #[tokio::test]
    async fn test_drop_releases_hardware() {
        let (mut session, platform) = session_with(FakePlatform::new());

        session.open_camera_preview().await.unwrap();
        session.start_recording(RecordingKind::Video).await.unwrap();
        drop(session);

        assert_eq!(platform.media.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut session, _platform) = session_with(FakePlatform::new());

        session.close_everything();
        session.open_camera_preview().await.unwrap();
        session.close_everything();
        session.close_everything();

        assert_eq!(session.state(), CaptureState::Idle);
    }
}
