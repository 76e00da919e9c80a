//! Entry editor
//!
//! Holds the working copy of one entry (new or existing) together with the
//! capture session and dictation that feed it. Nothing reaches the session
//! until `save`.

use crate::capability::{Availability, Geolocator, Platform, PositionOptions};
use crate::config::{MAX_IMAGES_PER_ENTRY, UNTITLED_ENTRY_TITLE};
use crate::database::{DiaryEntry, Location, MediaAttachment, MediaKind, Mood};
use crate::error::{AppError, LocationError, Result};
use crate::services::analysis::{merge_tags, normalize_tag, AnalysisService, Suggestion};
use crate::services::capture::{ensure_video_fits, CaptureSession, CaptureState, RecordingKind};
use crate::services::dictation::Dictation;
use crate::services::session::{SessionController, StateObserver};
use crate::storage::data_uri;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A file picked by the user
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Result of attaching a batch of files
#[derive(Debug, Default)]
pub struct AttachReport {
    pub attached: Vec<MediaAttachment>,
    /// File name and why it was dropped
    pub rejected: Vec<(String, AppError)>,
}

/// Editable fields of an entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub mood: Mood,
    pub tags: Vec<String>,
    pub media: Vec<MediaAttachment>,
    pub location: Option<Location>,
}

impl Draft {
    fn from_entry(entry: &DiaryEntry) -> Self {
        Self {
            title: entry.title.clone(),
            content: entry.content.clone(),
            mood: entry.mood,
            tags: entry.tags.clone(),
            media: entry.media.clone(),
            location: entry.location,
        }
    }

    pub fn image_count(&self) -> usize {
        self.media
            .iter()
            .filter(|m| m.kind == MediaKind::Image)
            .count()
    }
}

/// Set while an operation runs; cleared on drop, including cancellation
struct BusyFlag<'a>(&'a AtomicBool);

impl<'a> BusyFlag<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Editor<P: Platform, A: AnalysisService> {
    platform: Arc<P>,
    analysis: Arc<A>,
    original: Option<DiaryEntry>,
    draft: Mutex<Draft>,
    capture: Mutex<CaptureSession<P>>,
    dictation: Mutex<Dictation<P>>,
    analyzing: AtomicBool,
    locating: AtomicBool,
}

impl<P: Platform, A: AnalysisService> Editor<P, A> {
    /// Editor for a new entry
    pub fn new(platform: Arc<P>, analysis: Arc<A>) -> Self {
        Self::build(platform, analysis, None)
    }

    /// Editor over an existing entry
    pub fn open(platform: Arc<P>, analysis: Arc<A>, entry: DiaryEntry) -> Self {
        Self::build(platform, analysis, Some(entry))
    }

    fn build(platform: Arc<P>, analysis: Arc<A>, original: Option<DiaryEntry>) -> Self {
        let draft = original.as_ref().map(Draft::from_entry).unwrap_or_default();
        Self {
            capture: Mutex::new(CaptureSession::new(platform.clone())),
            dictation: Mutex::new(Dictation::new(platform.clone())),
            platform,
            analysis,
            original,
            draft: Mutex::new(draft),
            analyzing: AtomicBool::new(false),
            locating: AtomicBool::new(false),
        }
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    pub async fn draft(&self) -> Draft {
        self.draft.lock().await.clone()
    }

    /// Apply a change to the working copy
    pub async fn edit<F>(&self, f: F)
    where
        F: FnOnce(&mut Draft),
    {
        f(&mut *self.draft.lock().await);
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing.load(Ordering::Acquire)
    }

    pub fn is_locating(&self) -> bool {
        self.locating.load(Ordering::Acquire)
    }

    // ===== Tags =====

    /// Add one tag. Returns false for blanks and duplicates.
    pub async fn add_tag(&self, text: &str) -> bool {
        let Some(tag) = normalize_tag(text) else {
            return false;
        };
        merge_tags(&mut self.draft.lock().await.tags, [tag]) > 0
    }

    pub async fn remove_tag(&self, tag: &str) -> bool {
        let mut draft = self.draft.lock().await;
        let before = draft.tags.len();
        let tag = tag.to_lowercase();
        draft.tags.retain(|t| t.to_lowercase() != tag);
        draft.tags.len() != before
    }

    // ===== Attachments =====

    /// Attach an image or video picked from storage
    pub async fn attach_file(&self, file: SelectedFile) -> Result<MediaAttachment> {
        let kind = match MediaKind::from_mime(&file.mime_type) {
            Some(kind @ (MediaKind::Image | MediaKind::Video)) => kind,
            _ => return Err(AppError::UnsupportedMedia(file.mime_type)),
        };
        let size = file.data.len() as u64;

        match kind {
            MediaKind::Image => {
                if self.draft.lock().await.image_count() >= MAX_IMAGES_PER_ENTRY {
                    return Err(AppError::TooManyImages {
                        max: MAX_IMAGES_PER_ENTRY,
                    });
                }
            }
            _ => {
                ensure_video_fits(size)?;
            }
        }

        let SelectedFile {
            name,
            mime_type,
            data,
        } = file;
        let url = tokio::task::spawn_blocking(move || data_uri::encode(&mime_type, &data))
            .await
            .map_err(|e| AppError::Generic(format!("Failed to read {}: {}", name, e)))?;

        let attachment = MediaAttachment {
            id: Uuid::new_v4().to_string(),
            kind,
            url,
            thumbnail_url: None,
            duration: None,
            size: Some(size),
        };

        // the limit may have been reached while encoding
        let mut draft = self.draft.lock().await;
        if kind == MediaKind::Image && draft.image_count() >= MAX_IMAGES_PER_ENTRY {
            return Err(AppError::TooManyImages {
                max: MAX_IMAGES_PER_ENTRY,
            });
        }
        draft.media.push(attachment.clone());

        tracing::debug!("Attached {:?} {} ({} bytes)", kind, name, size);
        Ok(attachment)
    }

    /// Attach a batch. Offending files are dropped and reported; the rest are kept.
    pub async fn attach_files(&self, files: Vec<SelectedFile>) -> AttachReport {
        let mut report = AttachReport::default();

        for file in files {
            let name = file.name.clone();
            match self.attach_file(file).await {
                Ok(attachment) => report.attached.push(attachment),
                Err(e) => {
                    tracing::warn!("Skipped {}: {}", name, e);
                    report.rejected.push((name, e));
                }
            }
        }

        report
    }

    pub async fn remove_attachment(&self, id: &str) -> bool {
        let mut draft = self.draft.lock().await;
        let before = draft.media.len();
        draft.media.retain(|m| m.id != id);
        draft.media.len() != before
    }

    // ===== Analysis =====

    /// Ask the analysis service for a mood and tags and merge them into the draft.
    ///
    /// Does nothing when the content is blank or another request is running.
    /// Service failures are logged and leave the draft untouched.
    pub async fn request_ai_analysis(&self) -> Option<Suggestion> {
        let content = self.draft.lock().await.content.clone();
        if content.trim().is_empty() {
            return None;
        }
        let _busy = BusyFlag::try_acquire(&self.analyzing)?;

        let response = match self.analysis.analyze(&content).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("AI analysis failed: {}", e);
                return None;
            }
        };

        let suggestion = Suggestion::from(response);
        let mut draft = self.draft.lock().await;
        if let Some(mood) = suggestion.mood {
            draft.mood = mood;
        }
        let added = merge_tags(&mut draft.tags, suggestion.tags.iter().cloned());

        tracing::debug!("Analysis applied: mood {}, {} new tags", draft.mood, added);
        Some(suggestion)
    }

    // ===== Location =====

    /// Fix the entry's position. Returns `Ok(None)` if a request is already running.
    pub async fn request_location(&self) -> Result<Option<Location>> {
        let Some(_busy) = BusyFlag::try_acquire(&self.locating) else {
            return Ok(None);
        };

        let geo = self.platform.geolocation();
        match geo.availability() {
            Availability::Available => {}
            Availability::Unavailable => return Err(AppError::Unsupported("Geolocation".to_string())),
            Availability::Denied => return Err(LocationError::PermissionDenied.into()),
        }

        let options = PositionOptions::default();
        let location = tokio::time::timeout(options.timeout, geo.current_position(&options))
            .await
            .map_err(|_| LocationError::Timeout)?
            .map_err(|e| {
                tracing::error!("Location error: {}", e);
                e
            })?;

        self.draft.lock().await.location = Some(location);
        tracing::debug!("Location set to {}, {}", location.lat, location.lng);
        Ok(Some(location))
    }

    // ===== Capture =====

    pub async fn capture_state(&self) -> CaptureState {
        self.capture.lock().await.state()
    }

    pub async fn recording_elapsed_secs(&self) -> u64 {
        self.capture.lock().await.elapsed_secs()
    }

    pub async fn open_camera_preview(&self) -> Result<()> {
        self.capture.lock().await.open_camera_preview().await
    }

    pub async fn start_recording(&self, kind: RecordingKind) -> Result<()> {
        self.capture.lock().await.start_recording(kind).await
    }

    /// Finish the recording and add it to the draft
    pub async fn stop_recording(&self) -> Result<Option<MediaAttachment>> {
        let attachment = self.capture.lock().await.stop_recording().await?;
        if let Some(attachment) = &attachment {
            self.draft.lock().await.media.push(attachment.clone());
        }
        Ok(attachment)
    }

    pub async fn close_capture(&self) {
        self.capture.lock().await.close_everything();
    }

    // ===== Dictation =====

    pub async fn toggle_dictation(&self) -> Result<bool> {
        self.dictation.lock().await.toggle()
    }

    pub async fn is_listening(&self) -> bool {
        self.dictation.lock().await.is_listening()
    }

    /// Move recognized speech into the content. Returns the number of segments added.
    pub async fn pump_dictation(&self) -> usize {
        let mut dictation = self.dictation.lock().await;
        let mut draft = self.draft.lock().await;
        dictation.pump(&mut draft.content)
    }

    // ===== Commit =====

    /// Release devices and commit the entry through the session
    pub async fn save<O: StateObserver>(
        mut self,
        session: &mut SessionController<O>,
    ) -> Result<DiaryEntry> {
        self.capture.get_mut().close_everything();
        self.dictation.get_mut().stop();

        let now = Utc::now();
        let draft = self.draft.into_inner();

        let (id, date) = match &self.original {
            Some(original) => (original.id.clone(), original.date),
            None => (session.fresh_entry_id(now), now),
        };

        let is_favorite = session
            .entries()
            .get(&id)
            .or(self.original.as_ref())
            .map(|e| e.is_favorite)
            .unwrap_or(false);

        let title = if draft.title.trim().is_empty() {
            UNTITLED_ENTRY_TITLE.to_string()
        } else {
            draft.title
        };

        let entry = DiaryEntry {
            id,
            title,
            content: draft.content,
            date,
            mood: draft.mood,
            tags: draft.tags,
            media: draft.media,
            is_favorite,
            location: draft.location,
        };

        session.upsert_entry(entry.clone()).await?;
        tracing::info!("Saved entry {}", entry.id);
        Ok(entry)
    }

    /// Delete the entry being edited. A never-saved draft is simply discarded.
    pub async fn delete<O: StateObserver>(self, session: &mut SessionController<O>) -> Result<()> {
        match &self.original {
            Some(original) => session.delete_entry(&original.id).await,
            None => {
                tracing::debug!("Discarded unsaved draft");
                Ok(())
            }
        }
    }
}
