//! Domain models
//!
//! Rust structs for everything the diary persists.
//! All models use serde; the JSON shape is what lands in the key-value store.

use crate::config::ALL_WEEKDAYS;
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Mood tag attached to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
    Excited,
    Peaceful,
    Work,
    #[default]
    None,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Happy,
        Mood::Neutral,
        Mood::Sad,
        Mood::Excited,
        Mood::Peaceful,
        Mood::Work,
        Mood::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Excited => "excited",
            Mood::Peaceful => "peaceful",
            Mood::Work => "work",
            Mood::None => "none",
        }
    }

    /// Lenient mapping used for free-form labels; unknown labels become `None`
    pub fn from_label(label: &str) -> Mood {
        label.parse().unwrap_or(Mood::None)
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("Unknown mood '{}'", s))
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of captured or uploaded media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Classify a declared MIME type
    pub fn from_mime(mime: &str) -> Option<MediaKind> {
        let top = mime.split('/').next()?.trim().to_lowercase();
        match top.as_str() {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

/// One piece of media bound to an entry. The bytes live inline in `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// `data:` URI holding the encoded bytes
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Seconds, for audio and video
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// A diary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Set once at creation
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaAttachment>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl DiaryEntry {
    pub fn has_media(&self, kind: MediaKind) -> bool {
        self.media.iter().any(|m| m.kind == kind)
    }
}

/// A daily nudge configured in settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    /// `HH:MM`, no date
    pub time: String,
    /// Weekday indices, 0 = Sunday
    #[serde(default)]
    pub days: Vec<u8>,
    pub active: bool,
}

impl Reminder {
    /// Create an active every-day reminder. The id is the creation time in milliseconds.
    pub fn new(title: &str, time: &str) -> Result<Self> {
        Ok(Self {
            id: Utc::now().timestamp_millis().to_string(),
            title: title.trim().to_string(),
            time: normalize_reminder_time(time)?,
            days: ALL_WEEKDAYS.to_vec(),
            active: true,
        })
    }
}

/// Parse `H:MM` or `HH:MM` and return the zero-padded form
pub fn normalize_reminder_time(time: &str) -> Result<String> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| AppError::InvalidReminderTime(time.to_string()))
}

/// The logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    pub profile_pic: String,
    pub is_synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometric_enabled: Option<bool>,
}

impl User {
    /// Build a session user from an email address. No authentication happens.
    pub fn from_email(email: &str) -> Self {
        let email = email.trim();
        let name = email.split('@').next().unwrap_or(email).to_string();

        Self {
            name,
            email: email.to_string(),
            profile_pic: profile_pic_for(email),
            is_synced: true,
            biometric_enabled: None,
        }
    }
}

/// Avatar URL seeded by a hash of the normalised email
fn profile_pic_for(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.to_lowercase().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("https://picsum.photos/seed/{}/200", &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_from_label() {
        assert_eq!(Mood::from_label("Happy"), Mood::Happy);
        assert_eq!(Mood::from_label(" PEACEFUL "), Mood::Peaceful);
        assert_eq!(Mood::from_label("melancholic"), Mood::None);
    }

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("application/pdf"), None);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = DiaryEntry {
            id: "1716200000000".into(),
            title: "Trip".into(),
            content: "Beach day".into(),
            date: "2024-05-20T10:00:00Z".parse().unwrap(),
            mood: Mood::Happy,
            tags: vec!["travel".into()],
            media: vec![MediaAttachment {
                id: "a1".into(),
                kind: MediaKind::Image,
                url: "data:image/png;base64,AA==".into(),
                thumbnail_url: None,
                duration: None,
                size: Some(1),
            }],
            is_favorite: true,
            location: Some(Location { lat: 1.5, lng: -2.0 }),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["isFavorite"], true);
        assert_eq!(json["mood"], "happy");
        assert_eq!(json["media"][0]["type"], "image");
        assert_eq!(json["location"]["lng"], -2.0);

        let back: DiaryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_reminder_time_normalized() {
        assert_eq!(normalize_reminder_time("7:05").unwrap(), "07:05");
        assert_eq!(normalize_reminder_time("20:00").unwrap(), "20:00");
        assert!(normalize_reminder_time("25:00").is_err());
        assert!(normalize_reminder_time("evening").is_err());
    }

    #[test]
    fn test_new_reminder_defaults() {
        let reminder = Reminder::new("Time to write", "20:00").unwrap();
        assert!(reminder.active);
        assert_eq!(reminder.days, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_user_from_email() {
        let user = User::from_email("ada@example.com");
        assert_eq!(user.name, "ada");
        assert!(user.is_synced);
        assert_eq!(user.profile_pic, User::from_email("ADA@example.com").profile_pic);
        assert_ne!(user.profile_pic, User::from_email("bob@example.com").profile_pic);
    }
}
