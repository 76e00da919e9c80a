//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config::{NUDGE_DISMISS_AFTER, NUDGE_VIBRATION_MS, SETTINGS_FILE};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// Analysis backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Endpoint accepting `{"content": ...}` and answering `{mood, tags, summary}`.
    /// Analysis is disabled when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_analysis_timeout")]
    pub timeout_secs: u64,
}

fn default_analysis_timeout() -> u64 {
    30
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_analysis_timeout(),
        }
    }
}

/// Pacing of the simulated cloud sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Base pause after each preparation phase
    #[serde(default = "default_step_delay")]
    pub step_delay_ms: u64,
    /// Random extra pause added to each preparation phase
    #[serde(default = "default_step_jitter")]
    pub step_jitter_ms: u64,
    /// Pause after each uploaded batch
    #[serde(default = "default_upload_delay")]
    pub upload_delay_ms: u64,
    #[serde(default = "default_upload_batches")]
    pub upload_batches: u32,
}

fn default_step_delay() -> u64 {
    600
}

fn default_step_jitter() -> u64 {
    400
}

fn default_upload_delay() -> u64 {
    400
}

fn default_upload_batches() -> u32 {
    8
}

impl SyncSettings {
    /// No pauses at all
    pub fn instant() -> Self {
        Self {
            step_delay_ms: 0,
            step_jitter_ms: 0,
            upload_delay_ms: 0,
            upload_batches: default_upload_batches(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay(),
            step_jitter_ms: default_step_jitter(),
            upload_delay_ms: default_upload_delay(),
            upload_batches: default_upload_batches(),
        }
    }
}

/// Reminder banner behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NudgeSettings {
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    #[serde(default = "default_vibration_ms")]
    pub vibration_ms: u32,
    #[serde(default = "default_dismiss_after")]
    pub dismiss_after_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_vibration_ms() -> u32 {
    NUDGE_VIBRATION_MS
}

fn default_dismiss_after() -> u64 {
    NUDGE_DISMISS_AFTER.as_secs()
}

impl NudgeSettings {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_secs(self.dismiss_after_secs)
    }

    /// Vibration length, if vibration is on
    pub fn vibration(&self) -> Option<u32> {
        (self.vibration_enabled && self.vibration_ms > 0).then_some(self.vibration_ms)
    }
}

impl Default for NudgeSettings {
    fn default() -> Self {
        Self {
            vibration_enabled: true,
            vibration_ms: default_vibration_ms(),
            dismiss_after_secs: default_dismiss_after(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub nudges: NudgeSettings,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !fs::try_exists(&self.settings_path).await? {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    /// Update the analysis backend
    pub async fn update_analysis(&self, analysis: AnalysisSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.analysis = analysis;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert!(settings.analysis.endpoint.is_none());
        assert_eq!(settings.sync.step_delay_ms, 600);
        assert_eq!(settings.sync.upload_batches, 8);
        assert_eq!(settings.nudges.vibration(), Some(200));
        assert_eq!(settings.nudges.dismiss_after(), Duration::from_secs(8));
        assert!(temp.path().join(SETTINGS_FILE).exists());
    }

    #[tokio::test]
    async fn test_partial_file_gets_defaults() {
        let (service, temp) = create_test_service();
        std::fs::write(
            temp.path().join(SETTINGS_FILE),
            r#"{"nudges":{"vibration_enabled":false}}"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.nudges.vibration(), None);
        assert_eq!(settings.nudges.dismiss_after_secs, 8);
        assert_eq!(settings.sync.upload_delay_ms, 400);
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            service
                .update_analysis(AnalysisSettings {
                    endpoint: Some("http://localhost:9000/analyze".to_string()),
                    api_key: None,
                    timeout_secs: 5,
                })
                .await
                .unwrap();
        }

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            let loaded = service.load().await.unwrap();
            assert_eq!(
                loaded.analysis.endpoint.as_deref(),
                Some("http://localhost:9000/analyze")
            );
            assert_eq!(loaded.analysis.timeout_secs, 5);
        }
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let (service, temp) = create_test_service();
        std::fs::write(temp.path().join(SETTINGS_FILE), "{not json").unwrap();

        assert!(service.load().await.is_err());
    }
}
