//! Entry analysis service
//!
//! Suggests a mood and tags for an entry's text. The service is an
//! external collaborator: anything that answers the request/response
//! contract below can stand in for it.

use crate::database::Mood;
use crate::error::{AppError, Result};
use crate::services::settings::AnalysisSettings;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Raw answer from an analysis backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// Normalized suggestion ready to merge into a draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// `None` when the backend returned no mood at all
    pub mood: Option<Mood>,
    pub tags: Vec<String>,
    pub summary: String,
}

impl From<AnalysisResponse> for Suggestion {
    fn from(response: AnalysisResponse) -> Self {
        let mood = if response.mood.trim().is_empty() {
            None
        } else {
            Some(Mood::from_label(&response.mood))
        };

        Self {
            mood,
            tags: response.tags.iter().filter_map(|t| normalize_tag(t)).collect(),
            summary: response.summary,
        }
    }
}

pub trait AnalysisService: Send + Sync {
    fn analyze(&self, content: &str) -> impl Future<Output = Result<AnalysisResponse>> + Send;
}

/// Trim a tag and drop one leading `#`. Blank tags become `None`.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let tag = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

/// Append tags not already present (case-insensitive), keeping insertion order.
/// Returns how many were added.
pub fn merge_tags<I>(existing: &mut Vec<String>, incoming: I) -> usize
where
    I: IntoIterator<Item = String>,
{
    let mut added = 0;
    for tag in incoming {
        let Some(tag) = normalize_tag(&tag) else {
            continue;
        };
        let key = tag.to_lowercase();
        if existing.iter().any(|t| t.to_lowercase() == key) {
            continue;
        }
        existing.push(tag);
        added += 1;
    }
    added
}

/// JSON-over-HTTP analysis backend
#[derive(Clone)]
pub struct HttpAnalysisService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct AnalysisRequest<'a> {
    content: &'a str,
}

impl HttpAnalysisService {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("zendiary/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

impl AnalysisService for HttpAnalysisService {
    async fn analyze(&self, content: &str) -> Result<AnalysisResponse> {
        tracing::debug!("Requesting analysis from {}", self.endpoint);

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&AnalysisRequest { content });

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await?
            .error_for_status()?
            .json::<AnalysisResponse>()
            .await?;

        Ok(response)
    }
}

/// Analysis backend picked from settings
#[derive(Clone)]
pub enum ConfiguredAnalysis {
    Http(HttpAnalysisService),
    Disabled,
}

impl ConfiguredAnalysis {
    pub fn from_settings(settings: &AnalysisSettings) -> Result<Self> {
        match &settings.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => {
                Ok(ConfiguredAnalysis::Http(HttpAnalysisService::new(
                    endpoint.trim().to_string(),
                    settings.api_key.clone(),
                    Duration::from_secs(settings.timeout_secs),
                )?))
            }
            _ => Ok(ConfiguredAnalysis::Disabled),
        }
    }
}

impl AnalysisService for ConfiguredAnalysis {
    async fn analyze(&self, content: &str) -> Result<AnalysisResponse> {
        match self {
            ConfiguredAnalysis::Http(service) => service.analyze(content).await,
            ConfiguredAnalysis::Disabled => Err(AppError::Analysis(
                "No analysis endpoint configured".to_string(),
            )),
        }
    }
}
