//! Entry commands
//!
//! Writing goes through the same editor the interactive front end uses,
//! on a headless platform: camera, microphone and location are reported
//! unavailable, file attachments and analysis work as usual.

use crate::app::AppState;
use crate::capability::HeadlessPlatform;
use crate::database::{DiaryEntry, Mood};
use crate::error::AppError;
use crate::services::feed::{self, FeedFilter};
use crate::services::{ConfiguredAnalysis, Editor, SelectedFile};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct WriteCmd {
    /// Entry text
    content: Option<String>,

    #[arg(short, long)]
    title: Option<String>,

    #[arg(short, long)]
    mood: Option<Mood>,

    /// Tag to add; repeatable
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Image or video file to attach; repeatable
    #[arg(short, long = "attach")]
    attachments: Vec<PathBuf>,

    /// Ask the analysis backend for a mood and tags before saving
    #[arg(long)]
    analyze: bool,

    /// Id of an existing entry to edit
    #[arg(long)]
    edit: Option<String>,
}

impl WriteCmd {
    pub async fn run(self, app: &AppState) -> Result<()> {
        let WriteCmd {
            content,
            title,
            mood,
            tags,
            attachments,
            analyze,
            edit,
        } = self;

        let mut session = app.open_session().await?;
        let settings = app.settings.load().await?;
        let platform = Arc::new(HeadlessPlatform);
        let analysis = Arc::new(ConfiguredAnalysis::from_settings(&settings.analysis)?);

        let editor = match edit {
            Some(id) => {
                let entry = session
                    .entries()
                    .get(&id)
                    .cloned()
                    .ok_or(AppError::EntryNotFound(id))?;
                Editor::open(platform, analysis, entry)
            }
            None => Editor::new(platform, analysis),
        };

        editor
            .edit(|draft| {
                if let Some(title) = title {
                    draft.title = title;
                }
                if let Some(content) = content {
                    draft.content = content;
                }
                if let Some(mood) = mood {
                    draft.mood = mood;
                }
            })
            .await;

        for tag in &tags {
            editor.add_tag(tag).await;
        }

        let files = read_files(&attachments).await?;
        let report = editor.attach_files(files).await;
        for (name, e) in &report.rejected {
            eprintln!("Skipped {}: {}", name, e);
        }

        if analyze {
            match editor.request_ai_analysis().await {
                Some(suggestion) if !suggestion.summary.is_empty() => {
                    println!("Summary: {}", suggestion.summary)
                }
                Some(_) => {}
                None => eprintln!("Analysis unavailable, saving without it"),
            }
        }

        let entry = editor.save(&mut session).await?;
        println!("Saved {} \"{}\"", entry.id, entry.title);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ListCmd {
    /// Match title, content or tags
    #[arg(short, long, default_value = "")]
    search: String,

    /// all, favorites or photos
    #[arg(short, long, default_value = "all")]
    filter: FeedFilter,

    /// Show only the entry written on this day (YYYY-MM-DD)
    #[arg(long, conflicts_with_all = ["search", "filter"])]
    day: Option<NaiveDate>,
}

impl ListCmd {
    pub async fn run(self, app: &AppState) -> Result<()> {
        let session = app.open_session().await?;

        if let Some(day) = self.day {
            match session.entries().entry_for_day(day) {
                Some(entry) => println!("{}", summary_line(entry)),
                None => println!("No entry on {}", day),
            }
            return Ok(());
        }

        let groups = feed::list(session.entries().all(), &self.search, self.filter);

        if groups.is_empty() {
            println!("No entries");
            return Ok(());
        }

        for group in groups {
            println!("{}", group.label);
            for entry in group.entries {
                println!("  {}", summary_line(entry));
            }
        }
        Ok(())
    }
}

pub async fn favorite(app: &AppState, id: &str) -> Result<()> {
    let mut session = app.open_session().await?;
    match session.toggle_favorite(id).await? {
        Some(true) => println!("Added {} to favorites", id),
        Some(false) => println!("Removed {} from favorites", id),
        None => println!("No entry with id {}", id),
    }
    Ok(())
}

pub async fn delete(app: &AppState, id: &str) -> Result<()> {
    let mut session = app.open_session().await?;
    session.delete_entry(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

fn summary_line(entry: &DiaryEntry) -> String {
    let mut line = format!(
        "{} {} {}{}",
        entry.date.with_timezone(&Local).format("%a %d %H:%M"),
        entry.id,
        if entry.is_favorite { "* " } else { "" },
        entry.title
    );
    if entry.mood != Mood::None {
        line.push_str(&format!(" [{}]", entry.mood));
    }
    for tag in &entry.tags {
        line.push_str(&format!(" #{}", tag));
    }
    if !entry.media.is_empty() {
        line.push_str(&format!(" ({} media)", entry.media.len()));
    }
    line
}

async fn read_files(paths: &[PathBuf]) -> Result<Vec<SelectedFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(SelectedFile {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            mime_type: mime_for_path(path).to_string(),
            data,
        });
    }
    Ok(files)
}

/// Guess a MIME type from the file extension
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}
