//! Home feed
//!
//! Search, filter and month grouping over the entry list.

use crate::database::{DiaryEntry, MediaKind};
use chrono::{Datelike, Local, TimeZone};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedFilter {
    #[default]
    All,
    Favorites,
    /// Entries with at least one image
    Photos,
}

impl FeedFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedFilter::All => "all",
            FeedFilter::Favorites => "favorites",
            FeedFilter::Photos => "photos",
        }
    }

    pub fn matches(&self, entry: &DiaryEntry) -> bool {
        match self {
            FeedFilter::All => true,
            FeedFilter::Favorites => entry.is_favorite,
            FeedFilter::Photos => entry.has_media(MediaKind::Image),
        }
    }
}

impl FromStr for FeedFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(FeedFilter::All),
            "favorites" | "favourites" => Ok(FeedFilter::Favorites),
            "photos" => Ok(FeedFilter::Photos),
            other => Err(format!("Unknown filter '{}'", other)),
        }
    }
}

impl fmt::Display for FeedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entries written in one calendar month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup<'a> {
    /// e.g. "May 2024"
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub entries: Vec<&'a DiaryEntry>,
}

/// Case-insensitive substring match on title, content or any tag
pub fn matches_search(entry: &DiaryEntry, search: &str) -> bool {
    let needle = search.to_lowercase();
    entry.title.to_lowercase().contains(&needle)
        || entry.content.to_lowercase().contains(&needle)
        || entry.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

/// Filter and group `entries` by local month
pub fn list<'a>(entries: &'a [DiaryEntry], search: &str, filter: FeedFilter) -> Vec<MonthGroup<'a>> {
    list_in(entries, search, filter, &Local)
}

/// Filter and group `entries` by month in `tz`. Groups appear in the
/// order their first entry appears; entries keep source order.
pub fn list_in<'a, Tz>(
    entries: &'a [DiaryEntry],
    search: &str,
    filter: FeedFilter,
    tz: &Tz,
) -> Vec<MonthGroup<'a>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut groups: Vec<MonthGroup<'a>> = Vec::new();

    for entry in entries
        .iter()
        .filter(|e| matches_search(e, search) && filter.matches(e))
    {
        let local = entry.date.with_timezone(tz);
        let (year, month) = (local.year(), local.month());

        match groups.iter_mut().find(|g| g.year == year && g.month == month) {
            Some(group) => group.entries.push(entry),
            None => groups.push(MonthGroup {
                label: local.format("%B %Y").to_string(),
                year,
                month,
                entries: vec![entry],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MediaAttachment, Mood};
    use chrono::Utc;

    fn entry(id: &str, date: &str, title: &str, content: &str, tags: &[&str]) -> DiaryEntry {
        DiaryEntry {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            date: date.parse().unwrap(),
            mood: Mood::None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            media: Vec::new(),
            is_favorite: false,
            location: None,
        }
    }

    fn image() -> MediaAttachment {
        MediaAttachment {
            id: "img".to_string(),
            kind: MediaKind::Image,
            url: "data:image/png;base64,AA==".to_string(),
            thumbnail_url: None,
            duration: None,
            size: Some(1),
        }
    }

    fn ids(groups: &[MonthGroup<'_>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.entries.iter().map(|e| e.id.clone()).collect())
            .collect()
    }

    #[test]
    fn test_search_matches_title_content_and_tags() {
        let trip = entry("1", "2024-05-20T10:00:00Z", "Trip", "Beach day", &["travel"]);

        assert!(matches_search(&trip, "beach"));
        assert!(matches_search(&trip, "TRIP"));
        assert!(matches_search(&trip, "trav"));
        assert!(matches_search(&trip, ""));
        assert!(!matches_search(&trip, "mountain"));
    }

    #[test]
    fn test_filters() {
        let mut fav = entry("1", "2024-05-20T10:00:00Z", "A", "", &[]);
        fav.is_favorite = true;
        let mut photo = entry("2", "2024-05-19T10:00:00Z", "B", "", &[]);
        photo.media.push(image());
        let plain = entry("3", "2024-05-18T10:00:00Z", "C", "", &[]);
        let entries = vec![fav, photo, plain];

        assert_eq!(ids(&list_in(&entries, "", FeedFilter::All, &Utc)), vec![vec!["1", "2", "3"]]);
        assert_eq!(ids(&list_in(&entries, "", FeedFilter::Favorites, &Utc)), vec![vec!["1"]]);
        assert_eq!(ids(&list_in(&entries, "", FeedFilter::Photos, &Utc)), vec![vec!["2"]]);
    }

    #[test]
    fn test_search_and_filter_combine() {
        let mut fav = entry("1", "2024-05-20T10:00:00Z", "Garden", "", &[]);
        fav.is_favorite = true;
        let other = entry("2", "2024-05-19T10:00:00Z", "Garden party", "", &[]);
        let entries = vec![fav, other];

        let groups = list_in(&entries, "garden", FeedFilter::Favorites, &Utc);
        assert_eq!(ids(&groups), vec![vec!["1"]]);
    }

    #[test]
    fn test_grouping_by_month() {
        let entries = vec![
            entry("4", "2024-06-02T10:00:00Z", "", "", &[]),
            entry("3", "2024-05-30T10:00:00Z", "", "", &[]),
            entry("2", "2024-05-01T10:00:00Z", "", "", &[]),
            entry("1", "2023-05-15T10:00:00Z", "", "", &[]),
        ];

        let groups = list_in(&entries, "", FeedFilter::All, &Utc);

        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["June 2024", "May 2024", "May 2023"]);
        assert_eq!(ids(&groups), vec![vec!["4"], vec!["3", "2"], vec!["1"]]);
    }

    #[test]
    fn test_groups_follow_first_encounter() {
        let entries = vec![
            entry("1", "2024-05-02T10:00:00Z", "", "", &[]),
            entry("2", "2024-04-02T10:00:00Z", "", "", &[]),
            entry("3", "2024-05-01T10:00:00Z", "", "", &[]),
        ];

        let groups = list_in(&entries, "", FeedFilter::All, &Utc);
        assert_eq!(ids(&groups), vec![vec!["1", "3"], vec!["2"]]);
    }

    #[test]
    fn test_empty_repository_has_no_groups() {
        assert!(list(&[], "", FeedFilter::All).is_empty());
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("Photos".parse::<FeedFilter>().unwrap(), FeedFilter::Photos);
        assert!("recent".parse::<FeedFilter>().is_err());
    }
}
