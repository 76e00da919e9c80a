//! In-memory entry repository
//!
//! The authoritative list of diary entries, newest first. Ids are unique
//! and an entry's date never changes once it is in the list.

use crate::database::DiaryEntry;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryRepository {
    entries: Vec<DiaryEntry>,
}

impl EntryRepository {
    pub fn new(entries: Vec<DiaryEntry>) -> Self {
        Self { entries }
    }

    pub fn all(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&DiaryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Replace the entry with the same id, keeping its original date,
    /// or prepend it when the id is new.
    pub fn upsert(&mut self, mut entry: DiaryEntry) -> Upsert {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => {
                entry.date = existing.date;
                *existing = entry;
                Upsert::Replaced
            }
            None => {
                self.entries.insert(0, entry);
                Upsert::Inserted
            }
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Flip `is_favorite` on one entry. Returns the new value, or `None` if the id is absent.
    pub fn toggle_favorite(&mut self, id: &str) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.is_favorite = !entry.is_favorite;
        Some(entry.is_favorite)
    }

    /// Id for a new entry created at `now`: its millisecond timestamp,
    /// bumped forward until it no longer collides.
    pub fn fresh_id(&self, now: DateTime<Utc>) -> String {
        let mut millis = now.timestamp_millis();
        while self.get(&millis.to_string()).is_some() {
            millis += 1;
        }
        millis.to_string()
    }

    /// First entry written on `day` in local time
    pub fn entry_for_day(&self, day: NaiveDate) -> Option<&DiaryEntry> {
        self.entry_for_day_in(day, &Local)
    }

    pub fn entry_for_day_in<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> Option<&DiaryEntry> {
        self.entries
            .iter()
            .find(|e| e.date.with_timezone(tz).date_naive() == day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Mood;

    fn entry(id: &str, date: &str) -> DiaryEntry {
        DiaryEntry {
            id: id.to_string(),
            title: format!("Entry {}", id),
            content: String::new(),
            date: date.parse().unwrap(),
            mood: Mood::None,
            tags: Vec::new(),
            media: Vec::new(),
            is_favorite: false,
            location: None,
        }
    }

    #[test]
    fn test_new_entries_are_prepended() {
        let mut repo = EntryRepository::default();

        assert_eq!(repo.upsert(entry("1", "2024-05-01T10:00:00Z")), Upsert::Inserted);
        assert_eq!(repo.upsert(entry("2", "2024-05-02T10:00:00Z")), Upsert::Inserted);

        let ids: Vec<_> = repo.all().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_replace_keeps_position_and_date() {
        let mut repo = EntryRepository::new(vec![
            entry("2", "2024-05-02T10:00:00Z"),
            entry("1", "2024-05-01T10:00:00Z"),
        ]);

        let mut edited = entry("1", "2030-01-01T00:00:00Z");
        edited.title = "Edited".to_string();

        assert_eq!(repo.upsert(edited), Upsert::Replaced);
        assert_eq!(repo.len(), 2);

        let stored = &repo.all()[1];
        assert_eq!(stored.title, "Edited");
        assert_eq!(stored.date, "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_toggle_favorite_twice_restores() {
        let mut repo = EntryRepository::new(vec![
            entry("a", "2024-05-02T10:00:00Z"),
            entry("b", "2024-05-01T10:00:00Z"),
        ]);

        assert_eq!(repo.toggle_favorite("a"), Some(true));
        assert!(!repo.get("b").unwrap().is_favorite);
        assert_eq!(repo.toggle_favorite("a"), Some(false));
        assert!(!repo.get("b").unwrap().is_favorite);
    }

    #[test]
    fn test_toggle_missing_is_noop() {
        let mut repo = EntryRepository::new(vec![entry("a", "2024-05-02T10:00:00Z")]);
        let before = repo.clone();

        assert_eq!(repo.toggle_favorite("zzz"), None);
        assert_eq!(repo, before);
    }

    #[test]
    fn test_delete() {
        let mut repo = EntryRepository::new(vec![entry("a", "2024-05-02T10:00:00Z")]);

        assert!(repo.delete("a"));
        assert!(!repo.delete("a"));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_fresh_id_avoids_collisions() {
        let now: DateTime<Utc> = "2024-05-20T10:00:00Z".parse().unwrap();
        let millis = now.timestamp_millis();
        let repo = EntryRepository::new(vec![entry(&millis.to_string(), "2024-05-20T10:00:00Z")]);

        assert_eq!(repo.fresh_id(now), (millis + 1).to_string());
    }

    #[test]
    fn test_entry_for_day() {
        let repo = EntryRepository::new(vec![
            entry("2", "2024-05-21T08:00:00Z"),
            entry("1", "2024-05-20T23:00:00Z"),
        ]);

        let day = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(repo.entry_for_day_in(day, &Utc).unwrap().id, "1");

        let empty_day = NaiveDate::from_ymd_opt(2024, 5, 22).unwrap();
        assert!(repo.entry_for_day_in(empty_day, &Utc).is_none());
    }
}
