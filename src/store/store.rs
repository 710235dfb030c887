//! Bounded transcript store: persisted append-only log + recent-record cache.

use crate::defaults;
use crate::error::EchologError;
use crate::store::record::TranscriptRecord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk document shape: a single array field in append order.
#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    records: Vec<TranscriptRecord>,
}

/// Conjunctive query filters. All supplied filters must match.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Case-insensitive substring over transcription OR summary.
    pub keyword: Option<String>,
    /// Inclusive `YYYY-MM-DD` bounds against the local timestamp date.
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Inclusive `HH:MM[:SS]` bounds against the local timestamp time.
    pub time_from: Option<String>,
    pub time_to: Option<String>,
}

/// Append-only persisted log with a bounded in-memory cache of the newest
/// records.
///
/// Single-writer discipline: only the summarization worker appends. The
/// cache is always a suffix of the persisted sequence. Persistence is
/// best-effort: a write failure is logged and the in-memory state still
/// advances.
pub struct TranscriptStore {
    path: PathBuf,
    max_records: usize,
    cache_size: usize,
    records: Vec<TranscriptRecord>,
    cache: VecDeque<TranscriptRecord>,
}

impl TranscriptStore {
    /// Opens the store at `path`, rebuilding the cache from the persisted
    /// tail. Missing or malformed content loads as an empty store.
    pub fn open(path: &Path, max_records: usize, cache_size: usize) -> Self {
        let records = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<StoreFile>(&contents) {
                Ok(file) => file.records,
                Err(e) => {
                    eprintln!(
                        "echolog: malformed store file {} ({}), starting empty",
                        path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        let mut store = Self {
            path: path.to_path_buf(),
            max_records: max_records.max(1),
            cache_size: cache_size.max(1),
            records,
            cache: VecDeque::new(),
        };
        store.rebuild_cache();
        store
    }

    /// Opens a store with default capacity settings.
    pub fn open_default(path: &Path) -> Self {
        Self::open(
            path,
            defaults::STORE_MAX_RECORDS,
            defaults::STORE_CACHE_SIZE,
        )
    }

    /// Appends a record: persists the full sequence, updates the cache, and
    /// runs the rotation check.
    pub fn append(&mut self, record: TranscriptRecord) {
        self.records.push(record.clone());
        self.rotate();

        self.cache.push_back(record);
        while self.cache.len() > self.cache_size {
            self.cache.pop_front();
        }

        self.persist();
    }

    /// Drops the oldest records beyond the retention ceiling.
    fn rotate(&mut self) {
        if self.records.len() > self.max_records {
            let excess = self.records.len() - self.max_records;
            self.records.drain(..excess);
        }
    }

    /// Removes all records, persisted and cached.
    pub fn clear(&mut self) {
        self.records.clear();
        self.cache.clear();
        self.persist();
    }

    /// Runs a filtered query, newest-first, capped at the result limit.
    pub fn query(&self, filter: &QueryFilter) -> Vec<TranscriptRecord> {
        self.records
            .iter()
            .rev()
            .filter(|record| Self::matches(record, filter))
            .take(defaults::QUERY_RESULT_LIMIT)
            .cloned()
            .collect()
    }

    /// Records with `unix_timestamp` in `[now - window_secs, now]`, in
    /// append order.
    pub fn time_window(&self, now: i64, window_secs: i64) -> Vec<TranscriptRecord> {
        let from = now - window_secs;
        self.records
            .iter()
            .filter(|record| record.unix_timestamp >= from && record.unix_timestamp <= now)
            .cloned()
            .collect()
    }

    /// The cached newest records, in append order.
    pub fn cached(&self) -> Vec<TranscriptRecord> {
        self.cache.iter().cloned().collect()
    }

    /// The most recently appended record.
    pub fn latest(&self) -> Option<&TranscriptRecord> {
        self.records.last()
    }

    /// Number of persisted records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matches(record: &TranscriptRecord, filter: &QueryFilter) -> bool {
        if let Some(keyword) = &filter.keyword
            && !record.matches_keyword(keyword)
        {
            return false;
        }

        let date = record.date_part();
        if let Some(from) = &filter.date_from
            && date < from.as_str()
        {
            return false;
        }
        if let Some(to) = &filter.date_to
            && date > to.as_str()
        {
            return false;
        }

        let time = record.time_part();
        if let Some(from) = &filter.time_from
            && Self::clip(time, from) < from.as_str()
        {
            return false;
        }
        if let Some(to) = &filter.time_to
            && Self::clip(time, to) > to.as_str()
        {
            return false;
        }

        true
    }

    /// Truncates a record's time field to the filter's precision so that
    /// `"10:30:00"` still matches an inclusive bound of `"10:30"`.
    fn clip<'a>(time: &'a str, bound: &str) -> &'a str {
        &time[..bound.len().min(time.len())]
    }

    fn rebuild_cache(&mut self) {
        let tail_start = self.records.len().saturating_sub(self.cache_size);
        self.cache = self.records[tail_start..].iter().cloned().collect();
    }

    /// Rewrites the persisted document. Write failures are logged; the
    /// in-memory state stays ahead until the next successful write.
    fn persist(&self) {
        let file = StoreFile {
            records: self.records.clone(),
        };
        let serialized = match serde_json::to_string(&file) {
            Ok(json) => json,
            Err(e) => {
                let err = EchologError::Storage {
                    message: format!("failed to serialize store: {}", e),
                };
                eprintln!("echolog: {}", err);
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, serialized) {
            let err = EchologError::Storage {
                message: format!("failed to write {}: {}", self.path.display(), e),
            };
            eprintln!("echolog: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn record_at(h: u32, mi: u32, text: &str, summary: &str) -> TranscriptRecord {
        let t = Local.with_ymd_and_hms(2026, 8, 26, h, mi, 0).unwrap();
        TranscriptRecord::new(t, t, t, text.to_string(), summary.to_string())
    }

    fn temp_store(max: usize, cache: usize) -> (tempfile::TempDir, TranscriptStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::open(&dir.path().join("transcripts.json"), max, cache);
        (dir, store)
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_dir, store) = temp_store(100, 10);
        assert!(store.is_empty());
        assert!(store.latest().is_none());
    }

    #[test]
    fn test_open_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.json");
        fs::write(&path, "not json at all {{{").unwrap();
        let store = TranscriptStore::open(&path, 100, 10);
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.json");
        {
            let mut store = TranscriptStore::open(&path, 100, 10);
            store.append(record_at(10, 0, "first words", "first summary"));
            store.append(record_at(10, 5, "second words", "second summary"));
        }

        let reloaded = TranscriptStore::open(&path, 100, 10);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.latest().unwrap().transcription, "second words");
    }

    #[test]
    fn test_cache_is_suffix_of_persisted_sequence() {
        let (_dir, mut store) = temp_store(100, 3);
        for i in 0..7 {
            store.append(record_at(9, i, &format!("text {}", i), "s"));
        }

        let cached = store.cached();
        assert_eq!(cached.len(), 3);
        // Cache equals the last min(N, cap) records in append order
        assert_eq!(cached[0].transcription, "text 4");
        assert_eq!(cached[2].transcription, "text 6");
    }

    #[test]
    fn test_cache_rebuilt_from_tail_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.json");
        {
            let mut store = TranscriptStore::open(&path, 100, 2);
            for i in 0..5 {
                store.append(record_at(11, i, &format!("text {}", i), "s"));
            }
        }

        let reloaded = TranscriptStore::open(&path, 100, 2);
        let cached = reloaded.cached();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].transcription, "text 3");
        assert_eq!(cached[1].transcription, "text 4");
    }

    #[test]
    fn test_rotation_keeps_newest_ceiling_records() {
        let (_dir, mut store) = temp_store(5, 3);
        for i in 0..9 {
            store.append(record_at(8, i, &format!("text {}", i), "s"));
        }

        assert_eq!(store.len(), 5);
        let remaining: Vec<_> = store
            .query(&QueryFilter::default())
            .into_iter()
            .map(|r| r.transcription)
            .collect();
        // Newest-first: 8, 7, 6, 5, 4
        assert_eq!(remaining, vec![
            "text 8", "text 7", "text 6", "text 5", "text 4"
        ]);
    }

    #[test]
    fn test_rotation_persists_rotated_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.json");
        {
            let mut store = TranscriptStore::open(&path, 3, 3);
            for i in 0..6 {
                store.append(record_at(7, i, &format!("text {}", i), "s"));
            }
        }
        let reloaded = TranscriptStore::open(&path, 3, 3);
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.latest().unwrap().transcription, "text 5");
    }

    #[test]
    fn test_query_returns_newest_first() {
        let (_dir, mut store) = temp_store(100, 10);
        store.append(record_at(10, 0, "a", "s"));
        store.append(record_at(10, 5, "b", "s"));
        store.append(record_at(11, 30, "c", "s"));

        let all = store.query(&QueryFilter::default());
        let texts: Vec<_> = all.into_iter().map(|r| r.transcription).collect();
        assert_eq!(texts, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_query_keyword_matches_transcription_or_summary() {
        let (_dir, mut store) = temp_store(100, 10);
        store.append(record_at(10, 0, "walked the dog", "Morning Walk"));
        store.append(record_at(10, 5, "standup notes", "Team Meeting"));

        let filter = QueryFilter {
            keyword: Some("meeting".to_string()),
            ..Default::default()
        };
        let result = store.query(&filter);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].summary, "Team Meeting");
    }

    #[test]
    fn test_query_time_range_scenario() {
        // Spec scenario: 10:00, 10:05, 11:30; range [10:00, 10:30] returns
        // the first two, newest-first.
        let (_dir, mut store) = temp_store(100, 10);
        store.append(record_at(10, 0, "ten sharp", "s"));
        store.append(record_at(10, 5, "ten oh five", "s"));
        store.append(record_at(11, 30, "eleven thirty", "s"));

        let filter = QueryFilter {
            time_from: Some("10:00".to_string()),
            time_to: Some("10:30".to_string()),
            ..Default::default()
        };
        let result = store.query(&filter);
        let texts: Vec<_> = result.into_iter().map(|r| r.transcription).collect();
        assert_eq!(texts, vec!["ten oh five", "ten sharp"]);
    }

    #[test]
    fn test_query_filters_are_conjunctive() {
        let (_dir, mut store) = temp_store(100, 10);
        store.append(record_at(10, 0, "meeting about budget", "s"));
        store.append(record_at(15, 0, "meeting about hiring", "s"));

        let filter = QueryFilter {
            keyword: Some("meeting".to_string()),
            time_from: Some("12:00".to_string()),
            ..Default::default()
        };
        let result = store.query(&filter);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].transcription, "meeting about hiring");
    }

    #[test]
    fn test_query_date_filter() {
        let (_dir, mut store) = temp_store(100, 10);
        let early = Local.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        let late = Local.with_ymd_and_hms(2026, 8, 26, 10, 0, 0).unwrap();
        store.append(TranscriptRecord::new(
            early,
            early,
            early,
            "yesterday".into(),
            "s".into(),
        ));
        store.append(TranscriptRecord::new(
            late,
            late,
            late,
            "today".into(),
            "s".into(),
        ));

        let filter = QueryFilter {
            date_from: Some("2026-08-26".to_string()),
            ..Default::default()
        };
        let result = store.query(&filter);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].transcription, "today");
    }

    #[test]
    fn test_time_window_is_inclusive_pure_filter() {
        let (_dir, mut store) = temp_store(100, 10);
        store.append(record_at(10, 0, "a", "s"));
        store.append(record_at(10, 5, "b", "s"));
        store.append(record_at(11, 30, "c", "s"));

        let now = Local
            .with_ymd_and_hms(2026, 8, 26, 10, 5, 0)
            .unwrap()
            .timestamp();
        // Window reaching back exactly to 10:00 includes both bounds
        let hits = store.time_window(now, 300);
        let texts: Vec<_> = hits.iter().map(|r| r.transcription.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);

        // Idempotent under store order
        let again = store.time_window(now, 300);
        assert_eq!(hits, again);
    }

    #[test]
    fn test_time_window_empty_store() {
        let (_dir, store) = temp_store(100, 10);
        assert!(store.time_window(1_700_000_000, 3600).is_empty());
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.json");
        let mut store = TranscriptStore::open(&path, 100, 10);
        store.append(record_at(10, 0, "a", "s"));
        store.clear();

        assert!(store.is_empty());
        assert!(store.cached().is_empty());

        let reloaded = TranscriptStore::open(&path, 100, 10);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_write_failure_keeps_in_memory_state() {
        // Point the store at an unwritable path: appends still advance the
        // in-memory views.
        let mut store = TranscriptStore::open(Path::new("/nonexistent-dir/store.json"), 100, 10);
        store.append(record_at(10, 0, "kept in memory", "s"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.cached().len(), 1);
    }
}
