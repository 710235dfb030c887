//! The persisted transcript record and its timestamp renderings.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Fixed-width, zero-padded local timestamp format.
///
/// Date and time-of-day filters compare lexicographic prefixes of this
/// rendering, which is only sound because every field is zero padded.
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 12-hour clock rendering.
const TWELVE_HOUR_FORMAT: &str = "%I:%M:%S %p";

/// One persisted capture-to-summary result.
///
/// Created by the summarization worker once both transcription and summary
/// are available; never mutated afterward. Field names are the wire
/// contract of the store file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptRecord {
    /// Local wall-clock time of record creation (chunk completion).
    pub timestamp: String,
    /// Same instant, ISO-8601.
    pub timestamp_iso: String,
    /// Same instant, 12-hour clock.
    pub timestamp_12h: String,
    /// Elapsed time since the capture session started, `HH:MM:SS`.
    pub timestamp_relative: String,
    /// Local wall-clock time the chunk's capture began.
    pub recording_start: String,
    /// Capture start, ISO-8601.
    pub recording_start_iso: String,
    /// Transcribed speech (or an error-marker string).
    pub transcription: String,
    /// Condensed summary (or an error-marker string).
    pub summary: String,
    /// Chunk recording duration in seconds.
    pub duration_secs: u32,
    /// UTC-offset label of the local timezone.
    pub timezone: String,
    /// Authoritative ordering key.
    pub unix_timestamp: i64,
}

impl TranscriptRecord {
    /// Builds a record with all six timestamp renderings.
    pub fn new(
        completed_at: DateTime<Local>,
        capture_start: DateTime<Local>,
        session_start: DateTime<Local>,
        transcription: String,
        summary: String,
    ) -> Self {
        let elapsed = (completed_at - session_start).num_seconds().max(0);
        let duration = (completed_at - capture_start).num_seconds().max(0) as u32;

        Self {
            timestamp: completed_at.format(LOCAL_TIMESTAMP_FORMAT).to_string(),
            timestamp_iso: completed_at.to_rfc3339(),
            timestamp_12h: completed_at.format(TWELVE_HOUR_FORMAT).to_string(),
            timestamp_relative: format_elapsed(elapsed),
            recording_start: capture_start.format(LOCAL_TIMESTAMP_FORMAT).to_string(),
            recording_start_iso: capture_start.to_rfc3339(),
            transcription,
            summary,
            duration_secs: duration,
            timezone: completed_at.offset().to_string(),
            unix_timestamp: completed_at.timestamp(),
        }
    }

    /// Overrides the wall-clock duration with the chunk's sample-count
    /// duration, which excludes transcription latency.
    pub fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    /// The `YYYY-MM-DD` prefix of the local timestamp.
    pub fn date_part(&self) -> &str {
        &self.timestamp[..10.min(self.timestamp.len())]
    }

    /// The `HH:MM:SS` portion of the local timestamp.
    pub fn time_part(&self) -> &str {
        if self.timestamp.len() >= 19 {
            &self.timestamp[11..19]
        } else {
            ""
        }
    }

    /// Case-insensitive substring match over transcription OR summary.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.transcription.to_lowercase().contains(&needle)
            || self.summary.to_lowercase().contains(&needle)
    }
}

/// Renders elapsed seconds as zero-padded `HH:MM:SS`.
fn format_elapsed(total_secs: i64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn sample_record() -> TranscriptRecord {
        TranscriptRecord::new(
            local(2026, 8, 26, 14, 5, 30),
            local(2026, 8, 26, 14, 5, 0),
            local(2026, 8, 26, 13, 0, 0),
            "we discussed the quarterly roadmap".to_string(),
            "Team Meeting about roadmap".to_string(),
        )
    }

    #[test]
    fn test_local_timestamp_is_fixed_width() {
        let record = sample_record();
        assert_eq!(record.timestamp, "2026-08-26 14:05:30");
        assert_eq!(record.timestamp.len(), 19);
    }

    #[test]
    fn test_date_and_time_parts() {
        let record = sample_record();
        assert_eq!(record.date_part(), "2026-08-26");
        assert_eq!(record.time_part(), "14:05:30");
    }

    #[test]
    fn test_twelve_hour_rendering() {
        let record = sample_record();
        assert_eq!(record.timestamp_12h, "02:05:30 PM");
    }

    #[test]
    fn test_relative_rendering_is_elapsed_since_session_start() {
        let record = sample_record();
        assert_eq!(record.timestamp_relative, "01:05:30");
    }

    #[test]
    fn test_duration_from_capture_start() {
        let record = sample_record();
        assert_eq!(record.duration_secs, 30);
    }

    #[test]
    fn test_recording_start_renderings() {
        let record = sample_record();
        assert_eq!(record.recording_start, "2026-08-26 14:05:00");
        assert!(record.recording_start_iso.starts_with("2026-08-26T14:05:00"));
    }

    #[test]
    fn test_unix_timestamp_matches_instant() {
        let completed = local(2026, 8, 26, 14, 5, 30);
        let record = TranscriptRecord::new(
            completed,
            completed,
            completed,
            String::new(),
            String::new(),
        );
        assert_eq!(record.unix_timestamp, completed.timestamp());
        assert_eq!(record.timestamp_relative, "00:00:00");
    }

    #[test]
    fn test_keyword_match_is_case_insensitive_over_both_fields() {
        let record = sample_record();
        // summary is "Team Meeting about roadmap"
        assert!(record.matches_keyword("meeting"));
        assert!(record.matches_keyword("MEETING"));
        // transcription only
        assert!(record.matches_keyword("quarterly"));
        assert!(!record.matches_keyword("standup"));
    }

    #[test]
    fn test_serde_roundtrip_preserves_fields() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: TranscriptRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
        assert!(json.contains("\"unix_timestamp\""));
        assert!(json.contains("\"recording_start_iso\""));
    }
}
