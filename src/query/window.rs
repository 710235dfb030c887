//! Relative-time phrase matching for query routing.

/// Recognized relative-time phrases and their window width in seconds.
///
/// Entries are ordered: the first phrase found as a substring of the
/// question wins, so more specific phrases must precede the generic ones
/// they contain ("last half hour" before "last hour"). Matching is
/// case-sensitive against the question as given.
const TIME_PHRASES: &[(&str, i64)] = &[
    ("last 5 minutes", 5 * 60),
    ("last 10 minutes", 10 * 60),
    ("last 15 minutes", 15 * 60),
    ("last 30 minutes", 30 * 60),
    ("last half hour", 30 * 60),
    ("past half hour", 30 * 60),
    ("last hour", 60 * 60),
    ("past hour", 60 * 60),
    ("last 2 hours", 2 * 60 * 60),
    ("last 6 hours", 6 * 60 * 60),
    ("last 12 hours", 12 * 60 * 60),
    ("last 24 hours", 24 * 60 * 60),
    ("last day", 24 * 60 * 60),
    ("past day", 24 * 60 * 60),
    ("today", 24 * 60 * 60),
    ("last week", 7 * 24 * 60 * 60),
    ("past week", 7 * 24 * 60 * 60),
];

/// Scans `question` for a relative-time phrase. Returns the window width in
/// seconds for the first table entry found, or `None` when the question
/// carries no recognized phrase.
pub fn match_window(question: &str) -> Option<i64> {
    TIME_PHRASES
        .iter()
        .find(|(phrase, _)| question.contains(phrase))
        .map(|(_, secs)| *secs)
}
