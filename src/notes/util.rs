use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use time::macros::format_description;
use time::OffsetDateTime;
use uuid::Uuid;

/// Produces an opaque unique token for a new note. UUIDv4 gives practical
/// collision improbability; no further uniqueness check is performed.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Timestamp+sequence composite, for callers that cannot reach a random
/// UUID source. Collisions are only avoided within one process.
pub fn composite_id() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    format!("note-{nanos:x}-{seq:x}")
}

/// Splits a comma-separated tag string, trimming each piece and dropping
/// empties while preserving order.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Renders a unix-second timestamp as a short human date, or "Unknown" when
/// the timestamp is out of range.
pub fn format_date(timestamp: i64) -> String {
    let format = format_description!("[month repr:short] [day padding:none], [year]");
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|date| date.format(&format).ok())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn pluralize<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_differ() {
        assert_ne!(generate_id(), generate_id());
        assert_ne!(composite_id(), composite_id());
    }

    #[test]
    fn parse_tags_trims_and_drops_empties() {
        assert_eq!(parse_tags(" a, b ,,c"), ["a", "b", "c"]);
    }

    #[test]
    fn parse_tags_of_blank_input_is_empty() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags("   ").is_empty());
        assert!(parse_tags(" , , ").is_empty());
    }

    #[test]
    fn format_date_renders_short_form() {
        // 2026-01-12 00:00:00 UTC
        assert_eq!(format_date(1_768_176_000), "Jan 12, 2026");
    }

    #[test]
    fn format_date_flags_out_of_range_timestamps() {
        assert_eq!(format_date(i64::MAX), "Unknown");
        assert_eq!(format_date(i64::MIN), "Unknown");
    }

    #[test]
    fn pluralize_uses_singular_only_for_one() {
        assert_eq!(pluralize(1, "note", "notes"), "note");
        assert_eq!(pluralize(0, "note", "notes"), "notes");
        assert_eq!(pluralize(2, "note", "notes"), "notes");
    }
}
