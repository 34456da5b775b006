use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Current UTC time as an Rfc3339 string.
pub fn now_rfc3339() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn format_rfc3339(t: OffsetDateTime) -> String {
    t.format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Parse a persisted timestamp. Returns `None` on any format error;
/// callers decide the fallback (usually "treat as now").
pub fn parse_rfc3339(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).ok()
}

/// Whole days elapsed from `earlier` to `now` (floor division).
pub fn days_between(earlier: OffsetDateTime, now: OffsetDateTime) -> i64 {
    (now - earlier).whole_days()
}

/// The `YYYY-MM-DD` prefix of an Rfc3339 timestamp.
pub fn date_prefix(ts: &str) -> &str {
    if ts.len() >= 10 {
        &ts[..10]
    } else {
        ts
    }
}
