use skein_core::timefmt::{days_between, parse_rfc3339};
use skein_core::{pending_key, PendingItemWithAge, SessionRecord, STALE_THRESHOLD_DAYS};
use skein_store::Store;
use std::collections::HashMap;
use std::collections::HashSet;
use time::OffsetDateTime;

/// Deduplicate pending items across records by pending key and compute
/// their ages against `now`.
///
/// `records` must be ordered oldest-first (the store guarantees this):
/// the first occurrence of a key fixes `first_seen` and the reported
/// text; later occurrences only bump the occurrence count. Keys present
/// in `resolved` are skipped unless `include_resolved` is set.
///
/// Output is sorted by age descending — the oldest threads surface first.
pub fn pending_with_age(
    records: &[SessionRecord],
    resolved: &HashSet<String>,
    now: OffsetDateTime,
    include_resolved: bool,
) -> Vec<PendingItemWithAge> {
    let mut by_key: HashMap<String, PendingItemWithAge> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for record in records {
        for text in &record.pending {
            let key = pending_key(&record.project, text);
            if !include_resolved && resolved.contains(&key) {
                continue;
            }
            match by_key.get_mut(&key) {
                Some(item) => {
                    item.occurrences += 1;
                    item.source_sessions.push(record.session_id.clone());
                }
                None => {
                    order.push(key.clone());
                    by_key.insert(
                        key,
                        PendingItemWithAge {
                            text: text.clone(),
                            project: record.project.clone(),
                            branch: record.branch.clone(),
                            source_session_id: record.session_id.clone(),
                            first_seen: record.timestamp.clone(),
                            age_in_days: 0,
                            is_stale: false,
                            occurrences: 1,
                            source_sessions: vec![record.session_id.clone()],
                        },
                    );
                }
            }
        }
    }

    let mut items: Vec<PendingItemWithAge> = order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect();

    for item in &mut items {
        // An unparsable first_seen reads as "seen just now", not an error.
        let first_seen = parse_rfc3339(&item.first_seen).unwrap_or(now);
        item.age_in_days = days_between(first_seen, now).max(0);
        item.is_stale = item.age_in_days > STALE_THRESHOLD_DAYS;
    }

    items.sort_by(|a, b| b.age_in_days.cmp(&a.age_in_days));
    items
}

/// Store-backed aggregation: loads records and the overlay, computes ages
/// against the current time. A missing store yields an empty list.
pub fn load_pending(store: &Store, include_resolved: bool) -> Vec<PendingItemWithAge> {
    let records = store.load_all_records();
    let resolved = store.load_overlay().resolved_keys();
    pending_with_age(
        &records,
        &resolved,
        OffsetDateTime::now_utc(),
        include_resolved,
    )
}
