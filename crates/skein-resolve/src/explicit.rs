use crate::aggregate::load_pending;
use skein_core::score::token_set;
use skein_core::timefmt::now_rfc3339;
use skein_core::{PendingItemWithAge, Resolution, ResolutionSignal};
use skein_store::Store;

/// Outcome of a user-directed resolution attempt.
#[derive(Debug)]
pub enum ExplicitOutcome {
    Resolved(Resolution),
    /// More than one pending item matched; the engine refuses to guess.
    Ambiguous(Vec<PendingItemWithAge>),
    /// The search matched a thread that already has a resolution.
    AlreadyResolved(Resolution),
    NotFound,
}

#[derive(Debug)]
pub enum UndoOutcome {
    Undone(Resolution),
    NotFound,
}

/// Resolve a pending thread by free-text search, bypassing scoring and
/// confirmation entirely.
///
/// Matching is substring-first over the currently-pending items, falling
/// back to token overlap (at least 2 shared tokens, or every token when
/// the search has fewer than 2). Exactly one match resolves with
/// `signal: explicit` and a match score of 1; anything else is reported
/// without an overlay write.
pub fn resolve_explicit(store: &Store, search: &str) -> anyhow::Result<ExplicitOutcome> {
    let pending = load_pending(store, false);
    let matches = fuzzy_match(&pending, search);

    match matches.len() {
        0 => {
            // Re-resolving an already-closed thread is a no-op report,
            // not a failure.
            let overlay = store.load_overlay();
            let needle = search.to_lowercase();
            if let Some(existing) = overlay
                .resolutions
                .iter()
                .find(|r| r.pending_text.to_lowercase().contains(&needle))
            {
                return Ok(ExplicitOutcome::AlreadyResolved(existing.clone()));
            }
            Ok(ExplicitOutcome::NotFound)
        }
        1 => {
            let item = matches[0];
            let mut overlay = store.load_overlay();
            if let Some(existing) = overlay
                .resolutions
                .iter()
                .find(|r| r.pending_key == item.key())
            {
                return Ok(ExplicitOutcome::AlreadyResolved(existing.clone()));
            }
            let resolution = Resolution {
                pending_key: item.key(),
                pending_text: item.text.clone(),
                resolved_by: "user".to_string(),
                signal: ResolutionSignal::Explicit,
                match_score: 1.0,
                resolved_at: now_rfc3339(),
                project: item.project.clone(),
                source_session_id: None,
            };
            overlay.resolutions.push(resolution.clone());
            store.save_overlay(&mut overlay)?;
            Ok(ExplicitOutcome::Resolved(resolution))
        }
        _ => Ok(ExplicitOutcome::Ambiguous(
            matches.into_iter().cloned().collect(),
        )),
    }
}

/// Remove a resolution matched by key or pending-text substring, returning
/// its thread to pending state. Undo never touches the record store, so
/// no confirmation step is required.
pub fn undo(store: &Store, search: &str) -> anyhow::Result<UndoOutcome> {
    let mut overlay = store.load_overlay();
    let needle = search.to_lowercase();
    let position = overlay.resolutions.iter().position(|r| {
        r.pending_key.contains(&needle) || r.pending_text.to_lowercase().contains(&needle)
    });
    match position {
        Some(i) => {
            let removed = overlay.resolutions.remove(i);
            store.save_overlay(&mut overlay)?;
            Ok(UndoOutcome::Undone(removed))
        }
        None => Ok(UndoOutcome::NotFound),
    }
}

fn fuzzy_match<'a>(
    pending: &'a [PendingItemWithAge],
    search: &str,
) -> Vec<&'a PendingItemWithAge> {
    let needle = search.to_lowercase();
    let substring_hits: Vec<&PendingItemWithAge> = pending
        .iter()
        .filter(|item| item.text.to_lowercase().contains(&needle))
        .collect();
    if !substring_hits.is_empty() {
        return substring_hits;
    }

    let search_tokens = token_set(search);
    if search_tokens.is_empty() {
        return Vec::new();
    }
    let required = search_tokens.len().min(2);
    pending
        .iter()
        .filter(|item| {
            let item_tokens = token_set(&item.text);
            search_tokens.intersection(&item_tokens).count() >= required
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::SessionRecord;
    use tempfile::tempdir;

    fn record(session_id: &str, ts: &str, pending: &[&str]) -> SessionRecord {
        SessionRecord {
            session_id: session_id.to_string(),
            timestamp: ts.to_string(),
            project: "app".to_string(),
            worktree: None,
            branch: None,
            summary: "test".to_string(),
            accomplished: vec![],
            pending: pending.iter().map(|s| s.to_string()).collect(),
            files_touched: None,
            message_count: None,
            goal: None,
            challenges: None,
            notes: None,
        }
    }

    fn seeded_store(tmp: &tempfile::TempDir, pending: &[&str]) -> Store {
        let store = Store::new(tmp.path());
        store
            .write_record(&record("s1", "2026-01-01T00:00:00Z", pending))
            .unwrap();
        store
    }

    #[test]
    fn single_match_resolves_explicitly() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp, &["Add retry to fetch", "Improve logging output"]);

        let outcome = resolve_explicit(&store, "add retry to fetch").unwrap();
        let ExplicitOutcome::Resolved(resolution) = outcome else {
            panic!("expected Resolved, got {outcome:?}");
        };
        assert_eq!(resolution.signal, ResolutionSignal::Explicit);
        assert_eq!(resolution.match_score, 1.0);
        assert_eq!(resolution.resolved_by, "user");
        assert!(store.load_overlay().is_resolved("app:add retry to fetch"));
    }

    #[test]
    fn repeat_resolution_reports_already_resolved() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp, &["Add retry to fetch"]);

        assert!(matches!(
            resolve_explicit(&store, "add retry to fetch").unwrap(),
            ExplicitOutcome::Resolved(_)
        ));
        assert!(matches!(
            resolve_explicit(&store, "add retry to fetch").unwrap(),
            ExplicitOutcome::AlreadyResolved(_)
        ));
        assert_eq!(store.load_overlay().resolutions.len(), 1);
    }

    #[test]
    fn ambiguous_match_refuses_to_guess() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(
            &tmp,
            &["Add retry to fetch", "Add retry to websocket client"],
        );

        let outcome = resolve_explicit(&store, "retry").unwrap();
        let ExplicitOutcome::Ambiguous(candidates) = outcome else {
            panic!("expected Ambiguous, got {outcome:?}");
        };
        assert_eq!(candidates.len(), 2);
        assert!(store.load_overlay().resolutions.is_empty());
    }

    #[test]
    fn no_match_reports_not_found() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp, &["Add retry to fetch"]);

        let outcome = resolve_explicit(&store, "deploy the dashboard").unwrap();
        assert!(matches!(outcome, ExplicitOutcome::NotFound));
        assert!(store.load_overlay().resolutions.is_empty());
    }

    #[test]
    fn token_overlap_rescues_non_substring_search() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp, &["Add retry logic to the fetch layer"]);

        // Not a substring, but shares "retry" and "fetch".
        let outcome = resolve_explicit(&store, "fetch retry").unwrap();
        assert!(matches!(outcome, ExplicitOutcome::Resolved(_)));
    }

    #[test]
    fn undo_returns_thread_to_pending() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp, &["Add retry to fetch"]);
        let before = load_pending(&store, false);

        assert!(matches!(
            resolve_explicit(&store, "add retry").unwrap(),
            ExplicitOutcome::Resolved(_)
        ));
        assert!(load_pending(&store, false).is_empty());

        let outcome = undo(&store, "retry").unwrap();
        assert!(matches!(outcome, UndoOutcome::Undone(_)));
        assert!(store.load_overlay().resolutions.is_empty());

        // Aggregation is identical to its pre-resolution state.
        let after = load_pending(&store, false);
        assert_eq!(after.len(), before.len());
        assert_eq!(after[0].text, before[0].text);
        assert_eq!(after[0].first_seen, before[0].first_seen);
        assert_eq!(after[0].occurrences, before[0].occurrences);
    }

    #[test]
    fn undo_with_no_match_reports_not_found() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp, &["Add retry to fetch"]);
        assert!(matches!(undo(&store, "retry").unwrap(), UndoOutcome::NotFound));
    }
}
