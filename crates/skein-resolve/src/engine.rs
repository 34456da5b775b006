use crate::aggregate::pending_with_age;
use skein_core::score::similarity;
use skein_core::timefmt::{date_prefix, format_rfc3339, parse_rfc3339};
use skein_core::{PendingItemWithAge, Resolution, ResolutionSignal, SessionRecord};
use skein_oracle::Oracle;
use skein_store::Store;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

/// Candidates scoring below this are never proposed for confirmation.
pub const SCORE_THRESHOLD: f64 = 0.15;
/// At most this many candidates are confirmed per pending item.
pub const MAX_CANDIDATES: usize = 3;

/// One accomplished item that might resolve a pending thread.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub text: String,
    pub session_id: String,
    pub timestamp: String,
    pub score: f64,
}

/// Outcome of one auto-resolution pass.
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    pub pending_checked: usize,
    pub candidates_considered: usize,
    /// Candidates that were not confirmed (includes every candidate
    /// skipped because the reasoning backend was unavailable).
    pub unconfirmed: usize,
    pub resolved: Vec<Resolution>,
}

/// Score `pending` against an accomplished-item pool and return the top
/// candidates, highest score first. Restricted to the same project; ties
/// keep pool order, so ranking is reproducible across runs.
pub fn rank_candidates(
    pending: &PendingItemWithAge,
    pool: &[(SessionRecord, String)],
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = pool
        .iter()
        .filter(|(record, _)| record.project.eq_ignore_ascii_case(&pending.project))
        .filter_map(|(record, text)| {
            let score = similarity(&pending.text, text);
            if score < SCORE_THRESHOLD {
                return None;
            }
            Some(Candidate {
                text: text.clone(),
                session_id: record.session_id.clone(),
                timestamp: record.timestamp.clone(),
                score,
            })
        })
        .collect();
    // Stable: equal scores keep their original candidate order.
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

/// Human-readable score band for the confirmation prompt. The raw float
/// is withheld to avoid anchoring the semantic check on it.
fn score_band(score: f64) -> &'static str {
    if score >= 0.6 {
        "high"
    } else if score >= 0.3 {
        "medium"
    } else {
        "low"
    }
}

fn confirm_prompt(pending: &PendingItemWithAge, candidate: &Candidate) -> String {
    format!(
        "A coding session left this task unfinished:\n  \"{}\"\n\
         A session on {} recorded this accomplishment:\n  \"{}\"\n\
         Word overlap between the two is {}.\n\
         Does the accomplishment complete the unfinished task? \
         Answer with exactly YES or NO.",
        pending.text,
        date_prefix(&candidate.timestamp),
        candidate.text,
        score_band(candidate.score),
    )
}

/// Run one auto-resolution pass: score every unresolved pending item
/// against recent accomplished items, confirm survivors through the
/// reasoning backend, and append confirmed matches to the overlay.
///
/// First YES wins per pending item. A failed, ambiguous, or unavailable
/// reasoning call counts as unconfirmed and the item stays pending —
/// fail closed, no retries. Already-resolved keys are skipped up front,
/// so re-running the pass is idempotent.
pub fn check_for_resolutions(
    store: &Store,
    oracle: Option<&dyn Oracle>,
    now: OffsetDateTime,
) -> anyhow::Result<CheckReport> {
    let records = store.load_all_records();
    let mut overlay = store.load_overlay();
    let pending = pending_with_age(&records, &overlay.resolved_keys(), now, false);

    let window_days = store.config().window_days;
    let pool = accomplished_pool(&records, now, window_days);

    let mut report = CheckReport {
        pending_checked: pending.len(),
        ..Default::default()
    };

    for item in &pending {
        let candidates = rank_candidates(item, &pool);
        report.candidates_considered += candidates.len();

        for candidate in &candidates {
            let Some(oracle) = oracle else {
                report.unconfirmed += 1;
                continue;
            };
            let confirmed = match oracle.confirm(&confirm_prompt(item, candidate)) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!("confirmation not usable, treating as NO: {e}");
                    false
                }
            };
            if !confirmed {
                report.unconfirmed += 1;
                continue;
            }

            let resolution = Resolution {
                pending_key: item.key(),
                pending_text: item.text.clone(),
                resolved_by: candidate.text.clone(),
                signal: ResolutionSignal::Auto,
                match_score: candidate.score,
                resolved_at: format_rfc3339(now),
                project: item.project.clone(),
                source_session_id: Some(candidate.session_id.clone()),
            };
            overlay.resolutions.push(resolution.clone());
            // Flushed per match so a crash loses at most the in-flight one.
            store.save_overlay(&mut overlay)?;
            report.resolved.push(resolution);
            break;
        }
    }

    Ok(report)
}

/// Accomplished items from records inside the trailing window, in store
/// (oldest-first) order.
fn accomplished_pool(
    records: &[SessionRecord],
    now: OffsetDateTime,
    window_days: i64,
) -> Vec<(SessionRecord, String)> {
    let cutoff = now - Duration::days(window_days);
    records
        .iter()
        .filter(|r| parse_rfc3339(&r.timestamp).map(|t| t >= cutoff).unwrap_or(false))
        .flat_map(|r| r.accomplished.iter().map(move |a| (r.clone(), a.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::tempdir;

    /// Confirms every prompt with a fixed answer and records the prompts.
    struct ScriptedOracle {
        answer: anyhow::Result<bool>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedOracle {
        fn yes() -> Self {
            Self {
                answer: Ok(true),
                prompts: RefCell::new(vec![]),
            }
        }
        fn no() -> Self {
            Self {
                answer: Ok(false),
                prompts: RefCell::new(vec![]),
            }
        }
        fn broken() -> Self {
            Self {
                answer: Err(anyhow::anyhow!("timeout")),
                prompts: RefCell::new(vec![]),
            }
        }
        fn calls(&self) -> usize {
            self.prompts.borrow().len()
        }
    }

    impl Oracle for ScriptedOracle {
        fn synthesize(&self, _prompt: &str) -> anyhow::Result<serde_json::Value> {
            anyhow::bail!("not used")
        }
        fn confirm(&self, prompt: &str) -> anyhow::Result<bool> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match &self.answer {
                Ok(b) => Ok(*b),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn record(
        session_id: &str,
        ts: &str,
        project: &str,
        accomplished: &[&str],
        pending: &[&str],
    ) -> SessionRecord {
        SessionRecord {
            session_id: session_id.to_string(),
            timestamp: ts.to_string(),
            project: project.to_string(),
            worktree: None,
            branch: None,
            summary: "test".to_string(),
            accomplished: accomplished.iter().map(|s| s.to_string()).collect(),
            pending: pending.iter().map(|s| s.to_string()).collect(),
            files_touched: None,
            message_count: None,
            goal: None,
            challenges: None,
            notes: None,
        }
    }

    fn at(ts: &str) -> OffsetDateTime {
        parse_rfc3339(ts).unwrap()
    }

    fn seeded_store(tmp: &tempfile::TempDir) -> Store {
        let store = Store::new(tmp.path());
        store
            .write_record(&record(
                "s1",
                "2026-01-01T00:00:00Z",
                "app",
                &[],
                &["write unit tests for parser"],
            ))
            .unwrap();
        store
            .write_record(&record(
                "s2",
                "2026-01-05T00:00:00Z",
                "app",
                &["Wrote unit tests for the parser module"],
                &[],
            ))
            .unwrap();
        store
    }

    #[test]
    fn confirmed_candidate_resolves_and_persists() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp);
        let oracle = ScriptedOracle::yes();

        let report =
            check_for_resolutions(&store, Some(&oracle as &dyn Oracle), at("2026-01-06T00:00:00Z")).unwrap();

        assert_eq!(report.resolved.len(), 1);
        assert_eq!(oracle.calls(), 1);
        let resolution = &report.resolved[0];
        assert_eq!(resolution.signal, ResolutionSignal::Auto);
        assert!(resolution.match_score >= SCORE_THRESHOLD);
        assert_eq!(resolution.source_session_id.as_deref(), Some("s2"));

        let overlay = store.load_overlay();
        assert!(overlay.is_resolved("app:write unit tests for parser"));

        // The item no longer appears in default aggregation.
        let still_pending = crate::load_pending(&store, false);
        assert!(still_pending.is_empty());
    }

    #[test]
    fn second_pass_is_idempotent() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp);
        let now = at("2026-01-06T00:00:00Z");

        let first = check_for_resolutions(&store, Some(&ScriptedOracle::yes() as &dyn Oracle), now).unwrap();
        assert_eq!(first.resolved.len(), 1);

        let oracle = ScriptedOracle::yes();
        let second = check_for_resolutions(&store, Some(&oracle as &dyn Oracle), now).unwrap();
        assert!(second.resolved.is_empty());
        assert_eq!(second.pending_checked, 0);
        assert_eq!(oracle.calls(), 0);
        assert_eq!(store.load_overlay().resolutions.len(), 1);
    }

    #[test]
    fn missing_oracle_fails_closed() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp);

        let report = check_for_resolutions(&store, None, at("2026-01-06T00:00:00Z")).unwrap();

        assert!(report.resolved.is_empty());
        assert_eq!(report.unconfirmed, 1);
        assert!(store.load_overlay().resolutions.is_empty());
    }

    #[test]
    fn broken_oracle_fails_closed() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp);
        let oracle = ScriptedOracle::broken();

        let report =
            check_for_resolutions(&store, Some(&oracle as &dyn Oracle), at("2026-01-06T00:00:00Z")).unwrap();

        assert!(report.resolved.is_empty());
        assert_eq!(report.unconfirmed, 1);
        assert!(store.load_overlay().resolutions.is_empty());
    }

    #[test]
    fn declined_candidate_stays_pending() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp);

        let report =
            check_for_resolutions(&store, Some(&ScriptedOracle::no() as &dyn Oracle), at("2026-01-06T00:00:00Z"))
                .unwrap();

        assert!(report.resolved.is_empty());
        assert_eq!(report.unconfirmed, 1);
        assert_eq!(crate::load_pending(&store, false).len(), 1);
    }

    #[test]
    fn cross_project_matches_are_never_proposed() {
        let tmp = tempdir().unwrap();
        let store = Store::new(tmp.path());
        store
            .write_record(&record(
                "s1",
                "2026-01-01T00:00:00Z",
                "app",
                &[],
                &["write unit tests for parser"],
            ))
            .unwrap();
        store
            .write_record(&record(
                "s2",
                "2026-01-05T00:00:00Z",
                "web",
                &["Wrote unit tests for the parser module"],
                &[],
            ))
            .unwrap();

        let oracle = ScriptedOracle::yes();
        let report =
            check_for_resolutions(&store, Some(&oracle as &dyn Oracle), at("2026-01-06T00:00:00Z")).unwrap();
        assert!(report.resolved.is_empty());
        assert_eq!(report.candidates_considered, 0);
        assert_eq!(oracle.calls(), 0);
    }

    #[test]
    fn accomplishments_outside_window_are_ignored() {
        let tmp = tempdir().unwrap();
        let store = seeded_store(&tmp);

        // s2 (Jan 5) is 25 days before "now"; the 7-day window excludes it.
        let oracle = ScriptedOracle::yes();
        let report =
            check_for_resolutions(&store, Some(&oracle as &dyn Oracle), at("2026-01-30T00:00:00Z")).unwrap();
        assert!(report.resolved.is_empty());
        assert_eq!(report.candidates_considered, 0);

        // The stale pending item is still reported, not auto-resolved.
        let pending = pending_with_age(
            &store.load_all_records(),
            &store.load_overlay().resolved_keys(),
            at("2026-01-30T00:00:00Z"),
            false,
        );
        assert_eq!(pending.len(), 1);
        assert!(pending[0].is_stale);
    }

    #[test]
    fn first_yes_wins_and_stops_checking() {
        let tmp = tempdir().unwrap();
        let store = Store::new(tmp.path());
        store
            .write_record(&record(
                "s1",
                "2026-01-01T00:00:00Z",
                "app",
                &[],
                &["add retry to fetch layer"],
            ))
            .unwrap();
        store
            .write_record(&record(
                "s2",
                "2026-01-05T00:00:00Z",
                "app",
                &[
                    "Added retry to the fetch layer",
                    "Added retry helper to fetch",
                    "Documented the fetch retry layer",
                ],
                &[],
            ))
            .unwrap();

        let oracle = ScriptedOracle::yes();
        let report =
            check_for_resolutions(&store, Some(&oracle as &dyn Oracle), at("2026-01-06T00:00:00Z")).unwrap();

        assert_eq!(report.resolved.len(), 1);
        assert_eq!(oracle.calls(), 1);
        // The winner is the highest-scoring candidate.
        assert_eq!(report.resolved[0].resolved_by, "Added retry to the fetch layer");
    }

    #[test]
    fn ranking_is_deterministic_and_capped() {
        let pending = PendingItemWithAge {
            text: "add retry to fetch layer".to_string(),
            project: "app".to_string(),
            branch: None,
            source_session_id: "s1".to_string(),
            first_seen: "2026-01-01T00:00:00Z".to_string(),
            age_in_days: 5,
            is_stale: false,
            occurrences: 1,
            source_sessions: vec!["s1".to_string()],
        };
        let rec = record("s2", "2026-01-05T00:00:00Z", "app", &[], &[]);
        let pool: Vec<(SessionRecord, String)> = [
            "Added retry to the fetch layer",
            "Added fetch retry",
            "Reworked the retry fetch layer code",
            "Added retry to the fetch layer again",
        ]
        .iter()
        .map(|t| (rec.clone(), t.to_string()))
        .collect();

        let ranked_a = rank_candidates(&pending, &pool);
        let ranked_b = rank_candidates(&pending, &pool);
        assert!(ranked_a.len() <= MAX_CANDIDATES);
        let texts_a: Vec<&str> = ranked_a.iter().map(|c| c.text.as_str()).collect();
        let texts_b: Vec<&str> = ranked_b.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts_a, texts_b);
        for pair in ranked_a.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn prompt_carries_band_not_raw_score() {
        let pending = PendingItemWithAge {
            text: "add retry to fetch".to_string(),
            project: "app".to_string(),
            branch: None,
            source_session_id: "s1".to_string(),
            first_seen: "2026-01-01T00:00:00Z".to_string(),
            age_in_days: 5,
            is_stale: false,
            occurrences: 1,
            source_sessions: vec![],
        };
        let candidate = Candidate {
            text: "Added retry to fetch".to_string(),
            session_id: "s2".to_string(),
            timestamp: "2026-01-05T12:30:00Z".to_string(),
            score: 0.75,
        };
        let prompt = confirm_prompt(&pending, &candidate);
        assert!(prompt.contains("high"));
        assert!(!prompt.contains("0.75"));
        assert!(prompt.contains("2026-01-05"));
        assert!(prompt.contains("YES or NO"));
    }

    #[test]
    fn score_bands() {
        assert_eq!(score_band(0.7), "high");
        assert_eq!(score_band(0.4), "medium");
        assert_eq!(score_band(0.16), "low");
    }
}
