use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Current schema version for new overlay files.
pub const OVERLAY_VERSION: u32 = 1;

/// A pending item older than this (in days) is considered stale.
pub const STALE_THRESHOLD_DAYS: i64 = 14;

/// Normalized identity of a pending thread: `lowercase(project) + ":" + trim(lowercase(text))`.
///
/// Two pending strings from different sessions with the same key are the
/// same logical thread.
pub fn pending_key(project: &str, text: &str) -> String {
    format!("{}:{}", project.to_lowercase(), text.to_lowercase().trim())
}

/// In-memory view of one session, built from a transcript scan.
///
/// Consumed immediately by the synthesizer; never persisted.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub project: String,
    pub worktree: Option<String>,
    pub branch: Option<String>,
    /// Count of user + assistant events seen in the transcript.
    pub message_count: usize,
    /// Truncated user messages, in transcript order.
    pub user_messages: Vec<String>,
    /// One-line descriptions of assistant tool actions, in order.
    pub assistant_actions: Vec<String>,
    /// Basenames of files modified during the session, deduplicated by path.
    pub files_touched: Vec<String>,
    pub tools_used: BTreeSet<String>,
}

/// One persisted session record. Immutable once written to the store.
///
/// Optional fields (`goal`, `challenges`, `notes`, ...) carry extra detail
/// some sessions produce; absence means "no data", never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    /// Rfc3339 timestamp of when the record was synthesized.
    pub timestamp: String,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub accomplished: Vec<String>,
    #[serde(default)]
    pub pending: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_touched: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenges: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One (record, pending-string) pair. Derived during aggregation.
#[derive(Debug, Clone)]
pub struct PendingItem {
    pub text: String,
    pub project: String,
    pub branch: Option<String>,
    pub source_session_id: String,
    pub timestamp: String,
}

impl PendingItem {
    pub fn key(&self) -> String {
        pending_key(&self.project, &self.text)
    }
}

/// A pending item enriched with age data. Recomputed on every query so
/// "now" is always current; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PendingItemWithAge {
    pub text: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub source_session_id: String,
    /// Rfc3339 timestamp of the earliest record sharing this key.
    pub first_seen: String,
    pub age_in_days: i64,
    pub is_stale: bool,
    /// How many records surfaced this key.
    pub occurrences: usize,
    pub source_sessions: Vec<String>,
}

impl PendingItemWithAge {
    pub fn key(&self) -> String {
        pending_key(&self.project, &self.text)
    }
}

/// How a resolution was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSignal {
    /// Machine-confirmed via candidate scoring + semantic check.
    Auto,
    /// User-asserted via the explicit resolve command.
    Explicit,
}

/// A recorded claim that a pending thread's work is complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub pending_key: String,
    pub pending_text: String,
    /// The accomplished text (auto) or search text (explicit) that closed it.
    pub resolved_by: String,
    pub signal: ResolutionSignal,
    pub match_score: f64,
    pub resolved_at: String,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_session_id: Option<String>,
}

/// The append-only resolution overlay, kept apart from session records so
/// resolution logic can be rerun or rolled back without rewriting history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overlay {
    pub version: u32,
    #[serde(default)]
    pub resolutions: Vec<Resolution>,
    #[serde(default)]
    pub last_updated: String,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            version: OVERLAY_VERSION,
            resolutions: Vec::new(),
            last_updated: String::new(),
        }
    }
}

impl Overlay {
    /// Set of keys with an active resolution.
    pub fn resolved_keys(&self) -> std::collections::HashSet<String> {
        self.resolutions
            .iter()
            .map(|r| r.pending_key.clone())
            .collect()
    }

    pub fn is_resolved(&self, key: &str) -> bool {
        self.resolutions.iter().any(|r| r.pending_key == key)
    }
}
