use crate::{write_atomic, Store};
use skein_core::timefmt::date_prefix;
use skein_core::SessionRecord;
use std::path::PathBuf;

const MAX_SLUG_CHARS: usize = 60;

impl Store {
    /// Load every session record, oldest first.
    ///
    /// A missing records directory means "no sessions yet" and yields an
    /// empty list. Files that fail to parse are skipped with a warning;
    /// one corrupt record never hides the rest.
    pub fn load_all_records(&self) -> Vec<SessionRecord> {
        let dir = self.records_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(e) => e,
            Err(_) => return Vec::new(),
        };

        let mut records: Vec<SessionRecord> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("skipping unreadable record {}: {e}", path.display());
                    continue;
                }
            };
            match serde_json::from_str::<SessionRecord>(&content) {
                Ok(rec) => records.push(rec),
                Err(e) => {
                    tracing::warn!("skipping malformed record {}: {e}", path.display());
                }
            }
        }

        // Oldest first: the first occurrence of a pending key fixes first_seen.
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        records
    }

    /// Write a new record as `{date}-{slug}.json`. If that name is taken,
    /// a session-id suffix is appended; an existing record is never
    /// overwritten.
    pub fn write_record(&self, record: &SessionRecord) -> anyhow::Result<PathBuf> {
        let dir = self.records_dir();
        std::fs::create_dir_all(&dir)?;

        let slug = slugify(&record.summary);
        let date = date_prefix(&record.timestamp);
        let mut path = dir.join(format!("{date}-{slug}.json"));
        if path.exists() {
            let disambiguator: String = record.session_id.chars().take(8).collect();
            path = dir.join(format!("{date}-{slug}-{disambiguator}.json"));
        }
        if path.exists() {
            anyhow::bail!("record already written for session {}", record.session_id);
        }

        let json = serde_json::to_string_pretty(record)?;
        write_atomic(&path, json.as_bytes())?;
        Ok(path)
    }
}

/// Lowercase, collapse non-alphanumeric runs to single hyphens, trim
/// leading/trailing hyphens, cap the length.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut last_hyphen = true; // suppress a leading hyphen
    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
        if slug.len() >= MAX_SLUG_CHARS {
            break;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "session".to_string()
    } else {
        slug
    }
}
