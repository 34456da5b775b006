pub mod project;

use skein_core::SessionContext;
use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// User messages shorter than this (after trim) are noise, not intent.
const MIN_MESSAGE_CHARS: usize = 10;
/// Character budget per recorded user message.
const MAX_MESSAGE_CHARS: usize = 200;
/// Character budget per recorded command detail.
const MAX_DETAIL_CHARS: usize = 80;

/// Tools whose invocations modify files; their `file_path` input feeds
/// the touched-file list.
const FILE_MODIFYING_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Return the largest byte index `<= i` that is a valid char boundary.
/// Equivalent to `str::floor_char_boundary` (unstable nightly API).
fn floor_char_boundary(s: &str, i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    let mut pos = i;
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.len() > max_chars {
        let end = floor_char_boundary(s, max_chars);
        format!("{}...", &s[..end])
    } else {
        s.to_string()
    }
}

/// Scan a transcript JSONL file and build a `SessionContext` for the
/// session rooted at `working_dir`.
///
/// Each line is parsed defensively; a malformed line skips that event
/// only, never the whole scan. Pure read — no side effects.
pub fn extract_context(
    working_dir: &Path,
    transcript_path: &Path,
    workspace_roots: &[String],
) -> anyhow::Result<SessionContext> {
    let identity = project::identify(working_dir, workspace_roots);

    let file = std::fs::File::open(transcript_path)?;
    let reader = BufReader::new(file);

    let mut ctx = SessionContext {
        project: identity.project,
        worktree: identity.worktree,
        ..Default::default()
    };
    let mut touched_paths: BTreeSet<String> = BTreeSet::new();

    for line in reader.lines() {
        let Ok(line) = line else { break };
        if line.is_empty() {
            continue;
        }
        let event: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("skipping malformed transcript line: {e}");
                continue;
            }
        };
        scan_event(&event, &mut ctx, &mut touched_paths);
    }

    ctx.files_touched = touched_paths
        .iter()
        .map(|p| {
            Path::new(p)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| p.clone())
        })
        .collect();
    Ok(ctx)
}

fn scan_event(
    event: &serde_json::Value,
    ctx: &mut SessionContext,
    touched_paths: &mut BTreeSet<String>,
) {
    // Branch comes from the first event that carries one.
    if ctx.branch.is_none() {
        if let Some(branch) = event.get("gitBranch").and_then(|v| v.as_str()) {
            if !branch.is_empty() {
                ctx.branch = Some(branch.to_string());
            }
        }
    }

    match event.get("type").and_then(|v| v.as_str()) {
        Some("user") => {
            ctx.message_count += 1;
            if let Some(text) = user_text(event) {
                let trimmed = text.trim();
                // Short strings and tag-prefixed strings are
                // system-injected, not user intent.
                if trimmed.len() >= MIN_MESSAGE_CHARS && !trimmed.starts_with('<') {
                    ctx.user_messages.push(truncate(trimmed, MAX_MESSAGE_CHARS));
                }
            }
        }
        Some("assistant") => {
            ctx.message_count += 1;
            let Some(blocks) = event
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_array())
            else {
                return;
            };
            for block in blocks {
                if block.get("type").and_then(|t| t.as_str()) != Some("tool_use") {
                    continue;
                }
                let Some(name) = block.get("name").and_then(|n| n.as_str()) else {
                    continue;
                };
                ctx.tools_used.insert(name.to_string());
                let input = block.get("input");
                ctx.assistant_actions.push(describe_action(name, input));
                if FILE_MODIFYING_TOOLS.contains(&name) {
                    if let Some(path) = input
                        .and_then(|i| i.get("file_path"))
                        .and_then(|p| p.as_str())
                    {
                        touched_paths.insert(path.to_string());
                    }
                }
            }
        }
        _ => {}
    }
}

/// One-line description of a tool invocation, e.g. `Edit: main.rs`.
fn describe_action(name: &str, input: Option<&serde_json::Value>) -> String {
    let detail = input.and_then(|i| {
        for field in ["file_path", "command", "pattern", "url", "description"] {
            if let Some(v) = i.get(field).and_then(|v| v.as_str()) {
                if !v.is_empty() {
                    return Some(truncate(v, MAX_DETAIL_CHARS));
                }
            }
        }
        None
    });
    match detail {
        Some(d) => format!("{name}: {d}"),
        None => name.to_string(),
    }
}

fn user_text(event: &serde_json::Value) -> Option<String> {
    let content = event.get("message")?.get("content")?;
    if let Some(s) = content.as_str() {
        return Some(s.to_string());
    }
    let blocks = content.as_array()?;
    let texts: Vec<&str> = blocks
        .iter()
        .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}
