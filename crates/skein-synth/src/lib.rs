use skein_core::timefmt::now_rfc3339;
use skein_core::{SessionContext, SessionRecord};
use skein_oracle::Oracle;

/// Sessions with fewer meaningful user messages than this and no file
/// modifications are skipped entirely — noise records would pollute the
/// pending-thread index.
const MIN_MEANINGFUL_MESSAGES: usize = 2;

/// Message sampling bounds for the synthesis prompt.
const SAMPLE_HEAD: usize = 3;
const SAMPLE_TAIL: usize = 2;
const MAX_ACTIONS_IN_PROMPT: usize = 10;

const MAX_PENDING_ITEMS: usize = 3;
const MAX_ACCOMPLISHED_ITEMS: usize = 5;

/// Convert a `SessionContext` into a `SessionRecord`, or `None` when the
/// session is trivial.
///
/// The external reasoning call supplies summary/accomplished/pending; a
/// missing oracle or an unparsable reply falls back to a deterministic
/// record. This never errors and never retries the call.
pub fn synthesize(
    ctx: &SessionContext,
    session_id: &str,
    oracle: Option<&dyn Oracle>,
) -> Option<SessionRecord> {
    if ctx.user_messages.len() < MIN_MEANINGFUL_MESSAGES && ctx.files_touched.is_empty() {
        return None;
    }

    let (summary, accomplished, pending) = match oracle {
        Some(oracle) => match oracle.synthesize(&build_prompt(ctx)) {
            Ok(reply) => parse_reply(&reply).unwrap_or_else(|| fallback_fields(ctx)),
            Err(e) => {
                tracing::warn!("synthesis call failed, using fallback: {e}");
                fallback_fields(ctx)
            }
        },
        None => fallback_fields(ctx),
    };

    Some(SessionRecord {
        session_id: session_id.to_string(),
        timestamp: now_rfc3339(),
        project: ctx.project.clone(),
        worktree: ctx.worktree.clone(),
        branch: ctx.branch.clone(),
        summary,
        accomplished,
        pending,
        files_touched: if ctx.files_touched.is_empty() {
            None
        } else {
            Some(ctx.files_touched.clone())
        },
        message_count: Some(ctx.message_count),
        goal: None,
        challenges: None,
        notes: None,
    })
}

/// Structured prompt for the reasoning call: project, branch, a bounded
/// message sample, touched files, and a bounded action sample.
pub fn build_prompt(ctx: &SessionContext) -> String {
    let mut prompt = String::new();
    prompt.push_str("Summarize this coding session as strict JSON with fields ");
    prompt.push_str("\"summary\" (one or two lines), ");
    prompt.push_str("\"accomplished\" (2-5 past-tense items), and ");
    prompt.push_str("\"pending\" (0-3 imperative unfinished items). ");
    prompt.push_str("Reply with the JSON object only.\n\n");

    prompt.push_str(&format!("Project: {}\n", ctx.project));
    if let Some(branch) = &ctx.branch {
        prompt.push_str(&format!("Branch: {branch}\n"));
    }

    prompt.push_str("\nUser messages:\n");
    for msg in sample_messages(&ctx.user_messages) {
        prompt.push_str(&format!("- {msg}\n"));
    }

    if !ctx.files_touched.is_empty() {
        prompt.push_str(&format!("\nFiles modified: {}\n", ctx.files_touched.join(", ")));
    }

    if !ctx.assistant_actions.is_empty() {
        prompt.push_str("\nActions taken:\n");
        for action in ctx.assistant_actions.iter().take(MAX_ACTIONS_IN_PROMPT) {
            prompt.push_str(&format!("- {action}\n"));
        }
    }
    prompt
}

/// All messages when there are 5 or fewer; otherwise the first 3 and
/// last 2, with an elision marker between.
fn sample_messages(messages: &[String]) -> Vec<String> {
    if messages.len() <= SAMPLE_HEAD + SAMPLE_TAIL {
        return messages.to_vec();
    }
    let mut sample: Vec<String> = messages[..SAMPLE_HEAD].to_vec();
    sample.push(format!("[... {} more messages ...]", messages.len() - SAMPLE_HEAD - SAMPLE_TAIL));
    sample.extend_from_slice(&messages[messages.len() - SAMPLE_TAIL..]);
    sample
}

/// Pull (summary, accomplished, pending) out of an oracle reply.
/// Any missing or mistyped field rejects the whole reply.
fn parse_reply(reply: &serde_json::Value) -> Option<(String, Vec<String>, Vec<String>)> {
    let summary = reply.get("summary")?.as_str()?.trim().to_string();
    if summary.is_empty() {
        return None;
    }
    let accomplished = string_list(reply.get("accomplished")?)?;
    let pending = string_list(reply.get("pending")?)?;
    Some((
        summary,
        accomplished.into_iter().take(MAX_ACCOMPLISHED_ITEMS).collect(),
        pending.into_iter().take(MAX_PENDING_ITEMS).collect(),
    ))
}

fn string_list(value: &serde_json::Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(item.as_str()?.trim().to_string());
    }
    Some(out)
}

/// Deterministic fallback: summary from the first user message (or a
/// generic project label), accomplished items synthesized from file and
/// tool counts, pending left empty.
fn fallback_fields(ctx: &SessionContext) -> (String, Vec<String>, Vec<String>) {
    let summary = ctx
        .user_messages
        .first()
        .cloned()
        .unwrap_or_else(|| format!("Session in {}", ctx.project));

    let mut accomplished = Vec::new();
    if !ctx.files_touched.is_empty() {
        accomplished.push(format!(
            "Modified {} file(s): {}",
            ctx.files_touched.len(),
            ctx.files_touched.join(", ")
        ));
    }
    if !ctx.tools_used.is_empty() {
        let tools: Vec<&str> = ctx.tools_used.iter().map(String::as_str).collect();
        accomplished.push(format!("Used tools: {}", tools.join(", ")));
    }
    if accomplished.is_empty() {
        accomplished.push(format!("Worked in {}", ctx.project));
    }

    (summary, accomplished, Vec::new())
}
