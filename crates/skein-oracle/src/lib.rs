use std::time::Duration;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 1024;

/// The external reasoning capability, one method per call shape.
///
/// Implementations must be assumed fallible and latent; the fallback
/// paths at the call sites are the only places that handle failure.
pub trait Oracle {
    /// Send a prompt expecting a JSON object back (record synthesis).
    fn synthesize(&self, prompt: &str) -> anyhow::Result<serde_json::Value>;

    /// Send a prompt expecting a strict YES/NO token back (resolution
    /// confirmation). Any other reply is an error — callers treat errors
    /// as "not confirmed".
    fn confirm(&self, prompt: &str) -> anyhow::Result<bool>;
}

/// Synchronous Anthropic messages-API client.
pub struct AnthropicOracle {
    api_key: String,
    model: String,
}

impl AnthropicOracle {
    pub fn new(api_key: String, model: String) -> Self {
        Self { api_key, model }
    }

    /// Build from `ANTHROPIC_API_KEY`. `None` means no credential — the
    /// engine runs with deterministic fallbacks only.
    pub fn from_env(model: &str) -> Option<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self::new(api_key, model.to_string()))
    }

    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "reasoning call");
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [
                {"role": "user", "content": prompt},
            ],
        });

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .build()
            .new_agent();
        let mut response = agent
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .send(body.to_string())?;
        let reply: serde_json::Value = response.body_mut().read_json()?;

        let text = reply
            .pointer("/content/0/text")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("no text content in reasoning reply"))?;
        Ok(text.to_string())
    }
}

impl Oracle for AnthropicOracle {
    fn synthesize(&self, prompt: &str) -> anyhow::Result<serde_json::Value> {
        let text = self.complete(prompt)?;
        parse_json_reply(&text)
    }

    fn confirm(&self, prompt: &str) -> anyhow::Result<bool> {
        let text = self.complete(prompt)?;
        parse_yes_no(&text)
    }
}

/// Parse a reply that should be a JSON object, tolerating a markdown
/// code fence around it.
pub fn parse_json_reply(text: &str) -> anyhow::Result<serde_json::Value> {
    let trimmed = strip_code_fence(text.trim());
    let value: serde_json::Value = serde_json::from_str(trimmed)?;
    if !value.is_object() {
        anyhow::bail!("reasoning reply is not a JSON object");
    }
    Ok(value)
}

/// Accept only a strict YES or NO token (case-insensitive, optional
/// trailing period). Anything else is an error.
pub fn parse_yes_no(text: &str) -> anyhow::Result<bool> {
    let token = text.trim().trim_end_matches('.');
    if token.eq_ignore_ascii_case("yes") {
        Ok(true)
    } else if token.eq_ignore_ascii_case("no") {
        Ok(false)
    } else {
        anyhow::bail!("expected YES or NO, got {:?}", text.trim())
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag after the opening fence.
    let rest = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
