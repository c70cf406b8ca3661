//! Prompt-to-task generation.
//!
//! Two explicit paths: a plain text splitter for offline use, and an
//! OpenAI-compatible chat-completion client behind the [`TaskGenerator`]
//! capability so callers (and tests) can substitute their own source.
//! A generation failure surfaces to the caller; it is never silently
//! downgraded to the splitter. The caller picks the path up front.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::GenerationConfig;
use crate::ops;
use crate::task::Record;

/// Errors from the generation subsystem.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerateError {
    #[error("no API key found in ${var}")]
    #[diagnostic(
        code(donext::generate::missing_api_key),
        help(
            "Export the key (`export {var}=...`) or run `generate` without \
             --ai to use the plain text splitter."
        )
    )]
    MissingApiKey { var: String },

    #[error("generation request failed: {message}")]
    #[diagnostic(
        code(donext::generate::request_failed),
        help("Check the network connection and the base_url/model in config.toml.")
    )]
    RequestFailed { message: String },

    #[error("failed to parse generation response: {message}")]
    #[diagnostic(
        code(donext::generate::parse_error),
        help("The model returned an unexpected response format.")
    )]
    ParseError { message: String },
}

pub type GenerateResult<T> = std::result::Result<T, GenerateError>;

/// A task-shaped object returned by a generation source.
#[derive(Debug, Clone)]
pub struct GeneratedTask {
    pub text: String,
    pub category: String,
    pub priority: bool,
}

/// A source of generated tasks, substitutable in tests.
pub trait TaskGenerator {
    fn generate(&self, prompt: &str) -> GenerateResult<Vec<GeneratedTask>>;
}

/// Split a prompt into task fragments on newlines, commas, and semicolons,
/// trimming whitespace and dropping empty pieces.
pub fn split_prompt(prompt: &str) -> Vec<String> {
    prompt
        .split(['\n', ',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Add one uncategorized, non-priority task per prompt fragment.
/// Returns the number of tasks added.
pub fn generate_fallback(record: &mut Record, prompt: &str) -> usize {
    let mut added = 0;
    for fragment in split_prompt(prompt) {
        if ops::add(record, &fragment, "", false).is_ok() {
            added += 1;
        }
    }
    added
}

/// Add one task per generated object, carrying over text, category, and
/// priority. Returns the number of tasks added.
pub fn generate_with(
    record: &mut Record,
    prompt: &str,
    source: &dyn TaskGenerator,
) -> GenerateResult<usize> {
    let generated = source.generate(prompt)?;
    let mut added = 0;
    for item in generated {
        if ops::add(record, &item.text, &item.category, item.priority).is_ok() {
            added += 1;
        }
    }
    Ok(added)
}

const SYSTEM_PROMPT: &str = "You are a task planning assistant. \
    Expand the user's request into a list of concrete tasks. \
    Return a JSON array of objects with fields: text, category, priority (boolean). \
    Only return the JSON array, no other text.";

/// OpenAI-compatible chat-completion client.
///
/// One blocking round trip per call, bounded by the configured timeout;
/// no retries. The credential is supplied by the caller, the client never
/// reads the environment itself.
pub struct ChatClient {
    config: GenerationConfig,
    api_key: String,
}

impl ChatClient {
    /// Create a client with an explicit credential.
    pub fn new(config: GenerationConfig, api_key: String) -> Self {
        Self { config, api_key }
    }

    /// Create a client reading the credential from the configured env var.
    pub fn from_env(config: GenerationConfig) -> GenerateResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GenerateError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;
        Ok(Self::new(config, api_key))
    }
}

impl TaskGenerator for ChatClient {
    fn generate(&self, prompt: &str) -> GenerateResult<Vec<GeneratedTask>> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .build();

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });

        let body_str = serde_json::to_string(&body).map_err(|e| GenerateError::RequestFailed {
            message: format!("JSON serialize error: {e}"),
        })?;

        tracing::debug!(model = %self.config.model, "requesting task generation");

        let resp = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_string(&body_str)
            .map_err(|e: ureq::Error| GenerateError::RequestFailed {
                message: e.to_string(),
            })?;

        let resp_str = resp.into_string().map_err(|e| GenerateError::ParseError {
            message: e.to_string(),
        })?;

        let json: serde_json::Value =
            serde_json::from_str(&resp_str).map_err(|e| GenerateError::ParseError {
                message: e.to_string(),
            })?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| GenerateError::ParseError {
                message: "missing message content".into(),
            })?;

        parse_task_array(content)
    }
}

/// Extract the outermost JSON array of task objects from model output.
///
/// Entries without a non-empty `text` field are dropped; `category` and
/// `priority` default when absent.
pub fn parse_task_array(content: &str) -> GenerateResult<Vec<GeneratedTask>> {
    let trimmed = content.trim();
    let json_str = if trimmed.starts_with('[') {
        trimmed
    } else {
        // The model sometimes wraps the array in prose or a code fence.
        let start = trimmed.find('[');
        let end = trimmed.rfind(']');
        match (start, end) {
            (Some(s), Some(e)) if e > s => &trimmed[s..=e],
            _ => {
                return Err(GenerateError::ParseError {
                    message: "no JSON array found in response".into(),
                });
            }
        }
    };

    let parsed: Vec<serde_json::Value> =
        serde_json::from_str(json_str).map_err(|e| GenerateError::ParseError {
            message: format!("JSON parse error: {e}"),
        })?;

    let mut items = Vec::new();
    for val in &parsed {
        let text = val["text"].as_str().unwrap_or("").to_string();
        let category = val["category"].as_str().unwrap_or("").to_string();
        let priority = val["priority"].as_bool().unwrap_or(false);

        if !text.is_empty() {
            items.push(GeneratedTask {
                text,
                category,
                priority,
            });
        }
    }

    Ok(items)
}
