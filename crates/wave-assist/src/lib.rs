//! Client for the generative-text service backing the chat's assistive
//! affordances: emoji suggestions, smart replies, chat summarization.
//!
//! Nothing here is authoritative. Every failure — service unconfigured,
//! network error, unparseable reply — collapses into an empty result or a
//! placeholder string; callers never see a hard error.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const SUMMARY_EMPTY: &str = "No chat history to summarize.";
const SUMMARY_FAILED: &str = "Could not generate summary.";

#[derive(Clone)]
pub struct AssistClient {
    http: reqwest::Client,
    config: Option<AssistConfig>,
}

#[derive(Clone)]
struct AssistConfig {
    url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

impl AssistClient {
    /// Reads `WAVE_ASSIST_URL`, `WAVE_ASSIST_API_KEY`, `WAVE_ASSIST_MODEL`.
    /// With no URL configured the client runs disabled and every call
    /// returns its fallback.
    pub fn from_env() -> Self {
        let config = std::env::var("WAVE_ASSIST_URL").ok().map(|url| AssistConfig {
            url,
            api_key: std::env::var("WAVE_ASSIST_API_KEY").unwrap_or_default(),
            model: std::env::var("WAVE_ASSIST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
        });

        if config.is_none() {
            warn!("Assist service not configured; suggestions will be empty");
        }

        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Up to 5 emoji suggestions for a message. Messages under 3 trimmed
    /// characters are too short to suggest for.
    pub async fn suggest_emojis(&self, message: &str) -> Vec<String> {
        if message.trim().len() < 3 {
            return Vec::new();
        }
        let prompt = format!(
            "Suggest up to 5 relevant emojis for the following chat message. \
             Respond with only a JSON array of emoji strings.\n\nMessage: {}",
            message
        );
        match self.complete(&prompt).await {
            Ok(content) => {
                let mut emojis = parse_string_array(&content);
                emojis.truncate(5);
                emojis
            }
            Err(e) => {
                debug!("emoji suggestion failed: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Three short reply suggestions for a conversation.
    pub async fn smart_replies(&self, chat_history: &str) -> Vec<String> {
        if chat_history.trim().is_empty() {
            return Vec::new();
        }
        let prompt = format!(
            "Suggest 3 short, relevant replies to this conversation. \
             Respond with only a JSON array of reply strings.\n\nConversation:\n{}",
            chat_history
        );
        match self.complete(&prompt).await {
            Ok(content) => {
                let mut replies = parse_string_array(&content);
                replies.truncate(3);
                replies
            }
            Err(e) => {
                debug!("smart replies failed: {:#}", e);
                Vec::new()
            }
        }
    }

    pub async fn summarize(&self, chat_history: &str) -> String {
        if chat_history.trim().is_empty() {
            return SUMMARY_EMPTY.to_string();
        }
        let prompt = format!(
            "Summarize the following conversation in a few sentences.\n\n{}",
            chat_history
        );
        match self.complete(&prompt).await {
            Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
            Ok(_) => SUMMARY_FAILED.to_string(),
            Err(e) => {
                debug!("summarization failed: {:#}", e);
                SUMMARY_FAILED.to_string()
            }
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| anyhow!("assist service not configured"))?;

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", config.url.trim_end_matches('/')))
            .bearer_auth(&config.api_key)
            .json(&json!({
                "model": config.model,
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await
            .context("assist request failed")?
            .error_for_status()
            .context("assist service returned an error")?;

        let body: CompletionResponse = response.json().await.context("malformed assist response")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("assist response had no choices"))?;

        Ok(content)
    }
}

/// Models reply with varying shapes: a bare JSON array, a code-fenced one,
/// or loose lines. Take whatever parses.
fn parse_string_array(content: &str) -> Vec<String> {
    let trimmed = strip_code_fence(content.trim());

    if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
        return items.into_iter().filter(|s| !s.trim().is_empty()).collect();
    }

    trimmed
        .lines()
        .map(|l| l.trim().trim_start_matches(['-', '*']).trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn strip_code_fence(s: &str) -> &str {
    let s = s
        .strip_prefix("```json")
        .or_else(|| s.strip_prefix("```"))
        .unwrap_or(s);
    s.strip_suffix("```").unwrap_or(s).trim()
}
