//! Minimal OpenAI client for our use-cases.
//!
//! We only call chat.completions and request either plain text or JSON that
//! follows a caller-supplied schema. Calls are instrumented and log model
//! names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::content::{BoxFuture, ContentModel};
use crate::error::ModelError;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub timeout: Duration,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let timeout = std::env::var("OPENAI_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .map(Duration::from_secs)
      .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));

    let client = reqwest::Client::builder().timeout(timeout).build().ok()?;

    Some(Self { client, api_key, base_url, model, timeout })
  }

  /// One chat completion; `response_format` switches between text and JSON.
  #[instrument(level = "info", skip(self, user, response_format), fields(model = %self.model, prompt_len = user.len(), json = response_format.is_some()))]
  async fn chat(&self, user: &str, response_format: Option<ResponseFormat>, temperature: f32) -> Result<String, ModelError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq { role: "user".into(), content: user.into() }],
      temperature,
      response_format,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "kurikulum-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| {
        error!(target: "generation", elapsed = ?start.elapsed(), error = %e, "OpenAI request failed");
        ModelError::Transport(e.to_string())
      })?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      error!(target: "generation", %status, elapsed = ?start.elapsed(), "OpenAI returned an error status");
      return Err(ModelError::Http { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| ModelError::Decode(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(target: "generation", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    info!(target: "generation", elapsed = ?start.elapsed(), response_len = text.len(), "Model response received");
    Ok(text)
  }
}

impl ContentModel for OpenAI {
  fn name(&self) -> &str { &self.model }

  fn generate_text<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ModelError>> {
    Box::pin(async move { self.chat(prompt, None, 0.7).await })
  }

  /// Structured outputs need an object at the root, so the array schema is
  /// wrapped as `{ "questions": [...] }`; the content service accepts both shapes.
  fn generate_json<'a>(&'a self, prompt: &'a str, schema: &'a Value) -> BoxFuture<'a, Result<String, ModelError>> {
    Box::pin(async move {
      let wrapped = json!({
        "type": "object",
        "properties": { "questions": schema },
        "required": ["questions"],
      });
      let format = ResponseFormat {
        r#type: "json_schema".into(),
        json_schema: Some(json!({ "name": "question_batch", "schema": wrapped, "strict": false })),
      };
      self.chat(prompt, Some(format), 0.4).await
    })
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Debug, Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")] r#type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  json_schema: Option<Value>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_error_message() {
    let body = r#"{"error":{"message":"Invalid API key","type":"invalid_request_error"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Invalid API key"));
    assert_eq!(extract_openai_error("<html>bad gateway</html>"), None);
  }

  #[test]
  fn text_requests_omit_response_format() {
    let req = ChatCompletionRequest {
      model: "m".into(),
      messages: vec![ChatMessageReq { role: "user".into(), content: "hi".into() }],
      temperature: 0.7,
      response_format: None,
    };
    let v = serde_json::to_value(&req).unwrap();
    assert!(v.get("response_format").is_none());
    assert_eq!(v["messages"][0]["role"], "user");
  }

  #[test]
  fn json_format_serializes_schema() {
    let f = ResponseFormat { r#type: "json_schema".into(), json_schema: Some(json!({"name": "q"})) };
    let v = serde_json::to_value(&f).unwrap();
    assert_eq!(v["type"], "json_schema");
    assert_eq!(v["json_schema"]["name"], "q");
  }

  #[test]
  fn reads_first_choice_content() {
    let body: ChatCompletionResponse = serde_json::from_str(
      r#"{"choices":[{"message":{"content":"  <p>X</p> "}}],"usage":{"total_tokens":5}}"#,
    ).unwrap();
    let text = body.choices.first().and_then(|c| c.message.content.clone()).unwrap_or_default();
    assert_eq!(text.trim(), "<p>X</p>");
  }
}
