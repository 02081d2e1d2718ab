//! Google Gemini API client implementation
//!
//! Uses the generateContent endpoint. The system prompt travels as
//! `systemInstruction` and assistant turns use the role `model`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{Role, trim_leading_assistant};
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::ResolvedLlmConfig;

/// Maximum number of retries for transient server errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for server error retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Retries after a 429 before giving up
const RATE_LIMIT_RETRIES: u32 = 2;

/// Wait per rate-limit retry, multiplied by the retry number
const RATE_LIMIT_BACKOFF_MS: u64 = 5000;

/// Returned when the project has a zero quota, which a retry never fixes
pub const QUOTA_GUIDANCE: &str = "Quota Error (Limit 0). You likely need to LINK A BILLING ACCOUNT to your Google Cloud Project to unlock the Free Tier for Gemini 2.0 Flash.";

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504)
}

/// A 429 body mentioning "limit: 0" means no free-tier quota at all
fn is_zero_quota(body: &str) -> bool {
    body.contains("limit: 0")
}

/// Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl GeminiClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the generateContent body; fails when no user turn exists
    fn build_request_body(&self, request: &CompletionRequest) -> Result<serde_json::Value, LlmError> {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let history = trim_leading_assistant(&request.messages);
        if history.is_empty() {
            debug!("build_request_body: no user message");
            return Err(LlmError::NoUserMessage);
        }

        let contents: Vec<serde_json::Value> = history
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                serde_json::json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        Ok(serde_json::json!({
            "systemInstruction": { "parts": [{ "text": request.system_prompt }] },
            "contents": contents,
            "generationConfig": { "maxOutputTokens": request.max_tokens.min(self.max_tokens) },
        }))
    }

    fn parse_response(&self, api_response: GeminiResponse) -> CompletionResponse {
        debug!(candidate_count = api_response.candidates.len(), "parse_response: called");
        let candidate = api_response.candidates.into_iter().next();

        let (content, stop_reason) = match candidate {
            Some(c) => {
                let text: String = c
                    .content
                    .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
                    .unwrap_or_default();
                let stop_reason = c
                    .finish_reason
                    .as_deref()
                    .map(StopReason::from_gemini)
                    .unwrap_or(StopReason::EndTurn);
                ((!text.is_empty()).then_some(text), stop_reason)
            }
            None => (None, StopReason::EndTurn),
        };

        CompletionResponse {
            content,
            stop_reason,
            usage: TokenUsage {
                input_tokens: api_response.usage_metadata.prompt_token_count,
                output_tokens: api_response.usage_metadata.candidates_token_count,
            },
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = self.build_request_body(&request)?;

        let mut attempt = 0;
        let mut rate_limit_retries = 0;

        loop {
            let response = match self
                .http
                .post(url.clone())
                .header("x-goog-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                    warn!(attempt, backoff_ms = backoff, error = %e, "complete: retrying after network error");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    continue;
                }
                Err(e) => return Err(LlmError::Network(e)),
            };

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                let text = response.text().await.unwrap_or_default();
                if is_zero_quota(&text) {
                    debug!("complete: zero quota");
                    return Err(LlmError::QuotaExhausted(QUOTA_GUIDANCE.to_string()));
                }
                if rate_limit_retries < RATE_LIMIT_RETRIES {
                    rate_limit_retries += 1;
                    let backoff = RATE_LIMIT_BACKOFF_MS * u64::from(rate_limit_retries);
                    warn!(rate_limit_retries, backoff_ms = backoff, "complete: rate limited, waiting");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    continue;
                }
                return Err(LlmError::RateLimited {
                    retry_after: Duration::from_secs(retry_after),
                });
            }

            if is_retryable_status(status) && attempt < MAX_RETRIES {
                attempt += 1;
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(attempt, status, backoff_ms = backoff, "complete: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
                continue;
            }

            if !response.status().is_success() {
                debug!(%status, "complete: API error");
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::ApiError {
                    status,
                    message: super::api_error_message(&text),
                });
            }

            debug!("complete: success");
            let api_response: GeminiResponse = response.json().await?;
            return Ok(self.parse_response(api_response));
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: GeminiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn client() -> GeminiClient {
        GeminiClient {
            model: "gemini-2.0-flash".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            http: Client::new(),
            max_tokens: 1024,
        }
    }

    #[test]
    fn test_build_request_body() {
        let request = CompletionRequest {
            system_prompt: "You are Chad".to_string(),
            messages: vec![
                Message::assistant("Hi, I'm Chad"),
                Message::user("I need a prompt"),
                Message::assistant("## Task\nWrite a haiku"),
                Message::user("yes"),
            ],
            max_tokens: 1024,
        };

        let body = client().build_request_body(&request).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are Chad");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "yes");
    }

    #[test]
    fn test_build_request_body_requires_user_turn() {
        let request = CompletionRequest {
            system_prompt: "You are Chad".to_string(),
            messages: vec![Message::assistant("Hi, I'm Chad")],
            max_tokens: 1024,
        };
        assert!(matches!(
            client().build_request_body(&request),
            Err(LlmError::NoUserMessage)
        ));
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "**Role**: "}, {"text": "A tutor"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 30, "candidatesTokenCount": 4}
        }"#;
        let api_response: GeminiResponse = serde_json::from_str(json).unwrap();
        let response = client().parse_response(api_response);

        assert_eq!(response.content.as_deref(), Some("**Role**: A tutor"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 30);
        assert_eq!(response.usage.output_tokens, 4);
    }

    #[test]
    fn test_parse_blocked_response() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let api_response: GeminiResponse = serde_json::from_str(json).unwrap();
        let response = client().parse_response(api_response);
        assert!(response.content.is_none());
        assert_eq!(response.stop_reason, StopReason::Other("SAFETY".to_string()));
    }

    #[test]
    fn test_zero_quota_detection() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded for metric: generate_content_free_tier_requests, limit: 0"}}"#;
        assert!(is_zero_quota(body));
        assert!(!is_zero_quota(r#"{"error": {"message": "Resource exhausted, limit: 15"}}"#));
        assert!(QUOTA_GUIDANCE.contains("LINK A BILLING ACCOUNT"));
    }
}
