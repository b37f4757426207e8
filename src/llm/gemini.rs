use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::Generate;

static GENERATE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Hosted Gemini generator. One blocking-style call per prompt; transient
/// failures (connection errors, 429, 5xx) are retried with backoff before
/// the call is reported as failed.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    // absent when the candidate was blocked
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GENERATE_BASE_URL, self.model)
    }

    async fn call(&self, prompt: &str) -> Result<GenerateResponse> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            let sent = self
                .http
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            match sent {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<GenerateResponse>()
                        .await
                        .context("decoding generator response");
                }
                Ok(resp) if retryable(resp.status()) && attempts < MAX_RETRIES => {
                    let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempts - 1);
                    warn!(status = %resp.status(), attempt = attempts, delay_ms = backoff, "Retrying generator call");
                    sleep(Duration::from_millis(backoff)).await;
                }
                Ok(resp) => bail!("generator returned status {}", resp.status()),
                Err(e) if attempts < MAX_RETRIES => {
                    let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempts - 1);
                    warn!(error = %e, attempt = attempts, delay_ms = backoff, "Retrying generator call");
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e).context("sending generator request"),
            }
        }
    }
}

fn retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn first_candidate_text(resp: GenerateResponse) -> String {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
        .unwrap_or_default()
}

#[async_trait]
impl Generate for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Calling generator");
        let resp = self.call(prompt).await?;
        let text = first_candidate_text(resp);
        if text.trim().is_empty() {
            bail!("generator returned no text");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_is_joined_from_first_candidate_parts() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"name\":"}, {"text": "\"TCURR\"}"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        let resp: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_candidate_text(resp), "{\"name\":\"TCURR\"}");
    }

    #[test]
    fn empty_candidates_yield_empty_text() {
        let resp: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(first_candidate_text(resp), "");
    }

    #[test]
    fn blocked_candidate_without_content_yields_empty_text() {
        let raw = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let resp: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_candidate_text(resp), "");
    }

    #[test]
    fn endpoint_includes_model_name() {
        let client = GeminiClient::new(Client::new(), "key", "gemini-1.5-pro");
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        assert!(retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!retryable(StatusCode::UNAUTHORIZED));
        assert!(!retryable(StatusCode::BAD_REQUEST));
    }
}
