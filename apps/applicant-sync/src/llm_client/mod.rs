/// LLM client: the single point of entry for all completion-service calls.
///
/// No other module may call the Gemini API directly. Callers go through
/// `complete_with_retry`, which owns the attempt budget and backoff schedule.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
pub mod scripted;

/// Attempts per prompt before giving up.
pub const MAX_ATTEMPTS: u32 = 3;
const MAX_OUTPUT_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.1;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<LlmError>,
    },
}

/// Prompt in, free text out. Implementations make exactly one attempt.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Wait before the retry that follows failed attempt `attempt` (0-based): 2s, 3s, 5s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2_u64.pow(attempt) + 1)
}

/// Calls the service up to `MAX_ATTEMPTS` times, sleeping `backoff_delay` between attempts.
pub async fn complete_with_retry(
    service: &dyn CompletionService,
    prompt: &str,
) -> Result<String, LlmError> {
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_ATTEMPTS {
        if let Some(err) = &last_error {
            let delay = backoff_delay(attempt - 1);
            warn!(
                "Completion attempt {} failed ({err}), retrying in {}s...",
                attempt,
                delay.as_secs()
            );
            tokio::time::sleep(delay).await;
        }

        match service.complete(prompt).await {
            Ok(text) => return Ok(text),
            Err(e) => last_error = Some(e),
        }
    }

    Err(LlmError::RetriesExhausted {
        attempts: MAX_ATTEMPTS,
        last: Box::new(last_error.unwrap_or(LlmError::EmptyContent)),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `generateContent` backend.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_url: String, model: String, api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_url,
            model,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Completion succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed.text().ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::scripted::ScriptedCompletion;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> GeminiClient {
        GeminiClient::new(server.url(), "gemini-test".to_string(), "g-key".to_string()).unwrap()
    }

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(backoff_delay(0), Duration::from_secs(2));
        assert_eq!(backoff_delay(1), Duration::from_secs(3));
        assert_eq!(backoff_delay(2), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_on_third_attempt() {
        let service = ScriptedCompletion::new(vec![
            Err(LlmError::EmptyContent),
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
            Ok("Summary: fine".to_string()),
        ]);

        let started = tokio::time::Instant::now();
        let text = complete_with_retry(&service, "prompt").await.unwrap();

        assert_eq!(text, "Summary: fine");
        assert_eq!(service.calls(), 3);
        // 2s after the first failure, 3s after the second.
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_three_failures() {
        let service = ScriptedCompletion::new(vec![
            Err(LlmError::EmptyContent),
            Err(LlmError::EmptyContent),
            Err(LlmError::EmptyContent),
            Ok("never reached".to_string()),
        ]);

        let err = complete_with_retry(&service, "prompt").await.unwrap_err();

        assert_eq!(service.calls(), 3);
        assert!(matches!(err, LlmError::RetriesExhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_first_success_makes_single_call() {
        let service = ScriptedCompletion::new(vec![Ok("Score: 7".to_string())]);
        complete_with_retry(&service, "prompt").await.unwrap();
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_gemini_extracts_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "g-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {"maxOutputTokens": 500}
            })))
            .with_status(200)
            .with_body(
                json!({
                    "candidates": [{
                        "content": {"parts": [{"text": "Summary: ok\n"}, {"text": "Score: 8"}]}
                    }],
                    "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 30}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let text = client_for(&server).complete("hello").await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Summary: ok\nScore: 8");
    }

    #[tokio::test]
    async fn test_gemini_error_message_is_extracted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .with_status(429)
            .with_body(json!({"error": {"message": "quota exceeded"}}).to_string())
            .create_async()
            .await;

        let err = client_for(&server).complete("hello").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gemini_without_candidates_is_empty_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .with_status(200)
            .with_body(json!({"candidates": []}).to_string())
            .create_async()
            .await;

        let err = client_for(&server).complete("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }
}
