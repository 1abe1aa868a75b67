// Client for the external generative-text service (Gemini `generateContent`).

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::AppError;
use crate::metrics;

// ── Wire types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, with all of its text parts joined.
    fn first_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────

/// Sends prompts to the generative-text service. Construction fails when no
/// credential is configured, so holding a client means the feature is usable.
#[derive(Debug, Clone)]
pub struct SuggestionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SuggestionClient {
    pub fn new(config: &LlmConfig) -> Result<Self, AppError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Configuration("LLM_API_KEY is not set".to_string()))?
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let model = config.model.trim().trim_start_matches("models/");
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            model
        );

        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `prompt` and return the raw text of the first candidate.
    pub async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let start = Instant::now();
        let result = self.send(prompt).await;
        metrics::LLM_REQUEST_DURATION_SECONDS.observe(start.elapsed().as_secs_f64());

        let outcome = match &result {
            Ok(_) => "ok",
            Err(_) => "error",
        };
        metrics::LLM_REQUESTS_TOTAL
            .with_label_values(&[outcome])
            .inc();
        result
    }

    async fn send(&self, prompt: &str) -> Result<String, AppError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ExternalService("request timed out".to_string())
                } else {
                    AppError::ExternalService(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            tracing::warn!("Generative-text service returned {status}: {detail}");
            return Err(AppError::ExternalService(format!("HTTP {status}")));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AppError::ExternalService("request timed out".to_string())
            } else {
                AppError::ExternalService(format!("malformed response: {e}"))
            }
        })?;

        let text = parsed
            .first_text()
            .ok_or_else(|| AppError::ExternalService("response had no candidate text".into()))?;
        tracing::debug!("LLM raw response: '{text}'");
        Ok(text)
    }
}
