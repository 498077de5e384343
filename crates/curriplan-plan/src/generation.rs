//! Gemini `generateContent` client over blocking HTTP.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use curriplan_core::config::GenerationSettings;
use curriplan_core::traits::Generator;

pub struct GeminiClient {
    client: Client,
    url: String,
    model: String,
}

impl GeminiClient {
    /// Fails with `MissingCredential` when no API key is configured.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        let api_key = settings.api_key()?;
        Self::new(
            &settings.endpoint,
            &settings.model,
            &api_key,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn new(endpoint: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key.trim()).context("invalid Gemini API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build Gemini HTTP client")?;
        let url = format!("{}/models/{}:generateContent", endpoint.trim_end_matches('/'), model);
        Ok(Self { client, url, model: model.to_string() })
    }
}

impl Generator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content { role: "user", parts: vec![PartIn { text: prompt }] }],
        };
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling Gemini");
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .context("failed to call Gemini generateContent")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("Gemini returned {}: {}", status, text);
        }
        let parsed: GenerateResponse = resp.json().context("failed to parse Gemini response")?;
        answer_text(parsed)
    }
}

fn answer_text(parsed: GenerateResponse) -> Result<String> {
    let Some(candidate) = parsed.candidates.into_iter().next() else {
        match parsed.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => bail!("Gemini blocked the prompt: {}", reason),
            None => bail!("Gemini response has no candidates"),
        }
    };
    let answer = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");
    if answer.trim().is_empty() {
        bail!(
            "Gemini response missing text content (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        );
    }
    Ok(answer)
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartIn<'a>>,
}

#[derive(Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Deserialize)]
struct PartOut {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
