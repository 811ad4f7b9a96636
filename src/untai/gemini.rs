use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use crate::untai::LanguageModel;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    contents: Vec<Content<'a>>,
}

/// Client for Gemini's `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let headers = HeaderMap::from_iter([
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (
                HeaderName::from_static("x-goog-api-key"),
                HeaderValue::from_str(api_key).context("GEMINI_API_KEY is not a valid header value")?,
            ),
        ]);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Couldn't build the Gemini HTTP client.")?;

        Ok(Self {
            http,
            model: model.trim_start_matches("models/").to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{GEMINI_ENDPOINT}/{}:generateContent", self.model)
    }
}

/// Concatenates the text parts of the first candidate in a `generateContent` response.
fn extract_text(response: &Value) -> Result<String> {
    if let Some(message) = response.pointer("/error/message").and_then(Value::as_str) {
        return Err(anyhow!("Gemini returned an error: {message}"));
    }

    let parts = response
        .get("candidates").context("Missing key: candidates")?
        .get(0).context("Gemini returned no candidates.")?
        .get("content").context("Candidate has no content (blocked?)")?
        .get("parts").context("Missing key: parts")?
        .as_array().context("Couldn't read parts as an array.")?;

    Ok(parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<String>())
}

impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        log::debug!("[GeminiClient::generate] Sending prompt of {} chars to {}", prompt.len(), self.model);

        let body = RequestBody {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
        };

        let response = self
            .http
            .post(self.url())
            .json(&body)
            .send()
            .await?
            .json::<Value>()
            .await
            .context("Couldn't decode Gemini response as JSON.")?;

        extract_text(&response)
    }
}
