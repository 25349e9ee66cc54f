use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::errors::TextGenError;

pub const NEWS_SUMMARY_PROMPT: &str = r#"You are writing the body of a daily market news email for a retail investor.

Summarise the articles below in plain text (no HTML, no Markdown):
- open with one sentence on the overall market mood,
- then give one short paragraph per story: what happened, and why it matters to someone holding the stock,
- keep it under 250 words, neutral in tone, and never give buy or sell advice.

If the list is empty, say there is no notable market news today.

Articles (JSON):
{{newsData}}"#;

pub const WELCOME_PROMPT: &str = r#"Write a two or three sentence welcome for a new user of Stock Watch, an app that tracks stocks and emails price alerts and daily news digests.

Personalise it using the profile below. Plain text only, friendly and concise, no greeting line and no sign-off.

User profile:
{{userProfile}}"#;

pub const FALLBACK_WELCOME_INTRO: &str =
    "Thanks for joining Stock Watch. You now have the tools to track markets and make smarter moves.";

pub const FALLBACK_NEWS_SUMMARY: &str = "No market news.";

/// Produces free text from a prompt. `Ok(None)` means the model answered
/// without any text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, TextGenError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, TextGenError> {
        if self.api_key.trim().is_empty() {
            return Err(TextGenError::MissingApiKey);
        }

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        let res = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(TextGenError::Status { status, body });
        }

        let parsed = res.json::<GenerateResponse>().await?;
        Ok(parsed.first_text())
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.trim().is_empty())
    }
}
