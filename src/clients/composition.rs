use crate::clients::{endpoint, http_client, service_error, Composer, RemoteError};
use crate::model::{Caption, Poem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// System directive sent with every poem request.
pub const SYSTEM_PERSONA: &str = "You are a poet. You specialize in elegant and emotionally impactful poems. \
You are careful to use subtlety and write in a modern vernacular style. \
Use high-school level English but MFA-level craft. \
Your poems are literary but easy to relate to and understand. \
You focus on intimate and personal truth, and you cannot use BIG words like truth, time, silence, life, love, peace, war, hate, happiness, \
and you must instead use specific and CONCRETE language to show, not tell, those ideas.";

/// Instructions that open every user prompt.
pub const PROMPT_BASE: &str = "Write a poem which integrates details from what I describe below. \
Use the specified poem format. The references to the source material must be subtle yet clear. \
Focus on a unique and elegant poem and use specific ideas and details. \
You must keep vocabulary simple and use understated point of view.";

pub const POEM_FORMAT: &str = "8 line free verse";

pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// Builds the user prompt for a caption.
pub fn build_prompt(caption: &Caption) -> String {
    [
        PROMPT_BASE.to_string(),
        format!("Poem format: {}", POEM_FORMAT),
        format!("Scene description: {}", caption),
    ]
    .join("\n\n")
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Poem client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiComposer {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiComposer {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            http: http_client(timeout)?,
            url: endpoint(base_url, "chat/completions"),
            api_key: api_key.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl Composer for OpenAiComposer {
    #[instrument(skip(self, caption), fields(model = %self.model))]
    async fn compose(&self, caption: &Caption) -> Result<Poem, RemoteError> {
        let prompt = build_prompt(caption);
        debug!(%prompt, "Requesting poem");

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PERSONA,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = service_error("generation service", response).await;
            warn!(error = %error, "Poem request rejected");
            return Err(error);
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| RemoteError::Service("completion returned no content".to_string()))?;

        info!(lines = content.lines().count(), "Poem received");
        Ok(Poem::new(content))
    }
}
