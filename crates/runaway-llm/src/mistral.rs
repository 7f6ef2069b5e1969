//! Mistral chat completions client.
//!
//! One client serves three collaborators: passenger dialogue, the detective's
//! guesses and similarity scoring.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use runaway_core::catalog::PassengerProfile;
use runaway_core::collaborator::{
    ChatLine, CollaboratorError, DialogueGenerator, GuessGenerator, GuessRequest, GuessResponse,
    Role, SimilarityScorer,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompts;

/// Default Mistral base URL.
pub const DEFAULT_MISTRAL_BASE_URL: &str = "https://api.mistral.ai";

/// Default model for dialogue and guessing.
pub const DEFAULT_DIALOGUE_MODEL: &str = "mistral-large-latest";

/// Default model for similarity scoring.
pub const DEFAULT_SCORING_MODEL: &str = "mistral-small-latest";

const DIALOGUE_TEMPERATURE: f32 = 0.7;
const DIALOGUE_MAX_TOKENS: u32 = 500;
const GUESS_TEMPERATURE: f32 = 1.0;
const SCORING_TEMPERATURE: f32 = 0.0;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Connection settings for [`MistralClient`].
#[derive(Debug, Clone)]
pub struct MistralConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Base URL without the `/v1/...` path.
    pub base_url: String,
    /// Model for dialogue and guessing.
    pub dialogue_model: String,
    /// Model for similarity scoring.
    pub scoring_model: String,
}

/// Client for Mistral's chat completions API.
#[derive(Clone)]
pub struct MistralClient {
    client: Client,
    api_key: String,
    base_url: String,
    dialogue_model: String,
    scoring_model: String,
}

impl std::fmt::Debug for MistralClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralClient")
            .field("base_url", &self.base_url)
            .field("dialogue_model", &self.dialogue_model)
            .field("scoring_model", &self.scoring_model)
            .finish_non_exhaustive()
    }
}

impl MistralClient {
    /// Creates a client from `config`.
    #[must_use]
    pub fn new(config: MistralConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            dialogue_model: config.dialogue_model,
            scoring_model: config.scoring_model,
        }
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, CollaboratorError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CollaboratorError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::RequestFailed(format!("status {status}: {body}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
        debug!(model = request.model, "chat completion received");
        first_choice(body)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_owned(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl ResponseFormat {
    fn json() -> Self {
        Self { kind: "json_object" }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScoreBody {
    score: f64,
}

fn first_choice(response: ChatResponse) -> Result<String, CollaboratorError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| CollaboratorError::InvalidResponse("no content in completion".into()))
}

fn parse_guess(content: &str) -> Result<GuessResponse, CollaboratorError> {
    let parsed: GuessResponse = serde_json::from_str(content)
        .map_err(|e| CollaboratorError::InvalidResponse(format!("malformed guess: {e}")))?;
    if parsed.guess.trim().is_empty() {
        return Err(CollaboratorError::InvalidResponse("empty guess".into()));
    }
    Ok(parsed)
}

fn parse_score(content: &str) -> Result<f64, CollaboratorError> {
    let parsed: ScoreBody = serde_json::from_str(content)
        .map_err(|e| CollaboratorError::InvalidResponse(format!("malformed score: {e}")))?;
    Ok(parsed.score)
}

fn dialogue_messages(profile: &PassengerProfile, history: &[ChatLine]) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::new(Role::System, prompts::character_prompt(profile)))
        .chain(
            history
                .iter()
                .map(|line| ChatMessage::new(line.role, line.content.clone())),
        )
        .collect()
}

#[async_trait]
impl DialogueGenerator for MistralClient {
    async fn generate_reply(
        &self,
        profile: &PassengerProfile,
        history: &[ChatLine],
    ) -> Result<String, CollaboratorError> {
        let request = ChatRequest {
            model: &self.dialogue_model,
            messages: dialogue_messages(profile, history),
            temperature: DIALOGUE_TEMPERATURE,
            max_tokens: Some(DIALOGUE_MAX_TOKENS),
            response_format: None,
        };
        self.complete(&request).await
    }
}

#[async_trait]
impl GuessGenerator for MistralClient {
    async fn generate_guess(&self, request: &GuessRequest) -> Result<GuessResponse, CollaboratorError> {
        let chat = ChatRequest {
            model: &self.dialogue_model,
            messages: vec![ChatMessage::new(Role::User, prompts::guess_prompt(request))],
            temperature: GUESS_TEMPERATURE,
            max_tokens: None,
            response_format: Some(ResponseFormat::json()),
        };
        let content = self.complete(&chat).await?;
        parse_guess(&content)
    }
}

#[async_trait]
impl SimilarityScorer for MistralClient {
    async fn score(&self, passcode: &str, guess: &str, theme: &str) -> Result<f64, CollaboratorError> {
        let chat = ChatRequest {
            model: &self.scoring_model,
            messages: vec![
                ChatMessage::new(Role::System, prompts::SCORING_SYSTEM_PROMPT),
                ChatMessage::new(Role::User, prompts::scoring_message(passcode, guess, theme)),
            ],
            temperature: SCORING_TEMPERATURE,
            max_tokens: None,
            response_format: Some(ResponseFormat::json()),
        };
        let content = self.complete(&chat).await?;
        parse_score(&content)
    }
}
