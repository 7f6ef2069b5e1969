//! Ports for the external collaborators a turn calls out to.
//!
//! Implementations live in adapter crates. Callers must not hold a session
//! lock while awaiting any of these.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::PassengerProfile;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions to the model.
    System,
    /// The player.
    User,
    /// The character answering the player.
    Assistant,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One line of dialogue history passed to the dialogue generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub content: String,
}

/// Input for the guess generator. Lists are already bounded by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuessRequest {
    /// Theme of the wagon's passcode.
    pub theme: String,
    /// Most recent previous guesses, oldest first.
    pub previous_guesses: Vec<String>,
    /// Most recent previous indications, oldest first.
    pub previous_indications: Vec<String>,
    /// The player's current clue, with the passcode masked out.
    pub current_indication: String,
}

/// Output of the guess generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessResponse {
    /// One-word passcode guess.
    pub guess: String,
    /// Reasoning spoken out loud on the way to the guess.
    pub thoughts: String,
}

/// Failure of an external collaborator.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    /// The collaborator is missing credentials or configuration.
    #[error("collaborator not configured: {0}")]
    NotConfigured(String),

    /// The request did not complete or the provider answered with an error.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The provider answered with something we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl CollaboratorError {
    /// Whether repeating the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotConfigured(_) => false,
            Self::RequestFailed(message) => {
                !(message.contains("400") || message.contains("401") || message.contains("403"))
            }
            Self::InvalidResponse(_) => true,
        }
    }
}

/// Generates an in-character reply from a passenger.
#[async_trait]
pub trait DialogueGenerator: Send + Sync {
    /// Returns a single reply given the profile and recent history.
    async fn generate_reply(
        &self,
        profile: &PassengerProfile,
        history: &[ChatLine],
    ) -> Result<String, CollaboratorError>;
}

/// Produces the detective's next passcode guess.
#[async_trait]
pub trait GuessGenerator: Send + Sync {
    /// Returns a one-word guess and the reasoning behind it.
    async fn generate_guess(&self, request: &GuessRequest) -> Result<GuessResponse, CollaboratorError>;
}

/// Scores how close a guess is to the passcode.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    /// Returns a score in `[0, 1]`.
    async fn score(&self, passcode: &str, guess: &str, theme: &str) -> Result<f64, CollaboratorError>;
}

/// Converts reply text to audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns the encoded audio payload.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!CollaboratorError::RequestFailed("status 401: bad key".into()).is_retryable());
        assert!(!CollaboratorError::NotConfigured("MISTRAL_API_KEY".into()).is_retryable());
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(CollaboratorError::RequestFailed("connection reset".into()).is_retryable());
        assert!(CollaboratorError::RequestFailed("status 503".into()).is_retryable());
        assert!(CollaboratorError::InvalidResponse("missing score".into()).is_retryable());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(Role::Assistant).unwrap();
        assert_eq!(json, serde_json::json!("assistant"));
        assert_eq!(Role::User.as_str(), "user");
    }
}
