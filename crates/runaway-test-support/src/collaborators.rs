//! Scripted collaborator doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use runaway_core::catalog::PassengerProfile;
use runaway_core::collaborator::{
    ChatLine, CollaboratorError, DialogueGenerator, GuessGenerator, GuessRequest, GuessResponse,
    SimilarityScorer, SpeechSynthesizer,
};

fn provider_down() -> CollaboratorError {
    CollaboratorError::RequestFailed("provider unavailable".into())
}

/// Always answers with the same reply and remembers the history length of
/// every call.
#[derive(Debug)]
pub struct StubDialogueGenerator {
    reply: String,
    history_lengths: Mutex<Vec<usize>>,
}

impl StubDialogueGenerator {
    /// Create a generator answering `reply`.
    #[must_use]
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_owned(),
            history_lengths: Mutex::new(Vec::new()),
        }
    }

    /// History lengths seen so far, one per call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn history_lengths(&self) -> Vec<usize> {
        self.history_lengths.lock().unwrap().clone()
    }
}

#[async_trait]
impl DialogueGenerator for StubDialogueGenerator {
    async fn generate_reply(
        &self,
        _profile: &PassengerProfile,
        history: &[ChatLine],
    ) -> Result<String, CollaboratorError> {
        self.history_lengths.lock().unwrap().push(history.len());
        Ok(self.reply.clone())
    }
}

/// A dialogue generator whose provider is always down.
#[derive(Debug)]
pub struct FailingDialogueGenerator;

#[async_trait]
impl DialogueGenerator for FailingDialogueGenerator {
    async fn generate_reply(
        &self,
        _profile: &PassengerProfile,
        _history: &[ChatLine],
    ) -> Result<String, CollaboratorError> {
        Err(provider_down())
    }
}

/// Returns a fixed guess and records every request it receives.
#[derive(Debug)]
pub struct RecordingGuessGenerator {
    response: GuessResponse,
    requests: Mutex<Vec<GuessRequest>>,
}

impl RecordingGuessGenerator {
    /// Create a generator answering `guess` with reasoning `thoughts`.
    #[must_use]
    pub fn new(guess: &str, thoughts: &str) -> Self {
        Self {
            response: GuessResponse {
                guess: guess.to_owned(),
                thoughts: thoughts.to_owned(),
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of all requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<GuessRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GuessGenerator for RecordingGuessGenerator {
    async fn generate_guess(&self, request: &GuessRequest) -> Result<GuessResponse, CollaboratorError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

/// A guess generator whose provider is always down.
#[derive(Debug)]
pub struct FailingGuessGenerator;

#[async_trait]
impl GuessGenerator for FailingGuessGenerator {
    async fn generate_guess(&self, _request: &GuessRequest) -> Result<GuessResponse, CollaboratorError> {
        Err(provider_down())
    }
}

/// Always returns the same score.
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer(pub f64);

#[async_trait]
impl SimilarityScorer for FixedScorer {
    async fn score(&self, _passcode: &str, _guess: &str, _theme: &str) -> Result<f64, CollaboratorError> {
        Ok(self.0)
    }
}

/// A scorer whose provider is always down.
#[derive(Debug)]
pub struct FailingScorer;

#[async_trait]
impl SimilarityScorer for FailingScorer {
    async fn score(&self, _passcode: &str, _guess: &str, _theme: &str) -> Result<f64, CollaboratorError> {
        Err(provider_down())
    }
}

/// Always returns the same audio payload.
#[derive(Debug, Clone)]
pub struct StubSpeech(pub Vec<u8>);

#[async_trait]
impl SpeechSynthesizer for StubSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, CollaboratorError> {
        Ok(self.0.clone())
    }
}

/// A speech synthesizer whose provider is always down.
#[derive(Debug)]
pub struct FailingSpeech;

#[async_trait]
impl SpeechSynthesizer for FailingSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, CollaboratorError> {
        Err(provider_down())
    }
}
