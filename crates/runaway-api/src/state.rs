//! Shared application state.

use std::sync::Arc;

use runaway_core::catalog::WagonCatalog;
use runaway_core::clock::Clock;
use runaway_core::collaborator::{
    DialogueGenerator, GuessGenerator, SimilarityScorer, SpeechSynthesizer,
};
use runaway_session::application::registry::SessionRegistry;
use runaway_session::application::turns::Collaborators;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for deterministic timestamps.
    pub clock: Arc<dyn Clock>,
    /// Live sessions.
    pub sessions: Arc<SessionRegistry>,
    /// Wagon dataset.
    pub catalog: Arc<dyn WagonCatalog>,
    /// Passenger dialogue.
    pub dialogue: Arc<dyn DialogueGenerator>,
    /// Detective guesses.
    pub guesser: Arc<dyn GuessGenerator>,
    /// Guess scoring.
    pub scorer: Arc<dyn SimilarityScorer>,
    /// Text to speech.
    pub speech: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    /// Create new application state with an empty session registry.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        catalog: Arc<dyn WagonCatalog>,
        dialogue: Arc<dyn DialogueGenerator>,
        guesser: Arc<dyn GuessGenerator>,
        scorer: Arc<dyn SimilarityScorer>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new(Arc::clone(&clock))),
            clock,
            catalog,
            dialogue,
            guesser,
            scorer,
            speech,
        }
    }

    /// Borrowed view of the collaborators for one turn.
    #[must_use]
    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            catalog: self.catalog.as_ref(),
            dialogue: self.dialogue.as_ref(),
            guesser: self.guesser.as_ref(),
            scorer: self.scorer.as_ref(),
            speech: self.speech.as_ref(),
        }
    }
}
