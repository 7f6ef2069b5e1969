//! Turn orchestration: a chat exchange with a passenger and a guessing round
//! with the detective.
//!
//! Both turns call slow external collaborators. The session lock is only
//! taken for the short mutations before and after those calls, never across
//! them.

use chrono::{DateTime, Utc};
use runaway_core::catalog::WagonCatalog;
use runaway_core::clock::Clock;
use runaway_core::collaborator::{
    ChatLine, DialogueGenerator, GuessGenerator, GuessRequest, Role, SimilarityScorer,
    SpeechSynthesizer,
};
use runaway_core::error::DomainError;
use runaway_core::identity::NpcIdentity;
use tracing::{error, info, warn};

use crate::application::command_handlers::{
    handle_add_message, handle_record_guess, hydrate_current_wagon,
};
use crate::application::registry::SessionRegistry;
use crate::domain::commands::{AddMessage, RecordGuess, SendChatMessage, SubmitIndication};
use crate::domain::session::Message;

/// Reply used when the dialogue generator fails.
pub const FALLBACK_REPLY: &str =
    "I apologize, but I'm having trouble responding right now. Please try again later.";

/// Number of messages of history handed to the dialogue generator.
pub const DIALOGUE_HISTORY_LIMIT: usize = 10;

/// Number of previous guesses handed to the guess generator.
pub const GUESS_HISTORY_LIMIT: usize = 3;

/// Number of previous indications handed to the guess generator.
pub const INDICATION_HISTORY_LIMIT: usize = 5;

/// Score used when the similarity scorer is unavailable.
pub const NEUTRAL_SCORE: f64 = 0.5;

const PASSCODE_MASK: &str = "*******";

/// The collaborators a turn may call.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Wagon dataset.
    pub catalog: &'a dyn WagonCatalog,
    /// Passenger dialogue.
    pub dialogue: &'a dyn DialogueGenerator,
    /// Detective guesses.
    pub guesser: &'a dyn GuessGenerator,
    /// Guess scoring.
    pub scorer: &'a dyn SimilarityScorer,
    /// Text to speech.
    pub speech: &'a dyn SpeechSynthesizer,
}

/// Result of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnOutcome {
    /// The passenger that answered.
    pub uid: NpcIdentity,
    /// The reply text.
    pub reply: String,
    /// Spoken reply; empty when speech is unavailable.
    pub audio: Vec<u8>,
    /// When the reply was stored.
    pub timestamp: DateTime<Utc>,
}

/// Result of a guessing round.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessTurnOutcome {
    /// The detective's one-word guess.
    pub guess: String,
    /// The detective's reasoning.
    pub thoughts: String,
    /// Closeness to the passcode, in `[0, 1]`.
    pub score: f64,
    /// The wagon the round was played in.
    pub wagon_id: u32,
}

/// Replaces every case-insensitive occurrence of `passcode` in `text` with
/// a fixed mask. Case is compared per character with Unicode lowercasing.
#[must_use]
pub fn mask_passcode(text: &str, passcode: &str) -> String {
    if passcode.is_empty() {
        return text.to_owned();
    }

    let mut masked = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(next) = rest.chars().next() {
        if let Some(len) = caseless_prefix_len(rest, passcode) {
            masked.push_str(PASSCODE_MASK);
            rest = &rest[len..];
        } else {
            masked.push(next);
            rest = &rest[next.len_utf8()..];
        }
    }
    masked
}

/// Byte length of the prefix of `text` equal to `needle` ignoring case.
fn caseless_prefix_len(text: &str, needle: &str) -> Option<usize> {
    let mut chars = text.chars();
    let mut consumed = 0;
    for expected in needle.chars() {
        let actual = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        consumed += actual.len_utf8();
    }
    Some(consumed)
}

/// Handles a chat turn: stores the player's message, asks the passenger for a
/// reply, stores the reply and voices it.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty message,
/// `DomainError::InvalidIdentity` for an unparsable uid,
/// `DomainError::SessionNotFound` if the session is not live,
/// `DomainError::WrongWagon` if the passenger is not in the current wagon,
/// `DomainError::PassengerNotFound` if the dataset has no such passenger, and
/// `DomainError::Retryable` if the reply could not be stored.
pub async fn handle_chat_turn(
    command: &SendChatMessage,
    registry: &SessionRegistry,
    collaborators: Collaborators<'_>,
    clock: &dyn Clock,
) -> Result<ChatTurnOutcome, DomainError> {
    if command.message.trim().is_empty() {
        return Err(DomainError::Validation("message must not be empty".into()));
    }
    let identity = NpcIdentity::parse(&command.uid)?;

    let session = registry.get(command.session_id).await?;
    session.ensure_current_wagon(&identity)?;

    let profile = collaborators
        .catalog
        .load_passenger(Some(command.session_id), &identity)
        .await?
        .ok_or_else(|| DomainError::PassengerNotFound(identity.to_string()))?;

    let conversation = handle_add_message(
        &AddMessage {
            correlation_id: command.correlation_id,
            session_id: command.session_id,
            uid: command.uid.clone(),
            role: Role::User,
            content: command.message.clone(),
        },
        registry,
        clock.now(),
    )
    .await?;
    let history: Vec<ChatLine> = conversation
        .recent(DIALOGUE_HISTORY_LIMIT)
        .iter()
        .map(Message::to_chat_line)
        .collect();

    let reply = match collaborators.dialogue.generate_reply(&profile, &history).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(
                correlation_id = %command.correlation_id,
                session_id = %command.session_id,
                uid = %identity,
                error = %e,
                "dialogue generation failed, using fallback reply"
            );
            FALLBACK_REPLY.to_owned()
        }
    };

    let timestamp = clock.now();
    handle_add_message(
        &AddMessage {
            correlation_id: command.correlation_id,
            session_id: command.session_id,
            uid: command.uid.clone(),
            role: Role::Assistant,
            content: reply.clone(),
        },
        registry,
        timestamp,
    )
    .await
    .map_err(|e| {
        error!(
            correlation_id = %command.correlation_id,
            session_id = %command.session_id,
            uid = %identity,
            reply = %reply,
            error = %e,
            "could not store generated reply"
        );
        DomainError::Retryable(format!("reply could not be stored: {e}"))
    })?;

    let audio = match collaborators.speech.synthesize(&reply).await {
        Ok(audio) => audio,
        Err(e) => {
            warn!(
                correlation_id = %command.correlation_id,
                session_id = %command.session_id,
                error = %e,
                "speech synthesis failed, returning empty audio"
            );
            Vec::new()
        }
    };

    info!(
        correlation_id = %command.correlation_id,
        session_id = %command.session_id,
        uid = %identity,
        audio_bytes = audio.len(),
        "completed chat turn"
    );
    Ok(ChatTurnOutcome {
        uid: identity,
        reply,
        audio,
        timestamp,
    })
}

/// Handles a guessing round: the detective guesses the passcode from the
/// player's indication, the guess is scored and the round is recorded.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty indication,
/// `DomainError::SessionNotFound` if the session is not live, the catalog's
/// error if the wagon metadata cannot be loaded, and
/// `DomainError::Retryable` if the guess could not be produced or stored.
pub async fn handle_guess_turn(
    command: &SubmitIndication,
    registry: &SessionRegistry,
    collaborators: Collaborators<'_>,
    clock: &dyn Clock,
) -> Result<GuessTurnOutcome, DomainError> {
    if command.indication.trim().is_empty() {
        return Err(DomainError::Validation("indication must not be empty".into()));
    }

    let session = hydrate_current_wagon(command.session_id, registry, collaborators.catalog).await?;
    let wagon_id = session.current_wagon_id();
    let theme = session.current_wagon.theme.clone();
    let passcode = session.current_wagon.passcode().to_owned();

    // Stored history holds the player's raw text; everything the detective
    // sees is masked.
    let progress = &session.guessing_progress;
    let request = GuessRequest {
        theme: theme.clone(),
        previous_guesses: progress
            .recent_guesses(GUESS_HISTORY_LIMIT)
            .iter()
            .map(|guess| mask_passcode(guess, &passcode))
            .collect(),
        previous_indications: progress
            .recent_indications(INDICATION_HISTORY_LIMIT)
            .iter()
            .map(|m| mask_passcode(&m.content, &passcode))
            .collect(),
        current_indication: mask_passcode(&command.indication, &passcode),
    };

    let response = collaborators
        .guesser
        .generate_guess(&request)
        .await
        .map_err(|e| {
            warn!(
                correlation_id = %command.correlation_id,
                session_id = %command.session_id,
                wagon_id,
                error = %e,
                "guess generation failed"
            );
            DomainError::Retryable(format!("guess generation failed: {e}"))
        })?;

    let score = match collaborators.scorer.score(&passcode, &response.guess, &theme).await {
        Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
        Ok(score) => {
            warn!(session_id = %command.session_id, score, "scorer returned a non-finite score");
            NEUTRAL_SCORE
        }
        Err(e) => {
            warn!(
                correlation_id = %command.correlation_id,
                session_id = %command.session_id,
                error = %e,
                "similarity scoring failed, using neutral score"
            );
            NEUTRAL_SCORE
        }
    };

    handle_record_guess(
        &RecordGuess {
            correlation_id: command.correlation_id,
            session_id: command.session_id,
            wagon_id,
            indication: command.indication.clone(),
            guess: response.guess.clone(),
            rationale: response.thoughts.clone(),
        },
        registry,
        clock.now(),
    )
    .await
    .map_err(|e| {
        error!(
            correlation_id = %command.correlation_id,
            session_id = %command.session_id,
            wagon_id,
            guess = %response.guess,
            thoughts = %response.thoughts,
            error = %e,
            "could not store generated guess"
        );
        DomainError::Retryable(format!("guess could not be stored: {e}"))
    })?;

    info!(
        correlation_id = %command.correlation_id,
        session_id = %command.session_id,
        wagon_id,
        score,
        "completed guess turn"
    );
    Ok(GuessTurnOutcome {
        guess: response.guess,
        thoughts: response.thoughts,
        score,
        wagon_id,
    })
}
