//! Command handlers for the Session & Wagon Progress context.
//!
//! Each handler validates client input, performs any slow loading outside the
//! session lock, then applies the domain change through a single registry
//! mutation.

use runaway_core::catalog::WagonCatalog;
use runaway_core::error::DomainError;
use runaway_core::identity::{NpcIdentity, SessionId};
use tracing::{info, warn};

use crate::application::registry::SessionRegistry;
use crate::domain::commands::{
    AddMessage, AdvanceWagon, CreateSession, ExpireSessions, RecordGuess, TerminateSession,
};
use crate::domain::session::{Conversation, GuessingProgress, Message, Session};

/// Result of a successful wagon advancement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// Index of the wagon the session is now in.
    pub wagon_id: u32,
    /// Theme of the new wagon.
    pub theme: String,
}

/// Loads theme and passcode of the session's current wagon if they have not
/// been loaded yet. Returns the session as it stands afterwards.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session is not live, or the
/// catalog's error if the dataset cannot be read.
pub(crate) async fn hydrate_current_wagon(
    session_id: SessionId,
    registry: &SessionRegistry,
    catalog: &dyn WagonCatalog,
) -> Result<Session, DomainError> {
    let session = registry.get(session_id).await?;
    if session.current_wagon.is_loaded() {
        return Ok(session);
    }

    let wagons = catalog.load_wagons(Some(session_id)).await?;
    registry
        .mutate(session_id, |session| {
            session.load_wagon_metadata(&wagons);
            Ok(session.clone())
        })
        .await
}

/// Handles the `CreateSession` command: registers a fresh session and tries
/// to load wagon 0's metadata. A catalog failure does not fail creation; the
/// metadata is loaded again on the first guess.
pub async fn handle_create_session(
    command: &CreateSession,
    registry: &SessionRegistry,
    catalog: &dyn WagonCatalog,
) -> Session {
    let session = registry.create().await;

    match hydrate_current_wagon(session.session_id, registry, catalog).await {
        Ok(hydrated) => hydrated,
        Err(e) => {
            warn!(
                correlation_id = %command.correlation_id,
                session_id = %session.session_id,
                error = %e,
                "could not load wagon metadata for new session"
            );
            session
        }
    }
}

/// Handles the `AddMessage` command: appends the message to the conversation
/// with the referenced character in the current wagon.
///
/// # Errors
///
/// Returns `DomainError::InvalidIdentity` for an unparsable uid,
/// `DomainError::WrongWagon` if the character is not in the current wagon, and
/// `DomainError::SessionNotFound` if the session is not live. No state
/// changes on error.
pub async fn handle_add_message(
    command: &AddMessage,
    registry: &SessionRegistry,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Conversation, DomainError> {
    let identity = NpcIdentity::parse(&command.uid)?;
    let message = Message::new(command.role, command.content.clone(), now);

    let conversation = registry
        .mutate(command.session_id, |session| {
            session.add_message(identity, message).cloned()
        })
        .await?;

    info!(
        correlation_id = %command.correlation_id,
        session_id = %command.session_id,
        uid = %identity,
        message_role = command.role.as_str(),
        message_count = conversation.messages.len(),
        "added message to conversation"
    );
    Ok(conversation)
}

/// Handles the `AdvanceWagon` command: loads the wagon dataset, then moves the
/// session to the next wagon in one mutation.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session is not live, and
/// `DomainError::CannotAdvance` if the session is at the last wagon or the
/// dataset cannot be loaded. No state changes on error.
pub async fn handle_advance_wagon(
    command: &AdvanceWagon,
    registry: &SessionRegistry,
    catalog: &dyn WagonCatalog,
) -> Result<AdvanceOutcome, DomainError> {
    let session = registry.get(command.session_id).await?;

    let wagons = catalog.load_wagons(Some(command.session_id)).await.map_err(|e| {
        warn!(
            correlation_id = %command.correlation_id,
            session_id = %command.session_id,
            error = %e,
            "failed to read wagons data"
        );
        DomainError::CannotAdvance(format!("wagon dataset unavailable: {e}"))
    })?;

    let outcome = registry
        .mutate(command.session_id, |session| {
            let wagon_id = session.advance(&wagons)?;
            Ok(AdvanceOutcome {
                wagon_id,
                theme: session.current_wagon.theme.clone(),
            })
        })
        .await
        .inspect_err(|e| {
            warn!(
                correlation_id = %command.correlation_id,
                session_id = %command.session_id,
                current_wagon = session.current_wagon_id(),
                error = %e,
                "cannot advance wagon"
            );
        })?;

    info!(
        correlation_id = %command.correlation_id,
        session_id = %command.session_id,
        new_wagon = outcome.wagon_id,
        "advanced to next wagon"
    );
    Ok(outcome)
}

/// Handles the `RecordGuess` command: stores the indication, the guess and
/// the narrator replay in one mutation.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session is not live, and
/// `DomainError::WrongWagon` if the session is no longer in the wagon the
/// guess was produced for.
pub async fn handle_record_guess(
    command: &RecordGuess,
    registry: &SessionRegistry,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<GuessingProgress, DomainError> {
    let progress = registry
        .mutate(command.session_id, |session| {
            session.ensure_current_wagon(&NpcIdentity::narrator(command.wagon_id))?;
            session.record_guess(&command.indication, &command.guess, &command.rationale, now);
            Ok(session.guessing_progress.clone())
        })
        .await?;

    info!(
        correlation_id = %command.correlation_id,
        session_id = %command.session_id,
        wagon_id = command.wagon_id,
        guess_count = progress.guesses.len(),
        "added a new guess"
    );
    Ok(progress)
}

/// Handles the `TerminateSession` command.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session is not live.
pub async fn handle_terminate_session(
    command: &TerminateSession,
    registry: &SessionRegistry,
) -> Result<Session, DomainError> {
    registry.terminate(command.session_id).await.inspect_err(|_| {
        warn!(
            correlation_id = %command.correlation_id,
            session_id = %command.session_id,
            "attempted to terminate non-existent session"
        );
    })
}

/// Handles the `ExpireSessions` command. Returns how many sessions were
/// removed.
pub async fn handle_expire_sessions(command: &ExpireSessions, registry: &SessionRegistry) -> usize {
    let removed = registry.expire_older_than(command.max_age).await;
    if removed > 0 {
        info!(
            correlation_id = %command.correlation_id,
            removed,
            max_age_secs = command.max_age.num_seconds(),
            "expired idle sessions"
        );
    }
    removed
}
