//! Query handlers for the Session & Wagon Progress context.
//!
//! These return read-only view DTOs. Views never carry the wagon passcode.
//! Every lookup counts as activity and extends the session's lifetime.

use chrono::{DateTime, Utc};
use runaway_core::error::DomainError;
use runaway_core::identity::{NpcIdentity, SessionId};
use serde::Serialize;

use crate::application::registry::SessionRegistry;
use crate::domain::session::{Conversation, GuessingProgress, Message, Session};

/// Read-only view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    /// The session identifier.
    pub session_id: SessionId,
    /// The wagon being played.
    pub current_wagon: WagonView,
    /// Guessing state for the current wagon.
    pub guessing_progress: GuessingProgressView,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last read or write.
    pub last_active: DateTime<Utc>,
}

/// The current wagon without its passcode.
#[derive(Debug, Clone, Serialize)]
pub struct WagonView {
    /// Index of the wagon.
    pub wagon_id: u32,
    /// Theme of the wagon's passcode; empty until loaded.
    pub theme: String,
    /// One entry per started conversation.
    pub conversations: Vec<ConversationSummary>,
}

/// Summary of one conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    /// The character.
    pub uid: NpcIdentity,
    /// Number of messages exchanged.
    pub message_count: usize,
    /// Time of the most recent message.
    pub last_interaction: DateTime<Utc>,
}

/// Indications and guesses for the current wagon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuessingProgressView {
    /// Player clues, in order.
    pub indications: Vec<String>,
    /// Detective guesses, in order.
    pub guesses: Vec<String>,
}

/// Full message history with one character.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    /// The character.
    pub uid: NpcIdentity,
    /// Messages in insertion order.
    pub messages: Vec<Message>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id,
            current_wagon: WagonView {
                wagon_id: session.current_wagon.wagon_id,
                theme: session.current_wagon.theme.clone(),
                conversations: session
                    .current_wagon
                    .conversations
                    .values()
                    .map(|c| ConversationSummary {
                        uid: c.uid,
                        message_count: c.messages.len(),
                        last_interaction: c.last_interaction,
                    })
                    .collect(),
            },
            guessing_progress: GuessingProgressView::from(&session.guessing_progress),
            created_at: session.created_at,
            last_active: session.last_active,
        }
    }
}

impl From<&GuessingProgress> for GuessingProgressView {
    fn from(progress: &GuessingProgress) -> Self {
        Self {
            indications: progress.indications.iter().map(|m| m.content.clone()).collect(),
            guesses: progress.guesses.clone(),
        }
    }
}

impl From<&Conversation> for ConversationView {
    fn from(conversation: &Conversation) -> Self {
        Self {
            uid: conversation.uid,
            messages: conversation.messages.clone(),
        }
    }
}

/// Retrieves a session view.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session is not live.
pub async fn get_session_view(
    session_id: SessionId,
    registry: &SessionRegistry,
) -> Result<SessionView, DomainError> {
    registry
        .read(session_id, |session| SessionView::from(session))
        .await
}

/// Retrieves the conversation with `uid` in the current wagon. Returns
/// `Ok(None)` when the conversation has not started or the character belongs
/// to another wagon.
///
/// # Errors
///
/// Returns `DomainError::InvalidIdentity` for an unparsable uid and
/// `DomainError::SessionNotFound` if the session is not live.
pub async fn get_conversation(
    session_id: SessionId,
    uid: &str,
    registry: &SessionRegistry,
) -> Result<Option<ConversationView>, DomainError> {
    let identity = NpcIdentity::parse(uid)?;
    registry
        .read(session_id, |session| {
            session.conversation(&identity).map(ConversationView::from)
        })
        .await
}

/// Retrieves the guessing progress of the current wagon.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session is not live.
pub async fn get_guessing_progress(
    session_id: SessionId,
    registry: &SessionRegistry,
) -> Result<GuessingProgressView, DomainError> {
    registry
        .read(session_id, |session| {
            GuessingProgressView::from(&session.guessing_progress)
        })
        .await
}
