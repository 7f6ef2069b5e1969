//! Session state: the current wagon, its conversations and guessing progress.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use runaway_core::catalog::WagonDefinition;
use runaway_core::collaborator::{ChatLine, Role};
use runaway_core::error::DomainError;
use runaway_core::identity::{NpcIdentity, SessionId};
use serde::Serialize;

/// A single utterance. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Text of the message.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped at `timestamp`.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// The message as a history line for the dialogue generator.
    #[must_use]
    pub fn to_chat_line(&self) -> ChatLine {
        ChatLine {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Append-only message log with one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// The character this conversation is with.
    pub uid: NpcIdentity,
    /// Messages in insertion order.
    pub messages: Vec<Message>,
    /// Time of the most recent append.
    pub last_interaction: DateTime<Utc>,
}

impl Conversation {
    /// Starts an empty conversation.
    #[must_use]
    pub fn new(uid: NpcIdentity, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            messages: Vec::new(),
            last_interaction: now,
        }
    }

    fn append(&mut self, message: Message) {
        self.last_interaction = message.timestamp;
        self.messages.push(message);
    }

    /// The last `limit` messages, oldest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }
}

/// Indications and guesses accumulated for the active wagon's passcode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuessingProgress {
    /// Player clues, in order, each stored as a user message.
    pub indications: Vec<Message>,
    /// Detective guesses, in order.
    pub guesses: Vec<String>,
}

impl GuessingProgress {
    /// The last `limit` guesses, oldest first.
    #[must_use]
    pub fn recent_guesses(&self, limit: usize) -> &[String] {
        let start = self.guesses.len().saturating_sub(limit);
        &self.guesses[start..]
    }

    /// The last `limit` indications, oldest first.
    #[must_use]
    pub fn recent_indications(&self, limit: usize) -> &[Message] {
        let start = self.indications.len().saturating_sub(limit);
        &self.indications[start..]
    }

    /// Whether nothing has been guessed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guesses.is_empty() && self.indications.is_empty()
    }
}

/// State of the wagon the session is currently in. Replaced wholesale on
/// advancement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagonProgress {
    /// Index of the wagon in the dataset.
    pub wagon_id: u32,
    /// Theme of the wagon's passcode. Empty until loaded.
    pub theme: String,
    /// The secret passcode. Empty until loaded; never sent to clients.
    pub(crate) passcode: String,
    /// Conversations keyed by character.
    pub conversations: BTreeMap<NpcIdentity, Conversation>,
}

impl WagonProgress {
    /// A wagon whose theme and passcode have not been loaded yet.
    #[must_use]
    pub fn new(wagon_id: u32) -> Self {
        Self {
            wagon_id,
            theme: String::new(),
            passcode: String::new(),
            conversations: BTreeMap::new(),
        }
    }

    /// A wagon with theme and passcode taken from the dataset.
    #[must_use]
    pub fn from_definition(wagon_id: u32, definition: &WagonDefinition) -> Self {
        Self {
            theme: definition.theme.clone(),
            passcode: definition.passcode.clone(),
            ..Self::new(wagon_id)
        }
    }

    /// Whether theme and passcode have been loaded from the dataset.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !self.passcode.is_empty()
    }

    /// The secret passcode, for server-side use only.
    #[must_use]
    pub fn passcode(&self) -> &str {
        &self.passcode
    }
}

/// One player's run through the train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Unique identifier.
    pub session_id: SessionId,
    /// The wagon being played.
    pub current_wagon: WagonProgress,
    /// Guessing state for the current wagon.
    pub guessing_progress: GuessingProgress,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last read or write.
    pub last_active: DateTime<Utc>,
}

impl Session {
    /// A fresh session in wagon 0.
    #[must_use]
    pub fn new(session_id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            current_wagon: WagonProgress::new(0),
            guessing_progress: GuessingProgress::default(),
            created_at: now,
            last_active: now,
        }
    }

    /// Index of the wagon being played.
    #[must_use]
    pub fn current_wagon_id(&self) -> u32 {
        self.current_wagon.wagon_id
    }

    /// Records an access.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }

    /// Checks that `identity` lives in the current wagon.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::WrongWagon` otherwise.
    pub fn ensure_current_wagon(&self, identity: &NpcIdentity) -> Result<(), DomainError> {
        if identity.wagon_index() == self.current_wagon.wagon_id {
            Ok(())
        } else {
            Err(DomainError::WrongWagon {
                identity: identity.to_string(),
                current_wagon: self.current_wagon.wagon_id,
            })
        }
    }

    /// Appends `message` to the conversation with `identity`, starting the
    /// conversation if needed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::WrongWagon` if the identity belongs to another
    /// wagon; nothing is created or appended in that case.
    pub fn add_message(
        &mut self,
        identity: NpcIdentity,
        message: Message,
    ) -> Result<&Conversation, DomainError> {
        self.ensure_current_wagon(&identity)?;

        let timestamp = message.timestamp;
        let conversation = self
            .current_wagon
            .conversations
            .entry(identity)
            .or_insert_with(|| Conversation::new(identity, timestamp));
        conversation.append(message);
        Ok(conversation)
    }

    /// The conversation with `identity` in the current wagon. `None` when it
    /// has not started or the identity belongs to another wagon.
    #[must_use]
    pub fn conversation(&self, identity: &NpcIdentity) -> Option<&Conversation> {
        self.ensure_current_wagon(identity).ok()?;
        self.current_wagon.conversations.get(identity)
    }

    /// Records one guessing round: the indication, the guess, and a replay of
    /// the exchange in the detective's log.
    pub fn record_guess(&mut self, indication: &str, guess: &str, rationale: &str, now: DateTime<Utc>) {
        self.guessing_progress
            .indications
            .push(Message::new(Role::User, indication, now));
        self.guessing_progress.guesses.push(guess.to_owned());

        let narrator = NpcIdentity::narrator(self.current_wagon.wagon_id);
        let log = self
            .current_wagon
            .conversations
            .entry(narrator)
            .or_insert_with(|| Conversation::new(narrator, now));
        log.append(Message::new(Role::User, indication, now));
        log.append(Message::new(Role::Assistant, rationale, now));
    }

    /// Fills in the current wagon's theme and passcode if they are missing.
    /// Returns whether anything changed.
    pub fn load_wagon_metadata(&mut self, wagons: &[WagonDefinition]) -> bool {
        if self.current_wagon.is_loaded() {
            return false;
        }
        let Some(definition) = wagon_at(wagons, self.current_wagon.wagon_id) else {
            return false;
        };
        self.current_wagon.theme.clone_from(&definition.theme);
        self.current_wagon.passcode.clone_from(&definition.passcode);
        true
    }

    /// Moves to the next wagon, discarding the conversations and guessing
    /// progress of the wagon being left. Returns the new wagon index.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CannotAdvance` if the current wagon is the last
    /// one in `wagons`; the session is left untouched.
    pub fn advance(&mut self, wagons: &[WagonDefinition]) -> Result<u32, DomainError> {
        let current = self.current_wagon.wagon_id;
        let Some(max_wagon_index) = max_wagon_index(wagons) else {
            return Err(DomainError::CannotAdvance("wagon dataset is empty".into()));
        };
        let next = current + 1;
        let definition = wagon_at(wagons, next).filter(|_| next <= max_wagon_index);
        let Some(definition) = definition else {
            return Err(DomainError::CannotAdvance(format!(
                "wagon {current} is the last wagon (max index {max_wagon_index})"
            )));
        };

        self.current_wagon = WagonProgress::from_definition(next, definition);
        self.guessing_progress = GuessingProgress::default();
        Ok(next)
    }
}

/// Highest valid wagon index for the dataset, `None` when it is empty.
#[must_use]
pub fn max_wagon_index(wagons: &[WagonDefinition]) -> Option<u32> {
    let last = wagons.len().checked_sub(1)?;
    u32::try_from(last).ok()
}

fn wagon_at(wagons: &[WagonDefinition], wagon_id: u32) -> Option<&WagonDefinition> {
    usize::try_from(wagon_id).ok().and_then(|index| wagons.get(index))
}
