//! Commands for the Session & Wagon Progress context.

use chrono::Duration;
use runaway_core::collaborator::Role;
use runaway_core::command::Command;
use runaway_core::identity::SessionId;
use uuid::Uuid;

/// Command to open a new session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for CreateSession {
    fn command_type(&self) -> &'static str {
        "session.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to append a message to a character conversation.
#[derive(Debug, Clone)]
pub struct AddMessage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session to update.
    pub session_id: SessionId,
    /// Raw `wagon-<i>-player-<k>` identity supplied by the client.
    pub uid: String,
    /// Author of the message.
    pub role: Role,
    /// Text of the message.
    pub content: String,
}

impl Command for AddMessage {
    fn command_type(&self) -> &'static str {
        "session.add_message"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to move a session to the next wagon.
#[derive(Debug, Clone)]
pub struct AdvanceWagon {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session to advance.
    pub session_id: SessionId,
}

impl Command for AdvanceWagon {
    fn command_type(&self) -> &'static str {
        "session.advance_wagon"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to record one guessing round.
#[derive(Debug, Clone)]
pub struct RecordGuess {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session to update.
    pub session_id: SessionId,
    /// The wagon the guess was produced for; the round is rejected if the
    /// session has moved on.
    pub wagon_id: u32,
    /// The player's clue.
    pub indication: String,
    /// The detective's guess.
    pub guess: String,
    /// The detective's reasoning.
    pub rationale: String,
}

impl Command for RecordGuess {
    fn command_type(&self) -> &'static str {
        "session.record_guess"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to end a session.
#[derive(Debug, Clone)]
pub struct TerminateSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session to remove.
    pub session_id: SessionId,
}

impl Command for TerminateSession {
    fn command_type(&self) -> &'static str {
        "session.terminate"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to sweep sessions idle for longer than `max_age`.
#[derive(Debug, Clone)]
pub struct ExpireSessions {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Inactivity threshold.
    pub max_age: Duration,
}

impl Command for ExpireSessions {
    fn command_type(&self) -> &'static str {
        "session.expire"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to talk to a passenger and get their reply.
#[derive(Debug, Clone)]
pub struct SendChatMessage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session the player is in.
    pub session_id: SessionId,
    /// Raw `wagon-<i>-player-<k>` identity of the passenger.
    pub uid: String,
    /// What the player says.
    pub message: String,
}

impl Command for SendChatMessage {
    fn command_type(&self) -> &'static str {
        "session.send_chat_message"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to give the detective a clue and get a passcode guess back.
#[derive(Debug, Clone)]
pub struct SubmitIndication {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session the player is in.
    pub session_id: SessionId,
    /// The player's clue.
    pub indication: String,
}

impl Command for SubmitIndication {
    fn command_type(&self) -> &'static str {
        "session.submit_indication"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
