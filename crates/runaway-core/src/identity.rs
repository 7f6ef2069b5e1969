//! Identifiers for sessions and the characters a session can talk to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Opaque, unique identifier of a player session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mints a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Reference to a character inside a specific wagon, written on the wire as
/// `wagon-<i>-player-<k>`.
///
/// Player slot `0` is reserved for the detective's own guessing log; roster
/// passengers are numbered from `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NpcIdentity {
    wagon_index: u32,
    player_index: u32,
}

impl NpcIdentity {
    /// Player slot holding the detective's guessing log.
    pub const NARRATOR_SLOT: u32 = 0;

    /// Creates an identity from its two indices.
    #[must_use]
    pub fn new(wagon_index: u32, player_index: u32) -> Self {
        Self {
            wagon_index,
            player_index,
        }
    }

    /// The detective's log for the given wagon.
    #[must_use]
    pub fn narrator(wagon_index: u32) -> Self {
        Self::new(wagon_index, Self::NARRATOR_SLOT)
    }

    /// Parses the canonical `wagon-<i>-player-<k>` form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidIdentity` if the string does not have
    /// exactly that shape or either index is not a non-negative integer.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidIdentity(raw.to_owned());

        let mut parts = raw.split('-');
        let (Some("wagon"), Some(wagon), Some("player"), Some(player), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(invalid());
        };

        let wagon_index = parse_index(wagon).ok_or_else(invalid)?;
        let player_index = parse_index(player).ok_or_else(invalid)?;
        Ok(Self::new(wagon_index, player_index))
    }

    /// Index of the wagon this character belongs to.
    #[must_use]
    pub fn wagon_index(&self) -> u32 {
        self.wagon_index
    }

    /// Index of the character within its wagon.
    #[must_use]
    pub fn player_index(&self) -> u32 {
        self.player_index
    }

    /// Whether this identity is the detective's guessing log.
    #[must_use]
    pub fn is_narrator(&self) -> bool {
        self.player_index == Self::NARRATOR_SLOT
    }

    /// Dataset key of the owning wagon (`wagon-<i>`).
    #[must_use]
    pub fn wagon_key(&self) -> String {
        format!("wagon-{}", self.wagon_index)
    }

    /// Dataset key of the character within its wagon (`player-<k>`).
    #[must_use]
    pub fn player_key(&self) -> String {
        format!("player-{}", self.player_index)
    }
}

/// Parses an index written in canonical decimal: ASCII digits only, no sign
/// and no leading zero.
fn parse_index(raw: &str) -> Option<u32> {
    let canonical = !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'));
    if canonical { raw.parse().ok() } else { None }
}

impl fmt::Display for NpcIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wagon-{}-player-{}", self.wagon_index, self.player_index)
    }
}

impl FromStr for NpcIdentity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NpcIdentity {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NpcIdentity> for String {
    fn from(identity: NpcIdentity) -> Self {
        identity.to_string()
    }
}
