//! Wagon dataset port.
//!
//! The session context only needs "an ordered list of wagons indexable by
//! `wagon_id`" plus the profile of each passenger. Storage format is the
//! adapter's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::identity::{NpcIdentity, SessionId};

/// A character placed inside a wagon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    /// Identity string (`wagon-<i>-player-<k>`).
    pub uid: String,
    /// Floor position inside the wagon.
    pub position: [f32; 2],
    /// Facing, in degrees.
    pub rotation: f32,
    /// Character model used by the client.
    pub model_type: String,
    /// Items carried by the passenger.
    #[serde(default)]
    pub items: Vec<String>,
}

/// One stage of the game: a theme, its secret passcode, and its passengers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagonDefinition {
    /// Dataset identifier of the wagon.
    pub id: u32,
    /// Theme the passcode relates to.
    pub theme: String,
    /// Secret word that opens the next wagon.
    pub passcode: String,
    /// Passengers placed in the wagon.
    #[serde(default)]
    pub people: Vec<Passenger>,
}

/// Character sheet handed to the dialogue generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerProfile {
    /// Full name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Occupation.
    pub profession: String,
    /// Personality traits that color how the character speaks.
    pub personality: String,
    /// Role in the story.
    pub role: String,
    /// The character's secret.
    pub mystery_intrigue: String,
}

/// Loader for the wagon dataset a session plays through.
#[async_trait]
pub trait WagonCatalog: Send + Sync {
    /// Loads the ordered wagon list; position = `wagon_id`. `None` selects
    /// the shared default dataset.
    async fn load_wagons(
        &self,
        session_id: Option<SessionId>,
    ) -> Result<Vec<WagonDefinition>, DomainError>;

    /// Loads the profile of one passenger, or `None` if the dataset has no
    /// such character.
    async fn load_passenger(
        &self,
        session_id: Option<SessionId>,
        identity: &NpcIdentity,
    ) -> Result<Option<PassengerProfile>, DomainError>;

    /// Loads the profiles of every passenger of one wagon, ordered by player
    /// index, or `None` if the dataset has no roster for that wagon.
    async fn load_wagon_passengers(
        &self,
        session_id: Option<SessionId>,
        wagon_index: u32,
    ) -> Result<Option<Vec<(NpcIdentity, PassengerProfile)>>, DomainError>;
}
