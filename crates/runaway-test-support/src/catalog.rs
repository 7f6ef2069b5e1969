//! Test catalogs: in-memory `WagonCatalog` implementations for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use runaway_core::catalog::{Passenger, PassengerProfile, WagonCatalog, WagonDefinition};
use runaway_core::error::DomainError;
use runaway_core::identity::{NpcIdentity, SessionId};

/// Builds `count` wagons with themes `theme-<i>`, passcodes `passcode-<i>`
/// and two passengers each (`wagon-<i>-player-1` and `-2`).
#[must_use]
pub fn sample_wagons(count: u32) -> Vec<WagonDefinition> {
    (0..count)
        .map(|i| WagonDefinition {
            id: i,
            theme: format!("theme-{i}"),
            passcode: format!("passcode-{i}"),
            people: (1..=2)
                .map(|k| Passenger {
                    uid: NpcIdentity::new(i, k).to_string(),
                    position: [0.25, 0.5],
                    rotation: 0.0,
                    model_type: "character-female-a".to_owned(),
                    items: Vec::new(),
                })
                .collect(),
        })
        .collect()
}

/// A plausible passenger profile named `name`.
#[must_use]
pub fn sample_profile(name: &str) -> PassengerProfile {
    PassengerProfile {
        name: name.to_owned(),
        age: 47,
        profession: "Medical Researcher".to_owned(),
        personality: "Analytical and meticulous".to_owned(),
        role: "Ship's doctor".to_owned(),
        mystery_intrigue: "Carries a sealed sample from the derelict".to_owned(),
    }
}

/// A catalog serving the same wagons to every session. Every roster
/// passenger of every wagon gets a generated profile.
#[derive(Debug, Clone)]
pub struct StaticWagonCatalog {
    wagons: Vec<WagonDefinition>,
    profiles: HashMap<NpcIdentity, PassengerProfile>,
}

impl StaticWagonCatalog {
    /// Create a catalog over `wagons`.
    #[must_use]
    pub fn new(wagons: Vec<WagonDefinition>) -> Self {
        let profiles = wagons
            .iter()
            .flat_map(|wagon| wagon.people.iter())
            .filter_map(|person| NpcIdentity::parse(&person.uid).ok())
            .map(|identity| (identity, sample_profile(&format!("Passenger {identity}"))))
            .collect();
        Self { wagons, profiles }
    }

    /// Create a catalog of `count` sample wagons.
    #[must_use]
    pub fn with_wagons(count: u32) -> Self {
        Self::new(sample_wagons(count))
    }
}

#[async_trait]
impl WagonCatalog for StaticWagonCatalog {
    async fn load_wagons(
        &self,
        _session_id: Option<SessionId>,
    ) -> Result<Vec<WagonDefinition>, DomainError> {
        Ok(self.wagons.clone())
    }

    async fn load_passenger(
        &self,
        _session_id: Option<SessionId>,
        identity: &NpcIdentity,
    ) -> Result<Option<PassengerProfile>, DomainError> {
        Ok(self.profiles.get(identity).cloned())
    }

    async fn load_wagon_passengers(
        &self,
        _session_id: Option<SessionId>,
        wagon_index: u32,
    ) -> Result<Option<Vec<(NpcIdentity, PassengerProfile)>>, DomainError> {
        if !self.wagons.iter().any(|wagon| wagon.id == wagon_index) {
            return Ok(None);
        }
        let mut roster: Vec<_> = self
            .profiles
            .iter()
            .filter(|(identity, _)| identity.wagon_index() == wagon_index)
            .map(|(identity, profile)| (*identity, profile.clone()))
            .collect();
        roster.sort_by_key(|(identity, _)| identity.player_index());
        Ok(Some(roster))
    }
}

/// A catalog whose storage is always unavailable. Useful for testing
/// "dataset cannot be loaded" paths.
#[derive(Debug)]
pub struct FailingWagonCatalog;

#[async_trait]
impl WagonCatalog for FailingWagonCatalog {
    async fn load_wagons(
        &self,
        _session_id: Option<SessionId>,
    ) -> Result<Vec<WagonDefinition>, DomainError> {
        Err(DomainError::Infrastructure("wagons.json unreadable".into()))
    }

    async fn load_passenger(
        &self,
        _session_id: Option<SessionId>,
        _identity: &NpcIdentity,
    ) -> Result<Option<PassengerProfile>, DomainError> {
        Err(DomainError::Infrastructure("player_details.json unreadable".into()))
    }

    async fn load_wagon_passengers(
        &self,
        _session_id: Option<SessionId>,
        _wagon_index: u32,
    ) -> Result<Option<Vec<(NpcIdentity, PassengerProfile)>>, DomainError> {
        Err(DomainError::Infrastructure("player_details.json unreadable".into()))
    }
}
