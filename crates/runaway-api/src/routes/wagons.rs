//! Public, read-only view of the shared wagon dataset.
//!
//! Passcodes and passenger secrets never leave the server.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use runaway_core::catalog::{Passenger, PassengerProfile, WagonDefinition};
use runaway_core::error::DomainError;
use runaway_core::identity::NpcIdentity;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// A wagon without its passcode.
#[derive(Debug, Serialize)]
pub struct PublicWagon {
    /// Dataset identifier.
    pub id: u32,
    /// Theme of the passcode.
    pub theme: String,
    /// Passengers placed in the wagon.
    pub people: Vec<Passenger>,
}

impl From<WagonDefinition> for PublicWagon {
    fn from(wagon: WagonDefinition) -> Self {
        Self {
            id: wagon.id,
            theme: wagon.theme,
            people: wagon.people,
        }
    }
}

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct WagonsResponse {
    /// Wagons in play order.
    pub wagons: Vec<PublicWagon>,
}

/// A passenger profile without the secret.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    /// Identity of the passenger.
    pub uid: String,
    /// Full name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Occupation.
    pub profession: String,
    /// Personality traits.
    pub personality: String,
    /// Role in the story.
    pub role: String,
}

impl PublicProfile {
    fn new(identity: NpcIdentity, profile: PassengerProfile) -> Self {
        Self {
            uid: identity.to_string(),
            name: profile.name,
            age: profile.age,
            profession: profile.profession,
            personality: profile.personality,
            role: profile.role,
        }
    }
}

/// Response body for GET /{wagon_id}/players.
#[derive(Debug, Serialize)]
pub struct RosterResponse {
    /// The wagon the passengers ride in.
    pub wagon_id: u32,
    /// Passengers ordered by player index.
    pub players: Vec<PublicProfile>,
}

/// GET /
#[instrument(skip(state))]
async fn list_wagons(State(state): State<AppState>) -> Result<Json<WagonsResponse>, ApiError> {
    let wagons = state.catalog.load_wagons(None).await?;
    debug!(count = wagons.len(), "listing wagons");
    Ok(Json(WagonsResponse {
        wagons: wagons.into_iter().map(PublicWagon::from).collect(),
    }))
}

/// GET /{wagon_id}/players/{player_id}
#[instrument(skip(state))]
async fn get_player(
    State(state): State<AppState>,
    Path((wagon_id, player_id)): Path<(u32, u32)>,
) -> Result<Json<PublicProfile>, ApiError> {
    let identity = NpcIdentity::new(wagon_id, player_id);
    let profile = state
        .catalog
        .load_passenger(None, &identity)
        .await?
        .ok_or_else(|| DomainError::PassengerNotFound(identity.to_string()))?;
    Ok(Json(PublicProfile::new(identity, profile)))
}

/// GET /{wagon_id}/players
#[instrument(skip(state))]
async fn list_players(
    State(state): State<AppState>,
    Path(wagon_id): Path<u32>,
) -> Result<Json<RosterResponse>, ApiError> {
    let roster = state
        .catalog
        .load_wagon_passengers(None, wagon_id)
        .await?
        .ok_or(DomainError::WagonNotFound(wagon_id))?;
    debug!(count = roster.len(), "listing wagon passengers");
    Ok(Json(RosterResponse {
        wagon_id,
        players: roster
            .into_iter()
            .map(|(identity, profile)| PublicProfile::new(identity, profile))
            .collect(),
    }))
}

/// Returns the router for the wagon dataset.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wagons))
        .route("/{wagon_id}/players", get(list_players))
        .route("/{wagon_id}/players/{player_id}", get(get_player))
}
