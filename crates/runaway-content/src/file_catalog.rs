//! JSON-file implementation of the `WagonCatalog` port.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/default/wagons.json
//! <data_dir>/default/player_details.json
//! <data_dir>/<session_id>/wagons.json          (optional override)
//! <data_dir>/<session_id>/player_details.json  (optional override)
//! ```
//!
//! Each file is resolved on its own: the session directory wins when it
//! holds the file, otherwise the shared default is used.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use runaway_core::catalog::{PassengerProfile, WagonCatalog, WagonDefinition};
use runaway_core::error::DomainError;
use runaway_core::identity::{NpcIdentity, SessionId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

const DEFAULT_SCOPE: &str = "default";
const WAGONS_FILE: &str = "wagons.json";
const PLAYER_DETAILS_FILE: &str = "player_details.json";

#[derive(Debug, Deserialize)]
struct WagonsFile {
    wagons: Vec<WagonDefinition>,
}

#[derive(Debug, Deserialize)]
struct PlayerDetailsFile {
    player_details: HashMap<String, HashMap<String, PlayerEntry>>,
}

#[derive(Debug, Deserialize)]
struct PlayerEntry {
    profile: PassengerProfile,
}

/// Wagon catalog backed by JSON files on disk.
#[derive(Debug, Clone)]
pub struct FileWagonCatalog {
    data_dir: PathBuf,
}

impl FileWagonCatalog {
    /// Creates a catalog rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root directory of the dataset.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn resolve(&self, session_id: Option<SessionId>, file_name: &str) -> PathBuf {
        if let Some(session_id) = session_id {
            let candidate = self.data_dir.join(session_id.to_string()).join(file_name);
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
        }
        self.data_dir.join(DEFAULT_SCOPE).join(file_name)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        session_id: Option<SessionId>,
        file_name: &str,
    ) -> Result<T, DomainError> {
        let path = self.resolve(session_id, file_name).await;
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to read dataset file");
            DomainError::Infrastructure(format!("failed to read {}: {e}", path.display()))
        })?;
        let parsed = serde_json::from_str(&raw).map_err(|e| {
            error!(path = %path.display(), error = %e, "malformed dataset file");
            DomainError::Infrastructure(format!("malformed {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded dataset file");
        Ok(parsed)
    }
}

#[async_trait]
impl WagonCatalog for FileWagonCatalog {
    async fn load_wagons(
        &self,
        session_id: Option<SessionId>,
    ) -> Result<Vec<WagonDefinition>, DomainError> {
        let file: WagonsFile = self.read_json(session_id, WAGONS_FILE).await?;
        Ok(file.wagons)
    }

    async fn load_passenger(
        &self,
        session_id: Option<SessionId>,
        identity: &NpcIdentity,
    ) -> Result<Option<PassengerProfile>, DomainError> {
        let mut file: PlayerDetailsFile = self.read_json(session_id, PLAYER_DETAILS_FILE).await?;
        Ok(file
            .player_details
            .get_mut(&identity.wagon_key())
            .and_then(|players| players.remove(&identity.player_key()))
            .map(|entry| entry.profile))
    }

    async fn load_wagon_passengers(
        &self,
        session_id: Option<SessionId>,
        wagon_index: u32,
    ) -> Result<Option<Vec<(NpcIdentity, PassengerProfile)>>, DomainError> {
        let mut file: PlayerDetailsFile = self.read_json(session_id, PLAYER_DETAILS_FILE).await?;
        let wagon_key = NpcIdentity::narrator(wagon_index).wagon_key();
        let Some(players) = file.player_details.remove(&wagon_key) else {
            return Ok(None);
        };

        let mut roster: Vec<_> = players
            .into_iter()
            .filter_map(|(player_key, entry)| {
                match NpcIdentity::parse(&format!("{wagon_key}-{player_key}")) {
                    Ok(identity) => Some((identity, entry.profile)),
                    Err(e) => {
                        warn!(
                            wagon = %wagon_key,
                            player = %player_key,
                            error = %e,
                            "skipping malformed player key"
                        );
                        None
                    }
                }
            })
            .collect();
        roster.sort_by_key(|(identity, _)| identity.player_index());

        debug!(wagon = %wagon_key, count = roster.len(), "loaded wagon roster");
        Ok(Some(roster))
    }
}
