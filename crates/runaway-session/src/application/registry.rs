//! Process-wide store of live sessions.
//!
//! Each session sits behind its own mutex; the outer map lock is only held
//! long enough to find, insert or remove a slot. Mutations run against a
//! copy that is committed only on success, so a failed operation leaves the
//! stored session exactly as it was.
//!
//! Removal (termination or expiry) takes the session's mutex first and marks
//! the slot retired, so a request that looked the slot up just before removal
//! sees `SessionNotFound` instead of mutating a detached session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use runaway_core::clock::Clock;
use runaway_core::error::DomainError;
use runaway_core::identity::SessionId;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::domain::session::Session;

#[derive(Debug)]
struct SessionSlot {
    session: Session,
    retired: bool,
}

type SharedSlot = Arc<Mutex<SessionSlot>>;

/// Single source of truth for all live sessions.
pub struct SessionRegistry {
    clock: Arc<dyn Clock>,
    slots: RwLock<HashMap<SessionId, SharedSlot>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Create an empty registry reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slots: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, session_id: SessionId) -> Result<SharedSlot, DomainError> {
        self.slots
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(DomainError::SessionNotFound(session_id))
    }

    /// Mints a new session in wagon 0 and registers it.
    pub async fn create(&self) -> Session {
        let session = Session::new(SessionId::new(), self.clock.now());
        let slot = SessionSlot {
            session: session.clone(),
            retired: false,
        };
        self.slots
            .write()
            .await
            .insert(session.session_id, Arc::new(Mutex::new(slot)));

        info!(session_id = %session.session_id, "created new session");
        session
    }

    /// Returns a snapshot of the session. Reading counts as activity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if the session is not live.
    pub async fn get(&self, session_id: SessionId) -> Result<Session, DomainError> {
        self.read(session_id, Session::clone).await
    }

    /// Runs `f` against the session under its lock. Reading counts as
    /// activity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if the session is not live.
    pub async fn read<T>(
        &self,
        session_id: SessionId,
        f: impl FnOnce(&Session) -> T,
    ) -> Result<T, DomainError> {
        let slot = self.slot(session_id).await?;
        let mut guard = slot.lock().await;
        if guard.retired {
            return Err(DomainError::SessionNotFound(session_id));
        }
        guard.session.touch(self.clock.now());
        debug!(session_id = %session_id, "retrieved session");
        Ok(f(&guard.session))
    }

    /// Replaces the stored session with `session` and bumps `last_active`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if the session is not live.
    pub async fn update(&self, mut session: Session) -> Result<(), DomainError> {
        let session_id = session.session_id;
        let slot = self.slot(session_id).await?;
        let mut guard = slot.lock().await;
        if guard.retired {
            return Err(DomainError::SessionNotFound(session_id));
        }
        session.touch(self.clock.now());
        guard.session = session;

        debug!(
            session_id = %session_id,
            current_wagon = guard.session.current_wagon_id(),
            "updated session"
        );
        Ok(())
    }

    /// Applies `f` to the session atomically. The change is committed (and
    /// `last_active` bumped) only if `f` succeeds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if the session is not live, or
    /// whatever `f` returns.
    pub async fn mutate<T>(
        &self,
        session_id: SessionId,
        f: impl FnOnce(&mut Session) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let slot = self.slot(session_id).await?;
        let mut guard = slot.lock().await;
        if guard.retired {
            return Err(DomainError::SessionNotFound(session_id));
        }

        let mut draft = guard.session.clone();
        let value = f(&mut draft)?;
        draft.touch(self.clock.now());
        guard.session = draft;
        Ok(value)
    }

    /// Removes the session and returns its final state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if the session is not live.
    pub async fn terminate(&self, session_id: SessionId) -> Result<Session, DomainError> {
        let slot = self.slot(session_id).await?;
        let mut guard = slot.lock().await;
        if guard.retired {
            return Err(DomainError::SessionNotFound(session_id));
        }
        guard.retired = true;
        self.slots.write().await.remove(&session_id);

        info!(
            session_id = %session_id,
            final_wagon = guard.session.current_wagon_id(),
            "session terminated"
        );
        Ok(guard.session.clone())
    }

    /// Removes every session idle for longer than `max_age`, through the same
    /// path as [`SessionRegistry::terminate`]. Returns how many were removed.
    pub async fn expire_older_than(&self, max_age: Duration) -> usize {
        let candidates: Vec<(SessionId, SharedSlot)> = self
            .slots
            .read()
            .await
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();

        let mut removed = 0;
        for (session_id, slot) in candidates {
            let mut guard = slot.lock().await;
            if guard.retired {
                continue;
            }
            let idle = self.clock.now() - guard.session.last_active;
            if idle <= max_age {
                continue;
            }
            guard.retired = true;
            self.slots.write().await.remove(&session_id);
            removed += 1;

            info!(
                session_id = %session_id,
                idle_secs = idle.num_seconds(),
                "cleaned up idle session"
            );
        }
        removed
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Whether no session is live.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use runaway_core::collaborator::Role;
    use runaway_core::identity::NpcIdentity;
    use runaway_test_support::{FixedClock, ManualClock};

    use crate::domain::session::Message;

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn fixed_registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(FixedClock(start())))
    }

    #[tokio::test]
    async fn test_create_registers_unique_sessions() {
        let registry = fixed_registry();

        let first = registry.create().await;
        let second = registry.create().await;

        assert_ne!(first.session_id, second.session_id);
        assert_eq!(first.current_wagon_id(), 0);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_get_unknown_session_returns_not_found() {
        let registry = fixed_registry();
        let missing = SessionId::new();

        match registry.get(missing).await {
            Err(DomainError::SessionNotFound(id)) => assert_eq!(id, missing),
            other => panic!("expected SessionNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_touches_last_active() {
        // Arrange
        let clock = Arc::new(ManualClock::new(start()));
        let registry = SessionRegistry::new(clock.clone());
        let session = registry.create().await;

        // Act
        clock.advance(Duration::minutes(5));
        let fetched = registry.get(session.session_id).await.unwrap();

        // Assert
        assert_eq!(fetched.created_at, start());
        assert_eq!(fetched.last_active, start() + Duration::minutes(5));
    }

    #[tokio::test]
    async fn test_update_replaces_state_immediately() {
        // Arrange
        let registry = fixed_registry();
        let mut session = registry.create().await;
        session.current_wagon.theme = "Alien".into();

        // Act
        registry.update(session.clone()).await.unwrap();

        // Assert
        let fetched = registry.get(session.session_id).await.unwrap();
        assert_eq!(fetched.current_wagon.theme, "Alien");
    }

    #[tokio::test]
    async fn test_mutate_discards_changes_on_error() {
        // Arrange
        let registry = fixed_registry();
        let session = registry.create().await;
        let identity = NpcIdentity::new(0, 1);

        // Act
        let result: Result<(), DomainError> = registry
            .mutate(session.session_id, |s| {
                s.add_message(identity, Message::new(Role::User, "hi", start()))?;
                Err(DomainError::Validation("abort".into()))
            })
            .await;

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        let fetched = registry.get(session.session_id).await.unwrap();
        assert!(fetched.conversation(&identity).is_none());
    }

    #[tokio::test]
    async fn test_terminate_removes_session_and_reports_missing_afterwards() {
        let registry = fixed_registry();
        let session = registry.create().await;

        let terminated = registry.terminate(session.session_id).await.unwrap();

        assert_eq!(terminated.session_id, session.session_id);
        assert!(registry.is_empty().await);
        assert!(matches!(
            registry.terminate(session.session_id).await,
            Err(DomainError::SessionNotFound(_))
        ));
        assert!(matches!(
            registry.get(session.session_id).await,
            Err(DomainError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expire_removes_idle_sessions_and_keeps_touched_ones() {
        // Arrange
        let clock = Arc::new(ManualClock::new(start()));
        let registry = SessionRegistry::new(clock.clone());
        let idle = registry.create().await;
        let active = registry.create().await;

        // Act
        clock.advance(Duration::hours(20));
        registry.get(active.session_id).await.unwrap();
        clock.advance(Duration::hours(5));
        let removed = registry.expire_older_than(Duration::hours(24)).await;

        // Assert
        assert_eq!(removed, 1);
        assert!(matches!(
            registry.get(idle.session_id).await,
            Err(DomainError::SessionNotFound(_))
        ));
        assert!(registry.get(active.session_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_expire_keeps_sessions_touched_by_update_or_mutate() {
        // Arrange
        let clock = Arc::new(ManualClock::new(start()));
        let registry = SessionRegistry::new(clock.clone());
        let idle = registry.create().await;
        let updated = registry.create().await;
        let mutated = registry.create().await;

        // Act
        clock.advance(Duration::hours(20));
        registry.update(updated.clone()).await.unwrap();
        registry
            .mutate(mutated.session_id, |s| {
                s.current_wagon.theme = "Alien".into();
                Ok(())
            })
            .await
            .unwrap();
        clock.advance(Duration::hours(5));
        let removed = registry.expire_older_than(Duration::hours(24)).await;

        // Assert
        assert_eq!(removed, 1);
        assert_eq!(registry.len().await, 2);
        assert!(registry.get(idle.session_id).await.is_err());
        let survivor = registry.get(updated.session_id).await.unwrap();
        assert_eq!(survivor.created_at, start());
        assert!(registry.get(mutated.session_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_expire_keeps_session_exactly_at_threshold() {
        let clock = Arc::new(ManualClock::new(start()));
        let registry = SessionRegistry::new(clock.clone());
        let session = registry.create().await;

        clock.advance(Duration::hours(24));
        let removed = registry.expire_older_than(Duration::hours(24)).await;

        assert_eq!(removed, 0);
        assert!(registry.get(session.session_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_stale_slot_handle_cannot_mutate_after_termination() {
        // Arrange
        let registry = fixed_registry();
        let session = registry.create().await;
        let stale = registry.slot(session.session_id).await.unwrap();

        // Act
        registry.terminate(session.session_id).await.unwrap();

        // Assert
        assert!(stale.lock().await.retired);
        let result = registry.mutate(session.session_id, |_| Ok(())).await;
        assert!(matches!(result, Err(DomainError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_mutations_are_serialized() {
        // Arrange
        let registry = Arc::new(fixed_registry());
        let session = registry.create().await;
        let identity = NpcIdentity::new(0, 1);

        // Act
        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .mutate(session.session_id, |s| {
                            s.add_message(
                                identity,
                                Message::new(Role::User, format!("m{i}"), start()),
                            )
                            .map(|_| ())
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // Assert
        let fetched = registry.get(session.session_id).await.unwrap();
        assert_eq!(fetched.conversation(&identity).unwrap().messages.len(), 32);
    }
}
