//! Session lifecycle management.
//!
//! Exactly one browser session exists per scenario. The [`SessionManager`]
//! is the sole creator and destroyer of the underlying driver handle: it is
//! started by the before-scenario hook, exposed to page objects while the
//! scenario runs, and closed unconditionally afterwards. Page objects never
//! create or close the driver.
//!
//! There is no process-wide static handle: the manager is created by the
//! caller and passed explicitly to everything that needs the session.

use crate::driver::Driver;
use crate::result::{PasosError, PasosResult};
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle state of the session owned by a [`SessionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been started yet
    Uninitialized,
    /// A session is live and owns a driver handle
    Active,
    /// The last session has been torn down
    Closed,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Uninitialized
    }
}

/// A live browser session: one driver handle plus an identifier.
pub struct Session {
    id: Uuid,
    driver: Box<dyn Driver>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session identifier, unique per scenario.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The session's driver handle (non-owning access).
    #[must_use]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }
}

/// Owns the scenario-scoped session and enforces its state machine:
/// `Uninitialized -> Active -> Closed`, with `Closed -> Active` allowed
/// when the next scenario starts.
#[derive(Debug, Default)]
pub struct SessionManager {
    state: SessionState,
    session: Option<Session>,
}

impl SessionManager {
    /// Create a manager with no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Start a session by launching a driver.
    ///
    /// # Errors
    ///
    /// [`PasosError::InvalidState`] if a session is already active;
    /// starting over a live session is a programming error, never
    /// retried.
    pub fn start<L>(&mut self, launch: L) -> PasosResult<Uuid>
    where
        L: FnOnce() -> PasosResult<Box<dyn Driver>>,
    {
        if self.state == SessionState::Active {
            return Err(PasosError::InvalidState {
                message: "a session is already active".to_string(),
            });
        }
        let driver = launch()?;
        let id = Uuid::new_v4();
        debug!(session = %id, "session started");
        self.session = Some(Session { id, driver });
        self.state = SessionState::Active;
        Ok(id)
    }

    /// The active session.
    ///
    /// # Errors
    ///
    /// [`PasosError::InvalidState`] unless a session is active. Access
    /// after teardown is unrepresentable through this accessor.
    pub fn active(&self) -> PasosResult<&Session> {
        match (&self.state, &self.session) {
            (SessionState::Active, Some(session)) => Ok(session),
            _ => Err(PasosError::InvalidState {
                message: "no active session".to_string(),
            }),
        }
    }

    /// Close the session, quitting the driver.
    ///
    /// Idempotent: closing an already-closed or never-started session is a
    /// no-op. The session is marked closed even if the driver's quit
    /// fails, so teardown always completes.
    pub fn close(&mut self) -> PasosResult<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        self.state = SessionState::Closed;
        debug!(session = %session.id, "session closing");
        if let Err(e) = session.driver.quit() {
            warn!(session = %session.id, error = %e, "driver quit failed during teardown");
            return Err(e);
        }
        Ok(())
    }

    /// Run one scenario body inside a started session, closing it on every
    /// exit path. This is the scoped form of the before/after scenario
    /// hook pair.
    pub fn run_scenario<L, F, T>(&mut self, launch: L, body: F) -> PasosResult<T>
    where
        L: FnOnce() -> PasosResult<Box<dyn Driver>>,
        F: FnOnce(&Session) -> PasosResult<T>,
    {
        let _ = self.start(launch)?;
        let result = match self.active() {
            Ok(session) => body(session),
            Err(e) => Err(e),
        };
        let closed = self.close();
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
        }
    }
}
