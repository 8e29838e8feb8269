//! Login service.
//!
//! Wraps [`AuthSession`] with the calls and storage it needs. While a user is
//! logged in the session is re-checked every five minutes; the caller waits on
//! [`AuthService::next_refresh`] and then calls [`AuthService::check`].

use std::{convert::Infallible, future, sync::Arc, time::Duration};

use quizcast_client::{AuthAction, AuthEvent, AuthSession, auth::REFRESH_INTERVAL_SECS};
use quizcast_core::{ApiError, AuthApi, Storage, keys};
use quizcast_proto::{LoginRequest, SignupRequest, User};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::error::RuntimeError;

/// Login state plus the I/O behind it.
pub struct AuthService<A, S> {
    session: AuthSession,
    api: Arc<A>,
    storage: S,
    refresh: Option<Interval>,
}

impl<A: AuthApi, S: Storage> AuthService<A, S> {
    /// Service in the unknown state; call [`Self::check`] first.
    pub fn new(api: Arc<A>, storage: S) -> Self {
        Self { session: AuthSession::new(), api, storage, refresh: None }
    }

    /// Current login state.
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    /// Logged-in user's id, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.session.user_id()
    }

    /// Whether periodic re-checks are scheduled.
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_some()
    }

    /// Ask the backend whether the session is still logged in.
    ///
    /// A failed check counts as logged out.
    ///
    /// # Errors
    ///
    /// `Storage` if the stored token cannot be updated.
    pub async fn check(&mut self) -> Result<(), RuntimeError> {
        self.apply(AuthEvent::CheckStarted)?;
        let status = self.api.session_status().await;
        self.apply(AuthEvent::StatusLoaded(status))
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// `Api` if the backend refuses; `Storage` if the token cannot be stored.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), RuntimeError> {
        let request = LoginRequest { email: email.to_string(), password: password.to_string() };
        let result = self.api.login(&request).await;
        let failure = result.as_ref().err().cloned();
        self.apply(AuthEvent::LoginCompleted(result))?;
        reject_on(failure)
    }

    /// Create an account and log in.
    ///
    /// # Errors
    ///
    /// `Api` if the backend refuses.
    pub async fn signup(&mut self, request: &SignupRequest) -> Result<(), RuntimeError> {
        let result = self.api.signup(request).await;
        let failure = result.as_ref().err().cloned();
        self.apply(AuthEvent::SignupCompleted(result))?;
        reject_on(failure)
    }

    /// Log out. Local state is cleared even if the backend call fails.
    ///
    /// # Errors
    ///
    /// `Storage` if the stored token cannot be removed.
    pub async fn logout(&mut self) -> Result<(), RuntimeError> {
        if let Err(err) = self.api.logout().await {
            warn!(%err, "logout call failed; clearing locally");
        }
        self.apply(AuthEvent::LoggedOut)?;
        info!("logged out");
        Ok(())
    }

    /// Wait until the next scheduled re-check. Pends forever while logged
    /// out. Cancel-safe.
    pub async fn next_refresh(&mut self) {
        match &mut self.refresh {
            Some(interval) => {
                interval.tick().await;
            },
            None => future::pending().await,
        }
    }

    /// Re-check the session on schedule for as long as the future is polled.
    /// A failed check is logged; it also logs the user out, which stops the
    /// schedule.
    pub async fn keep_fresh(&mut self) -> Infallible {
        loop {
            self.next_refresh().await;
            match self.check().await {
                Ok(()) if self.session.is_logged_in() => debug!("session refreshed"),
                Ok(()) => info!("session expired"),
                Err(err) => warn!(%err, "session refresh failed"),
            }
        }
    }

    fn apply(&mut self, event: AuthEvent) -> Result<(), RuntimeError> {
        for action in self.session.handle(event) {
            match action {
                AuthAction::StoreToken(token) => self.storage.set(keys::AUTH_TOKEN, &token)?,
                AuthAction::ClearToken => self.storage.remove(keys::AUTH_TOKEN)?,
                AuthAction::StartRefresh => {
                    let period = Duration::from_secs(REFRESH_INTERVAL_SECS);
                    let mut interval = interval_at(Instant::now() + period, period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    self.refresh = Some(interval);
                },
                AuthAction::StopRefresh => self.refresh = None,
            }
        }
        Ok(())
    }
}

fn reject_on(failure: Option<ApiError>) -> Result<(), RuntimeError> {
    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
