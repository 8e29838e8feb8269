//! Login state cache.
//!
//! Mirrors the backend's session: who is logged in, and whether a check is in
//! flight. The backend authenticates by cookie; a token returned at login is
//! kept as a fallback for transports that drop cookies.
//!
//! While logged in the session is re-checked periodically; the machine asks
//! for that timer with [`AuthAction::StartRefresh`] and cancels it on logout.

use quizcast_core::ApiError;
use quizcast_proto::{LoginResponse, SessionStatus, User};
use tracing::{debug, warn};

/// How often a logged-in session is re-checked.
pub const REFRESH_INTERVAL_SECS: u64 = 5 * 60;

/// Inputs to the auth machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A session-status call was issued.
    CheckStarted,
    /// Session-status call finished.
    StatusLoaded(Result<SessionStatus, ApiError>),
    /// Login call finished.
    LoginCompleted(Result<LoginResponse, ApiError>),
    /// Signup call finished.
    SignupCompleted(Result<LoginResponse, ApiError>),
    /// Logout call finished, whatever its outcome.
    LoggedOut,
}

/// Work for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    /// Persist the fallback bearer token.
    StoreToken(String),
    /// Delete the fallback bearer token.
    ClearToken,
    /// Begin periodic session checks.
    StartRefresh,
    /// Stop periodic session checks.
    StopRefresh,
}

/// Login state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    user: Option<User>,
    user_id: Option<String>,
    logged_in: bool,
    loading: bool,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self { user: None, user_id: None, logged_in: false, loading: true }
    }
}

impl AuthSession {
    /// Unknown state; a check is expected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a user is logged in.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Whether a session check is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Logged-in user's profile.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Logged-in user's id.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Process one event.
    pub fn handle(&mut self, event: AuthEvent) -> Vec<AuthAction> {
        match event {
            AuthEvent::CheckStarted => {
                self.loading = true;
                Vec::new()
            },
            AuthEvent::StatusLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(status) if status.is_logged_in => {
                        debug!(user_id = ?status.user_id, "session is logged in");
                        self.log_in(status.user, status.user_id)
                    },
                    Ok(_) => self.log_out(false),
                    Err(err) => {
                        warn!(%err, "session check failed");
                        self.log_out(false)
                    },
                }
            },
            AuthEvent::LoginCompleted(result) => match result {
                Ok(login) => {
                    let mut actions = self.log_in(login.user, login.user_id);
                    if let Some(token) = login.token {
                        actions.insert(0, AuthAction::StoreToken(token));
                    }
                    actions
                },
                Err(err) => {
                    debug!(%err, "login rejected");
                    Vec::new()
                },
            },
            AuthEvent::SignupCompleted(result) => match result {
                Ok(signup) => self.log_in(signup.user, signup.user_id),
                Err(err) => {
                    debug!(%err, "signup rejected");
                    Vec::new()
                },
            },
            AuthEvent::LoggedOut => self.log_out(true),
        }
    }

    fn log_in(&mut self, user: Option<User>, user_id: Option<String>) -> Vec<AuthAction> {
        let was_logged_in = self.logged_in;
        self.user_id = user_id.or_else(|| user.as_ref().map(|u| u.user_id.clone()));
        self.user = user;
        self.logged_in = true;
        if was_logged_in { Vec::new() } else { vec![AuthAction::StartRefresh] }
    }

    fn log_out(&mut self, clear_token: bool) -> Vec<AuthAction> {
        let was_logged_in = self.logged_in;
        self.user = None;
        self.user_id = None;
        self.logged_in = false;

        let mut actions = Vec::new();
        if was_logged_in {
            actions.push(AuthAction::StopRefresh);
        }
        if clear_token {
            actions.push(AuthAction::ClearToken);
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> User {
        User {
            user_id: "usr_1".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    #[test]
    fn starts_loading() {
        let auth = AuthSession::new();
        assert!(auth.is_loading());
        assert!(!auth.is_logged_in());
    }

    #[test]
    fn login_stores_token_and_starts_refresh() {
        let mut auth = AuthSession::new();
        let actions = auth.handle(AuthEvent::LoginCompleted(Ok(LoginResponse {
            user: Some(ada()),
            user_id: Some("usr_1".into()),
            token: Some("tok".into()),
        })));

        assert_eq!(actions, vec![AuthAction::StoreToken("tok".into()), AuthAction::StartRefresh]);
        assert!(auth.is_logged_in());
        assert_eq!(auth.user_id(), Some("usr_1"));
    }

    #[test]
    fn failed_login_changes_nothing() {
        let mut auth = AuthSession::new();
        let actions = auth.handle(AuthEvent::LoginCompleted(Err(ApiError::Rejected {
            message: Some("Invalid credentials".into()),
        })));
        assert!(actions.is_empty());
        assert!(!auth.is_logged_in());
    }

    #[test]
    fn status_check_fills_user_id_from_profile() {
        let mut auth = AuthSession::new();
        auth.handle(AuthEvent::StatusLoaded(Ok(SessionStatus {
            is_logged_in: true,
            user: Some(ada()),
            user_id: None,
        })));
        assert!(!auth.is_loading());
        assert_eq!(auth.user_id(), Some("usr_1"));
    }

    #[test]
    fn refresh_starts_once() {
        let mut auth = AuthSession::new();
        let status = SessionStatus { is_logged_in: true, user: Some(ada()), user_id: None };
        assert_eq!(auth.handle(AuthEvent::StatusLoaded(Ok(status.clone()))), vec![
            AuthAction::StartRefresh
        ]);
        assert!(auth.handle(AuthEvent::StatusLoaded(Ok(status))).is_empty());
    }

    #[test]
    fn failed_check_logs_out_but_keeps_token() {
        let mut auth = AuthSession::new();
        auth.handle(AuthEvent::SignupCompleted(Ok(LoginResponse {
            user: Some(ada()),
            user_id: None,
            token: None,
        })));
        let actions = auth.handle(AuthEvent::StatusLoaded(Err(ApiError::Network("down".into()))));
        assert_eq!(actions, vec![AuthAction::StopRefresh]);
        assert!(!auth.is_logged_in());
    }

    #[test]
    fn logout_always_clears_token() {
        let mut auth = AuthSession::new();
        assert_eq!(auth.handle(AuthEvent::LoggedOut), vec![AuthAction::ClearToken]);
    }
}
