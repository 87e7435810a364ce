use crate::session::error::Result;
use crate::session::SessionRepository;
use crate::{AuthError, Published, TokenPair};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What the login screen shows.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginUiState {
    /// What's been typed into the email field
    pub email: String,

    /// What's been typed into the password field
    pub password: String,

    /// Whether a login is waiting on the server
    pub is_fetching: bool,

    /// Why the last attempt failed, if it did. Cleared when a new attempt
    /// starts.
    pub problem: Option<String>,
}

impl std::fmt::Debug for LoginUiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginUiState")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("is_fetching", &self.is_fetching)
            .field("problem", &self.problem)
            .finish()
    }
}

/// Everything an in-flight attempt needs to write back to.
#[derive(Debug, Default)]
struct Shared {
    /// Form state
    ui_state: Published<LoginUiState>,

    /// Set once a login succeeds; the presentation layer navigates on this.
    authenticated: Published<bool>,

    /// The tokens from the most recent successful login or refresh
    session: Published<Option<TokenPair>>,
}

/// Owns the login form state and drives login attempts through a
/// `SessionRepository`.
///
/// Overlapping `login` calls are neither prevented nor coalesced. Each
/// attempt writes its result when it resolves, so the one that resolves last
/// decides the final state.
pub struct LoginStateHolder {
    /// Where tokens come from
    repository: Arc<dyn SessionRepository>,

    /// State shared with in-flight attempts
    shared: Arc<Shared>,

    /// Cancels every attempt started since the last `cancel`
    cancel: Mutex<CancellationToken>,

    /// Cancels refreshes started since the last `logout` or `cancel`
    cancel_refresh: Mutex<CancellationToken>,
}

impl LoginStateHolder {
    /// Construct a holder with an empty form and no session.
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository,
            shared: Arc::new(Shared::default()),
            cancel: Mutex::new(CancellationToken::new()),
            cancel_refresh: Mutex::new(CancellationToken::new()),
        }
    }

    /// Adopt a session from a previous run (e.g. loaded from disk.)
    pub fn restore(&self, tokens: TokenPair) {
        tracing::debug!("restoring session");
        self.shared.session.set(Some(tokens));
        self.shared.authenticated.set(true);
    }

    /// The current form state
    pub fn state(&self) -> LoginUiState {
        self.shared.ui_state.get()
    }

    /// Get notified when the form state changes
    pub fn subscribe_state(&self) -> watch::Receiver<LoginUiState> {
        self.shared.ui_state.subscribe()
    }

    /// Has a login succeeded?
    pub fn is_authenticated(&self) -> bool {
        self.shared.authenticated.get()
    }

    /// Get notified when a login succeeds (or the session is cleared)
    pub fn subscribe_authenticated(&self) -> watch::Receiver<bool> {
        self.shared.authenticated.subscribe()
    }

    /// The tokens from the last successful login or refresh
    pub fn session(&self) -> Option<TokenPair> {
        self.shared.session.get()
    }

    /// Get notified when the tokens change
    pub fn subscribe_session(&self) -> watch::Receiver<Option<TokenPair>> {
        self.shared.session.subscribe()
    }

    /// Replace the email. Nothing else in the form changes.
    pub fn update_email(&self, email: impl Into<String>) {
        let email = email.into();
        self.shared.ui_state.update(|state| state.email = email);
    }

    /// Replace the password. Nothing else in the form changes.
    pub fn update_password(&self, password: impl Into<String>) {
        let password = password.into();
        self.shared.ui_state.update(|state| state.password = password);
    }

    /// Try to log in with whatever is in the form right now.
    ///
    /// `is_fetching` is set before this returns and is cleared when the
    /// attempt resolves, whether it succeeded, failed, or was cancelled. On
    /// success the session is stored and the authenticated signal is raised;
    /// on failure the reason goes in `problem` and the signal is left alone.
    ///
    /// Must be called from within a tokio runtime.
    pub fn login(&self) -> JoinHandle<Result<TokenPair>> {
        let mut credentials = (String::new(), String::new());
        self.shared.ui_state.update(|state| {
            state.is_fetching = true;
            state.problem = None;
            credentials = (state.email.clone(), state.password.clone());
        });
        let (email, password) = credentials;

        let repository = Arc::clone(&self.repository);
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancellation();

        tokio::spawn(async move {
            tracing::info!("logging in");

            let result = tokio::select! {
                () = cancel.cancelled() => Err(AuthError::Cancelled),
                result = repository.login(&email, &password) => result,
            };

            match &result {
                Ok(tokens) => {
                    tracing::info!("logged in");
                    shared.session.set(Some(tokens.clone()));
                }
                Err(err) => tracing::warn!(%err, "login failed"),
            }

            shared.ui_state.update(|state| {
                state.is_fetching = false;
                if let Err(err) = &result {
                    state.problem = Some(err.to_string());
                }
            });

            // last, so anyone reacting to the signal sees settled form state
            if result.is_ok() {
                shared.authenticated.set(true);
            }

            result
        })
    }

    /// Trade the current session's refresh token for a new pair.
    ///
    /// Clears `problem` when it starts, like `login`.
    ///
    /// On success the session is replaced. If the session no longer holds
    /// the refresh token we started with (logged out, or logged in again) the
    /// new pair is dropped and this returns `AuthError::NoSession`. On failure
    /// the session is kept and the reason goes in `problem`. Returns
    /// `AuthError::NoSession` without touching the network if there is
    /// nothing to refresh. `logout` cancels refreshes in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn refresh(&self) -> JoinHandle<Result<TokenPair>> {
        let refresh_token = self
            .shared
            .session
            .with(|session| session.as_ref().map(|tokens| tokens.refresh_token.clone()));
        self.shared.ui_state.update(|state| state.problem = None);

        let repository = Arc::clone(&self.repository);
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancellation();
        let cancel_refresh = current(&self.cancel_refresh);

        tokio::spawn(async move {
            let Some(refresh_token) = refresh_token else {
                return Err(AuthError::NoSession);
            };

            tracing::info!("refreshing session");

            let result = tokio::select! {
                () = cancel.cancelled() => Err(AuthError::Cancelled),
                () = cancel_refresh.cancelled() => Err(AuthError::Cancelled),
                result = repository.refresh(&refresh_token) => result,
            };

            match result {
                Ok(tokens) => {
                    let mut replaced = false;
                    shared.session.update(|session| {
                        let current = session
                            .as_ref()
                            .is_some_and(|held| held.refresh_token == refresh_token);
                        if current {
                            *session = Some(tokens.clone());
                            replaced = true;
                        }
                    });

                    if replaced {
                        tracing::info!("refreshed session");
                        Ok(tokens)
                    } else {
                        tracing::info!("session changed during refresh; dropping new tokens");
                        Err(AuthError::NoSession)
                    }
                }
                Err(AuthError::Cancelled) => {
                    tracing::debug!("refresh cancelled");
                    Err(AuthError::Cancelled)
                }
                Err(err) => {
                    tracing::warn!(%err, "refresh failed");
                    shared
                        .ui_state
                        .update(|state| state.problem = Some(err.to_string()));
                    Err(err)
                }
            }
        })
    }

    /// Forget the session and lower the authenticated signal. Refreshes in
    /// flight resolve with `AuthError::Cancelled`.
    pub fn logout(&self) {
        tracing::info!("logging out");
        take_and_cancel(&self.cancel_refresh);
        self.shared.session.set(None);
        self.shared.authenticated.set(false);
    }

    /// Abandon every in-flight attempt. They resolve with
    /// `AuthError::Cancelled`. Attempts started afterwards are unaffected.
    pub fn cancel(&self) {
        take_and_cancel(&self.cancel);
        take_and_cancel(&self.cancel_refresh);
    }

    /// The token for attempts starting now
    fn cancellation(&self) -> CancellationToken {
        current(&self.cancel)
    }
}

/// The token in `slot` right now
fn current(slot: &Mutex<CancellationToken>) -> CancellationToken {
    slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Cancel the token in `slot`, leaving a fresh one for later attempts
fn take_and_cancel(slot: &Mutex<CancellationToken>) {
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::take(&mut *guard).cancel();
}

impl Drop for LoginStateHolder {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for LoginStateHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginStateHolder")
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}
