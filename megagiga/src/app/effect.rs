use super::Action;
use megagiga_core::{token_store, AuthError, LoginStateHolder, StoredSession, TokenPair, TokenStore};
use std::sync::Arc;

/// Things that can happen as a result of user input. Side effects!
#[derive(Debug)]
pub enum Effect {
    /// Look for a session from a previous run
    LoadSession,

    /// Save the session to disk
    SaveSession(TokenPair),

    /// Forget the session on disk
    ClearSession,

    /// Log in with whatever is in the form
    LogIn(Arc<LoginStateHolder>),

    /// Get a fresh token pair
    Refresh(Arc<LoginStateHolder>),
}

impl Effect {
    /// Perform the side-effectful portions of this effect, returning the next
    /// `Action` the application needs to handle
    pub async fn run(self, store: &TokenStore) -> Option<Action> {
        match self.run_inner(store).await {
            Ok(action) => action,
            Err(problem) => {
                tracing::error!(?problem, "problem running effect");
                Some(Action::Problem(problem.to_string()))
            }
        }
    }

    /// The actual implementation of `run`, but with a `Result` wrapper to make
    /// it more ergonomic to write.
    async fn run_inner(self, store: &TokenStore) -> Result<Option<Action>, Problem> {
        match self {
            Self::LoadSession => {
                tracing::debug!("loading session");

                let session = store.load().await?;

                Ok(Some(Action::LoadedSession(session)))
            }

            Self::SaveSession(tokens) => {
                tracing::info!("saving session");

                let session = StoredSession::now(tokens);
                store.save(&session).await?;

                Ok(Some(Action::SavedSession(session.saved_at)))
            }

            Self::ClearSession => {
                tracing::info!("clearing session");

                store.clear().await?;

                Ok(Some(Action::ClearedSession))
            }

            Self::LogIn(holder) => {
                // Success shows up through the authenticated signal and
                // failure through the form's `problem`, so there's nothing
                // left to report here.
                if let Err(err) = holder.login().await? {
                    tracing::debug!(%err, "login attempt finished without a session");
                }

                Ok(None)
            }

            Self::Refresh(holder) => {
                let tokens = holder.refresh().await??;

                Ok(Some(Action::Refreshed(tokens)))
            }
        }
    }
}

/// Problems that can happen while running an `Effect`.
#[derive(Debug, thiserror::Error)]
pub enum Problem {
    /// We couldn't read or write the stored session.
    #[error("Problem with the stored session: {0}")]
    Store(#[from] token_store::Error),

    /// We had a problem communicating with the server.
    #[error("Problem communicating with the server: {0}")]
    Auth(#[from] AuthError),

    /// A background task panicked or was aborted.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
