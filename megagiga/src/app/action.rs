use chrono::{DateTime, Utc};
use crossterm::event::KeyEvent;
use megagiga_core::{StoredSession, TokenPair};

/// Things that can happen to this app
#[derive(Debug)]
pub enum Action {
    /// We looked for a session from a previous run
    LoadedSession(Option<StoredSession>),

    /// We wrote the session to disk
    SavedSession(DateTime<Utc>),

    /// We removed the session from disk
    ClearedSession,

    /// The login form state changed (typing, fetching, problems)
    LoginStateChanged,

    /// The authenticated signal changed
    AuthenticatedChanged(bool),

    /// We got a fresh token pair
    Refreshed(TokenPair),

    /// The user did something on the keyboard
    Key(KeyEvent),

    /// Something bad happened; display it to the user
    Problem(String),
}
