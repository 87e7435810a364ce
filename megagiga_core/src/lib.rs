//! Session handling shared by all megagiga clients: talking to the auth
//! endpoint, holding login state, and remembering tokens between runs.

/// Talk to the authentication endpoint.
pub mod session;
pub use session::{AuthError, Client, TokenPair};

/// A value with one writer and many observers.
pub mod published;
pub use published::Published;

/// The state behind the login screen.
pub mod login_state;
pub use login_state::{LoginStateHolder, LoginUiState};

/// Remember the session on disk.
pub mod token_store;
pub use token_store::{StoredSession, TokenStore};
