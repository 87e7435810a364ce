/// Things that can go wrong while authenticating
pub mod error;
pub use error::AuthError;

/// The HTTP client for the auth endpoint
pub mod client;
pub use client::Client;

/// Log in with an email and password
pub mod login;

/// Trade a refresh token for a new token pair
pub mod refresh;

/// The seam between UI state and the network
pub mod repository;
pub use repository::{RemoteSessionRepository, SessionRepository};

/// Access and refresh tokens
pub mod tokens;
pub use tokens::TokenPair;
