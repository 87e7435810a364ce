use reqwest::StatusCode;
use thiserror::Error;

/// Easy alias for error handling
pub type Result<T> = std::result::Result<T, AuthError>;

/// Reasons a login or refresh did not produce a token pair
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server rejected the email/password or the refresh token.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// We never got an HTTP response, for example because the server was
    /// unreachable or the request timed out.
    #[error("could not reach the server: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a status we can't do anything about.
    #[error("server error: {0}")]
    ServerError(StatusCode),

    /// The server said yes, but the body was empty or not a token pair.
    #[error("malformed response from server: {0}")]
    MalformedResponse(String),

    /// We couldn't build a URL, for example if the configured server was
    /// invalid.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// A refresh was requested but nobody has logged in yet.
    #[error("not logged in")]
    NoSession,

    /// The attempt was abandoned before the server answered.
    #[error("cancelled")]
    Cancelled,
}

impl AuthError {
    /// Should the user fix something on their end (as opposed to waiting or
    /// retrying)?
    pub fn is_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }
}
