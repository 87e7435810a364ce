use serde::{Deserialize, Serialize};

/// The request to log into the server. Sent as query parameters.
#[derive(Serialize, Deserialize)]
pub struct Req {
    /// Email the account was registered with.
    pub email: String,

    /// Plaintext password.
    pub password: String,
}

impl std::fmt::Debug for Req {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Req")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the login endpoint lives, relative to the server's base URL.
pub const PATH: &str = "login";
