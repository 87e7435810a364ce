use serde::{Deserialize, Serialize};

/// The pair of opaque bearer tokens the server hands out on login and
/// refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived token for authenticating requests.
    pub access_token: String,

    /// Long-lived token for getting a new pair.
    pub refresh_token: String,
}

impl TokenPair {
    /// Construct a new pair
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// A pair with a blank token in it can't be used for anything.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty() || self.refresh_token.is_empty()
    }
}

// Tokens are secrets; keep them out of logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
