use super::error::Result;
use super::{login, Client, TokenPair};
use async_trait::async_trait;

/// Where login state goes to get tokens. The production implementation talks
/// to the server; tests substitute their own.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Log in with an email and password.
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair>;

    /// Trade a refresh token for a new pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair>;
}

/// A `SessionRepository` backed by the auth API.
#[derive(Debug, Clone)]
pub struct RemoteSessionRepository {
    /// Which server to talk to
    client: Client,

    /// Shared HTTP connection pool
    http: reqwest::Client,
}

impl RemoteSessionRepository {
    /// Construct a repository from a client and a shared HTTP pool.
    pub fn new(client: Client, http: reqwest::Client) -> Self {
        Self { client, http }
    }
}

#[async_trait]
impl SessionRepository for RemoteSessionRepository {
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let req = login::Req {
            email: email.to_string(),
            password: password.to_string(),
        };

        self.client.login(&self.http, &req).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        self.client.refresh(&self.http, refresh_token).await
    }
}
