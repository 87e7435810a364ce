use super::error::{AuthError, Result};
use super::{login, refresh, TokenPair};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use url::Url;

/// Client for the auth API
#[derive(Debug, Clone)]
pub struct Client {
    /// The server to connect to, e.g. `https://api.example.com/`. Endpoint
    /// paths are resolved relative to this, so a base with a path segment
    /// needs a trailing slash (`https://example.com/api/`).
    pub server: String,
}

impl Client {
    /// Construct a new client
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
        }
    }

    /// Log into the server with an email and password.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`, plus `AuthError::Url` if the
    /// server URL is invalid.
    #[tracing::instrument(skip_all, fields(server = %self.server))]
    pub async fn login(&self, http: &reqwest::Client, req: &login::Req) -> Result<TokenPair> {
        let url = self.url(login::PATH)?;

        Self::handle_response(http.get(url).query(req)).await
    }

    /// Trade a refresh token for a fresh token pair.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`, plus `AuthError::Url` if the
    /// server URL is invalid. A refresh token that can't be sent as a header
    /// is reported as `AuthError::InvalidCredentials`.
    #[tracing::instrument(skip_all, fields(server = %self.server))]
    pub async fn refresh(&self, http: &reqwest::Client, refresh_token: &str) -> Result<TokenPair> {
        let url = self.url(refresh::PATH)?;

        let mut value = HeaderValue::from_str(refresh_token).map_err(|err| {
            tracing::debug!(?err, "refresh token is not a valid header value");
            AuthError::InvalidCredentials
        })?;
        value.set_sensitive(true);

        Self::handle_response(http.get(url).header(AUTHORIZATION, value)).await
    }

    /// Resolve an endpoint path against the server.
    fn url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&self.server)?.join(path)?)
    }

    /// Convert an HTTP response into a token pair, interpreting errors in a
    /// standard way.
    ///
    /// ## Errors
    ///
    /// - `Ok(..)` if the server returned a success (2xx) with a token pair
    /// - `AuthError::MalformedResponse` if a success had an empty body, a body
    ///   that isn't a token pair, or a blank token
    /// - `AuthError::InvalidCredentials` for 400, 401, and 403
    /// - `AuthError::ServerError` for any other status
    /// - `AuthError::Network` if we never got a response
    async fn handle_response(req: reqwest::RequestBuilder) -> Result<TokenPair> {
        let resp = req.send().await?;

        let status = resp.status();
        tracing::debug!(%status, "got response");

        if status.is_success() {
            let body = resp.bytes().await?;
            if body.is_empty() {
                return Err(AuthError::MalformedResponse("empty body".to_string()));
            }

            let tokens: TokenPair = serde_json::from_slice(&body)
                .map_err(|err| AuthError::MalformedResponse(err.to_string()))?;

            if tokens.is_empty() {
                Err(AuthError::MalformedResponse("blank token".to_string()))
            } else {
                Ok(tokens)
            }
        } else if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            Err(AuthError::InvalidCredentials)
        } else {
            Err(AuthError::ServerError(status))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tokens_json(access: &str, refresh: &str) -> serde_json::Value {
        json!({ "accessToken": access, "refreshToken": refresh })
    }

    fn req(email: &str, password: &str) -> login::Req {
        login::Req {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn login_sends_credentials_as_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .and(query_param("email", "a@example.com"))
            .and(query_param("password", "hunter2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("A", "B")))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = Client::new(server.uri())
            .login(&reqwest::Client::new(), &req("a@example.com", "hunter2"))
            .await
            .unwrap();

        assert_eq!(tokens, TokenPair::new("A", "B"));
    }

    #[tokio::test]
    async fn login_resolves_relative_to_base_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("A", "B")))
            .mount(&server)
            .await;

        let tokens = Client::new(format!("{}/api/", server.uri()))
            .login(&reqwest::Client::new(), &req("a@example.com", "pw"))
            .await
            .unwrap();

        assert_eq!(tokens, TokenPair::new("A", "B"));
    }

    #[tokio::test]
    async fn login_unauthorized_is_invalid_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = Client::new(server.uri())
            .login(&reqwest::Client::new(), &req("a@example.com", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials), "{err:?}");
    }

    #[tokio::test]
    async fn login_bad_request_is_invalid_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "httpCode": 400,
                "haveError": true,
                "error": { "code": 11, "message": "Incorrect login or password" },
            })))
            .mount(&server)
            .await;

        let err = Client::new(server.uri())
            .login(&reqwest::Client::new(), &req("a@example.com", "wrong"))
            .await
            .unwrap_err();

        assert!(err.is_credentials(), "{err:?}");
    }

    #[tokio::test]
    async fn login_empty_body_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = Client::new(server.uri())
            .login(&reqwest::Client::new(), &req("a@example.com", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MalformedResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn login_wrong_shape_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jwt": "nope" })))
            .mount(&server)
            .await;

        let err = Client::new(server.uri())
            .login(&reqwest::Client::new(), &req("a@example.com", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MalformedResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn login_blank_token_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("", "B")))
            .mount(&server)
            .await;

        let err = Client::new(server.uri())
            .login(&reqwest::Client::new(), &req("a@example.com", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MalformedResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn login_connection_refused_is_network() {
        // grab a free port, then let it go so nothing is listening there
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let err = Client::new(format!("http://{addr}/"))
            .login(&reqwest::Client::new(), &req("a@example.com", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Network(_)), "{err:?}");
    }

    #[tokio::test]
    async fn bad_server_url_is_url_error() {
        let err = Client::new("not a url")
            .login(&reqwest::Client::new(), &req("a@example.com", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Url(_)), "{err:?}");
    }

    #[tokio::test]
    async fn refresh_sends_token_in_authorization_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/refresh"))
            .and(header("Authorization", "refresh-me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tokens_json("C", "D")))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = Client::new(server.uri())
            .refresh(&reqwest::Client::new(), "refresh-me")
            .await
            .unwrap();

        assert_eq!(tokens, TokenPair::new("C", "D"));
    }

    #[tokio::test]
    async fn refresh_server_error_is_reported_with_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = Client::new(server.uri())
            .refresh(&reqwest::Client::new(), "refresh-me")
            .await;

        match result {
            Err(AuthError::ServerError(status)) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            }
            other => panic!("expected a server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_with_unsendable_token_is_invalid_credentials() {
        let err = Client::new("http://127.0.0.1:1/")
            .refresh(&reqwest::Client::new(), "line\nbreak")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials), "{err:?}");
    }
}
