//! Auth backend client
//!
//! Two services sit behind this trait: the node (temporary request tokens and
//! the verifier exchange) and the worker (token test, token refresh and the
//! custodial address lookup).

use async_trait::async_trait;
use ethers_core::types::Address;
use perch_config::AuthConfig;
use perch_types::Credential;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::error::SessionError;

/// Temporary OAuth request token from the node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

/// Body of the verifier exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifierExchange {
    pub token: String,
    pub verifier: String,
    pub secret: String,
}

/// Fresh access/refresh pair from a refresh
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `GET {node}/requestAccessToken`
    async fn request_token(&self) -> Result<RequestToken, SessionError>;

    /// `POST {node}/accessToken`
    async fn exchange_verifier(&self, exchange: &VerifierExchange)
        -> Result<Credential, SessionError>;

    /// `POST {worker}/testAccessToken`; 403 is `Forbidden`
    async fn test_access_token(&self, token: &str, identity_id: &str)
        -> Result<bool, SessionError>;

    /// `POST {worker}/refreshAccessToken`; 403 is `Forbidden`
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        identity_id: &str,
    ) -> Result<TokenPair, SessionError>;

    /// Bearer-authorized `POST {worker}/getAddress`; 401/404 carry the status text
    async fn get_address(&self, access_token: &str, identity_id: &str)
        -> Result<Address, SessionError>;
}

pub mod endpoints {
    pub const REQUEST_ACCESS_TOKEN: &str = "requestAccessToken";
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const TEST_ACCESS_TOKEN: &str = "testAccessToken";
    pub const REFRESH_ACCESS_TOKEN: &str = "refreshAccessToken";
    pub const GET_ADDRESS: &str = "getAddress";
}

#[derive(Deserialize)]
struct TokenValidity {
    #[serde(rename = "isValid")]
    is_valid: bool,
}

#[derive(Deserialize)]
struct AddressBody {
    address: Address,
}

/// [`AuthBackend`] over HTTPS with reqwest
pub struct HttpAuthBackend {
    client: reqwest::Client,
    node_url: Url,
    worker_url: Url,
}

impl HttpAuthBackend {
    pub fn new(config: &AuthConfig) -> Result<Self, SessionError> {
        let parse = |name: &str, value: &str| {
            Url::parse(value)
                .map_err(|e| SessionError::Configuration(format!("{}: {}", name, e)))
        };
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            node_url: parse("auth.node_url", &config.node_url)?,
            worker_url: parse("auth.worker_url", &config.worker_url)?,
        })
    }

    fn endpoint(base: &Url, name: &str) -> Result<Url, SessionError> {
        let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), name);
        Url::parse(&joined).map_err(|e| SessionError::Configuration(e.to_string()))
    }

    async fn post_worker(
        &self,
        name: &'static str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<Response, SessionError> {
        let url = Self::endpoint(&self.worker_url, name)?;
        debug!("POST {}", url);
        let mut request = self.client.post(url).json(&body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }
}

/// Map status codes shared by every endpoint
fn check_status(endpoint: &'static str, response: Response) -> Result<Response, SessionError> {
    let status = response.status();
    let text = || status.canonical_reason().unwrap_or("").to_string();
    match status {
        StatusCode::FORBIDDEN => Err(SessionError::Forbidden { endpoint }),
        StatusCode::UNAUTHORIZED => Err(SessionError::Unauthorized(text())),
        StatusCode::NOT_FOUND => Err(SessionError::NotFound(text())),
        s if s.is_success() => Ok(response),
        s => Err(SessionError::UnexpectedStatus {
            endpoint,
            status: s.as_u16(),
        }),
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn request_token(&self) -> Result<RequestToken, SessionError> {
        let url = Self::endpoint(&self.node_url, endpoints::REQUEST_ACCESS_TOKEN)?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Ok(check_status(endpoints::REQUEST_ACCESS_TOKEN, response)?
            .json()
            .await?)
    }

    async fn exchange_verifier(
        &self,
        exchange: &VerifierExchange,
    ) -> Result<Credential, SessionError> {
        let url = Self::endpoint(&self.node_url, endpoints::ACCESS_TOKEN)?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(exchange)
            .send()
            .await?;
        Ok(check_status(endpoints::ACCESS_TOKEN, response)?
            .json()
            .await?)
    }

    async fn test_access_token(
        &self,
        token: &str,
        identity_id: &str,
    ) -> Result<bool, SessionError> {
        let response = self
            .post_worker(
                endpoints::TEST_ACCESS_TOKEN,
                json!({ "token": token, "twitterId": identity_id }),
                None,
            )
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(SessionError::Forbidden {
                endpoint: endpoints::TEST_ACCESS_TOKEN,
            });
        }
        // Any other status carries the verdict in its body
        match response.json::<TokenValidity>().await {
            Ok(validity) => Ok(validity.is_valid),
            Err(_) if !status.is_success() => Ok(false),
            Err(e) => Err(SessionError::InvalidResponse(e.to_string())),
        }
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        identity_id: &str,
    ) -> Result<TokenPair, SessionError> {
        let response = self
            .post_worker(
                endpoints::REFRESH_ACCESS_TOKEN,
                json!({ "refreshToken": refresh_token, "twitterId": identity_id }),
                None,
            )
            .await?;
        Ok(check_status(endpoints::REFRESH_ACCESS_TOKEN, response)?
            .json()
            .await?)
    }

    async fn get_address(
        &self,
        access_token: &str,
        identity_id: &str,
    ) -> Result<Address, SessionError> {
        let response = self
            .post_worker(
                endpoints::GET_ADDRESS,
                json!({ "twitterId": identity_id }),
                Some(access_token),
            )
            .await?;
        let body: AddressBody = check_status(endpoints::GET_ADDRESS, response)?
            .json()
            .await?;
        Ok(body.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn backend(server: &mockito::Server) -> HttpAuthBackend {
        let config = AuthConfig {
            node_url: server.url(),
            worker_url: format!("{}/", server.url()),
            ..Default::default()
        };
        HttpAuthBackend::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_request_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/requestAccessToken")
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"req","secret":"shh"}"#)
            .create_async()
            .await;

        let token = backend(&server).request_token().await.unwrap();
        assert_eq!(
            token,
            RequestToken {
                token: "req".into(),
                secret: "shh".into()
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_verifier_exchange_returns_credential() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/accessToken")
            .match_body(Matcher::Json(
                json!({"token": "t", "verifier": "v", "secret": "s"}),
            ))
            .with_body(r#"{"twitterId":"42","token":"access","refreshToken":"refresh"}"#)
            .create_async()
            .await;

        let credential = backend(&server)
            .exchange_verifier(&VerifierExchange {
                token: "t".into(),
                verifier: "v".into(),
                secret: "s".into(),
            })
            .await
            .unwrap();
        assert_eq!(credential, Credential::new("42", "access", "refresh"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_check_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/testAccessToken")
            .match_body(Matcher::PartialJson(json!({"token": "good"})))
            .with_body(r#"{"isValid":true}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/testAccessToken")
            .match_body(Matcher::PartialJson(json!({"token": "stale"})))
            .with_status(403)
            .create_async()
            .await;
        let backend = backend(&server);

        assert!(backend.test_access_token("good", "42").await.unwrap());
        assert_eq!(
            backend.test_access_token("stale", "42").await,
            Err(SessionError::Forbidden {
                endpoint: endpoints::TEST_ACCESS_TOKEN
            })
        );
    }

    #[tokio::test]
    async fn test_address_lookup_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/getAddress")
            .match_header("authorization", "Bearer access")
            .with_body(r#"{"address":"0x1111111111111111111111111111111111111111"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/getAddress")
            .match_header("authorization", "Bearer expired")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/getAddress")
            .match_header("authorization", "Bearer unknown")
            .with_status(404)
            .create_async()
            .await;
        let backend = backend(&server);

        assert_eq!(
            backend.get_address("access", "42").await.unwrap(),
            Address::repeat_byte(0x11)
        );
        assert_eq!(
            backend.get_address("expired", "42").await,
            Err(SessionError::Unauthorized("Unauthorized".into()))
        );
        assert_eq!(
            backend.get_address("unknown", "42").await,
            Err(SessionError::NotFound("Not Found".into()))
        );
    }

    #[test]
    fn test_endpoint_join_tolerates_trailing_slash() {
        let base = Url::parse("https://worker.example.dev/").unwrap();
        assert_eq!(
            HttpAuthBackend::endpoint(&base, "getAddress").unwrap().as_str(),
            "https://worker.example.dev/getAddress"
        );
        let base = Url::parse("https://api.example.dev/v1").unwrap();
        assert_eq!(
            HttpAuthBackend::endpoint(&base, "accessToken").unwrap().as_str(),
            "https://api.example.dev/v1/accessToken"
        );
    }
}
