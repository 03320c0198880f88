//! Scripted auth backend for exercising session flows offline

use async_trait::async_trait;
use ethers_core::types::Address;
use parking_lot::Mutex;
use perch_types::Credential;

use crate::backend::{endpoints, AuthBackend, RequestToken, TokenPair, VerifierExchange};
use crate::error::SessionError;

fn unscripted<T>(endpoint: &str) -> Result<T, SessionError> {
    Err(SessionError::Network(format!("{} not scripted", endpoint)))
}

/// Answers each endpoint with a fixed result and records every request
#[derive(Default)]
pub struct ScriptedBackend {
    request_token: Option<Result<RequestToken, SessionError>>,
    exchange: Option<Result<Credential, SessionError>>,
    validity: Option<Result<bool, SessionError>>,
    refresh: Option<Result<TokenPair, SessionError>>,
    address: Option<Result<Address, SessionError>>,
    requests: Mutex<Vec<&'static str>>,
    exchanges: Mutex<Vec<VerifierExchange>>,
    bearers: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn with_request_token(mut self, token: &str, secret: &str) -> Self {
        self.request_token = Some(Ok(RequestToken {
            token: token.to_string(),
            secret: secret.to_string(),
        }));
        self
    }

    pub fn with_exchange(mut self, result: Result<Credential, SessionError>) -> Self {
        self.exchange = Some(result);
        self
    }

    pub fn with_validity(mut self, result: Result<bool, SessionError>) -> Self {
        self.validity = Some(result);
        self
    }

    pub fn with_refresh(mut self, result: Result<(&str, &str), SessionError>) -> Self {
        self.refresh = Some(result.map(|(token, refresh_token)| TokenPair {
            token: token.to_string(),
            refresh_token: refresh_token.to_string(),
        }));
        self
    }

    pub fn with_address(mut self, result: Result<Address, SessionError>) -> Self {
        self.address = Some(result);
        self
    }

    /// Endpoint names in call order
    pub fn requests(&self) -> Vec<&'static str> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn exchanges(&self) -> Vec<VerifierExchange> {
        self.exchanges.lock().clone()
    }

    /// Bearer tokens presented to the address lookup
    pub fn bearers(&self) -> Vec<String> {
        self.bearers.lock().clone()
    }

    fn record(&self, endpoint: &'static str) {
        self.requests.lock().push(endpoint);
    }
}

#[async_trait]
impl AuthBackend for ScriptedBackend {
    async fn request_token(&self) -> Result<RequestToken, SessionError> {
        self.record(endpoints::REQUEST_ACCESS_TOKEN);
        self.request_token
            .clone()
            .unwrap_or_else(|| unscripted(endpoints::REQUEST_ACCESS_TOKEN))
    }

    async fn exchange_verifier(
        &self,
        exchange: &VerifierExchange,
    ) -> Result<Credential, SessionError> {
        self.record(endpoints::ACCESS_TOKEN);
        self.exchanges.lock().push(exchange.clone());
        self.exchange
            .clone()
            .unwrap_or_else(|| unscripted(endpoints::ACCESS_TOKEN))
    }

    async fn test_access_token(
        &self,
        _token: &str,
        _identity_id: &str,
    ) -> Result<bool, SessionError> {
        self.record(endpoints::TEST_ACCESS_TOKEN);
        self.validity
            .clone()
            .unwrap_or_else(|| unscripted(endpoints::TEST_ACCESS_TOKEN))
    }

    async fn refresh_access_token(
        &self,
        _refresh_token: &str,
        _identity_id: &str,
    ) -> Result<TokenPair, SessionError> {
        self.record(endpoints::REFRESH_ACCESS_TOKEN);
        self.refresh
            .clone()
            .unwrap_or_else(|| unscripted(endpoints::REFRESH_ACCESS_TOKEN))
    }

    async fn get_address(
        &self,
        access_token: &str,
        _identity_id: &str,
    ) -> Result<Address, SessionError> {
        self.record(endpoints::GET_ADDRESS);
        self.bearers.lock().push(access_token.to_string());
        self.address
            .clone()
            .unwrap_or_else(|| unscripted(endpoints::GET_ADDRESS))
    }
}
