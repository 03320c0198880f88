//! Session and address lookup errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 403 from an auth endpoint
    #[error("{endpoint} answered 403 Forbidden")]
    Forbidden { endpoint: &'static str },

    /// 401, carrying the status text
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 404, carrying the status text
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{endpoint} answered unexpected status {status}")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },

    /// Both tokens were rejected; the stored credential has been cleared
    #[error("Session expired, login required")]
    SessionExpired,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential store error: {0}")]
    Store(String),

    /// The identity provider did not hand back a usable callback
    #[error("Login failed: {0}")]
    Login(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SessionError::InvalidResponse(err.to_string())
        } else {
            SessionError::Network(err.to_string())
        }
    }
}

/// Typed outcome of the custodial address lookup
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressLookupError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Address not found: {0}")]
    NotFound(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Session(SessionError),
}

impl From<SessionError> for AddressLookupError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unauthorized(text) => AddressLookupError::Unauthorized(text),
            SessionError::NotFound(text) => AddressLookupError::NotFound(text),
            other => AddressLookupError::Session(other),
        }
    }
}
