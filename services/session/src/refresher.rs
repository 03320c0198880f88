//! Session Refresher
//!
//! Keeps the stored credential usable: test the access token, fall back to
//! the refresh token on 403, and clear everything once both are rejected so
//! the caller knows to log in again.

use perch_types::Credential;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::AuthBackend;
use crate::error::SessionError;
use crate::store::SessionStore;

/// Verdict of the token test endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid,
    /// 403: the access token is no longer accepted, try a refresh
    Forbidden,
}

pub struct SessionRefresher<B: ?Sized, S: ?Sized> {
    pub(crate) backend: Arc<B>,
    pub(crate) store: Arc<S>,
    pub(crate) authorize_url: String,
}

impl<B, S> SessionRefresher<B, S>
where
    B: AuthBackend + ?Sized,
    S: SessionStore + ?Sized,
{
    pub fn new(backend: Arc<B>, store: Arc<S>, authorize_url: impl Into<String>) -> Self {
        Self {
            backend,
            store,
            authorize_url: authorize_url.into(),
        }
    }

    pub async fn credential(&self) -> Result<Credential, SessionError> {
        self.store.get().await
    }

    /// Forget the stored credential
    pub async fn logout(&self) -> Result<(), SessionError> {
        info!("Clearing stored credential");
        self.store.clear().await
    }

    /// One token test request
    pub async fn validate(&self, token: &str, identity_id: &str) -> Result<Validity, SessionError> {
        match self.backend.test_access_token(token, identity_id).await {
            Ok(true) => Ok(Validity::Valid),
            Ok(false) => Ok(Validity::Invalid),
            Err(SessionError::Forbidden { .. }) => Ok(Validity::Forbidden),
            Err(e) => Err(e),
        }
    }

    /// One refresh request; persists the new pair or clears the store on 403
    pub async fn refresh(
        &self,
        refresh_token: &str,
        identity_id: &str,
    ) -> Result<Credential, SessionError> {
        match self
            .backend
            .refresh_access_token(refresh_token, identity_id)
            .await
        {
            Ok(pair) => {
                let credential = Credential::new(identity_id, pair.token, pair.refresh_token);
                self.store.set(&credential).await?;
                info!("Access token refreshed for identity {}", identity_id);
                Ok(credential)
            }
            Err(SessionError::Forbidden { .. }) => {
                warn!("Refresh token rejected, clearing session");
                self.store.clear().await?;
                Err(SessionError::SessionExpired)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the stored session is usable, refreshing it if needed
    ///
    /// Issues at most two requests; `false` means a new login is required.
    pub async fn test_tokens(&self) -> Result<bool, SessionError> {
        let credential = self.store.get().await?;
        if credential.is_empty() {
            debug!("No stored tokens");
            return Ok(false);
        }

        match self
            .validate(&credential.access_token, &credential.identity_id)
            .await?
        {
            Validity::Valid => Ok(true),
            Validity::Invalid => Ok(false),
            Validity::Forbidden => {
                debug!("Access token forbidden, trying refresh");
                match self
                    .refresh(&credential.refresh_token, &credential.identity_id)
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(SessionError::SessionExpired) => Ok(false),
                    Err(e) => Err(e),
                }
            }
        }
    }
}
