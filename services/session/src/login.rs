//! Three-legged identity login
//!
//! 1. Ask the node for a temporary request token and secret.
//! 2. Send the user through the identity provider's authorization page.
//! 3. Exchange the returned verifier for an access/refresh pair and store it.

use async_trait::async_trait;
use perch_types::Credential;
use tracing::{debug, info};
use url::Url;

use crate::backend::{AuthBackend, VerifierExchange};
use crate::error::SessionError;
use crate::refresher::SessionRefresher;
use crate::store::SessionStore;

/// Opens the authorization page and returns the URL the provider redirected to
#[async_trait]
pub trait IdentityFlow: Send + Sync {
    async fn authorize(&self, authorization_url: &Url) -> Result<Url, SessionError>;
}

/// Verifier handed back on the provider's callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    pub oauth_token: String,
    pub oauth_verifier: String,
}

/// `{authorize_url}?oauth_token=..&force_login=false`
pub fn authorization_url(authorize_url: &str, oauth_token: &str) -> Result<Url, SessionError> {
    let mut url = Url::parse(authorize_url)
        .map_err(|e| SessionError::Configuration(format!("auth.authorize_url: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("oauth_token", oauth_token)
        .append_pair("force_login", "false");
    Ok(url)
}

/// Read `oauth_token` and `oauth_verifier` from the callback query
pub fn parse_callback(redirect: &Url) -> Result<Callback, SessionError> {
    let mut oauth_token = None;
    let mut oauth_verifier = None;
    for (key, value) in redirect.query_pairs() {
        match key.as_ref() {
            "oauth_token" => oauth_token = Some(value.into_owned()),
            "oauth_verifier" => oauth_verifier = Some(value.into_owned()),
            "denied" => {
                return Err(SessionError::Login(
                    "authorization denied by user".to_string(),
                ))
            }
            _ => {}
        }
    }

    match (oauth_token, oauth_verifier) {
        (Some(oauth_token), Some(oauth_verifier)) => Ok(Callback {
            oauth_token,
            oauth_verifier,
        }),
        _ => Err(SessionError::Login(format!(
            "callback without oauth_token/oauth_verifier: {}",
            redirect
        ))),
    }
}

impl<B, S> SessionRefresher<B, S>
where
    B: AuthBackend + ?Sized,
    S: SessionStore + ?Sized,
{
    /// Run the full handshake and persist the resulting credential
    pub async fn login<F: IdentityFlow + ?Sized>(&self, flow: &F) -> Result<Credential, SessionError> {
        let request = self.backend.request_token().await?;
        let url = authorization_url(&self.authorize_url, &request.token)?;
        debug!("Authorization URL: {}", url);

        let redirect = flow.authorize(&url).await?;
        let callback = parse_callback(&redirect)?;

        let credential = self
            .backend
            .exchange_verifier(&VerifierExchange {
                token: callback.oauth_token,
                verifier: callback.oauth_verifier,
                secret: request.secret,
            })
            .await?;
        if credential.is_empty() {
            return Err(SessionError::InvalidResponse(
                "token exchange returned no tokens".to_string(),
            ));
        }

        self.store.set(&credential).await?;
        info!("Logged in as identity {}", credential.identity_id);
        Ok(credential)
    }
}
