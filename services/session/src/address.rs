//! Custodial address lookup for the logged-in identity

use ethers_core::types::Address;
use tracing::debug;

use crate::backend::AuthBackend;
use crate::error::AddressLookupError;
use crate::refresher::SessionRefresher;
use crate::store::SessionStore;

impl<B, S> SessionRefresher<B, S>
where
    B: AuthBackend + ?Sized,
    S: SessionStore + ?Sized,
{
    /// On-chain address the backend mapped to the stored identity
    ///
    /// 401 and 404 come back as `Unauthorized` / `NotFound` with the status
    /// text; the credential is left untouched either way.
    pub async fn lookup_address(&self) -> Result<Address, AddressLookupError> {
        let credential = self.store.get().await?;
        if credential.access_token.is_empty() {
            return Err(AddressLookupError::NotLoggedIn);
        }

        let address = self
            .backend
            .get_address(&credential.access_token, &credential.identity_id)
            .await?;
        debug!("Identity {} maps to {:?}", credential.identity_id, address);
        Ok(address)
    }
}
