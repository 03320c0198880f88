//! # Perch Session Service
//!
//! Links a third-party identity to its custodial on-chain address.
//!
//! - [`login`]: request token → provider authorization → verifier exchange
//! - [`refresher`]: token test with a single refresh fallback; a rejected
//!   refresh clears the stored credential
//! - [`address`]: bearer-authorized custodial address lookup
//! - [`store`]: `SessionStore` with in-memory and JSON file implementations
//! - [`backend`]: `AuthBackend` trait and its reqwest implementation
//!
//! ```rust,no_run
//! use perch_config::AuthConfig;
//! use perch_session::{HttpAuthBackend, JsonFileStore, SessionRefresher};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), perch_session::SessionError> {
//! let config = AuthConfig::default();
//! let backend = Arc::new(HttpAuthBackend::new(&config)?);
//! let store = Arc::new(JsonFileStore::new("session.json"));
//! let session = SessionRefresher::new(backend, store, config.authorize_url.clone());
//!
//! if !session.test_tokens().await? {
//!     println!("login required");
//! }
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod backend;
pub mod error;
pub mod login;
pub mod refresher;
pub mod store;
pub mod testing;

pub use backend::{AuthBackend, HttpAuthBackend, RequestToken, TokenPair, VerifierExchange};
pub use error::{AddressLookupError, SessionError};
pub use login::{authorization_url, parse_callback, Callback, IdentityFlow};
pub use refresher::{SessionRefresher, Validity};
pub use store::{InMemoryStore, JsonFileStore, SessionStore};
