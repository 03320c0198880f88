//! # Perch Centralized Configuration
//!
//! Centralized configuration and chain constants for every Perch service.
//!
//! ## Features
//!
//! - **Chain Constants**: canonical mainnet addresses for the V2 factory,
//!   WETH, USDC and the USDC/WETH pair
//! - **Layered Loading**: serde defaults → TOML file → `PERCH_*` environment
//! - **Logging**: one `tracing-subscriber` initialisation shared by binaries
//!
//! ## Usage
//!
//! ```rust,no_run
//! use perch_config::{chain, PerchConfig};
//!
//! let config = PerchConfig::load(None).unwrap();
//! perch_config::logging::init(&config.logging).unwrap();
//! assert_eq!(config.contracts.weth, chain::WETH);
//! ```

pub mod chain;
pub mod logging;
pub mod settings;

// Re-export commonly used types
pub use settings::{
    AuthConfig, ChainConfig, ContractsConfig, LoggingConfig, PerchConfig, PollingConfig,
};
