//! Service Configuration Module
//!
//! Loads [`PerchConfig`] from serde defaults, an optional TOML file and
//! `PERCH_`-prefixed environment variables, in that order of precedence.
//! Nested keys use a double underscore: `PERCH_AUTH__WORKER_URL`.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::chain;

/// Default location of the TOML file
pub const DEFAULT_CONFIG_PATH: &str = "config/perch.toml";

/// Complete configuration for Perch services
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerchConfig {
    /// Node connectivity
    pub chain: ChainConfig,
    /// Contract addresses and reference currency scales
    pub contracts: ContractsConfig,
    /// Auth backend and worker endpoints
    pub auth: AuthConfig,
    /// Receipt polling bounds
    pub polling: PollingConfig,
    /// Log level and output format
    pub logging: LoggingConfig,
}

/// Blockchain node connectivity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint for reads, simulation and receipts
    pub rpc_url: String,
    pub chain_id: u64,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

/// Contract addresses, kept as strings and parsed when needed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContractsConfig {
    pub factory: String,
    pub weth: String,
    pub usdc: String,
    pub usdc_pair: String,
    /// Custodial swap contract; required for buy, sell, approve and allowance
    pub swap_contract: Option<String>,
    pub base_decimals: u8,
    pub stable_decimals: u8,
}

/// Endpoints of the session backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// Serves `requestAccessToken` and `accessToken`
    pub node_url: String,
    /// Serves `testAccessToken`, `refreshAccessToken` and `getAddress`
    pub worker_url: String,
    /// Identity provider authorization page
    pub authorize_url: String,
    pub request_timeout_secs: u64,
}

/// Bounded backoff for receipt polling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub backoff_multiplier: f64,
    pub max_attempts: u32,
    /// Overall deadline across all attempts
    pub timeout_secs: u64,
}

/// Tracing subscriber settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: chain::MAINNET_CHAIN_ID,
            request_timeout_secs: 30,
        }
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            factory: chain::V2_FACTORY.to_string(),
            weth: chain::WETH.to_string(),
            usdc: chain::USDC.to_string(),
            usdc_pair: chain::USDC_WETH_PAIR.to_string(),
            swap_contract: None,
            base_decimals: chain::WETH_DECIMALS,
            stable_decimals: chain::USDC_DECIMALS,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            node_url: "http://127.0.0.1:3000".to_string(),
            worker_url: "http://127.0.0.1:8787".to_string(),
            authorize_url: chain::AUTHORIZE_URL.to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1_000,
            max_interval_ms: 8_000,
            backoff_multiplier: 1.5,
            max_attempts: 90,
            timeout_secs: 300, // 5 minutes max wait
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PerchConfig {
    /// Load configuration with file and environment overrides
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        debug!("Loading configuration from {:?} (required: {})", file, required);

        let config = Config::builder()
            .add_source(File::from(file.as_path()).required(required))
            .add_source(
                Environment::with_prefix("PERCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut loaded: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        loaded.expand_env_vars()?;

        info!(
            "Configuration loaded: rpc={} chain_id={}",
            loaded.chain.rpc_url, loaded.chain.chain_id
        );
        Ok(loaded)
    }

    /// Parse a TOML file without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid TOML in {}", path.display()))
    }

    /// Write the configuration as TOML
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Expand `$VAR` / `${VAR}` references in endpoint URLs
    pub fn expand_env_vars(&mut self) -> Result<()> {
        for value in [
            &mut self.chain.rpc_url,
            &mut self.auth.node_url,
            &mut self.auth.worker_url,
        ] {
            let expanded = shellexpand::env(value.as_str())
                .with_context(|| format!("Failed to expand {}", value))?
                .into_owned();
            *value = expanded;
        }
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("chain.rpc_url", &self.chain.rpc_url),
            ("auth.node_url", &self.auth.node_url),
            ("auth.worker_url", &self.auth.worker_url),
            ("auth.authorize_url", &self.auth.authorize_url),
        ] {
            Url::parse(url).with_context(|| format!("Invalid URL for {}: {}", name, url))?;
        }

        self.contracts.factory_address()?;
        self.contracts.weth_address()?;
        self.contracts.usdc_address()?;
        self.contracts.usdc_pair_address()?;
        if let Some(swap) = &self.contracts.swap_contract {
            let parsed = parse_address("contracts.swap_contract", swap)?;
            if parsed.is_zero() {
                bail!("contracts.swap_contract must not be the zero address");
            }
        }

        if self.polling.initial_interval_ms == 0 {
            bail!("polling.initial_interval_ms must be positive");
        }
        if self.polling.max_interval_ms < self.polling.initial_interval_ms {
            bail!("polling.max_interval_ms must be >= polling.initial_interval_ms");
        }
        if !(self.polling.backoff_multiplier >= 1.0) {
            bail!("polling.backoff_multiplier must be >= 1.0");
        }
        if self.polling.max_attempts == 0 {
            bail!("polling.max_attempts must be positive");
        }
        if self.polling.timeout_secs == 0 {
            bail!("polling.timeout_secs must be positive");
        }

        Ok(())
    }
}

impl ChainConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ContractsConfig {
    pub fn factory_address(&self) -> Result<Address> {
        parse_address("contracts.factory", &self.factory)
    }

    pub fn weth_address(&self) -> Result<Address> {
        parse_address("contracts.weth", &self.weth)
    }

    pub fn usdc_address(&self) -> Result<Address> {
        parse_address("contracts.usdc", &self.usdc)
    }

    pub fn usdc_pair_address(&self) -> Result<Address> {
        parse_address("contracts.usdc_pair", &self.usdc_pair)
    }

    /// `None` when the swap contract is not configured
    pub fn swap_contract_address(&self) -> Result<Option<Address>> {
        self.swap_contract
            .as_deref()
            .map(|s| parse_address("contracts.swap_contract", s))
            .transpose()
    }
}

impl AuthConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollingConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_address(name: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .with_context(|| format!("Invalid address for {}: {}", name, value))
}
