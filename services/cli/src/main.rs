//! Perch command-line front end
//!
//! Quotes, swaps and token data go to the configured node, with signatures
//! requested from an EIP-1193 JSON-RPC endpoint. Login, session checks and
//! the custodial address lookup go to the auth backend.

mod identity;

use anyhow::{anyhow, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use ethers::types::{Address, H256, U256};
use perch_config::PerchConfig;
use perch_session::{HttpAuthBackend, JsonFileStore, SessionRefresher};
use perch_swap::{
    compute_quote, wait_for_receipt, Contracts, Eip1193Wallet, EthersNode, HttpTransport,
    PollPolicy, SwapError, SwapOrchestrator, SwapState, TokenDataReader, WalletProvider,
};
use perch_types::{Quote, SwapDirection, SwapRequest};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use identity::ConsoleIdentityFlow;

type Wallet = Eip1193Wallet<HttpTransport>;
type Orchestrator = SwapOrchestrator<EthersNode, Wallet>;
type Session = SessionRefresher<HttpAuthBackend, JsonFileStore>;

/// Grace period for a cancelled flow to unwind after Ctrl-C
const CANCEL_GRACE: Duration = Duration::from_secs(2);

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "perch")]
#[command(about = "Swap ERC-20 tokens against their WETH pool and manage the linked identity")]
struct Args {
    /// Configuration file path (config/perch.toml is used when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// EIP-1193 JSON-RPC endpoint that signs transactions; defaults to chain.rpc_url
    #[arg(long, global = true)]
    wallet_url: Option<Url>,

    /// Credential file for the identity session
    #[arg(long, global = true, default_value = ".perch/session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
struct SwapArgs {
    /// Token contract address
    #[arg(value_parser = parse_address)]
    token: Address,

    /// Input amount in smallest units: wei for buys, token units for sells
    amount: String,

    /// Slippage tolerance in percent
    #[arg(short, long, default_value = "0.5")]
    slippage: Decimal,

    /// Token decimals; read from the token contract when omitted
    #[arg(short, long)]
    decimals: Option<u8>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview a swap without touching the wallet
    Quote {
        /// buy or sell
        direction: SwapDirection,
        #[command(flatten)]
        swap: SwapArgs,
    },

    /// Display price of a token in stable-coin units
    Price {
        #[arg(value_parser = parse_address)]
        token: Address,
        #[arg(short, long)]
        decimals: Option<u8>,
    },

    /// Balance, symbol, price, decimals and allowance for a wallet
    TokenData {
        #[arg(value_parser = parse_address)]
        token: Address,
        /// Wallet to inspect; defaults to the signer's first account
        #[arg(long, value_parser = parse_address)]
        wallet: Option<Address>,
    },

    /// Pool reserves of a token against the base currency
    Reserves {
        #[arg(value_parser = parse_address)]
        token: Address,
    },

    /// Spend base currency for the token
    Buy(SwapArgs),

    /// Sell the token for base currency
    Sell(SwapArgs),

    /// Grant the swap contract an unlimited allowance and wait for it to be mined
    Approve {
        #[arg(value_parser = parse_address)]
        token: Address,
    },

    /// Transfer native currency, e.g. to the custodial address
    Deposit {
        #[arg(value_parser = parse_address)]
        to: Address,
        /// Amount in wei
        #[arg(value_parser = parse_u256)]
        amount: U256,
    },

    /// Wait for a transaction receipt
    Receipt {
        #[arg(value_parser = parse_hash)]
        hash: H256,
    },

    /// Link an identity through the provider's authorization page
    Login,

    /// Inspect or clear the stored session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Custodial address of the logged-in identity
    Address,

    /// Print the effective configuration
    Config {
        /// Also write it to this TOML file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum SessionAction {
    /// Test the stored tokens, refreshing them if needed
    Test,
    /// Identity of the stored credential
    Show,
    /// Forget the stored credential
    Logout,
}

fn parse_address(s: &str) -> Result<Address, String> {
    s.parse::<Address>()
        .map_err(|e| format!("invalid address {}: {}", s, e))
}

fn parse_hash(s: &str) -> Result<H256, String> {
    s.parse::<H256>()
        .map_err(|e| format!("invalid transaction hash {}: {}", s, e))
}

fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|e| format!("invalid amount {}: {}", s, e))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn connect_node(config: &PerchConfig) -> Result<(Arc<EthersNode>, Contracts)> {
    let node = EthersNode::connect(&config.chain).context("Failed to connect to node")?;
    let contracts = Contracts::from_config(&config.contracts)?;
    Ok((Arc::new(node), contracts))
}

fn connect_wallet(config: &PerchConfig, wallet_url: Option<&Url>) -> Result<Arc<Wallet>> {
    let url = match wallet_url {
        Some(url) => url.clone(),
        None => Url::parse(&config.chain.rpc_url).context("chain.rpc_url")?,
    };
    debug!("Wallet endpoint: {}", url);
    let transport = HttpTransport::new(url, config.chain.request_timeout())?;
    Ok(Arc::new(Eip1193Wallet::new(transport)))
}

fn token_reader(config: &PerchConfig) -> Result<TokenDataReader<EthersNode>> {
    let (node, contracts) = connect_node(config)?;
    Ok(TokenDataReader::new(node, contracts))
}

fn orchestrator(config: &PerchConfig, wallet_url: Option<&Url>) -> Result<Orchestrator> {
    let (node, contracts) = connect_node(config)?;
    let wallet = connect_wallet(config, wallet_url)?;
    Ok(SwapOrchestrator::new(
        node,
        wallet,
        &contracts,
        PollPolicy::from(&config.polling),
    )?)
}

fn session(config: &PerchConfig, session_file: PathBuf) -> Result<Session> {
    let backend = HttpAuthBackend::new(&config.auth)?;
    Ok(SessionRefresher::new(
        Arc::new(backend),
        Arc::new(JsonFileStore::new(session_file)),
        config.auth.authorize_url.clone(),
    ))
}

async fn swap_request(reader: &TokenDataReader<EthersNode>, swap: &SwapArgs) -> Result<SwapRequest> {
    let token_decimals = match swap.decimals {
        Some(decimals) => decimals,
        None => reader.decimals(swap.token).await?,
    };
    Ok(SwapRequest {
        token_address: swap.token,
        amount: swap.amount.clone(),
        slippage_percent: swap.slippage,
        token_decimals,
    })
}

/// Run a wallet flow; Ctrl-C cancels any confirmation wait in progress
async fn interruptible<T, F>(orchestrator: &Orchestrator, flow: F) -> Result<T>
where
    F: Future<Output = Result<T, SwapError>>,
{
    tokio::pin!(flow);
    tokio::select! {
        result = &mut flow => return Ok(result?),
        _ = tokio::signal::ctrl_c() => {}
    }

    warn!("Interrupted, cancelling");
    orchestrator.cancel();
    match tokio::time::timeout(CANCEL_GRACE, flow).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(interrupted(&orchestrator.state())),
    }
}

/// Error for a flow that did not unwind in time, naming any broadcast hash
fn interrupted(state: &SwapState) -> anyhow::Error {
    match state {
        SwapState::TxBroadcast(tx_hash) => anyhow!(
            "interrupted after broadcast of {:?}; check `perch receipt` before resubmitting",
            tx_hash
        ),
        state => anyhow!("interrupted in state {}", state),
    }
}

/// Amounts as decimal strings, like `reserves` and `token-data`
fn quote_json(quote: &Quote) -> serde_json::Value {
    json!({
        "direction": quote.direction,
        "amount_in": quote.amount_in.to_string(),
        "amount_out": quote.amount_out.to_string(),
        "amount_out_min": quote.amount_out_min.to_string(),
    })
}

async fn run(args: Args, config: PerchConfig) -> Result<()> {
    let wallet_url = args.wallet_url.as_ref();

    match args.command {
        Command::Quote { direction, swap } => {
            let reader = token_reader(&config)?;
            let request = swap_request(&reader, &swap).await?;
            let amount_in = request.amount_in()?;
            let (_, reserves) = reader.reserves(swap.token).await?;
            let quote = compute_quote(&reserves, direction, amount_in, &request)?;
            print_json(&quote_json(&quote))?;
        }
        Command::Price { token, decimals } => {
            let reader = token_reader(&config)?;
            let decimals = match decimals {
                Some(decimals) => decimals,
                None => reader.decimals(token).await?,
            };
            let symbol = reader.symbol(token).await?;
            let price = reader.price(token, decimals).await?;
            println!("{}: {}", symbol, price);
        }
        Command::TokenData { token, wallet } => {
            let reader = token_reader(&config)?;
            let wallet = match wallet {
                Some(wallet) => wallet,
                None => connect_wallet(&config, wallet_url)?
                    .accounts()
                    .await?
                    .first()
                    .copied()
                    .ok_or_else(|| anyhow!("signer exposes no accounts, pass --wallet"))?,
            };
            print_json(&reader.token_data(wallet, token).await?)?;
        }
        Command::Reserves { token } => {
            let reader = token_reader(&config)?;
            let (pair, reserves) = reader.reserves(token).await?;
            print_json(&json!({
                "pair": pair,
                "token_reserves": reserves.token_reserves.to_string(),
                "base_reserves": reserves.base_reserves.to_string(),
            }))?;
        }
        Command::Buy(swap) => {
            let request = swap_request(&token_reader(&config)?, &swap).await?;
            let orchestrator = orchestrator(&config, wallet_url)?;
            let receipt = interruptible(&orchestrator, orchestrator.buy(&request)).await?;
            print_json(&receipt)?;
        }
        Command::Sell(swap) => {
            let request = swap_request(&token_reader(&config)?, &swap).await?;
            let orchestrator = orchestrator(&config, wallet_url)?;
            let receipt = interruptible(&orchestrator, orchestrator.sell(&request)).await?;
            print_json(&receipt)?;
        }
        Command::Approve { token } => {
            let orchestrator = orchestrator(&config, wallet_url)?;
            let tx_hash = orchestrator.approve(token).await?;
            println!("Approve broadcast: {:?}", tx_hash);
            let receipt =
                interruptible(&orchestrator, orchestrator.wait_for_receipt(tx_hash)).await?;
            print_json(&receipt)?;
        }
        Command::Deposit { to, amount } => {
            let orchestrator = orchestrator(&config, wallet_url)?;
            let receipt = interruptible(&orchestrator, orchestrator.deposit(to, amount)).await?;
            print_json(&receipt)?;
        }
        Command::Receipt { hash } => {
            let (node, _) = connect_node(&config)?;
            let (cancel_tx, cancel_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel_tx.send_replace(true);
                }
            });
            let policy = PollPolicy::from(&config.polling);
            let receipt = wait_for_receipt(node.as_ref(), hash, &policy, Some(cancel_rx)).await?;
            print_json(&receipt)?;
        }
        Command::Login => {
            let credential = session(&config, args.session_file)?
                .login(&ConsoleIdentityFlow)
                .await?;
            println!("Logged in as identity {}", credential.identity_id);
        }
        Command::Session { action } => {
            let session = session(&config, args.session_file)?;
            match action {
                SessionAction::Test => {
                    if session.test_tokens().await? {
                        println!("Session valid");
                    } else {
                        println!("Session invalid, run `perch login`");
                    }
                }
                SessionAction::Show => {
                    let credential = session.credential().await?;
                    if credential.is_empty() {
                        println!("Not logged in");
                    } else {
                        println!("Identity {}", credential.identity_id);
                    }
                }
                SessionAction::Logout => {
                    session.logout().await?;
                    println!("Logged out");
                }
            }
        }
        Command::Address => {
            let address = session(&config, args.session_file)?
                .lookup_address()
                .await?;
            println!("{:?}", address);
        }
        Command::Config { save } => {
            print!("{}", config.to_toml()?);
            if let Some(path) = save {
                config.save_to_file(&path)?;
                info!("📁 Configuration written to {:?}", path);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = PerchConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    perch_config::logging::init(&config.logging)?;
    config.validate().context("Invalid configuration")?;

    debug!("📁 Config file: {:?}", args.config);
    debug!("🔗 RPC: {}", config.chain.rpc_url);

    run(args, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_buy() {
        let args = Args::try_parse_from([
            "perch",
            "buy",
            "0x1111111111111111111111111111111111111111",
            "1000000000000000000",
            "--slippage",
            "0.25",
        ])
        .unwrap();

        match args.command {
            Command::Buy(swap) => {
                assert_eq!(swap.token, Address::repeat_byte(0x11));
                assert_eq!(swap.amount, "1000000000000000000");
                assert_eq!(swap.slippage, Decimal::new(25, 2));
                assert_eq!(swap.decimals, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.session_file, PathBuf::from(".perch/session.json"));
    }

    #[test]
    fn test_parse_quote_direction() {
        let args = Args::try_parse_from([
            "perch",
            "quote",
            "sell",
            "0x1111111111111111111111111111111111111111",
            "500",
            "--decimals",
            "9",
        ])
        .unwrap();

        match args.command {
            Command::Quote { direction, swap } => {
                assert_eq!(direction, SwapDirection::Sell);
                assert_eq!(swap.decimals, Some(9));
                assert_eq!(swap.slippage, Decimal::new(5, 1));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_quote_amounts_print_as_decimal() {
        let quote = Quote {
            direction: SwapDirection::Sell,
            amount_in: U256::from(100u64),
            amount_out: U256::from(90u64),
            amount_out_min: U256::from(89u64),
        };

        let value = quote_json(&quote);
        assert_eq!(value["amount_in"], "100");
        assert_eq!(value["amount_out"], "90");
        assert_eq!(value["amount_out_min"], "89");
        assert_eq!(value["direction"], serde_json::to_value(SwapDirection::Sell).unwrap());
    }

    #[test]
    fn test_interrupt_after_broadcast_names_hash() {
        let err = interrupted(&SwapState::TxBroadcast(H256::repeat_byte(0x77)));
        let message = err.to_string();
        assert!(message.contains("0x7777"));
        assert!(message.contains("perch receipt"));

        let err = interrupted(&SwapState::TxAwaitingSignature);
        assert_eq!(err.to_string(), "interrupted in state TxAwaitingSignature");
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(Args::try_parse_from(["perch", "reserves", "0x1234"]).is_err());
        assert!(Args::try_parse_from([
            "perch",
            "deposit",
            "0x1111111111111111111111111111111111111111",
            "1.5"
        ])
        .is_err());
        assert!(Args::try_parse_from([
            "perch",
            "quote",
            "hold",
            "0x1111111111111111111111111111111111111111",
            "1"
        ])
        .is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "perch",
            "session",
            "test",
            "--session-file",
            "/tmp/perch.json",
            "--wallet-url",
            "http://127.0.0.1:8545",
        ])
        .unwrap();

        assert!(matches!(
            args.command,
            Command::Session {
                action: SessionAction::Test
            }
        ));
        assert_eq!(args.session_file, PathBuf::from("/tmp/perch.json"));
        assert_eq!(
            args.wallet_url.as_ref().map(Url::as_str),
            Some("http://127.0.0.1:8545/")
        );
    }
}
