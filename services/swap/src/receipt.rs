//! Bounded, cancellable receipt polling
//!
//! The interval grows by `backoff_multiplier` from `initial_interval` up to
//! `max_interval`. Polling stops at whichever comes first: a receipt,
//! `max_attempts`, the overall `timeout`, or the cancel flag. The flag is a
//! latched `watch` value, so a cancel raised before the wait starts still
//! stops it.

use ethers::types::H256;
use perch_config::PollingConfig;
use perch_types::TxReceipt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::SwapError;
use crate::logging::LogEmoji;
use crate::node::ReceiptSource;

#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_multiplier: f64,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            initial_interval: config.initial_interval(),
            max_interval: config.max_interval(),
            backoff_multiplier: config.backoff_multiplier,
            max_attempts: config.max_attempts,
            timeout: config.timeout(),
        }
    }
}

impl PollPolicy {
    /// Interval after `current`, capped at `max_interval`
    pub fn next_interval(&self, current: Duration) -> Duration {
        let next = current.as_secs_f64() * self.backoff_multiplier.max(1.0);
        Duration::from_secs_f64(next.min(self.max_interval.as_secs_f64()))
    }
}

/// Resolves once the flag is set; never resolves without a channel
async fn cancelled(cancel: &mut Option<watch::Receiver<bool>>) {
    match cancel {
        Some(rx) => {
            if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                // Sender gone: nobody can cancel any more
                std::future::pending::<()>().await
            }
        }
        None => std::future::pending::<()>().await,
    }
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().map_or(false, |rx| *rx.borrow())
}

/// Poll `source` until `tx_hash` is mined
///
/// A mined receipt with status 0 is `TransactionFailed`. Transient lookup
/// errors are logged and count as a pending poll.
pub async fn wait_for_receipt<S: ReceiptSource + ?Sized>(
    source: &S,
    tx_hash: H256,
    policy: &PollPolicy,
    mut cancel: Option<watch::Receiver<bool>>,
) -> Result<TxReceipt, SwapError> {
    let deadline = Instant::now() + policy.timeout;
    let mut interval = policy.initial_interval;
    let mut attempts = 0;

    debug!("{} Waiting for receipt of {:?}", LogEmoji::CLOCK, tx_hash);

    while attempts < policy.max_attempts {
        if is_cancelled(&cancel) {
            warn!("Receipt wait for {:?} cancelled", tx_hash);
            return Err(SwapError::Cancelled {
                tx_hash: Some(tx_hash),
            });
        }
        attempts += 1;

        let lookup = tokio::select! {
            result = source.receipt(tx_hash) => result,
            _ = cancelled(&mut cancel) => {
                warn!("Receipt wait for {:?} cancelled", tx_hash);
                return Err(SwapError::Cancelled {
                    tx_hash: Some(tx_hash),
                });
            }
        };

        match lookup {
            Ok(Some(receipt)) if receipt.succeeded() => {
                info!(
                    "{} Transaction {:?} confirmed in block {:?} after {} polls",
                    LogEmoji::SUCCESS,
                    tx_hash,
                    receipt.block_number,
                    attempts
                );
                return Ok(receipt);
            }
            Ok(Some(_)) => return Err(SwapError::TransactionFailed { tx_hash }),
            Ok(None) => debug!("Receipt for {:?} pending (poll {})", tx_hash, attempts),
            Err(e) => warn!("Error checking transaction receipt: {}", e),
        }

        if attempts == policy.max_attempts {
            break;
        }
        let now = Instant::now();
        if now >= deadline {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval.min(deadline - now)) => {}
            _ = cancelled(&mut cancel) => {
                warn!("Receipt wait for {:?} cancelled", tx_hash);
                return Err(SwapError::Cancelled {
                    tx_hash: Some(tx_hash),
                });
            }
        }
        interval = policy.next_interval(interval);
    }

    warn!(
        "{} No receipt for {:?} after {} polls",
        LogEmoji::WARNING,
        tx_hash,
        attempts
    );
    Err(SwapError::ConfirmationTimeout { tx_hash, attempts })
}
