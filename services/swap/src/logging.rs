//! Standardized emoji logging for swap flows
//!
//! Keeps the same emoji per concern across the orchestrator, readers and
//! wallet adapters so a user-facing log reads as one story.

/// Standard emoji set for swap logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅";
    pub const ERROR: &'static str = "❌";
    pub const WARNING: &'static str = "⚠️";

    // Flow stages
    pub const SEARCH: &'static str = "🔍"; // Address/pair resolution
    pub const POOL: &'static str = "🏊"; // Reserve reads
    pub const QUOTE: &'static str = "📊"; // Quote and slippage bound
    pub const SIMULATE: &'static str = "🧪"; // eth_call dry run
    pub const WALLET: &'static str = "👛"; // Signature prompts
    pub const EXECUTE: &'static str = "⚡"; // Broadcast
    pub const CLOCK: &'static str = "⏱️"; // Receipt polling
    pub const SWAP: &'static str = "🔄"; // State transitions
}

#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SUCCESS, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!("{} {}", $crate::logging::LogEmoji::ERROR, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_search {
    ($($arg:tt)*) => {
        tracing::debug!("{} {}", $crate::logging::LogEmoji::SEARCH, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_quote {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::QUOTE, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_wallet {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::WALLET, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_execution {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::EXECUTE, format!($($arg)*))
    };
}
