pub mod api;
pub mod config;
pub mod dedup;
pub mod detector;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod notifier;
pub mod retry;
pub mod store;
pub mod types;
pub mod window;

/// Moralis Solana gateway base URL (mainnet account endpoints, no trailing slash)
pub const MORALIS_API_BASE: &str = "https://solana-gateway.moralis.io/account/mainnet";

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
