use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction. `Buy` sorts before `Sell` so detector output is stable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn label(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

/// A wallet the user asked the tracker to watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedWallet {
    pub address: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub added_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl TrackedWallet {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            active: true,
            added_at: Utc::now(),
        }
    }
}

/// Entry in the tracked-token filter. A non-empty filter restricts detection
/// to the listed token addresses; an empty filter tracks everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedToken {
    pub address: String,
    #[serde(default)]
    pub symbol: String,
    pub added_at: DateTime<Utc>,
}

impl TrackedToken {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            symbol: String::new(),
            added_at: Utc::now(),
        }
    }
}

/// Canonical swap event produced by the normalizer.
///
/// `(signature, wallet)` identifies the event; re-delivery from polling
/// overlap or webhook retries is a no-op in the window store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub wallet: String,
    pub token: String,
    pub token_symbol: String,
    pub side: Side,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub signature: String,
}

/// A (token, side) pair currently meeting the multi-wallet threshold,
/// pending deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub token: String,
    pub token_symbol: String,
    pub side: Side,
    pub wallets: BTreeSet<String>,
    pub total_amount: Decimal,
    pub detected_at: DateTime<Utc>,
}

/// Persisted record of an emitted alert, used to seed suppression state
/// after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub token: String,
    pub side: Side,
    pub wallets: BTreeSet<String>,
    pub total_amount: Decimal,
    pub emitted_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            token: candidate.token.clone(),
            side: candidate.side,
            wallets: candidate.wallets.clone(),
            total_amount: candidate.total_amount,
            emitted_at: candidate.detected_at,
        }
    }
}

// ── Raw wire types (swaps endpoint / webhook payloads) ─────────────

/// One page of the swaps endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwapPage {
    #[serde(default)]
    pub result: Vec<RawSwap>,
}

/// Raw swap record as delivered by the API. Amounts and timestamps arrive
/// as either JSON strings or numbers depending on the upstream serializer,
/// so both are kept loose until the normalizer parses them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSwap {
    pub transaction_type: Option<String>,
    pub sub_category: Option<String>,
    pub wallet_address: Option<String>,
    pub pair_address: Option<String>,
    /// Block timestamp in epoch milliseconds.
    pub block_timestamp: Option<serde_json::Value>,
    pub signature: Option<String>,
    pub bought: Option<RawTokenLeg>,
    pub sold: Option<RawTokenLeg>,
}

/// One leg of a swap (the token bought or sold).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTokenLeg {
    pub symbol: Option<String>,
    pub amount: Option<serde_json::Value>,
}
