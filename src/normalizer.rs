use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::TrackerError;
use crate::types::{RawSwap, RawTokenLeg, Side, TradeEvent};

/// Subcategory tag the upstream API uses for a fresh buy.
const SUB_CATEGORY_BUY: &str = "newPosition";
/// Subcategory tag for a full exit.
const SUB_CATEGORY_SELL: &str = "sellAll";

/// Outcome of normalizing one raw payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Trade(TradeEvent),
    /// Known-but-untracked subcategory (partial fills, transfers, ...).
    /// An expected filter, not an error.
    Discard,
}

/// Convert a raw swap payload into a canonical `TradeEvent`.
///
/// Pure transform: `newPosition` maps to a buy (amount/symbol from the
/// `bought` leg), `sellAll` to a sell (from the `sold` leg), anything else
/// is discarded. Structural problems yield `MalformedEvent`.
pub fn normalize(raw: &RawSwap) -> Result<Normalized, TrackerError> {
    let side = match raw.sub_category.as_deref() {
        Some(SUB_CATEGORY_BUY) => Side::Buy,
        Some(SUB_CATEGORY_SELL) => Side::Sell,
        _ => return Ok(Normalized::Discard),
    };

    let wallet = required(&raw.wallet_address, "walletAddress")?;
    let token = required(&raw.pair_address, "pairAddress")?;
    let signature = required(&raw.signature, "signature")?;

    let leg = match side {
        Side::Buy => raw.bought.as_ref(),
        Side::Sell => raw.sold.as_ref(),
    }
    .ok_or_else(|| malformed(format!("missing {} leg", leg_name(side))))?;

    let amount = parse_amount(leg)?;
    if amount < Decimal::ZERO {
        return Err(malformed(format!("negative amount {amount}")));
    }
    let timestamp = parse_timestamp(raw.block_timestamp.as_ref())?;
    let token_symbol = leg.symbol.clone().unwrap_or_default();

    Ok(Normalized::Trade(TradeEvent {
        wallet,
        token,
        token_symbol,
        side,
        amount,
        timestamp,
        signature,
    }))
}

fn leg_name(side: Side) -> &'static str {
    match side {
        Side::Buy => "bought",
        Side::Sell => "sold",
    }
}

fn malformed(msg: impl Into<String>) -> TrackerError {
    TrackerError::MalformedEvent(msg.into())
}

fn required(field: &Option<String>, name: &str) -> Result<String, TrackerError> {
    match field.as_deref() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(malformed(format!("missing {name}"))),
    }
}

fn parse_amount(leg: &RawTokenLeg) -> Result<Decimal, TrackerError> {
    let value = leg
        .amount
        .as_ref()
        .ok_or_else(|| malformed("missing amount"))?;
    let parsed = match value {
        Value::String(s) => s.parse::<Decimal>().ok(),
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| malformed(format!("unparsable amount {value}")))
}

/// Parse an epoch-millisecond timestamp delivered as a JSON number or string.
fn parse_timestamp(value: Option<&Value>) -> Result<DateTime<Utc>, TrackerError> {
    let value = value.ok_or_else(|| malformed("missing blockTimestamp"))?;
    let millis = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| malformed(format!("unparsable blockTimestamp {value}")))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| malformed(format!("blockTimestamp {millis} out of range")))
}
