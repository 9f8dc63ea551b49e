use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::types::{Side, TradeEvent};

/// Per (token, side) rolling trade history, bounded to the detection window.
///
/// Buckets are keyed in a `BTreeMap` so iteration is token-ascending with
/// `Buy` before `Sell`, which gives the detector its deterministic output
/// order for free. Entries inside a bucket stay timestamp-ordered, so
/// eviction is a prefix trim. Eviction is lazy: it runs on each detection
/// pass, never from a background timer.
pub struct WindowStore {
    window: Duration,
    buckets: BTreeMap<(String, Side), Vec<TradeEvent>>,
    /// (signature, wallet) pairs currently held, for idempotent ingestion.
    seen: HashSet<(String, String)>,
}

impl WindowStore {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            buckets: BTreeMap::new(),
            seen: HashSet::new(),
        }
    }

    /// Append an event to its (token, side) bucket, keeping timestamp order.
    ///
    /// Re-recording the same (signature, wallet) is a no-op; returns whether
    /// the event was actually inserted.
    pub fn record(&mut self, event: TradeEvent) -> bool {
        let key = (event.signature.clone(), event.wallet.clone());
        if !self.seen.insert(key) {
            return false;
        }
        let bucket = self
            .buckets
            .entry((event.token.clone(), event.side))
            .or_default();
        // Events usually arrive newest-window in order; out-of-order inserts
        // still land at the right spot.
        let idx = bucket.partition_point(|e| e.timestamp <= event.timestamp);
        bucket.insert(idx, event);
        true
    }

    /// Drop entries older than the window (`now - timestamp > window`),
    /// trimming each bucket's time-ordered prefix. Fully drained buckets
    /// are removed so deduplication state can reset.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        for bucket in self.buckets.values_mut() {
            let trim = bucket.partition_point(|e| e.timestamp < cutoff);
            for evicted in bucket.drain(..trim) {
                self.seen.remove(&(evicted.signature, evicted.wallet));
            }
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
    }

    /// Whether any entry remains for the given (token, side).
    pub fn has_entries(&self, token: &str, side: Side) -> bool {
        self.buckets
            .contains_key(&(token.to_string(), side))
    }

    /// Per-wallet cumulative amounts for a (token, side) bucket. A wallet
    /// that trades twice appears once, with its amounts summed. Intended to
    /// run after `evict_expired`.
    pub fn wallet_totals(&self, token: &str, side: Side) -> BTreeMap<String, Decimal> {
        let mut totals = BTreeMap::new();
        if let Some(bucket) = self.buckets.get(&(token.to_string(), side)) {
            for event in bucket {
                *totals.entry(event.wallet.clone()).or_insert(Decimal::ZERO) += event.amount;
            }
        }
        totals
    }

    /// Iterate buckets in detector order (token ascending, Buy before Sell).
    pub fn iter_buckets(&self) -> impl Iterator<Item = (&str, Side, &[TradeEvent])> {
        self.buckets
            .iter()
            .map(|((token, side), bucket)| (token.as_str(), *side, bucket.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total retained entries across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
