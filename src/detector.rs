use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::Candidate;
use crate::window::WindowStore;

/// Scans the window store for (token, side) buckets crossing the
/// multi-wallet threshold. Runs once per aggregation cycle; membership can
/// change through eviction alone, so detection is never edge-triggered on
/// new events.
pub struct PatternDetector {
    min_wallets: usize,
}

impl PatternDetector {
    pub fn new(min_wallets: usize) -> Self {
        Self { min_wallets }
    }

    /// Emit a candidate for every bucket whose distinct-wallet count meets
    /// the threshold. Output order is stable across runs over identical
    /// state: token address ascending, buys before sells.
    pub fn detect(&self, window: &WindowStore, now: DateTime<Utc>) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for (token, side, entries) in window.iter_buckets() {
            let totals = window.wallet_totals(token, side);
            if totals.len() < self.min_wallets {
                continue;
            }
            let total_amount: Decimal = totals.values().copied().sum();
            // Most recent entry carries the freshest symbol spelling.
            let token_symbol = entries
                .last()
                .map(|e| e.token_symbol.clone())
                .unwrap_or_default();
            candidates.push(Candidate {
                token: token.to_string(),
                token_symbol,
                side,
                wallets: totals.into_keys().collect(),
                total_amount,
                detected_at: now,
            });
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Side, TradeEvent};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn event(wallet: &str, token: &str, side: Side, amount: Decimal, at: i64, sig: &str) -> TradeEvent {
        TradeEvent {
            wallet: wallet.to_string(),
            token: token.to_string(),
            token_symbol: format!("{token}-SYM"),
            side,
            amount,
            timestamp: ts(at),
            signature: sig.to_string(),
        }
    }

    fn store_with(events: Vec<TradeEvent>) -> WindowStore {
        let mut store = WindowStore::new(Duration::hours(6));
        for e in events {
            store.record(e);
        }
        store
    }

    #[test]
    fn below_threshold_emits_nothing() {
        let store = store_with(vec![
            event("a", "t1", Side::Buy, dec!(1.0), 0, "s1"),
            event("b", "t1", Side::Buy, dec!(2.0), 1, "s2"),
        ]);
        let detector = PatternDetector::new(3);
        assert!(detector.detect(&store, ts(10)).is_empty());
    }

    #[test]
    fn threshold_met_emits_candidate_with_summed_total() {
        let store = store_with(vec![
            event("a", "t1", Side::Buy, dec!(1.0), 0, "s1"),
            event("b", "t1", Side::Buy, dec!(2.0), 1, "s2"),
            event("c", "t1", Side::Buy, dec!(0.5), 2, "s3"),
        ]);
        let detector = PatternDetector::new(3);
        let candidates = detector.detect(&store, ts(10));
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.token, "t1");
        assert_eq!(c.side, Side::Buy);
        assert_eq!(c.wallets.len(), 3);
        assert_eq!(c.total_amount, dec!(3.5));
        assert_eq!(c.token_symbol, "t1-SYM");
    }

    #[test]
    fn repeat_buyer_counts_once_but_amount_sums() {
        let store = store_with(vec![
            event("a", "t1", Side::Buy, dec!(1.0), 0, "s1"),
            event("a", "t1", Side::Buy, dec!(4.0), 5, "s2"),
            event("b", "t1", Side::Buy, dec!(2.0), 1, "s3"),
        ]);
        let detector = PatternDetector::new(2);
        let candidates = detector.detect(&store, ts(10));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].wallets.len(), 2);
        assert_eq!(candidates[0].total_amount, dec!(7.0));
    }

    #[test]
    fn removing_a_wallet_drops_the_candidate() {
        let mut store = store_with(vec![
            event("a", "t1", Side::Buy, dec!(1.0), 0, "s1"),
            event("b", "t1", Side::Buy, dec!(2.0), 7200, "s2"),
        ]);
        let detector = PatternDetector::new(2);
        assert_eq!(detector.detect(&store, ts(7300)).len(), 1);

        // Six hours later wallet a's entry falls out of the window.
        let later = ts(6 * 3600 + 60);
        store.evict_expired(later);
        assert!(detector.detect(&store, later).is_empty());
    }

    #[test]
    fn buy_and_sell_detected_independently() {
        let store = store_with(vec![
            event("a", "t1", Side::Buy, dec!(1.0), 0, "s1"),
            event("b", "t1", Side::Buy, dec!(2.0), 1, "s2"),
            event("c", "t1", Side::Sell, dec!(3.0), 2, "s3"),
            event("d", "t1", Side::Sell, dec!(4.0), 3, "s4"),
        ]);
        let detector = PatternDetector::new(2);
        let candidates = detector.detect(&store, ts(10));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].side, Side::Buy);
        assert_eq!(candidates[1].side, Side::Sell);
    }

    #[test]
    fn output_order_is_stable() {
        let store = store_with(vec![
            event("a", "zeta", Side::Buy, dec!(1.0), 0, "s1"),
            event("b", "zeta", Side::Buy, dec!(1.0), 1, "s2"),
            event("a", "alpha", Side::Sell, dec!(1.0), 2, "s3"),
            event("b", "alpha", Side::Sell, dec!(1.0), 3, "s4"),
            event("a", "alpha", Side::Buy, dec!(1.0), 4, "s5"),
            event("b", "alpha", Side::Buy, dec!(1.0), 5, "s6"),
        ]);
        let detector = PatternDetector::new(2);
        let first = detector.detect(&store, ts(10));
        let second = detector.detect(&store, ts(10));
        assert_eq!(first, second);

        let keys: Vec<(&str, Side)> = first.iter().map(|c| (c.token.as_str(), c.side)).collect();
        assert_eq!(
            keys,
            vec![
                ("alpha", Side::Buy),
                ("alpha", Side::Sell),
                ("zeta", Side::Buy),
            ]
        );
    }
}
