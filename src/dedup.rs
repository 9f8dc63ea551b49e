use std::collections::{BTreeSet, HashMap};

use crate::types::{AlertRecord, Candidate, Side};

/// Suppresses re-emission of alerts the detector re-derives every cycle.
///
/// State per (token, side) is the wallet set covered by the last sent alert.
/// A candidate alerts again only when its wallet set strictly expands on
/// that set. Once a bucket fully drains out of the window the entry is
/// cleared, so a fresh multi-buy after a quiet period alerts again.
#[derive(Default)]
pub struct AlertDeduplicator {
    last_alerted: HashMap<(String, Side), BTreeSet<String>>,
}

impl AlertDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed suppression state from persisted alert history (restart
    /// recovery). Records are applied in order, so the newest record per
    /// (token, side) wins.
    pub fn seed(&mut self, records: &[AlertRecord]) {
        for record in records {
            self.last_alerted
                .insert((record.token.clone(), record.side), record.wallets.clone());
        }
    }

    /// True iff no alert is outstanding for this (token, side), or the
    /// candidate brings at least one wallet the last alert did not cover.
    pub fn should_alert(&self, candidate: &Candidate) -> bool {
        match self
            .last_alerted
            .get(&(candidate.token.clone(), candidate.side))
        {
            None => true,
            Some(covered) => candidate.wallets.iter().any(|w| !covered.contains(w)),
        }
    }

    /// Record that an alert went out for this candidate.
    pub fn mark_alerted(&mut self, candidate: &Candidate) {
        self.last_alerted.insert(
            (candidate.token.clone(), candidate.side),
            candidate.wallets.clone(),
        );
    }

    /// Drop suppression state for buckets that no longer have in-window
    /// entries; called after eviction each cycle.
    pub fn retain_active<F>(&mut self, mut has_entries: F)
    where
        F: FnMut(&str, Side) -> bool,
    {
        self.last_alerted
            .retain(|(token, side), _| has_entries(token, *side));
    }
}
