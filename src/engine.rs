use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::SwapsApi;
use crate::config::SettingsConfig;
use crate::dedup::AlertDeduplicator;
use crate::detector::PatternDetector;
use crate::error::TrackerError;
use crate::normalizer::{Normalized, normalize};
use crate::notifier::{Notifier, render_alert};
use crate::retry::RetryPolicy;
use crate::store::JsonStore;
use crate::types::{AlertRecord, Candidate, RawSwap};
use crate::window::WindowStore;

/// Orchestrates one aggregation cycle at a time:
/// fetch/drain → normalize → evict → detect → dedupe → notify.
///
/// Owns the window store and deduplicator outright; persistence is a
/// write-through mirror and the notifier a collaborator. All mutation
/// happens on the single logical thread driving the cycle.
pub struct AggregationEngine {
    settings: SettingsConfig,
    window: WindowStore,
    detector: PatternDetector,
    dedup: AlertDeduplicator,
    /// When false, cycles are skipped entirely (user toggle).
    pub alerts_enabled: bool,
}

impl AggregationEngine {
    pub fn new(settings: SettingsConfig) -> Self {
        let window = WindowStore::new(settings.window_duration());
        let detector = PatternDetector::new(settings.min_wallets_threshold);
        Self {
            settings,
            window,
            detector,
            dedup: AlertDeduplicator::new(),
            alerts_enabled: true,
        }
    }

    pub fn settings(&self) -> &SettingsConfig {
        &self.settings
    }

    /// Seed suppression state from persisted alert history so a restart
    /// does not re-send alerts for wallet sets already covered.
    pub fn restore(&mut self, store: &JsonStore) {
        self.dedup.seed(store.alerts());
        if !store.alerts().is_empty() {
            info!("Restored suppression state from {} alert record(s)", store.alerts().len());
        }
    }

    /// Normalizing phase: convert raw payloads into trade events and record
    /// them. Malformed payloads are logged and skipped; discarded
    /// subcategories and duplicate (signature, wallet) pairs are silent
    /// no-ops. Returns the number of newly recorded events.
    pub fn ingest(&mut self, raws: &[RawSwap], store: &JsonStore) -> usize {
        let tracked = store.tracked_tokens();
        let mut recorded = 0;
        for raw in raws {
            match normalize(raw) {
                Ok(Normalized::Trade(event)) => {
                    if !tracked.is_empty() && !tracked.contains_key(&event.token) {
                        continue;
                    }
                    if self.window.record(event) {
                        recorded += 1;
                    }
                }
                Ok(Normalized::Discard) => {}
                Err(e) => warn!("Skipping event: {e}"),
            }
        }
        recorded
    }

    /// Evicting + Detecting phases. Returns the candidates that pass
    /// deduplication, in stable detector order.
    pub fn run_detection(&mut self, now: DateTime<Utc>) -> Vec<Candidate> {
        self.window.evict_expired(now);
        let window = &self.window;
        self.dedup
            .retain_active(|token, side| window.has_entries(token, side));

        self.detector
            .detect(&self.window, now)
            .into_iter()
            .filter(|c| self.dedup.should_alert(c))
            .collect()
    }

    /// Record that an alert for `candidate` actually went out.
    pub fn mark_alerted(&mut self, candidate: &Candidate) {
        self.dedup.mark_alerted(candidate);
    }

    /// Retained entries across all buckets, for cycle logging.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

/// One full polling cycle: one API call per active wallet (fixed-delay
/// spacing, bounded retry with exponential backoff), then the shared
/// normalize/detect/notify tail. A wallet that exhausts its retries is
/// skipped; nothing short of the cycle itself can abort the cycle.
pub async fn poll_cycle(
    engine: &mut AggregationEngine,
    api: &SwapsApi,
    store: &mut JsonStore,
    notifier: &dyn Notifier,
) -> Result<()> {
    if !engine.alerts_enabled {
        debug!("Alerts disabled, skipping cycle");
        return Ok(());
    }

    let retry = RetryPolicy::new(
        engine.settings.max_retries,
        Duration::from_millis(engine.settings.retry_base_delay_ms),
    );
    let spacing = Duration::from_millis(engine.settings.rate_limit_delay_ms);

    let wallets = store.active_wallet_addresses();
    let mut raws = Vec::new();
    for (i, wallet) in wallets.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(spacing).await;
        }
        match fetch_with_retry(api, wallet, retry).await {
            Ok(batch) => raws.extend(batch),
            Err(e) => warn!("{e}; skipping wallet for this cycle"),
        }
    }

    ingest_and_alert(engine, &raws, store, notifier).await;
    Ok(())
}

/// Webhook-mode cycle: the Fetching phase is replaced by draining the
/// inbound queue of pre-validated payloads accumulated since last cycle.
pub async fn webhook_cycle(
    engine: &mut AggregationEngine,
    queue: &mut mpsc::Receiver<RawSwap>,
    store: &mut JsonStore,
    notifier: &dyn Notifier,
) -> Result<()> {
    if !engine.alerts_enabled {
        debug!("Alerts disabled, skipping cycle");
        return Ok(());
    }

    let mut raws = Vec::new();
    while let Ok(raw) = queue.try_recv() {
        raws.push(raw);
    }

    ingest_and_alert(engine, &raws, store, notifier).await;
    Ok(())
}

/// Shared Normalizing → Evicting → Detecting → Notifying tail.
async fn ingest_and_alert(
    engine: &mut AggregationEngine,
    raws: &[RawSwap],
    store: &mut JsonStore,
    notifier: &dyn Notifier,
) {
    let recorded = engine.ingest(raws, store);
    let now = Utc::now();
    let candidates = engine.run_detection(now);
    info!(
        "Cycle: {} payload(s), {recorded} new event(s), {} in window, {} alert(s) due",
        raws.len(),
        engine.window_len(),
        candidates.len()
    );

    for candidate in &candidates {
        let message = render_alert(candidate, engine.settings.window_hours);
        if let Err(e) = notifier.notify(&message).await {
            // Left unmarked on purpose: the candidate is retried next cycle.
            warn!("Failed to deliver alert for {}: {e}", candidate.token);
            continue;
        }
        engine.mark_alerted(candidate);
        info!(
            "Multi {} alert: {} wallets on {} (total {})",
            candidate.side.label(),
            candidate.wallets.len(),
            candidate.token,
            candidate.total_amount
        );
        if let Err(e) = store.append_alert(AlertRecord::from_candidate(candidate)) {
            warn!("{e}; suppression state will not survive a restart");
        }
    }
}

async fn fetch_with_retry(
    api: &SwapsApi,
    wallet: &str,
    policy: RetryPolicy,
) -> Result<Vec<RawSwap>, TrackerError> {
    let mut attempt = 0;
    loop {
        match api.fetch_swaps(wallet).await {
            Ok(batch) => return Ok(batch),
            Err(source) => match policy.backoff(attempt) {
                Some(delay) => {
                    warn!(
                        "Fetch attempt {} for {wallet} failed: {source}; retrying in {delay:?}",
                        attempt + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    return Err(TrackerError::TransientFetch {
                        wallet: wallet.to_string(),
                        source,
                    });
                }
            },
        }
    }
}
