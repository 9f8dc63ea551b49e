use thiserror::Error;

/// Core error taxonomy. No variant aborts an aggregation cycle on its own;
/// callers log and continue per the propagation policy in the engine.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Upstream payload that cannot be turned into a `TradeEvent`
    /// (missing address, unparsable amount or timestamp).
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Network or rate-limit failure fetching swaps for a wallet after the
    /// retry budget was exhausted; the wallet is skipped for the cycle.
    #[error("transient fetch failure for {wallet}: {source}")]
    TransientFetch {
        wallet: String,
        #[source]
        source: reqwest::Error,
    },

    /// Inbound webhook rejected at the boundary (bad or missing signature).
    /// Signature verification itself lives outside the core.
    #[error("webhook authentication failed: {0}")]
    Authentication(String),

    /// Best-effort persistence write failed. In-memory state stays
    /// authoritative for the current process; a restart may permit one
    /// duplicate alert.
    #[error("persistence write failed: {0}")]
    PersistenceWrite(String),
}
