use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::TrackerError;
use crate::types::{AlertRecord, TrackedToken, TrackedWallet};

pub const WALLETS_FILE: &str = "wallets.json";
pub const TRACKED_TOKENS_FILE: &str = "tracked_tokens.json";
pub const ALERTS_FILE: &str = "alerts.json";

/// JSON-file backed storage for the wallet registry, tracked-token filter,
/// and alert history.
///
/// Files are read once at startup and rewritten whole on mutation
/// (write-through, last writer wins). The in-memory copy is authoritative;
/// write failures surface as `PersistenceWrite` and callers decide whether
/// that is fatal (for alert history it never is).
pub struct JsonStore {
    dir: PathBuf,
    wallets: BTreeMap<String, TrackedWallet>,
    tokens: BTreeMap<String, TrackedToken>,
    alerts: Vec<AlertRecord>,
}

impl JsonStore {
    /// Open the store rooted at `dir`, loading any existing state files.
    /// Missing files yield empty registries; unreadable or corrupt files
    /// are an error (unrecoverable storage corruption is fatal at startup).
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let wallets = load_or_default(&dir.join(WALLETS_FILE))?;
        let tokens = load_or_default(&dir.join(TRACKED_TOKENS_FILE))?;
        let alerts = load_or_default(&dir.join(ALERTS_FILE))?;
        Ok(Self {
            dir,
            wallets,
            tokens,
            alerts,
        })
    }

    // ── wallet registry ────────────────────────────────────────────

    pub fn wallets(&self) -> impl Iterator<Item = &TrackedWallet> {
        self.wallets.values()
    }

    /// Addresses that participate in polling, in stable order.
    pub fn active_wallet_addresses(&self) -> Vec<String> {
        self.wallets
            .values()
            .filter(|w| w.active)
            .map(|w| w.address.clone())
            .collect()
    }

    /// Display name for an address, falling back to the address itself.
    pub fn wallet_name<'a>(&'a self, address: &'a str) -> &'a str {
        self.wallets
            .get(address)
            .map(|w| w.name.as_str())
            .unwrap_or(address)
    }

    pub fn add_wallet(&mut self, wallet: TrackedWallet) -> Result<(), TrackerError> {
        self.wallets.insert(wallet.address.clone(), wallet);
        self.write_wallets()
    }

    /// Remove a wallet; returns whether it was tracked.
    pub fn remove_wallet(&mut self, address: &str) -> Result<bool, TrackerError> {
        if self.wallets.remove(address).is_none() {
            return Ok(false);
        }
        self.write_wallets()?;
        Ok(true)
    }

    // ── tracked-token filter ───────────────────────────────────────

    pub fn tracked_tokens(&self) -> &BTreeMap<String, TrackedToken> {
        &self.tokens
    }

    pub fn add_token(&mut self, token: TrackedToken) -> Result<(), TrackerError> {
        self.tokens.insert(token.address.clone(), token);
        self.write_tokens()
    }

    pub fn remove_token(&mut self, address: &str) -> Result<bool, TrackerError> {
        if self.tokens.remove(address).is_none() {
            return Ok(false);
        }
        self.write_tokens()?;
        Ok(true)
    }

    // ── alert history ──────────────────────────────────────────────

    pub fn alerts(&self) -> &[AlertRecord] {
        &self.alerts
    }

    /// Append an emitted alert (best-effort write-through).
    pub fn append_alert(&mut self, record: AlertRecord) -> Result<(), TrackerError> {
        self.alerts.push(record);
        write_json(&self.dir.join(ALERTS_FILE), &self.alerts)
    }

    fn write_wallets(&self) -> Result<(), TrackerError> {
        write_json(&self.dir.join(WALLETS_FILE), &self.wallets)
    }

    fn write_tokens(&self) -> Result<(), TrackerError> {
        write_json(&self.dir.join(TRACKED_TOKENS_FILE), &self.tokens)
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TrackerError> {
    let contents = serde_json::to_string_pretty(value)
        .map_err(|e| TrackerError::PersistenceWrite(format!("{}: {e}", path.display())))?;
    fs::write(path, contents)
        .map_err(|e| TrackerError::PersistenceWrite(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn open_empty_dir_yields_empty_registries() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        assert_eq!(store.wallets().count(), 0);
        assert!(store.tracked_tokens().is_empty());
        assert!(store.alerts().is_empty());
    }

    #[test]
    fn wallet_add_remove_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = JsonStore::open(dir.path()).unwrap();
            store
                .add_wallet(TrackedWallet::new("Wallet1", "alice"))
                .unwrap();
            store
                .add_wallet(TrackedWallet::new("Wallet2", "bob"))
                .unwrap();
            assert!(store.remove_wallet("Wallet2").unwrap());
            assert!(!store.remove_wallet("Wallet2").unwrap());
        }
        let store = JsonStore::open(dir.path()).unwrap();
        assert_eq!(store.active_wallet_addresses(), vec!["Wallet1"]);
        assert_eq!(store.wallet_name("Wallet1"), "alice");
        assert_eq!(store.wallet_name("unknown"), "unknown");
    }

    #[test]
    fn inactive_wallets_are_excluded_from_polling() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(dir.path()).unwrap();
        let mut wallet = TrackedWallet::new("Wallet1", "alice");
        wallet.active = false;
        store.add_wallet(wallet).unwrap();
        assert!(store.active_wallet_addresses().is_empty());
    }

    #[test]
    fn tokens_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = JsonStore::open(dir.path()).unwrap();
            store.add_token(TrackedToken::new("TokenX")).unwrap();
        }
        let store = JsonStore::open(dir.path()).unwrap();
        assert!(store.tracked_tokens().contains_key("TokenX"));
    }

    #[test]
    fn alert_history_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let record = AlertRecord {
            token: "TokenX".to_string(),
            side: Side::Buy,
            wallets: ["a", "b", "c"].iter().map(|s| s.to_string()).collect(),
            total_amount: dec!(3.5),
            emitted_at: Utc::now(),
        };
        {
            let mut store = JsonStore::open(dir.path()).unwrap();
            store.append_alert(record.clone()).unwrap();
        }
        let store = JsonStore::open(dir.path()).unwrap();
        assert_eq!(store.alerts().len(), 1);
        assert_eq!(store.alerts()[0].token, "TokenX");
        assert_eq!(store.alerts()[0].total_amount, dec!(3.5));
    }

    #[test]
    fn corrupt_state_file_is_fatal_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(WALLETS_FILE), "{not json").unwrap();
        assert!(JsonStore::open(dir.path()).is_err());
    }
}
