use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use solana_multibuy::api::SwapsApi;
use solana_multibuy::config::{AppConfig, CONFIG_PATH, Secrets};
use solana_multibuy::engine::{self, AggregationEngine};
use solana_multibuy::notifier::TelegramNotifier;
use solana_multibuy::store::JsonStore;
use solana_multibuy::types::{TrackedToken, TrackedWallet};

#[derive(Parser)]
#[command(name = "multibuy", about = "Solana multi-buy/multi-sell wallet tracker")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: String,

    /// Directory holding the JSON state files
    #[arg(long, default_value = ".")]
    data_dir: String,

    /// Add a wallet to the tracked set and exit
    #[arg(long, num_args = 2, value_names = ["ADDRESS", "NAME"])]
    add_wallet: Option<Vec<String>>,

    /// Remove a wallet from the tracked set and exit
    #[arg(long, value_name = "ADDRESS")]
    remove_wallet: Option<String>,

    /// List tracked wallets and exit
    #[arg(long)]
    list_wallets: bool,

    /// Add a token address to the tracked-token filter and exit
    #[arg(long, value_name = "ADDRESS")]
    track_token: Option<String>,

    /// Remove a token address from the tracked-token filter and exit
    #[arg(long, value_name = "ADDRESS")]
    untrack_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load(Path::new(&args.config))?;
    let mut store = JsonStore::open(&args.data_dir)?;

    // Registry maintenance commands run and exit before any polling starts.
    if let Some(pair) = &args.add_wallet {
        let (address, name) = (&pair[0], &pair[1]);
        store.add_wallet(TrackedWallet::new(address, name))?;
        info!("Added wallet {name} ({address})");
        return Ok(());
    }
    if let Some(address) = &args.remove_wallet {
        if store.remove_wallet(address)? {
            info!("Removed wallet {address}");
        } else {
            warn!("Wallet {address} was not tracked");
        }
        return Ok(());
    }
    if args.list_wallets {
        let mut count = 0;
        for wallet in store.wallets() {
            println!("{} ({})", wallet.name, wallet.address);
            count += 1;
        }
        if count == 0 {
            println!("No wallets are being tracked.");
        }
        return Ok(());
    }
    if let Some(address) = &args.track_token {
        store.add_token(TrackedToken::new(address))?;
        info!("Now tracking token {address}");
        return Ok(());
    }
    if let Some(address) = &args.untrack_token {
        if store.remove_token(address)? {
            info!("Stopped tracking token {address}");
        } else {
            warn!("Token {address} was not tracked");
        }
        return Ok(());
    }

    let secrets = Secrets::from_env()?;
    let api = SwapsApi::new(secrets.moralis_api_key);
    let notifier = TelegramNotifier::new(secrets.telegram_bot_token, secrets.telegram_chat_ids);

    let settings = config.settings.clone();
    let mut engine = AggregationEngine::new(settings.clone());
    engine.restore(&store);

    info!(
        "Starting tracker — {} wallet(s), window={}h threshold={} poll={}s",
        store.active_wallet_addresses().len(),
        settings.window_hours,
        settings.min_wallets_threshold,
        settings.poll_interval_secs,
    );
    if store.active_wallet_addresses().is_empty() {
        warn!("No active wallets; add one with --add-wallet ADDRESS NAME");
    }

    let poll_duration = Duration::from_secs(settings.poll_interval_secs);
    info!("Entering polling loop (interval: {}s). Press Ctrl+C to stop.", settings.poll_interval_secs);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = tokio::time::sleep(poll_duration) => {
                // The cycle runs to completion before the next select arm
                // can fire, so shutdown never interrupts a half-applied cycle.
                if let Err(e) = engine::poll_cycle(&mut engine, &api, &mut store, &notifier).await {
                    warn!("Poll cycle error: {e}");
                }
            }
        }
    }

    Ok(())
}
