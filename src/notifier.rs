use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::RoundingStrategy;
use tracing::warn;

use crate::TELEGRAM_API_BASE;
use crate::types::{Candidate, Side};

/// Render the alert message for a candidate.
///
/// Format is fixed; downstream consumers parse these messages.
pub fn render_alert(candidate: &Candidate, window_hours: u64) -> String {
    let (emoji, kind, verb) = match candidate.side {
        Side::Buy => ("🟢", "Buy", "bought"),
        Side::Sell => ("🔴", "Sell", "sold"),
    };
    let total = candidate
        .total_amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!(
        "{emoji} Multi {kind} Alert!\n{count} wallets {verb} {symbol} in the last {window_hours} hours!\nTotal: {total:.2} SOL\n{address}",
        count = candidate.wallets.len(),
        symbol = candidate.token_symbol,
        address = candidate.token,
    )
}

/// Delivery side of alerting. The engine decides *that* and *what* to
/// notify; implementations decide how it reaches the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Sends alerts through the Telegram Bot API (`sendMessage`).
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_ids: Vec<String>,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_ids: Vec<String>) -> Self {
        Self {
            client: Client::new(),
            bot_token: bot_token.into(),
            chat_ids,
            base_url: TELEGRAM_API_BASE.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Deliver to every configured chat. A failed chat is logged and the
    /// rest still go out; only total failure is an error.
    async fn notify(&self, message: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let mut delivered = 0usize;
        for chat_id in &self.chat_ids {
            let sent = self
                .client
                .post(&url)
                .form(&[("chat_id", chat_id.as_str()), ("text", message)])
                .send()
                .await
                .and_then(|resp| resp.error_for_status());
            match sent {
                Ok(_) => delivered += 1,
                Err(e) => warn!("Failed to deliver alert to chat {chat_id}: {e}"),
            }
        }
        if delivered == 0 && !self.chat_ids.is_empty() {
            anyhow::bail!("alert delivery failed for all {} chats", self.chat_ids.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn candidate(side: Side, wallets: &[&str], total: rust_decimal::Decimal) -> Candidate {
        Candidate {
            token: "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string(),
            token_symbol: "BONK".to_string(),
            side,
            wallets: wallets.iter().map(|w| w.to_string()).collect(),
            total_amount: total,
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn buy_alert_matches_expected_format() {
        let c = candidate(Side::Buy, &["a", "b", "c"], dec!(3.0));
        assert_eq!(
            render_alert(&c, 6),
            "🟢 Multi Buy Alert!\n\
             3 wallets bought BONK in the last 6 hours!\n\
             Total: 3.00 SOL\n\
             7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"
        );
    }

    #[test]
    fn sell_alert_uses_red_and_sold() {
        let c = candidate(Side::Sell, &["a", "b"], dec!(12.345));
        assert_eq!(
            render_alert(&c, 6),
            "🔴 Multi Sell Alert!\n\
             2 wallets sold BONK in the last 6 hours!\n\
             Total: 12.35 SOL\n\
             7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"
        );
    }

    #[test]
    fn window_hours_follows_config() {
        let c = candidate(Side::Buy, &["a", "b"], dec!(1.0));
        assert!(render_alert(&c, 12).contains("in the last 12 hours!"));
    }
}
