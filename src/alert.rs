use crate::config::AlertConfig;
use crate::selector::{Side, TradeDecision};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

const IST_OFFSET_MINUTES: i32 = 5 * 60 + 30;

/// Trading session in the exchange's fixed UTC offset. Both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub utc_offset_minutes: i32,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or_default(),
            utc_offset_minutes: IST_OFFSET_MINUTES,
        }
    }
}

impl MarketHours {
    /// `minutes` east of UTC as an offset, or None outside ±24h
    pub fn fixed_offset(minutes: i32) -> Option<FixedOffset> {
        minutes.checked_mul(60).and_then(FixedOffset::east_opt)
    }

    /// Configured offset. An out-of-range value falls back to IST.
    pub fn offset(&self) -> FixedOffset {
        Self::fixed_offset(self.utc_offset_minutes)
            .or_else(|| Self::fixed_offset(IST_OFFSET_MINUTES))
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.offset()).time();
        self.open <= local && local <= self.close
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub subject: String,
    pub body: String,
    pub side: Side,
    pub entry: f64,
    pub target: f64,
    pub stop: f64,
    pub underlying: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertStatus {
    Ready(AlertPayload),
    /// Recommendation exists but the session is closed
    MarketClosed,
    /// Trade flagged but failed re-validation
    NotWorthy,
    NoTrade,
}

/// Build the alert for a decision, gated on market hours.
pub fn format_alert(
    decision: &TradeDecision,
    underlying: f64,
    now: DateTime<Utc>,
    hours: &MarketHours,
) -> AlertStatus {
    let rec = match decision {
        TradeDecision::NoTrade => return AlertStatus::NoTrade,
        TradeDecision::WeakSignal { .. } => return AlertStatus::NotWorthy,
        TradeDecision::Recommend(rec) => rec,
    };

    if !hours.is_open(now) {
        return AlertStatus::MarketClosed;
    }

    let side = rec.side.label();
    AlertStatus::Ready(AlertPayload {
        subject: format!("Option Chain Alert: {} BUY {}", side, rec.strike),
        body: format!(
            "Trade Signal: {} Buy @ {}\nTarget: {}\nStop: {}\nCMP: {}",
            side, rec.entry, rec.target, rec.stop, underlying
        ),
        side: rec.side,
        entry: rec.entry,
        target: rec.target,
        stop: rec.stop,
        underlying,
    })
}

/// Delivery seam for alert payloads
pub trait AlertSink {
    fn deliver(
        &self,
        payload: &AlertPayload,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Writes alerts to the log only
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    async fn deliver(&self, payload: &AlertPayload) -> Result<()> {
        tracing::info!(subject = %payload.subject, body = %payload.body, "Trade alert");
        Ok(())
    }
}

/// Posts alerts as JSON to a webhook (mail relay, chat bot, ...)
pub struct WebhookAlertSink {
    client: reqwest::Client,
    url: String,
    recipient: Option<String>,
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    subject: &'a str,
    text: &'a str,
}

impl WebhookAlertSink {
    pub fn new(url: String, recipient: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(crate::config::HTTP_TIMEOUT)
            .build()
            .context("Failed to build webhook client")?;
        Ok(Self { client, url, recipient })
    }
}

impl AlertSink for WebhookAlertSink {
    async fn deliver(&self, payload: &AlertPayload) -> Result<()> {
        let body = WebhookBody {
            to: self.recipient.as_deref(),
            subject: &payload.subject,
            text: &payload.body,
        };

        let res = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("Alert webhook request failed")?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("Alert webhook returned {}", status);
        }
        tracing::info!(subject = %payload.subject, "Alert delivered via webhook");
        Ok(())
    }
}

/// Webhook when configured, otherwise the log
pub enum ConfiguredSink {
    Log(LogAlertSink),
    Webhook(WebhookAlertSink),
}

impl ConfiguredSink {
    pub fn from_config(cfg: &AlertConfig) -> Result<Self> {
        match &cfg.webhook_url {
            Some(url) => {
                let sink = WebhookAlertSink::new(url.clone(), cfg.recipient.clone())?;
                Ok(Self::Webhook(sink))
            }
            None => Ok(Self::Log(LogAlertSink)),
        }
    }
}

impl AlertSink for ConfiguredSink {
    async fn deliver(&self, payload: &AlertPayload) -> Result<()> {
        match self {
            Self::Log(sink) => sink.deliver(payload).await,
            Self::Webhook(sink) => sink.deliver(payload).await,
        }
    }
}

/// Format and, when ready, hand the alert to `sink`. Delivery failures are
/// logged and do not fail the pass.
pub async fn dispatch<S: AlertSink>(
    sink: &S,
    decision: &TradeDecision,
    underlying: f64,
    now: DateTime<Utc>,
    hours: &MarketHours,
) -> AlertStatus {
    let status = format_alert(decision, underlying, now, hours);
    match &status {
        AlertStatus::Ready(payload) => {
            if let Err(e) = sink.deliver(payload).await {
                tracing::warn!(error = %e, "Alert delivery failed");
            }
        }
        AlertStatus::MarketClosed => tracing::info!("Market closed. Alert skipped."),
        AlertStatus::NotWorthy => tracing::info!("Trade is valid but not strong enough to alert."),
        AlertStatus::NoTrade => tracing::debug!("No trade near CMP, nothing to alert."),
    }
    status
}
