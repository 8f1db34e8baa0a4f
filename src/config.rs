use crate::alert::MarketHours;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

// -----------------------------------------------
// NSE API ENDPOINTS
// -----------------------------------------------
pub const NSE_BASE_URL: &str = "https://www.nseindia.com";
pub const NSE_OPTION_CHAIN_REFERER: &str = "https://www.nseindia.com/option-chain";

pub fn nse_option_chain_url(symbol: &str) -> String {
    format!(
        "{}/api/option-chain-indices?symbol={}",
        NSE_BASE_URL,
        urlencoding::encode(symbol)
    )
}

// -----------------------------------------------
// INDICES
// -----------------------------------------------
pub const NSE_INDICES: &[&str] = &["NIFTY", "BANKNIFTY"];

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                               AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/131.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8",
    "en-IN,en;q=0.9",
];

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const WARMUP_TIMEOUT: Duration = Duration::from_secs(5);

// -----------------------------------------------
// SESSION WARMUP
// -----------------------------------------------
pub const WARMUP_DELAY_MS: u64 = 200;

// -----------------------------------------------
// RETRY CONFIG
// -----------------------------------------------
pub const RETRY_BASE_DELAY_MS: u64 = 100;
pub const RETRY_FACTOR: u64 = 2;
pub const RETRY_MAX_DELAY_SECS: u64 = 3;
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// -----------------------------------------------
// HTTP HEADERS
// -----------------------------------------------
pub const HEADER_ACCEPT_JSON: &str = "application/json";
pub const HEADER_ACCEPT_HTML: &str = "text/html";

// -----------------------------------------------
// REFRESH / SERVER
// -----------------------------------------------
pub const DEFAULT_REFRESH_SECS: u64 = 900;
pub const DEFAULT_PORT: u16 = 3001;

// -----------------------------------------------
// ANALYSIS DEFAULTS
// -----------------------------------------------
pub const DEFAULT_STRIKE_INTERVAL: f64 = 50.0;
pub const DEFAULT_PRICE_WINDOW: f64 = 300.0;
pub const DEFAULT_STOP_OFFSET: f64 = 40.0;
pub const DEFAULT_TARGET_OFFSET: f64 = 80.0;
pub const DEFAULT_ATM_EPSILON: f64 = 0.01;
pub const DEFAULT_OI_SHIFT_MIN: u64 = 100;

/// Put/call ratio cut-offs for a sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentThresholds {
    /// Ratio strictly above this is bullish.
    pub bullish_above: f64,
    /// Ratio strictly below this is bearish.
    pub bearish_below: f64,
}

impl SentimentThresholds {
    pub const PER_ROW: Self = Self { bullish_above: 1.2, bearish_below: 0.9 };
    pub const AGGREGATE: Self = Self { bullish_above: 1.2, bearish_below: 0.8 };
}

/// Normalized imbalance cut-offs for breakout strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakoutThresholds {
    pub high_below: f64,
    pub medium_below: f64,
}

impl Default for BreakoutThresholds {
    fn default() -> Self {
        Self { high_below: 0.15, medium_below: 0.30 }
    }
}

/// Tunables for one analysis pass. Passed explicitly; nothing here is global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub strike_interval: f64,
    pub price_window: f64,
    pub stop_offset: f64,
    pub target_offset: f64,
    pub atm_epsilon: f64,
    pub oi_shift_min: u64,
    pub row_sentiment: SentimentThresholds,
    pub aggregate_sentiment: SentimentThresholds,
    pub breakout: BreakoutThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            strike_interval: DEFAULT_STRIKE_INTERVAL,
            price_window: DEFAULT_PRICE_WINDOW,
            stop_offset: DEFAULT_STOP_OFFSET,
            target_offset: DEFAULT_TARGET_OFFSET,
            atm_epsilon: DEFAULT_ATM_EPSILON,
            oi_shift_min: DEFAULT_OI_SHIFT_MIN,
            row_sentiment: SentimentThresholds::PER_ROW,
            aggregate_sentiment: SentimentThresholds::AGGREGATE,
            breakout: BreakoutThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let interval = parse_or(&lookup, "NSE_STRIKE_INTERVAL", d.strike_interval);

        Self {
            strike_interval: if interval > 0.0 { interval } else { d.strike_interval },
            price_window: parse_or(&lookup, "NSE_PRICE_WINDOW", d.price_window),
            stop_offset: parse_or(&lookup, "NSE_STOP_OFFSET", d.stop_offset),
            target_offset: parse_or(&lookup, "NSE_TARGET_OFFSET", d.target_offset),
            atm_epsilon: parse_or(&lookup, "NSE_ATM_EPSILON", d.atm_epsilon),
            oi_shift_min: parse_or(&lookup, "NSE_OI_SHIFT_MIN", d.oi_shift_min),
            row_sentiment: SentimentThresholds {
                bullish_above: parse_or(
                    &lookup,
                    "NSE_ROW_BULLISH_ABOVE",
                    d.row_sentiment.bullish_above,
                ),
                bearish_below: parse_or(
                    &lookup,
                    "NSE_ROW_BEARISH_BELOW",
                    d.row_sentiment.bearish_below,
                ),
            },
            aggregate_sentiment: SentimentThresholds {
                bullish_above: parse_or(
                    &lookup,
                    "NSE_AGG_BULLISH_ABOVE",
                    d.aggregate_sentiment.bullish_above,
                ),
                bearish_below: parse_or(
                    &lookup,
                    "NSE_AGG_BEARISH_BELOW",
                    d.aggregate_sentiment.bearish_below,
                ),
            },
            breakout: BreakoutThresholds {
                high_below: parse_or(&lookup, "NSE_BREAKOUT_HIGH_BELOW", d.breakout.high_below),
                medium_below: parse_or(
                    &lookup,
                    "NSE_BREAKOUT_MEDIUM_BELOW",
                    d.breakout.medium_below,
                ),
            },
        }
    }
}

/// Alert delivery settings. Recipient and webhook come from the environment
/// so that no address or secret lives in the source tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertConfig {
    pub recipient: Option<String>,
    pub webhook_url: Option<String>,
    pub market_hours: MarketHours,
}

impl AlertConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = MarketHours::default();
        let open = parse_time(&lookup, "NSE_MARKET_OPEN").unwrap_or(d.open);
        let close = parse_time(&lookup, "NSE_MARKET_CLOSE").unwrap_or(d.close);
        let offset = parse_or(&lookup, "NSE_MARKET_UTC_OFFSET_MIN", d.utc_offset_minutes);
        let offset = if MarketHours::fixed_offset(offset).is_some() {
            offset
        } else {
            tracing::warn!(
                key = "NSE_MARKET_UTC_OFFSET_MIN",
                value = offset,
                "Ignoring UTC offset outside ±24h"
            );
            d.utc_offset_minutes
        };

        Self {
            recipient: lookup("NSE_ALERT_RECIPIENT").filter(|s| !s.trim().is_empty()),
            webhook_url: lookup("NSE_ALERT_WEBHOOK").filter(|s| !s.trim().is_empty()),
            market_hours: MarketHours { open, close, utc_offset_minutes: offset },
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable config value");
            default
        }),
        None => default,
    }
}

fn parse_time<F>(lookup: &F, key: &str) -> Option<NaiveTime>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
        Ok(t) => Some(t),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable market time, expected HH:MM");
            None
        }
    }
}

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Get the execution mode from environment or default to a single pass
pub fn get_execution_mode() -> String {
    std::env::var("NSE_MODE").unwrap_or_else(|_| "once".to_string())
}

/// Index to analyse
pub fn get_symbol() -> String {
    std::env::var("NSE_SYMBOL").unwrap_or_else(|_| "NIFTY".to_string())
}

pub fn get_port() -> u16 {
    std::env::var("NSE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Seconds between snapshots in watch mode (also the API cache lifetime)
pub fn get_refresh_secs() -> u64 {
    std::env::var("NSE_REFRESH_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(|s| s.max(1))
        .unwrap_or(DEFAULT_REFRESH_SECS)
}

/// Check if running in CI/automated environment
pub fn is_ci_environment() -> bool {
    std::env::var("CI").is_ok() || std::env::var("GITHUB_ACTIONS").is_ok()
}
