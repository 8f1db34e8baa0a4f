use crate::classifier::{round2, ClassifiedRow};
use crate::config::{AnalysisConfig, SentimentThresholds};
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Chain-wide sentiment. `Undefined` when the window holds no call open interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateSentiment {
    Bullish,
    Bearish,
    Neutral,
    Undefined,
}

impl AggregateSentiment {
    pub fn from_ratio(ratio: f64, th: &SentimentThresholds) -> Self {
        if ratio > th.bullish_above {
            AggregateSentiment::Bullish
        } else if ratio < th.bearish_below {
            AggregateSentiment::Bearish
        } else {
            AggregateSentiment::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSummary {
    /// Resistance: strike with the most call open interest
    pub max_call_oi_strike: Option<f64>,
    /// Support: strike with the most put open interest
    pub max_put_oi_strike: Option<f64>,
    pub aggregate_ratio: Option<f64>,
    pub aggregate_sentiment: AggregateSentiment,
}

/// Σput / Σcall over the window, rounded to 2 dp
pub fn aggregate_ratio(near: &[ClassifiedRow]) -> Result<f64> {
    // u128 holds the sum of any window of u64 open interest
    let (calls, puts) = near.iter().fold((0u128, 0u128), |(c, p), r| {
        (
            c + u128::from(r.row.call_open_interest),
            p + u128::from(r.row.put_open_interest),
        )
    });

    if calls == 0 {
        return Err(AnalysisError::DivisionUndefined);
    }
    Ok(round2(puts as f64 / calls as f64))
}

/// First strike holding the maximum of `key`, in input (ascending) order
fn first_max_strike<F>(near: &[ClassifiedRow], key: F) -> Option<f64>
where
    F: Fn(&ClassifiedRow) -> u64,
{
    let mut best: Option<(&ClassifiedRow, u64)> = None;
    for row in near {
        let value = key(row);
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((row, value));
        }
    }
    best.map(|(row, _)| row.strike())
}

pub fn summarize(near: &[ClassifiedRow], cfg: &AnalysisConfig) -> ChainSummary {
    let (aggregate_ratio, aggregate_sentiment) = match aggregate_ratio(near) {
        Ok(ratio) => (
            Some(ratio),
            AggregateSentiment::from_ratio(ratio, &cfg.aggregate_sentiment),
        ),
        Err(e) => {
            tracing::warn!(rows = near.len(), "{}", e);
            (None, AggregateSentiment::Undefined)
        }
    };

    ChainSummary {
        max_call_oi_strike: first_max_strike(near, |r| r.row.call_open_interest),
        max_put_oi_strike: first_max_strike(near, |r| r.row.put_open_interest),
        aggregate_ratio,
        aggregate_sentiment,
    }
}
