use crate::builder::build_chain_rows;
use crate::classifier::{classify_rows, ClassifiedRow};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::models::{OptionChain, RawStrikeRecord};
use crate::selector::{atm_strike, near_rows, select_from_near, TradeDecision};
use crate::summary::{summarize, ChainSummary};
use serde::{Deserialize, Serialize};

/// Everything derived from one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub timestamp: String,
    pub underlying: f64,
    pub atm_strike: f64,
    pub total_strikes: usize,
    pub near_rows: Vec<ClassifiedRow>,
    pub summary: ChainSummary,
    pub decision: TradeDecision,
}

/// Build, classify, window, summarize and select in one pass.
pub fn analyze_snapshot(
    symbol: &str,
    timestamp: &str,
    records: &[RawStrikeRecord],
    cfg: &AnalysisConfig,
) -> Result<AnalysisReport> {
    let rows = build_chain_rows(records, cfg)?;
    let Some(underlying) = rows.first().map(|r| r.underlying_price) else {
        return Err(AnalysisError::MalformedSnapshot(
            "no strikes on the interval grid".to_string(),
        ));
    };

    let classified = classify_rows(&rows, cfg);
    let near = near_rows(&classified, underlying, cfg.price_window);
    let summary = summarize(&near, cfg);
    let decision = select_from_near(&near, cfg);

    tracing::info!(
        symbol,
        underlying,
        strikes = rows.len(),
        near = near.len(),
        actionable = near.iter().filter(|r| r.actionable).count(),
        "Snapshot analysed"
    );

    Ok(AnalysisReport {
        symbol: symbol.to_string(),
        timestamp: timestamp.to_string(),
        underlying,
        atm_strike: atm_strike(underlying, cfg.strike_interval),
        total_strikes: rows.len(),
        near_rows: near,
        summary,
        decision,
    })
}

/// Convenience wrapper over a fetched NSE payload
pub fn analyze_chain(
    symbol: &str,
    chain: &OptionChain,
    cfg: &AnalysisConfig,
) -> Result<AnalysisReport> {
    analyze_snapshot(symbol, &chain.records.timestamp, &chain.raw_records(), cfg)
}
