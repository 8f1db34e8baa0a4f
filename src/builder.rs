use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::models::{ChainRow, OiLeg, RawStrikeRecord};
use std::collections::BTreeMap;

const STEP_TOLERANCE: f64 = 1e-9;

/// Normalize raw strike records into sorted, unique `ChainRow`s.
///
/// Records off the strike grid are dropped. When a strike repeats, the last
/// record seen wins. The first record's underlying is the snapshot price and
/// is copied onto every row. A snapshot with no strike left on the grid is
/// malformed, so a successful result is never empty.
pub fn build_chain_rows(
    records: &[RawStrikeRecord],
    cfg: &AnalysisConfig,
) -> Result<Vec<ChainRow>> {
    let first = records
        .first()
        .ok_or_else(|| AnalysisError::MalformedSnapshot("no strike records".to_string()))?;

    let underlying = first.underlying_value.parse().ok_or_else(|| {
        AnalysisError::MalformedSnapshot(format!(
            "underlying price {:?} is not a positive number",
            first.underlying_value
        ))
    })?;

    let mut by_step: BTreeMap<i64, ChainRow> = BTreeMap::new();
    let mut off_grid = 0usize;

    for rec in records {
        if rec.underlying_value.parse().is_none() {
            return Err(AnalysisError::MalformedSnapshot(format!(
                "strike {} has unparsable underlying {:?}",
                rec.strike_price, rec.underlying_value
            )));
        }
        if !rec.strike_price.is_finite() {
            return Err(AnalysisError::MalformedSnapshot(format!(
                "non-finite strike {}",
                rec.strike_price
            )));
        }

        let call_oi = leg_open_interest(rec.call, rec.strike_price, "CE")?;
        let put_oi = leg_open_interest(rec.put, rec.strike_price, "PE")?;

        let Some(step) = grid_step(rec.strike_price, cfg.strike_interval) else {
            off_grid += 1;
            continue;
        };

        by_step.insert(step, ChainRow::new(rec.strike_price, call_oi, put_oi, underlying));
    }

    if off_grid > 0 {
        tracing::debug!(
            off_grid,
            interval = cfg.strike_interval,
            "Dropped strikes off the interval grid"
        );
    }

    if by_step.is_empty() {
        return Err(AnalysisError::MalformedSnapshot(format!(
            "no strikes on the {} interval grid",
            cfg.strike_interval
        )));
    }

    Ok(by_step.into_values().collect())
}

/// Index of `strike` on the interval grid, or None when it falls between steps
fn grid_step(strike: f64, interval: f64) -> Option<i64> {
    let steps = strike / interval;
    let rounded = steps.round();
    ((steps - rounded).abs() < STEP_TOLERANCE).then_some(rounded as i64)
}

fn leg_open_interest(leg: Option<OiLeg>, strike: f64, side: &str) -> Result<u64> {
    let oi = leg.map(|l| l.open_interest).unwrap_or(0.0);
    if !oi.is_finite() || oi < 0.0 {
        return Err(AnalysisError::MalformedSnapshot(format!(
            "{} open interest {} at strike {} is invalid",
            side, oi, strike
        )));
    }
    Ok(oi.round() as u64)
}
