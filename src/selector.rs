use crate::classifier::{BreakoutStrength, ClassifiedRow, OiShift, TradeAction, Trend};
use crate::config::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Call,
    Put,
}

impl Side {
    /// Exchange label ("CE" / "PE")
    pub fn label(self) -> &'static str {
        match self {
            Side::Call => "CE",
            Side::Put => "PE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    pub row: ClassifiedRow,
    pub score: u8,
}

impl TradeCandidate {
    pub fn new(row: ClassifiedRow) -> Self {
        Self { score: row.breakout_strength.score(), row }
    }

    fn side(&self) -> Side {
        match self.row.trade_action {
            TradeAction::BuyPut => Side::Put,
            _ => Side::Call,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub side: Side,
    pub strike: f64,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub trend: Trend,
    pub breakout_strength: BreakoutStrength,
    pub oi_shift: OiShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TradeDecision {
    /// Nothing actionable inside the window
    NoTrade,
    /// Top candidate failed re-validation: flagged, but not alert-worthy
    WeakSignal { candidate: TradeCandidate },
    Recommend(Recommendation),
}

impl TradeDecision {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            TradeDecision::Recommend(rec) => Some(rec),
            _ => None,
        }
    }
}

/// Nearest strike on the grid. Halves round away from zero.
pub fn atm_strike(price: f64, interval: f64) -> f64 {
    (price / interval).round() * interval
}

pub fn is_atm(strike: f64, atm: f64, epsilon: f64) -> bool {
    (strike - atm).abs() < epsilon
}

/// Rows with strike in `[price - window, price + window]`
pub fn near_rows(rows: &[ClassifiedRow], price: f64, window: f64) -> Vec<ClassifiedRow> {
    let (lo, hi) = (price - window, price + window);
    rows.iter()
        .filter(|r| r.strike() >= lo && r.strike() <= hi)
        .copied()
        .collect()
}

/// Actionable rows ordered best first: score desc, put/call ratio desc, strike asc
pub fn rank_candidates(near: &[ClassifiedRow]) -> Vec<TradeCandidate> {
    let mut candidates: Vec<TradeCandidate> = near
        .iter()
        .filter(|r| r.actionable)
        .copied()
        .map(TradeCandidate::new)
        .collect();

    candidates.sort_by(compare_candidates);
    candidates
}

fn compare_candidates(a: &TradeCandidate, b: &TradeCandidate) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.row.put_call_ratio.total_cmp(&a.row.put_call_ratio))
        .then_with(|| a.row.strike().total_cmp(&b.row.strike()))
}

/// Exact buy predicate for a side, checked independently of `trade_action`
fn confirms(side: Side, row: &ClassifiedRow) -> bool {
    match side {
        Side::Call => {
            row.trend == Trend::Uptrend
                && row.breakout_strength == BreakoutStrength::High
                && row.oi_shift == OiShift::SupportUp
        }
        Side::Put => {
            row.trend == Trend::Downtrend
                && row.breakout_strength == BreakoutStrength::High
                && row.oi_shift == OiShift::ResistanceDown
        }
    }
}

/// Pick at most one trade near `price` from already-classified rows.
pub fn select_trade(rows: &[ClassifiedRow], price: f64, cfg: &AnalysisConfig) -> TradeDecision {
    let near = near_rows(rows, price, cfg.price_window);
    select_from_near(&near, cfg)
}

pub(crate) fn select_from_near(near: &[ClassifiedRow], cfg: &AnalysisConfig) -> TradeDecision {
    let Some(best) = rank_candidates(near).into_iter().next() else {
        return TradeDecision::NoTrade;
    };

    decide(best, cfg)
}

/// Re-validate the chosen candidate and attach levels.
pub fn decide(candidate: TradeCandidate, cfg: &AnalysisConfig) -> TradeDecision {
    let side = candidate.side();
    let row = &candidate.row;

    // Ranking only sees actionable rows, so this should always hold. Kept as a
    // second gate between the classifier and anything that sends an alert.
    if !confirms(side, row) {
        tracing::warn!(
            strike = row.strike(),
            action = ?row.trade_action,
            "Top candidate failed re-validation"
        );
        return TradeDecision::WeakSignal { candidate };
    }

    let strike = row.strike();
    let (stop, target) = match side {
        Side::Call => (strike - cfg.stop_offset, strike + cfg.target_offset),
        Side::Put => (strike + cfg.stop_offset, strike - cfg.target_offset),
    };

    TradeDecision::Recommend(Recommendation {
        side,
        strike,
        entry: strike,
        stop,
        target,
        trend: row.trend,
        breakout_strength: row.breakout_strength,
        oi_shift: row.oi_shift,
    })
}
