use crate::config::{AnalysisConfig, BreakoutThresholds, SentimentThresholds};
use crate::models::ChainRow;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakoutStrength {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OiShift {
    SupportUp,
    ResistanceDown,
    NoShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeAction {
    BuyCall,
    BuyPut,
    Avoid,
}

impl Sentiment {
    /// First matching rule wins; anything in between is neutral.
    pub fn from_ratio(ratio: f64, th: &SentimentThresholds) -> Self {
        let rules = [
            (ratio > th.bullish_above, Sentiment::Bullish),
            (ratio < th.bearish_below, Sentiment::Bearish),
        ];
        first_match(&rules).unwrap_or(Sentiment::Neutral)
    }
}

impl BreakoutStrength {
    /// Lower imbalance means a more balanced strike and a stronger breakout signal.
    pub fn from_imbalance(imbalance: f64, th: &BreakoutThresholds) -> Self {
        let rules = [
            (imbalance < th.high_below, BreakoutStrength::High),
            (imbalance < th.medium_below, BreakoutStrength::Medium),
        ];
        first_match(&rules).unwrap_or(BreakoutStrength::Low)
    }

    /// Ranking weight of a candidate
    pub fn score(self) -> u8 {
        match self {
            BreakoutStrength::High => 3,
            BreakoutStrength::Medium => 2,
            BreakoutStrength::Low => 1,
        }
    }
}

impl From<Sentiment> for Trend {
    fn from(s: Sentiment) -> Self {
        match s {
            Sentiment::Bullish => Trend::Uptrend,
            Sentiment::Bearish => Trend::Downtrend,
            Sentiment::Neutral => Trend::Sideways,
        }
    }
}

impl OiShift {
    pub fn classify(call_oi: u64, put_oi: u64, min_oi: u64) -> Self {
        let rules = [
            (put_oi > call_oi && put_oi > min_oi, OiShift::SupportUp),
            (call_oi > put_oi && call_oi > min_oi, OiShift::ResistanceDown),
        ];
        first_match(&rules).unwrap_or(OiShift::NoShift)
    }
}

/// (trend, breakout, shift) combinations that trigger a buy
const TRADE_RULES: [(Trend, BreakoutStrength, OiShift, TradeAction); 2] = [
    (Trend::Uptrend, BreakoutStrength::High, OiShift::SupportUp, TradeAction::BuyCall),
    (Trend::Downtrend, BreakoutStrength::High, OiShift::ResistanceDown, TradeAction::BuyPut),
];

impl TradeAction {
    pub fn decide(trend: Trend, breakout: BreakoutStrength, shift: OiShift) -> Self {
        TRADE_RULES
            .iter()
            .find(|(t, b, s, _)| *t == trend && *b == breakout && *s == shift)
            .map(|(_, _, _, action)| *action)
            .unwrap_or(TradeAction::Avoid)
    }

    pub fn is_buy(self) -> bool {
        matches!(self, TradeAction::BuyCall | TradeAction::BuyPut)
    }
}

fn first_match<T: Copy>(rules: &[(bool, T)]) -> Option<T> {
    rules.iter().find(|(hit, _)| *hit).map(|(_, category)| *category)
}

/// A chain row with every derived signal attached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRow {
    #[serde(flatten)]
    pub row: ChainRow,
    pub put_call_ratio: f64,
    pub sentiment: Sentiment,
    pub breakout_strength: BreakoutStrength,
    pub trend: Trend,
    pub oi_shift: OiShift,
    pub trade_action: TradeAction,
    pub actionable: bool,
}

impl ClassifiedRow {
    pub fn strike(&self) -> f64 {
        self.row.strike
    }
}

/// put / call rounded to 2 dp; 0 when there is no call open interest
pub fn put_call_ratio(call_oi: u64, put_oi: u64) -> f64 {
    if call_oi == 0 {
        return 0.0;
    }
    round2(put_oi as f64 / call_oi as f64)
}

/// |call - put| / (call + put + 1)
pub fn oi_imbalance(call_oi: u64, put_oi: u64) -> f64 {
    let diff = call_oi.abs_diff(put_oi) as f64;
    diff / (call_oi as f64 + put_oi as f64 + 1.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Classify a single strike. Pure and total.
pub fn classify_row(row: &ChainRow, cfg: &AnalysisConfig) -> ClassifiedRow {
    let (call_oi, put_oi) = (row.call_open_interest, row.put_open_interest);

    let put_call_ratio = put_call_ratio(call_oi, put_oi);
    let sentiment = Sentiment::from_ratio(put_call_ratio, &cfg.row_sentiment);
    let imbalance = oi_imbalance(call_oi, put_oi);
    let breakout_strength = BreakoutStrength::from_imbalance(imbalance, &cfg.breakout);
    let trend = Trend::from(sentiment);
    let oi_shift = OiShift::classify(call_oi, put_oi, cfg.oi_shift_min);
    let trade_action = TradeAction::decide(trend, breakout_strength, oi_shift);

    ClassifiedRow {
        row: *row,
        put_call_ratio,
        sentiment,
        breakout_strength,
        trend,
        oi_shift,
        trade_action,
        actionable: trade_action.is_buy(),
    }
}

/// Classify every row in parallel, preserving input order
pub fn classify_rows(rows: &[ChainRow], cfg: &AnalysisConfig) -> Vec<ClassifiedRow> {
    rows.par_iter().map(|row| classify_row(row, cfg)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_guarded_and_rounded() {
        assert_eq!(put_call_ratio(0, 500), 0.0);
        assert_eq!(put_call_ratio(0, 0), 0.0);
        assert_eq!(put_call_ratio(300, 800), 2.67);
        assert_eq!(put_call_ratio(900, 100), 0.11);
    }

    #[test]
    fn test_sentiment_boundaries() {
        let th = SentimentThresholds::PER_ROW;
        assert_eq!(Sentiment::from_ratio(1.21, &th), Sentiment::Bullish);
        assert_eq!(Sentiment::from_ratio(1.2, &th), Sentiment::Neutral);
        assert_eq!(Sentiment::from_ratio(0.9, &th), Sentiment::Neutral);
        assert_eq!(Sentiment::from_ratio(0.89, &th), Sentiment::Bearish);
    }

    #[test]
    fn test_breakout_bands() {
        let th = BreakoutThresholds::default();
        assert_eq!(BreakoutStrength::from_imbalance(0.10, &th), BreakoutStrength::High);
        assert_eq!(BreakoutStrength::from_imbalance(0.20, &th), BreakoutStrength::Medium);
        assert_eq!(BreakoutStrength::from_imbalance(0.40, &th), BreakoutStrength::Low);
        assert_eq!(BreakoutStrength::from_imbalance(0.15, &th), BreakoutStrength::Medium);
        assert_eq!(BreakoutStrength::from_imbalance(0.30, &th), BreakoutStrength::Low);
    }

    #[test]
    fn test_all_zero_row() {
        let c = classify_row(&ChainRow::new(25000.0, 0, 0, 25000.0), &AnalysisConfig::default());
        assert_eq!(c.put_call_ratio, 0.0);
        assert_eq!(c.sentiment, Sentiment::Bearish);
        assert_eq!(c.breakout_strength, BreakoutStrength::High);
        assert_eq!(c.oi_shift, OiShift::NoShift);
        assert_eq!(c.trade_action, TradeAction::Avoid);
        assert!(!c.actionable);
    }

    #[test]
    fn test_oi_shift_requires_min_oi() {
        assert_eq!(OiShift::classify(50, 100, 100), OiShift::NoShift);
        assert_eq!(OiShift::classify(50, 101, 100), OiShift::SupportUp);
        assert_eq!(OiShift::classify(101, 50, 100), OiShift::ResistanceDown);
        assert_eq!(OiShift::classify(500, 500, 100), OiShift::NoShift);
    }

    #[test]
    fn test_trade_table() {
        use BreakoutStrength::*;
        let cases = [
            (Trend::Uptrend, High, OiShift::SupportUp, TradeAction::BuyCall),
            (Trend::Downtrend, High, OiShift::ResistanceDown, TradeAction::BuyPut),
            (Trend::Uptrend, Medium, OiShift::SupportUp, TradeAction::Avoid),
            (Trend::Sideways, High, OiShift::SupportUp, TradeAction::Avoid),
        ];
        for (trend, breakout, shift, expected) in cases {
            assert_eq!(TradeAction::decide(trend, breakout, shift), expected);
        }
    }

    #[test]
    fn test_buy_call_row() {
        // pcr 1.25 bullish, imbalance 110/991 ~ 0.11 high, puts dominate
        let row = ChainRow::new(25000.0, 440, 550, 24990.0);
        let c = classify_row(&row, &AnalysisConfig::default());
        assert_eq!(c.put_call_ratio, 1.25);
        assert_eq!(c.trend, Trend::Uptrend);
        assert_eq!(c.breakout_strength, BreakoutStrength::High);
        assert_eq!(c.oi_shift, OiShift::SupportUp);
        assert_eq!(c.trade_action, TradeAction::BuyCall);
        assert!(c.actionable);
    }

    #[test]
    fn test_classify_rows_keeps_order() {
        let rows: Vec<ChainRow> = (0..64)
            .map(|i| ChainRow::new(20000.0 + 50.0 * i as f64, i, 64 - i, 21000.0))
            .collect();
        let classified = classify_rows(&rows, &AnalysisConfig::default());
        assert_eq!(classified.len(), rows.len());
        assert!(classified.iter().zip(&rows).all(|(c, r)| c.row == *r));
    }
}
