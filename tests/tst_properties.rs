//! Property tests for the per-row classifier and the selector.

use nse_oc_signals::classifier::{oi_imbalance, put_call_ratio};
use nse_oc_signals::config::BreakoutThresholds;
use nse_oc_signals::{
    classify_row, near_rows, rank_candidates, AnalysisConfig, BreakoutStrength, ChainRow,
    Sentiment, Trend,
};
use proptest::prelude::*;

fn arb_oi() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0u64), 0u64..200, 0u64..5_000_000]
}

fn arb_row() -> impl Strategy<Value = ChainRow> {
    (400i64..600, arb_oi(), arb_oi())
        .prop_map(|(step, call, put)| ChainRow::new(step as f64 * 50.0, call, put, 25000.0))
}

proptest! {
    /// No call open interest means a zero ratio, never inf or NaN.
    #[test]
    fn zero_calls_give_zero_ratio(put in arb_oi()) {
        prop_assert_eq!(put_call_ratio(0, put), 0.0);
    }

    #[test]
    fn ratio_and_imbalance_are_finite(call in arb_oi(), put in arb_oi()) {
        prop_assert!(put_call_ratio(call, put).is_finite());
        let imbalance = oi_imbalance(call, put);
        prop_assert!((0.0..1.0).contains(&imbalance));
    }

    /// Trend is always the fixed image of sentiment.
    #[test]
    fn trend_follows_sentiment(row in arb_row()) {
        let c = classify_row(&row, &AnalysisConfig::default());
        let expected = match c.sentiment {
            Sentiment::Bullish => Trend::Uptrend,
            Sentiment::Bearish => Trend::Downtrend,
            Sentiment::Neutral => Trend::Sideways,
        };
        prop_assert_eq!(c.trend, expected);
        prop_assert_eq!(c.actionable, c.trade_action.is_buy());
    }

    /// Higher imbalance never yields a stronger breakout.
    #[test]
    fn breakout_monotonic(a in 0.0..1.0f64, b in 0.0..1.0f64) {
        let th = BreakoutThresholds::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            BreakoutStrength::from_imbalance(lo, &th).score()
                >= BreakoutStrength::from_imbalance(hi, &th).score()
        );
    }

    /// Ranking only returns actionable near rows, best first.
    #[test]
    fn ranking_is_ordered(rows in prop::collection::vec(arb_row(), 0..40)) {
        let cfg = AnalysisConfig::default();
        let classified: Vec<_> = rows.iter().map(|r| classify_row(r, &cfg)).collect();
        let near = near_rows(&classified, 25000.0, cfg.price_window);
        let ranked = rank_candidates(&near);

        prop_assert!(ranked.iter().all(|c| c.row.actionable));
        prop_assert!(ranked.iter().all(|c| (c.row.strike() - 25000.0).abs() <= cfg.price_window));
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].row.put_call_ratio >= pair[1].row.put_call_ratio);
            }
        }
    }
}
