use chrono::{TimeZone, Utc};
use nse_oc_signals::{
    analyze_chain, analyze_snapshot, build_chain_rows, format_alert, AggregateSentiment,
    AlertStatus, AnalysisConfig, AnalysisError, BreakoutStrength, MarketHours, OiShift,
    OptionChain, RawStrikeRecord, Side, TradeAction, TradeDecision, Trend,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn records(underlying: f64, data: &[(f64, f64, f64)]) -> Vec<RawStrikeRecord> {
        data.iter()
            .map(|&(strike, ce, pe)| RawStrikeRecord::new(strike, underlying, ce, pe))
            .collect()
    }

    #[test]
    fn test_reference_scenario() {
        let recs = records(
            24987.0,
            &[
                (24900.0, 500.0, 200.0),
                (24950.0, 300.0, 800.0),
                (25000.0, 900.0, 100.0),
                (25050.0, 200.0, 150.0),
            ],
        );
        let cfg = AnalysisConfig::default();
        let report = analyze_snapshot("NIFTY", "16-Oct-2026 10:00:00", &recs, &cfg).unwrap();

        assert_eq!(report.atm_strike, 25000.0);
        assert_eq!(report.near_rows.len(), 4);

        let row = report.near_rows.iter().find(|r| r.strike() == 24950.0).unwrap();
        assert_eq!(row.put_call_ratio, 2.67);
        assert_eq!(row.trend, Trend::Uptrend);
        assert_eq!(row.oi_shift, OiShift::SupportUp);
        assert_eq!(row.breakout_strength, BreakoutStrength::Low);
        assert_eq!(row.trade_action, TradeAction::Avoid);

        // 24950 is not a trade, but 25050 (pcr 0.75, imbalance 50/351) is a put
        let actionable: Vec<f64> = report
            .near_rows
            .iter()
            .filter(|r| r.actionable)
            .map(|r| r.strike())
            .collect();
        assert_eq!(actionable, vec![25050.0]);

        let rec = report.decision.recommendation().copied().unwrap();
        assert_eq!(rec.side, Side::Put);
        assert_eq!(rec.entry, 25050.0);
        assert_eq!(rec.stop, 25090.0);
        assert_eq!(rec.target, 24970.0);

        assert_eq!(report.summary.max_call_oi_strike, Some(25000.0));
        assert_eq!(report.summary.max_put_oi_strike, Some(24950.0));
    }

    #[test]
    fn test_scenario_with_buy_call() {
        let recs = records(
            24987.0,
            &[
                (24900.0, 500.0, 200.0),
                (24950.0, 440.0, 550.0),
                (25000.0, 900.0, 100.0),
                // outside the 300 window
                (25400.0, 1000.0, 1300.0),
            ],
        );
        let cfg = AnalysisConfig::default();
        let report = analyze_snapshot("NIFTY", "", &recs, &cfg).unwrap();

        assert_eq!(report.total_strikes, 4);
        assert_eq!(report.near_rows.len(), 3);

        let rec = report.decision.recommendation().copied().unwrap();
        assert_eq!(rec.side, Side::Call);
        assert_eq!(rec.entry, 24950.0);
        assert_eq!(rec.stop, 24910.0);
        assert_eq!(rec.target, 25030.0);

        let open = Utc.with_ymd_and_hms(2026, 10, 16, 5, 0, 0).unwrap();
        match format_alert(&report.decision, report.underlying, open, &MarketHours::default()) {
            AlertStatus::Ready(p) => {
                assert_eq!(p.subject, "Option Chain Alert: CE BUY 24950");
                assert!(p.body.contains("CMP: 24987"));
            }
            other => panic!("expected payload, got {:?}", other),
        }

        // 16:30 IST
        let closed = Utc.with_ymd_and_hms(2026, 10, 16, 11, 0, 0).unwrap();
        assert_eq!(
            format_alert(&report.decision, report.underlying, closed, &MarketHours::default()),
            AlertStatus::MarketClosed
        );
    }

    #[test]
    fn test_builder_keeps_later_duplicate() {
        let recs = records(25010.0, &[(25000.0, 10.0, 20.0), (25000.0, 30.0, 40.0)]);
        let rows = build_chain_rows(&recs, &AnalysisConfig::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].call_open_interest, 30);
        assert_eq!(rows[0].put_open_interest, 40);
    }

    #[test]
    fn test_zero_call_window_reports_undefined() {
        let recs = records(25000.0, &[(24950.0, 0.0, 500.0), (25000.0, 0.0, 700.0)]);
        let report = analyze_snapshot("NIFTY", "", &recs, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.summary.aggregate_ratio, None);
        assert_eq!(report.summary.aggregate_sentiment, AggregateSentiment::Undefined);
        assert!(report.near_rows.iter().all(|r| r.put_call_ratio == 0.0));
        assert_eq!(report.decision, TradeDecision::NoTrade);
    }

    #[test]
    fn test_malformed_snapshot_has_no_partial_result() {
        let err = analyze_snapshot("NIFTY", "", &[], &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_snapshot_with_no_strike_on_grid_is_malformed() {
        let recs = records(24987.0, &[(24975.0, 100.0, 100.0), (25025.0, 100.0, 100.0)]);
        let err = analyze_snapshot("NIFTY", "", &recs, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_wider_interval_from_config() {
        let cfg = AnalysisConfig { strike_interval: 100.0, ..AnalysisConfig::default() };
        let recs = records(
            48120.0,
            &[(48050.0, 1.0, 1.0), (48100.0, 2.0, 2.0), (48200.0, 3.0, 3.0)],
        );
        let report = analyze_snapshot("BANKNIFTY", "", &recs, &cfg).unwrap();
        assert_eq!(report.total_strikes, 2);
        assert_eq!(report.atm_strike, 48100.0);
    }

    #[test]
    fn test_analyze_nse_payload() {
        let json = r#"{
            "records": {
                "timestamp": "16-Oct-2026 11:30:00",
                "underlyingValue": "25010.5",
                "data": [
                    {"strikePrice": 25000, "CE": {"openInterest": 1000}, "PE": {"openInterest": 850}},
                    {"strikePrice": 25025, "CE": {"openInterest": 5}},
                    {"strikePrice": 25050, "PE": {"openInterest": 90}}
                ]
            }
        }"#;
        let chain: OptionChain = serde_json::from_str(json).unwrap();
        let report = analyze_chain("NIFTY", &chain, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.timestamp, "16-Oct-2026 11:30:00");
        assert_eq!(report.underlying, 25010.5);
        assert_eq!(report.total_strikes, 2);

        let rec = report.decision.recommendation().copied().unwrap();
        assert_eq!(rec.side, Side::Put);
        assert_eq!(rec.stop, 25040.0);
        assert_eq!(rec.target, 24920.0);

        // report is handed to presentation as JSON
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["decision"]["status"], "recommend");
        assert_eq!(value["near_rows"][0]["strike"], 25000.0);
    }
}
