pub mod alert;
pub mod analyzer;
pub mod api_server;
pub mod builder;
pub mod classifier;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod nse_client;
pub mod selector;
pub mod summary;

// Re-exports for convenience
pub use alert::{format_alert, AlertPayload, AlertSink, AlertStatus, MarketHours};
pub use analyzer::{analyze_chain, analyze_snapshot, AnalysisReport};
pub use builder::build_chain_rows;
pub use classifier::{
    classify_row, classify_rows, BreakoutStrength, ClassifiedRow, OiShift, Sentiment, TradeAction,
    Trend,
};
pub use config::{AlertConfig, AnalysisConfig};
pub use error::AnalysisError;
pub use models::{ChainRow, OiLeg, OptionChain, PriceField, RawStrikeRecord};
pub use nse_client::OptionChainClient;
pub use selector::{
    atm_strike, near_rows, rank_candidates, select_trade, Recommendation, Side, TradeCandidate,
    TradeDecision,
};
pub use summary::{aggregate_ratio, summarize, AggregateSentiment, ChainSummary};
