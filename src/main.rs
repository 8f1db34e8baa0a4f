use anyhow::Result;
use colored::Colorize;
use nse_oc_signals::alert::{self, AlertStatus, ConfiguredSink};
use nse_oc_signals::config::{self, AlertConfig, AnalysisConfig};
use nse_oc_signals::selector::is_atm;
use nse_oc_signals::{
    analyze_chain, api_server, logging, AggregateSentiment, AnalysisReport, OptionChainClient,
    TradeDecision,
};
use std::time::Duration;

fn banner(title: &str) {
    println!("{}", "=".repeat(60).blue());
    println!("{}", title.green().bold());
    println!("{}", "=".repeat(60).blue());
}

fn print_report(report: &AnalysisReport, cfg: &AnalysisConfig) {
    println!(
        "{} {} CMP: {:.2}  ATM: {}",
        "📌".cyan(),
        report.symbol.yellow(),
        report.underlying,
        report.atm_strike
    );
    println!("{} Snapshot: {} ({} strikes)", "ℹ".blue(), report.timestamp, report.total_strikes);
    println!();

    println!(
        "{:>9} {:>10} {:>10} {:>6}  {:<8} {:<7} {:<10} {:<15} {:<8}",
        "Strike", "CE OI", "PE OI", "PCR", "Signal", "Break", "Trend", "OI Shift", "Trade"
    );
    for r in &report.near_rows {
        let line = format!(
            "{:>9} {:>10} {:>10} {:>6.2}  {:<8} {:<7} {:<10} {:<15} {:<8}",
            r.strike(),
            r.row.call_open_interest,
            r.row.put_open_interest,
            r.put_call_ratio,
            format!("{:?}", r.sentiment),
            format!("{:?}", r.breakout_strength),
            format!("{:?}", r.trend),
            format!("{:?}", r.oi_shift),
            format!("{:?}", r.trade_action),
        );
        if is_atm(r.strike(), report.atm_strike, cfg.atm_epsilon) {
            println!("{}", line.as_str().on_blue());
        } else if r.actionable {
            println!("{}", line.as_str().green());
        } else {
            println!("{}", line);
        }
    }
    println!();

    let s = &report.summary;
    let fmt_strike = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string());
    println!("{}", "Summary".cyan().bold());
    println!("  Max CE OI (Resistance): {}", fmt_strike(s.max_call_oi_strike));
    println!("  Max PE OI (Support):    {}", fmt_strike(s.max_put_oi_strike));
    match (s.aggregate_ratio, s.aggregate_sentiment) {
        (Some(ratio), sentiment) => {
            let label = format!("{:?}", sentiment);
            let label = match sentiment {
                AggregateSentiment::Bullish => label.as_str().green(),
                AggregateSentiment::Bearish => label.as_str().red(),
                _ => label.as_str().yellow(),
            };
            println!("  Total PCR: {} → {}", ratio, label);
        }
        (None, _) => println!("  Total PCR: {}", "undefined (no call OI in window)".yellow()),
    }
    println!();

    match &report.decision {
        TradeDecision::Recommend(rec) => {
            println!("{}", "Best Trade Now".green().bold());
            println!("  {} BUY @ {}", rec.side.label(), rec.entry);
            println!("  Target:   {}", rec.target);
            println!("  Stoploss: {}", rec.stop);
            println!(
                "  Trend: {:?} | Breakout: {:?} | OI: {:?}",
                rec.trend, rec.breakout_strength, rec.oi_shift
            );
        }
        TradeDecision::WeakSignal { candidate } => {
            println!(
                "{} Trade at {} is valid but not strong enough to alert.",
                "⚠".yellow(),
                candidate.row.strike()
            );
        }
        TradeDecision::NoTrade => {
            println!("{} No strong trade opportunity found near CMP.", "⚠".yellow());
        }
    }
}

/// One fetch → analyse → alert pass
async fn run_once(
    client: &OptionChainClient,
    sink: &ConfiguredSink,
    symbol: &str,
    analysis: &AnalysisConfig,
    alerts: &AlertConfig,
) -> Result<()> {
    let chain = client.fetch_option_chain(symbol).await?;
    let report = analyze_chain(symbol, &chain, analysis)?;

    print_report(&report, analysis);

    let status = alert::dispatch(
        sink,
        &report.decision,
        report.underlying,
        chrono::Utc::now(),
        &alerts.market_hours,
    )
    .await;

    if status == AlertStatus::MarketClosed {
        println!("{} Market closed. Alert skipped.", "⏰".yellow());
    }
    Ok(())
}

async fn run_watch(symbol: &str, analysis: AnalysisConfig, alerts: AlertConfig) -> Result<()> {
    let refresh = config::get_refresh_secs();
    let client = OptionChainClient::new()?;
    let sink = ConfiguredSink::from_config(&alerts)?;
    let mut ticker = tokio::time::interval(Duration::from_secs(refresh));

    tracing::info!(symbol, refresh, "Watching option chain");
    loop {
        ticker.tick().await;
        banner(&format!("Option Chain Dashboard ({})", symbol));
        if let Err(e) = run_once(&client, &sink, symbol, &analysis, &alerts).await {
            tracing::error!(error = %e, "Snapshot failed");
            println!("{} Error: {:#}", "✗".red(), e);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::init_logging()?;

    let mode = config::get_execution_mode();
    let symbol = config::get_symbol();
    let analysis = AnalysisConfig::from_env();
    let alerts = AlertConfig::from_env();

    if !config::NSE_INDICES.contains(&symbol.as_str()) {
        tracing::warn!(symbol = %symbol, "Symbol is not in the configured index list");
    }

    match mode.as_str() {
        "once" => {
            banner(&format!("Option Chain Dashboard ({})", symbol));
            let client = OptionChainClient::new()?;
            let sink = ConfiguredSink::from_config(&alerts)?;
            run_once(&client, &sink, &symbol, &analysis, &alerts).await?;
        }
        "watch" => {
            if config::is_ci_environment() {
                println!("{} Watch mode never exits, running a single pass in CI", "ℹ".blue());
                let client = OptionChainClient::new()?;
                let sink = ConfiguredSink::from_config(&alerts)?;
                run_once(&client, &sink, &symbol, &analysis, &alerts).await?;
            } else {
                run_watch(&symbol, analysis, alerts).await?;
            }
        }
        "server" => {
            banner("Option Chain API Server");
            let ttl = Duration::from_secs(config::get_refresh_secs());
            api_server::start_server(config::get_port(), analysis, ttl).await?;
        }
        _ => {
            eprintln!("Invalid mode '{}'. Use 'once', 'watch' or 'server'", mode);
            eprintln!("Set NSE_MODE environment variable to control execution mode");
            eprintln!("Examples:");
            eprintln!("  NSE_MODE=once NSE_SYMBOL=NIFTY cargo run");
            eprintln!("  NSE_MODE=watch NSE_SYMBOL=BANKNIFTY NSE_REFRESH_SECS=900 cargo run");
            eprintln!("  NSE_MODE=server NSE_PORT=3001 cargo run");
            std::process::exit(1);
        }
    }

    Ok(())
}
