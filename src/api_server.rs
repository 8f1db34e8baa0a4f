use crate::analyzer::{analyze_chain, AnalysisReport};
use crate::config::{self, AnalysisConfig};
use crate::nse_client::OptionChainClient;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub symbol: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, started: Instant) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            processing_time_ms: Some(started.elapsed().as_millis() as u64),
        }
    }

    fn err(error: String, started: Instant) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            processing_time_ms: Some(started.elapsed().as_millis() as u64),
        }
    }
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

#[derive(Clone)]
pub struct AppState {
    client: Arc<OptionChainClient>,
    analysis: Arc<AnalysisConfig>,
    cache: Arc<RwLock<HashMap<String, (AnalysisReport, Instant)>>>,
    cache_ttl: Duration,
}

impl AppState {
    pub fn new(analysis: AnalysisConfig, cache_ttl: Duration) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OptionChainClient::new()?),
            analysis: Arc::new(analysis),
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl,
        })
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /api/indices
async fn get_indices() -> Json<ApiResponse<Vec<String>>> {
    let started = Instant::now();
    let indices: Vec<String> = config::NSE_INDICES.iter().map(|s| s.to_string()).collect();
    Json(ApiResponse::ok(indices, started))
}

/// GET /api/analysis?symbol=NIFTY
async fn get_analysis(
    Query(query): Query<AnalysisQuery>,
    State(app_state): State<AppState>,
) -> Result<Json<ApiResponse<AnalysisReport>>, StatusCode> {
    let started = Instant::now();
    let symbol = query.symbol.trim().to_uppercase();

    if !config::NSE_INDICES.contains(&symbol.as_str()) {
        return Ok(Json(ApiResponse::err(format!("Unsupported index: {}", symbol), started)));
    }

    {
        let cache = app_state.cache.read().await;
        if let Some((report, cached_at)) = cache.get(&symbol) {
            if cached_at.elapsed() < app_state.cache_ttl {
                return Ok(Json(ApiResponse::ok(report.clone(), started)));
            }
        }
    }

    let chain = match app_state.client.fetch_option_chain(&symbol).await {
        Ok(chain) => chain,
        Err(e) => {
            tracing::error!(symbol = %symbol, error = %e, "Fetch failed");
            return Ok(Json(ApiResponse::err(e.to_string(), started)));
        }
    };

    match analyze_chain(&symbol, &chain, &app_state.analysis) {
        Ok(report) => {
            app_state
                .cache
                .write()
                .await
                .insert(symbol, (report.clone(), Instant::now()));
            Ok(Json(ApiResponse::ok(report, started)))
        }
        Err(e) => Ok(Json(ApiResponse::err(e.to_string(), started))),
    }
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/indices", get(get_indices))
        .route("/api/analysis", get(get_analysis))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn start_server(port: u16, analysis: AnalysisConfig, cache_ttl: Duration) -> Result<()> {
    let app = router(AppState::new(analysis, cache_ttl)?);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Option chain API running on http://{}", addr);
    tracing::info!("   GET  /api/indices");
    tracing::info!("   GET  /api/analysis?symbol=NIFTY");

    axum::serve(listener, app).await?;
    Ok(())
}
