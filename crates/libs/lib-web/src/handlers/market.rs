//! # Market Handlers
//!
//! Read-only market data endpoints (candles, ticker, scored news) plus the
//! coin-gated LLM analysis. The free endpoints proxy the aggregator clients
//! directly; analysis reserves its price first and refunds it when any
//! upstream fetch or the model call fails.

use crate::services::{ActionGate, Hold};
use axum::extract::{Extension, Json, Query, State};
use lib_auth::Claims;
use lib_core::{AppError, Result, ToolId};
use lib_tools::{
    classify, impact_score, AnalysisReport, AnalystClient, Candle, MarketError, MarketHttpClient,
    NewsArticle, NewsClient, ScoredArticle, TickerStats,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const DEFAULT_INTERVAL: &str = "1h";
const DEFAULT_CANDLE_LIMIT: usize = 100;
const DEFAULT_NEWS_LIMIT: usize = 10;
const ANALYSIS_CANDLE_LIMIT: usize = 48;

#[derive(Debug, Deserialize)]
pub struct CandlesQuery {
    pub symbol: String,
    pub interval: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub query: Option<String>,
    pub limit: Option<usize>,
}

/// Gated analysis result with accounting info.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub symbol: String,
    pub report: AnalysisReport,
    pub charged: i64,
    pub balance: i64,
}

/// `GET /api/market/candles?symbol=BTC&interval=1h&limit=100`
pub async fn get_candles(
    State(market): State<Arc<MarketHttpClient>>,
    Query(query): Query<CandlesQuery>,
) -> Result<Json<Vec<Candle>>> {
    let interval = query.interval.as_deref().unwrap_or(DEFAULT_INTERVAL);
    let limit = query.limit.unwrap_or(DEFAULT_CANDLE_LIMIT).clamp(1, 1000);

    let candles = market
        .get_candles(&query.symbol, interval, limit)
        .await
        .map_err(map_market_err)?;

    Ok(Json(candles))
}

/// `GET /api/market/ticker?symbol=BTC`
pub async fn get_ticker(
    State(market): State<Arc<MarketHttpClient>>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<TickerStats>> {
    let ticker = market
        .get_ticker(&query.symbol)
        .await
        .map_err(map_market_err)?;
    Ok(Json(ticker))
}

/// `GET /api/market/news?query=bitcoin&limit=10`
///
/// Articles come back annotated with keyword sentiment and an impact score.
pub async fn get_news(
    State(news): State<Arc<NewsClient>>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Vec<ScoredArticle>>> {
    let term = query.query.as_deref().unwrap_or("crypto");
    let limit = query.limit.unwrap_or(DEFAULT_NEWS_LIMIT).clamp(1, 50);

    let articles = news.get_news(term, limit).await.map_err(map_market_err)?;

    Ok(Json(score_articles(articles)))
}

/// `GET /api/market/analysis?symbol=BTC` - coin-gated LLM market analysis.
///
/// Aggregates ticker, candles, and scored news, then asks the model for a
/// structured report. The price is reserved up front and released if any
/// upstream step fails.
#[instrument(skip(claims, gate, market, news, analyst), fields(username = %claims.username, symbol = %query.symbol))]
pub async fn get_analysis(
    Extension(claims): Extension<Claims>,
    State(gate): State<ActionGate>,
    State(market): State<Arc<MarketHttpClient>>,
    State(news): State<Arc<NewsClient>>,
    State(analyst): State<Arc<AnalystClient>>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<AnalysisResponse>> {
    let user_id = claims
        .user_id()
        .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

    // Reserve and settle on a spawned task so a client disconnect cannot
    // cancel the refund or the commit mid-flight.
    let symbol = query.symbol;
    let task = tokio::spawn(async move {
        let hold = gate.reserve(user_id, ToolId::MarketAnalysis).await?;

        match run_analysis(&market, &news, &analyst, &symbol).await {
            Ok(report) => {
                let balance = gate.commit(hold).await?;
                info!(
                    user_id,
                    symbol = %symbol,
                    trend = %report.trend,
                    charged = hold.amount,
                    "[MARKET] Analysis complete"
                );
                Ok(Json(AnalysisResponse {
                    symbol,
                    report,
                    charged: hold.amount,
                    balance,
                }))
            }
            Err(e) => {
                warn!(user_id, symbol = %symbol, "[MARKET] Analysis failed: {}", e);
                settle_failure(&gate, hold).await;
                Err(map_market_err(e))
            }
        }
    });

    task.await
        .map_err(|e| AppError::Internal(format!("Analysis task failed: {}", e)))?
}

async fn run_analysis(
    market: &MarketHttpClient,
    news: &NewsClient,
    analyst: &AnalystClient,
    symbol: &str,
) -> std::result::Result<AnalysisReport, MarketError> {
    let (ticker, candles, articles) = tokio::try_join!(
        market.get_ticker(symbol),
        market.get_candles(symbol, DEFAULT_INTERVAL, ANALYSIS_CANDLE_LIMIT),
        news.get_news(symbol, DEFAULT_NEWS_LIMIT),
    )?;

    let scored = score_articles(articles);
    analyst.analyze(symbol, &ticker, &candles, &scored).await
}

fn score_articles(articles: Vec<NewsArticle>) -> Vec<ScoredArticle> {
    articles
        .into_iter()
        .map(|article| {
            let sentiment = classify(&article.title);
            let impact = impact_score(&article.source, article.published_at, &article.title);
            ScoredArticle {
                article,
                sentiment,
                impact,
            }
        })
        .collect()
}

async fn settle_failure(gate: &ActionGate, hold: Hold) {
    if let Err(e) = gate.release(hold).await {
        warn!(entry_id = hold.entry_id, "[MARKET] Refund failed: {}", e);
    }
}

fn map_market_err(e: MarketError) -> AppError {
    match e {
        MarketError::Fetch(msg) => AppError::Fetch(msg),
        MarketError::Parse(msg) => AppError::Parse(msg),
    }
}
