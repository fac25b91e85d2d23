//! # Market Aggregator
//!
//! API composition over external market data: candlestick series and 24-hour
//! ticker stats from a Binance-style REST API, a news list with
//! primary/fallback sources, naive keyword sentiment and impact scoring, and
//! an LLM-backed analysis step that parses a JSON report out of free text.

// region: --- Modules
mod analyst;
mod client;
mod news;
mod sentiment;

pub use analyst::{AnalysisReport, AnalystClient};
pub use client::MarketHttpClient;
pub use news::NewsClient;
pub use sentiment::{classify, impact_score, Sentiment};
// endregion: --- Modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Market aggregator error type.
///
/// `Fetch` covers transport and upstream failures; `Parse` covers malformed
/// or unexpected payloads, including an LLM reply with no JSON object.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Parse failed: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for MarketError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MarketError::Parse(err.to_string())
        } else {
            MarketError::Fetch(err.to_string())
        }
    }
}

/// One OHLCV candlestick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    /// Open time, Unix milliseconds
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 24-hour ticker statistics for a trading pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerStats {
    pub symbol: String,
    pub last_price: f64,
    pub price_change_percent: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub volume: f64,
}

/// A news article from either news source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

/// A news article annotated with sentiment and impact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: NewsArticle,
    pub sentiment: Sentiment,
    /// Heuristic 0-100 market relevance rating
    pub impact: u8,
}
