//! # Tool Engines
//!
//! The paid capabilities behind the platform's tool endpoints: the
//! client-independent image pipeline (resize, background removal) and the
//! market aggregator (candles, ticker, news, sentiment scoring, LLM
//! analysis). No coin accounting lives here; callers gate access.

pub mod image;
pub mod market;

pub use image::{BackgroundRemover, ImageTool, ProcessedImage, Resizer, ToolError};
pub use market::{
    classify, impact_score, AnalysisReport, AnalystClient, Candle, MarketError,
    MarketHttpClient, NewsArticle, NewsClient, ScoredArticle, Sentiment, TickerStats,
};
