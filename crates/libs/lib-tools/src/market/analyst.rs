//! # LLM Analyst
//!
//! Builds a market-analysis prompt from ticker stats, candles and scored
//! news, sends it to an OpenAI-compatible chat-completions endpoint, and
//! parses the structured report out of the reply text. Models wrap JSON in
//! prose and code fences, so the parser scans for the first balanced JSON
//! object instead of deserializing the raw reply.

use super::{Candle, MarketError, ScoredArticle, TickerStats};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

/// Structured analysis report produced by the LLM.
///
/// Every field defaults so a partial object from the model still yields a
/// usable report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub trend: String,
    #[serde(default)]
    pub confidence: u8,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_factors: Vec<String>,
}

/// Client for the chat-completions analysis endpoint.
pub struct AnalystClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl AnalystClient {
    /// Create a new client with timeout configuration.
    ///
    /// An empty `api_key` is allowed at construction; `analyze` fails with a
    /// `Fetch` error when called without one.
    pub fn new(api_base: String, api_key: String, model: String) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            api_base,
            api_key,
            model,
        })
    }

    /// Run an analysis over the aggregated market inputs.
    pub async fn analyze(
        &self,
        symbol: &str,
        ticker: &TickerStats,
        candles: &[Candle],
        articles: &[ScoredArticle],
    ) -> Result<AnalysisReport, MarketError> {
        if self.api_key.is_empty() {
            return Err(MarketError::Fetch(
                "Analysis API key is not configured".to_string(),
            ));
        }

        let prompt = build_prompt(symbol, ticker, candles, articles);
        let url = format!("{}/chat/completions", self.api_base);
        debug!(symbol, model = %self.model, "Requesting market analysis");

        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a market analyst. Reply with a single JSON object \
                        with keys: trend (\"bullish\", \"bearish\" or \"sideways\"), \
                        confidence (integer 0-100), summary (string), \
                        key_factors (array of strings). No other text."
                },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.3,
            "max_tokens": 600
        });

        let reply: ChatResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| MarketError::Fetch(format!("Analysis API status: {}", e)))?
            .json()
            .await
            .map_err(|e| MarketError::Parse(format!("Chat payload: {}", e)))?;

        let content = reply
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| MarketError::Parse("Chat reply has no choices".to_string()))?;

        let object = extract_json_object(content).ok_or_else(|| {
            warn!(symbol, "Analysis reply contained no JSON object");
            MarketError::Parse("Analysis reply contained no JSON object".to_string())
        })?;

        serde_json::from_str(object)
            .map_err(|e| MarketError::Parse(format!("Analysis report: {}", e)))
    }
}

/// Plain-text prompt summarizing ticker, candles and scored headlines.
fn build_prompt(
    symbol: &str,
    ticker: &TickerStats,
    candles: &[Candle],
    articles: &[ScoredArticle],
) -> String {
    let mut prompt = format!(
        "Analyze the market for {}.\n\n24h stats: last price {}, change {}%, high {}, low {}, volume {}.\n",
        symbol,
        ticker.last_price,
        ticker.price_change_percent,
        ticker.high_price,
        ticker.low_price,
        ticker.volume
    );

    if !candles.is_empty() {
        prompt.push_str("\nRecent closes (oldest first): ");
        let closes: Vec<String> = candles.iter().map(|c| c.close.to_string()).collect();
        prompt.push_str(&closes.join(", "));
        prompt.push('\n');
    }

    if !articles.is_empty() {
        prompt.push_str("\nRecent headlines:\n");
        for scored in articles.iter().take(10) {
            prompt.push_str(&format!(
                "- [{} / impact {}] {} ({})\n",
                scored.sentiment, scored.impact, scored.article.title, scored.article.source
            ));
        }
    }

    prompt
}

/// Extract the first balanced top-level JSON object from free text.
///
/// Tracks brace depth while respecting string literals and escapes, so
/// braces inside quoted values do not end the object early. Returns `None`
/// when the text holds no complete object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Chat-completions reply, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{NewsArticle, Sentiment};
    use chrono::Utc;

    #[test]
    fn test_extract_json_object_plain() {
        let text = r#"{"trend": "bullish", "confidence": 70}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_extract_json_object_embedded_in_prose() {
        let text = "Here is my analysis:\n```json\n{\"trend\": \"bearish\"}\n```\nHope that helps.";
        assert_eq!(extract_json_object(text), Some("{\"trend\": \"bearish\"}"));
    }

    #[test]
    fn test_extract_json_object_braces_inside_strings() {
        let text = r#"note {"summary": "watch the {resistance} zone", "confidence": 40} done"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"summary": "watch the {resistance} zone", "confidence": 40}"#)
        );
    }

    #[test]
    fn test_extract_json_object_nested() {
        let text = r#"{"a": {"b": 1}, "c": 2} trailing"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": 1}, "c": 2}"#));
    }

    #[test]
    fn test_extract_json_object_none_without_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("unterminated {\"a\": 1"), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn test_extract_json_object_escaped_quote() {
        let text = r#"{"summary": "he said \"buy {now}\"", "confidence": 10}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_report_defaults_for_partial_object() {
        let report: AnalysisReport = serde_json::from_str(r#"{"trend": "bullish"}"#).unwrap();
        assert_eq!(report.trend, "bullish");
        assert_eq!(report.confidence, 0);
        assert!(report.key_factors.is_empty());
    }

    #[test]
    fn test_prompt_includes_headlines_and_closes() {
        let ticker = TickerStats {
            symbol: "BTCUSDT".to_string(),
            last_price: 42000.0,
            price_change_percent: 1.5,
            high_price: 43000.0,
            low_price: 41000.0,
            volume: 1000.0,
        };
        let candles = vec![Candle {
            open_time: 0,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 10.0,
        }];
        let articles = vec![ScoredArticle {
            article: NewsArticle {
                title: "ETF approval fuels rally".to_string(),
                url: "https://example.com/a".to_string(),
                source: "Reuters".to_string(),
                published_at: Utc::now(),
            },
            sentiment: Sentiment::Positive,
            impact: 90,
        }];

        let prompt = build_prompt("BTC", &ticker, &candles, &articles);
        assert!(prompt.contains("1.5"));
        assert!(prompt.contains("ETF approval fuels rally"));
        assert!(prompt.contains("positive"));
    }
}
