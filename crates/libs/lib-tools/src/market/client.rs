//! # Market Data Client
//!
//! Candlestick series and 24-hour ticker stats from a Binance-style REST API.

use super::{Candle, MarketError, TickerStats};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// HTTP client for the market data API.
pub struct MarketHttpClient {
    http: Client,
    api_base: String,
    quote_suffix: String,
}

impl MarketHttpClient {
    /// Create a new client with timeout configuration.
    pub fn new(api_base: String, quote_suffix: String) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            api_base,
            quote_suffix,
        })
    }

    /// Trading-pair symbol for a bare asset symbol ("BTC" -> "BTCUSDT").
    pub fn pair_symbol(&self, symbol: &str) -> String {
        format!("{}{}", symbol.to_uppercase(), self.quote_suffix)
    }

    /// Fetch a candlestick series for a symbol.
    pub async fn get_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketError> {
        let pair = self.pair_symbol(symbol);
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.api_base, pair, interval, limit
        );
        debug!(%pair, interval, limit, "Fetching candles");

        let rows: Vec<Vec<Value>> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| MarketError::Fetch(format!("Market API status: {}", e)))?
            .json()
            .await
            .map_err(|e| MarketError::Parse(format!("Kline payload: {}", e)))?;

        rows.iter().map(parse_kline_row).collect()
    }

    /// Fetch 24-hour ticker statistics for a symbol.
    pub async fn get_ticker(&self, symbol: &str) -> Result<TickerStats, MarketError> {
        let pair = self.pair_symbol(symbol);
        let url = format!("{}/ticker/24hr?symbol={}", self.api_base, pair);
        debug!(%pair, "Fetching 24h ticker");

        let raw: RawTicker = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| MarketError::Fetch(format!("Market API status: {}", e)))?
            .json()
            .await
            .map_err(|e| MarketError::Parse(format!("Ticker payload: {}", e)))?;

        raw.try_into()
    }
}

/// Ticker payload as the API sends it: numeric fields as strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicker {
    symbol: String,
    last_price: String,
    price_change_percent: String,
    high_price: String,
    low_price: String,
    volume: String,
}

impl TryFrom<RawTicker> for TickerStats {
    type Error = MarketError;

    fn try_from(raw: RawTicker) -> Result<Self, MarketError> {
        Ok(TickerStats {
            symbol: raw.symbol,
            last_price: parse_decimal(&raw.last_price, "lastPrice")?,
            price_change_percent: parse_decimal(&raw.price_change_percent, "priceChangePercent")?,
            high_price: parse_decimal(&raw.high_price, "highPrice")?,
            low_price: parse_decimal(&raw.low_price, "lowPrice")?,
            volume: parse_decimal(&raw.volume, "volume")?,
        })
    }
}

fn parse_decimal(s: &str, field: &str) -> Result<f64, MarketError> {
    s.parse::<f64>()
        .map_err(|_| MarketError::Parse(format!("Invalid decimal in {}: {:?}", field, s)))
}

/// Parse one kline row: `[openTime, "open", "high", "low", "close", "volume", ...]`.
fn parse_kline_row(row: &Vec<Value>) -> Result<Candle, MarketError> {
    if row.len() < 6 {
        return Err(MarketError::Parse(format!(
            "Kline row too short: {} fields",
            row.len()
        )));
    }

    let open_time = row[0]
        .as_i64()
        .ok_or_else(|| MarketError::Parse("Kline open time is not an integer".to_string()))?;

    let decimal_at = |idx: usize, field: &str| -> Result<f64, MarketError> {
        row[idx]
            .as_str()
            .ok_or_else(|| MarketError::Parse(format!("Kline {} is not a string", field)))
            .and_then(|s| parse_decimal(s, field))
    };

    Ok(Candle {
        open_time,
        open: decimal_at(1, "open")?,
        high: decimal_at(2, "high")?,
        low: decimal_at(3, "low")?,
        close: decimal_at(4, "close")?,
        volume: decimal_at(5, "volume")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MarketHttpClient {
        MarketHttpClient::new(
            "https://api.example.com/api/v3".to_string(),
            "USDT".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_pair_symbol_appends_quote_suffix() {
        let client = client();
        assert_eq!(client.pair_symbol("BTC"), "BTCUSDT");
        assert_eq!(client.pair_symbol("eth"), "ETHUSDT");
    }

    #[test]
    fn test_parse_kline_row() {
        let row: Vec<Value> = json!([
            1704067200000i64,
            "42000.5",
            "42100.0",
            "41900.25",
            "42050.0",
            "1234.56",
            1704070799999i64
        ])
        .as_array()
        .unwrap()
        .clone();

        let candle = parse_kline_row(&row).unwrap();
        assert_eq!(candle.open_time, 1704067200000);
        assert_eq!(candle.open, 42000.5);
        assert_eq!(candle.low, 41900.25);
        assert_eq!(candle.volume, 1234.56);
    }

    #[test]
    fn test_parse_kline_row_rejects_short_rows() {
        let row: Vec<Value> = vec![json!(1), json!("2")];
        assert!(matches!(
            parse_kline_row(&row),
            Err(MarketError::Parse(_))
        ));
    }

    #[test]
    fn test_raw_ticker_conversion() {
        let raw = RawTicker {
            symbol: "BTCUSDT".to_string(),
            last_price: "42000.5".to_string(),
            price_change_percent: "-1.25".to_string(),
            high_price: "43000".to_string(),
            low_price: "41000".to_string(),
            volume: "9876.5".to_string(),
        };

        let stats: TickerStats = raw.try_into().unwrap();
        assert_eq!(stats.price_change_percent, -1.25);
        assert_eq!(stats.high_price, 43000.0);
    }

    #[test]
    fn test_raw_ticker_rejects_bad_decimal() {
        let raw = RawTicker {
            symbol: "BTCUSDT".to_string(),
            last_price: "not-a-number".to_string(),
            price_change_percent: "0".to_string(),
            high_price: "0".to_string(),
            low_price: "0".to_string(),
            volume: "0".to_string(),
        };
        assert!(matches!(
            TickerStats::try_from(raw),
            Err(MarketError::Parse(_))
        ));
    }
}
