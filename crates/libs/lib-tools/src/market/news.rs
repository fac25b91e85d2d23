//! # News Client
//!
//! News list fetching with a primary source and automatic fallback to a
//! secondary one. The two APIs return different shapes; both normalize to
//! [`NewsArticle`].

use super::{MarketError, NewsArticle};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// HTTP client over the primary and fallback news APIs.
pub struct NewsClient {
    http: Client,
    primary_base: String,
    primary_api_key: String,
    fallback_base: String,
}

impl NewsClient {
    /// Create a new client with timeout configuration.
    pub fn new(
        primary_base: String,
        primary_api_key: String,
        fallback_base: String,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            primary_base,
            primary_api_key,
            fallback_base,
        })
    }

    /// Fetch recent articles for a query term.
    ///
    /// Priority 1 is the primary API (skipped when no key is configured);
    /// any failure there falls through to the fallback API. Only when both
    /// fail does the caller see an error.
    pub async fn get_news(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>, MarketError> {
        if !self.primary_api_key.is_empty() {
            match self.get_primary(query, limit).await {
                Ok(articles) => {
                    debug!(count = articles.len(), "Primary news source returned");
                    return Ok(articles);
                }
                Err(e) => {
                    warn!("Primary news source failed: {}. Trying fallback.", e);
                }
            }
        } else {
            debug!("No primary news API key configured, using fallback");
        }

        let articles = self.get_fallback(query, limit).await?;
        debug!(count = articles.len(), "Fallback news source returned");
        Ok(articles)
    }

    /// Request builder for the primary API; `.query` percent-encodes the
    /// user-supplied term.
    fn primary_request(&self, query: &str, limit: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}/everything", self.primary_base))
            .query(&[
                ("q", query),
                ("pageSize", limit),
                ("sortBy", "publishedAt"),
                ("apiKey", self.primary_api_key.as_str()),
            ])
    }

    fn fallback_request(&self, query: &str, limit: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}/news/", self.fallback_base))
            .query(&[("categories", query), ("limit", limit)])
    }

    async fn get_primary(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>, MarketError> {
        let response: PrimaryNewsResponse = self
            .primary_request(query, &limit.to_string())
            .send()
            .await?
            .error_for_status()
            .map_err(|e| MarketError::Fetch(format!("Primary news status: {}", e)))?
            .json()
            .await
            .map_err(|e| MarketError::Parse(format!("Primary news payload: {}", e)))?;

        Ok(response
            .articles
            .into_iter()
            .map(|a| NewsArticle {
                title: a.title,
                url: a.url,
                source: a.source.name,
                published_at: a.published_at,
            })
            .collect())
    }

    async fn get_fallback(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>, MarketError> {
        let response: FallbackNewsResponse = self
            .fallback_request(query, &limit.to_string())
            .send()
            .await?
            .error_for_status()
            .map_err(|e| MarketError::Fetch(format!("Fallback news status: {}", e)))?
            .json()
            .await
            .map_err(|e| MarketError::Parse(format!("Fallback news payload: {}", e)))?;

        Ok(response
            .data
            .into_iter()
            .map(|a| NewsArticle {
                title: a.title,
                url: a.url,
                source: a.source,
                published_at: DateTime::<Utc>::from_timestamp(a.published_on, 0)
                    .unwrap_or_else(Utc::now),
            })
            .collect())
    }
}

// region: --- Wire Shapes
#[derive(Debug, Deserialize)]
struct PrimaryNewsResponse {
    articles: Vec<PrimaryArticle>,
}

#[derive(Debug, Deserialize)]
struct PrimaryArticle {
    title: String,
    url: String,
    source: PrimarySource,
    #[serde(rename = "publishedAt")]
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct PrimarySource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct FallbackNewsResponse {
    #[serde(rename = "Data")]
    data: Vec<FallbackArticle>,
}

#[derive(Debug, Deserialize)]
struct FallbackArticle {
    title: String,
    url: String,
    source: String,
    published_on: i64,
}
// endregion: --- Wire Shapes

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> NewsClient {
        NewsClient::new(
            "https://news.example/v2".to_string(),
            "test-key".to_string(),
            "https://fallback.example/data/v2".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_query_term_is_percent_encoded() {
        let client = test_client();

        let req = client.primary_request("btc & eth", "10").build().unwrap();
        let url = req.url().as_str().to_string();
        assert!(url.contains("%26"), "ampersand must be encoded: {}", url);
        assert!(!url.contains("btc & eth"));

        let req = client.fallback_request("btc & eth", "10").build().unwrap();
        let url = req.url().as_str().to_string();
        assert!(url.contains("%26"), "ampersand must be encoded: {}", url);
    }

    #[test]
    fn test_primary_request_carries_key_and_page_size() {
        let client = test_client();
        let req = client.primary_request("bitcoin", "5").build().unwrap();
        let url = req.url().as_str();

        assert!(url.starts_with("https://news.example/v2/everything?"));
        assert!(url.contains("q=bitcoin"));
        assert!(url.contains("pageSize=5"));
        assert!(url.contains("apiKey=test-key"));
    }

    #[test]
    fn test_primary_shape_parses() {
        let payload = r#"{
            "status": "ok",
            "articles": [
                {
                    "title": "Bitcoin surges past resistance",
                    "url": "https://example.com/a",
                    "source": {"id": null, "name": "Reuters"},
                    "publishedAt": "2026-08-29T10:00:00Z"
                }
            ]
        }"#;

        let parsed: PrimaryNewsResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.articles.len(), 1);
        assert_eq!(parsed.articles[0].source.name, "Reuters");
    }

    #[test]
    fn test_fallback_shape_parses() {
        let payload = r#"{
            "Type": 100,
            "Data": [
                {
                    "title": "Market selloff deepens",
                    "url": "https://example.com/b",
                    "source": "coindesk",
                    "published_on": 1756418400
                }
            ]
        }"#;

        let parsed: FallbackNewsResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].source, "coindesk");
    }
}
