use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::{
    config::SearchConfig,
    core::backoff::{BackoffPolicy, execute_with_backoff},
    engines::SearchEngine,
    error::{ConfigError, SearchError},
    models::{ProductRecord, SearchPage, product::RawProduct},
};

/// Product search through the Real-Time Amazon Data API on RapidAPI.
#[derive(Clone, Debug)]
pub struct AmazonSearch {
    client: Client,
    api_key: String,
    api_host: String,
    base_url: String,
    backoff: BackoffPolicy,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<SearchData>,
    #[serde(default)]
    parameters: Option<SearchParameters>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    products: Option<Vec<RawProduct>>,
    #[serde(default)]
    total_products: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchParameters {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<RawProduct>,
}

/// Shapes a search payload, keeping the first `max_results` products.
pub(crate) fn parse_search_payload(
    body: &str,
    keyword: &str,
    max_results: usize,
) -> Result<SearchPage, SearchError> {
    let envelope: SearchEnvelope =
        serde_json::from_str(body).map_err(|_| SearchError::InvalidResponse)?;

    if envelope.status.as_deref() != Some("OK") {
        return Err(SearchError::InvalidResponse);
    }

    let data = envelope.data.ok_or(SearchError::InvalidResponse)?;
    let products = data.products.ok_or(SearchError::InvalidResponse)?;

    Ok(SearchPage {
        products: products
            .into_iter()
            .take(max_results)
            .map(ProductRecord::from)
            .collect(),
        total_products: data.total_products,
        query: envelope
            .parameters
            .and_then(|p| p.query)
            .unwrap_or_else(|| keyword.to_string()),
    })
}

pub(crate) fn parse_details_payload(body: &str) -> Option<ProductRecord> {
    let envelope: DetailsEnvelope = serde_json::from_str(body).ok()?;
    if envelope.status.as_deref() != Some("OK") {
        return None;
    }
    envelope.data.map(ProductRecord::from)
}

fn status_error(status: StatusCode) -> SearchError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        SearchError::RateLimited
    } else {
        SearchError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

impl AmazonSearch {
    pub fn new(config: &SearchConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("RAPIDAPI_KEY"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            api_host: config.api_host.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            backoff: BackoffPolicy::new(config.max_retries, config.base_delay_ms),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/{}", self.base_url, path))
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
    }

    /// One request, without retries.
    async fn search_once(
        &self,
        keyword: &str,
        max_results: usize,
        region: &str,
    ) -> Result<SearchPage, SearchError> {
        let response = self
            .get("search")
            .query(&[("query", keyword), ("page", "1"), ("country", region)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let body = response.text().await?;
        parse_search_payload(&body, keyword, max_results)
    }

    async fn fetch_details(
        &self,
        id: &str,
        region: &str,
    ) -> Result<Option<ProductRecord>, SearchError> {
        let response = self
            .get("product-details")
            .query(&[("asin", id), ("country", region)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        Ok(parse_details_payload(&response.text().await?))
    }
}

#[async_trait]
impl SearchEngine for AmazonSearch {
    fn name(&self) -> &'static str {
        "amazon"
    }

    async fn search_products(
        &self,
        keyword: &str,
        max_results: usize,
        region: &str,
    ) -> Result<SearchPage, SearchError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        log::info!(
            "Searching {} for \"{}\" in {}",
            self.name(),
            keyword,
            region
        );
        let page = execute_with_backoff(
            || self.search_once(keyword, max_results, region),
            &self.backoff,
        )
        .await?;

        log::info!(
            "Found {} products for \"{}\" ({} total)",
            page.products.len(),
            keyword,
            page.total_products.unwrap_or_default()
        );
        Ok(page)
    }

    async fn product_details(&self, id: &str, region: &str) -> Option<ProductRecord> {
        match self.fetch_details(id, region).await {
            Ok(Some(product)) => Some(product),
            Ok(None) => {
                log::info!("No product details for {}", id);
                None
            }
            Err(e) => {
                log::error!("Error getting product details for {}: {}", id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Upstream, closed_port};
    use serde_json::{Value, json};
    use std::time::Instant;

    fn config(api_key: Option<&str>) -> SearchConfig {
        SearchConfig {
            api_key: api_key.map(str::to_string),
            ..SearchConfig::default()
        }
    }

    fn products(count: usize) -> Value {
        let products: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "asin": format!("B0{i:08}"),
                    "product_title": format!("Product {i}"),
                    "product_price": "$10.00",
                })
            })
            .collect();

        json!({
            "status": "OK",
            "parameters": { "query": "usb c hub", "country": "US", "page": 1 },
            "data": { "total_products": 1234, "products": products }
        })
    }

    fn payload(count: usize) -> String {
        products(count).to_string()
    }

    fn engine(base_url: &str, base_delay_ms: u64) -> AmazonSearch {
        AmazonSearch::new(&SearchConfig {
            api_key: Some("test-key".to_string()),
            base_url: base_url.to_string(),
            base_delay_ms,
            timeout_secs: 5,
            ..SearchConfig::default()
        })
        .unwrap()
    }

    fn throttled() -> (StatusCode, Value) {
        (StatusCode::TOO_MANY_REQUESTS, json!({ "message": "Too many requests" }))
    }

    #[test]
    fn test_missing_key_is_config_error() {
        assert!(matches!(
            AmazonSearch::new(&config(None)),
            Err(ConfigError::MissingCredential("RAPIDAPI_KEY"))
        ));
        assert!(matches!(
            AmazonSearch::new(&config(Some(""))),
            Err(ConfigError::MissingCredential(_))
        ));
        assert!(AmazonSearch::new(&config(Some("key"))).is_ok());
    }

    #[test]
    fn test_search_payload_truncates() {
        let page = parse_search_payload(&payload(15), "usb hub", 10).unwrap();

        assert_eq!(page.products.len(), 10);
        assert_eq!(page.products[0].asin, "B000000000");
        assert_eq!(page.products[9].title, "Product 9");
        assert_eq!(page.total_products, Some(1234));
        assert_eq!(page.query, "usb c hub");
    }

    #[test]
    fn test_search_payload_is_deterministic() {
        let first = parse_search_payload(&payload(5), "usb hub", 10).unwrap();
        let second = parse_search_payload(&payload(5), "usb hub", 10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_payload_echo_falls_back_to_keyword() {
        let body = json!({ "status": "OK", "data": { "products": [] } }).to_string();
        let page = parse_search_payload(&body, "usb hub", 10).unwrap();

        assert!(page.products.is_empty());
        assert_eq!(page.total_products, None);
        assert_eq!(page.query, "usb hub");
    }

    #[test]
    fn test_search_payload_invalid() {
        for body in [
            json!({ "status": "ERROR", "data": { "products": [] } }).to_string(),
            json!({ "status": "OK", "data": {} }).to_string(),
            json!({ "status": "OK" }).to_string(),
            json!({ "data": { "products": [] } }).to_string(),
            "<html>oops</html>".to_string(),
        ] {
            assert!(matches!(
                parse_search_payload(&body, "kw", 10),
                Err(SearchError::InvalidResponse)
            ));
        }
    }

    #[test]
    fn test_details_payload() {
        let body = json!({
            "status": "OK",
            "data": { "asin": "B0C", "product_title": "Desk Lamp", "is_prime": true }
        })
        .to_string();
        let product = parse_details_payload(&body).unwrap();
        assert_eq!(product.title, "Desk Lamp");
        assert_eq!(product.price, "N/A");
        assert!(product.is_prime);

        let missing_data = json!({ "status": "OK" }).to_string();
        assert!(parse_details_payload(&missing_data).is_none());
        let failed = json!({ "status": "ERROR", "data": {} }).to_string();
        assert!(parse_details_payload(&failed).is_none());
        assert!(parse_details_payload("nope").is_none());
    }

    #[test]
    fn test_status_errors() {
        let limited = status_error(StatusCode::TOO_MANY_REQUESTS);
        assert!(matches!(limited, SearchError::RateLimited));
        assert!(crate::core::backoff::is_rate_limited(&limited.to_string()));

        let forbidden = status_error(StatusCode::FORBIDDEN);
        assert_eq!(forbidden.to_string(), "Amazon API error: 403 Forbidden");
        assert!(!crate::core::backoff::is_rate_limited(&forbidden.to_string()));
    }

    #[tokio::test]
    async fn test_empty_keyword_fails_before_request() {
        let engine = AmazonSearch::new(&config(Some("key"))).unwrap();
        assert!(matches!(
            engine.search_products("   ", 10, "US").await,
            Err(SearchError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn test_search_retries_rate_limits() {
        let replies = vec![throttled(), throttled(), (StatusCode::OK, products(3))];
        let upstream = Upstream::start(replies).await;

        let page = engine(&upstream.base_url, 10)
            .search_products("usb hub", 10, "DE")
            .await
            .unwrap();

        assert_eq!(page.products.len(), 3);
        assert_eq!(upstream.hits(), 3);

        let request = &upstream.requests()[2];
        assert_eq!(request.path, "/search");
        assert!(request.query.contains("query=usb+hub"), "{}", request.query);
        assert!(request.query.contains("page=1"));
        assert!(request.query.contains("country=DE"));
        assert_eq!(request.headers["x-rapidapi-key"], "test-key");
        assert_eq!(
            request.headers["x-rapidapi-host"],
            "real-time-amazon-data.p.rapidapi.com"
        );
    }

    #[tokio::test]
    async fn test_search_gives_up_after_budget() {
        let upstream = Upstream::start(vec![throttled()]).await;

        let result = engine(&upstream.base_url, 10)
            .search_products("usb hub", 10, "US")
            .await;

        assert!(matches!(result, Err(SearchError::RateLimited)));
        assert_eq!(upstream.hits(), 3);
    }

    #[tokio::test]
    async fn test_search_server_error_not_retried() {
        let upstream = Upstream::start(vec![
            (StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "boom" })),
            (StatusCode::OK, products(3)),
        ])
        .await;

        let result = engine(&upstream.base_url, 10)
            .search_products("usb hub", 10, "US")
            .await;

        assert!(matches!(result, Err(SearchError::Status { status: 500, .. })));
        assert_eq!(upstream.hits(), 1);
    }

    #[tokio::test]
    async fn test_search_bad_envelope_not_retried() {
        let upstream = Upstream::start(vec![
            (StatusCode::OK, json!({ "status": "ERROR" })),
            (StatusCode::OK, products(3)),
        ])
        .await;

        let result = engine(&upstream.base_url, 10)
            .search_products("usb hub", 10, "US")
            .await;

        assert!(matches!(result, Err(SearchError::InvalidResponse)));
        assert_eq!(upstream.hits(), 1);
    }

    #[tokio::test]
    async fn test_connection_failure_with_429_in_keyword_not_retried() {
        let engine = engine(&closed_port().await, 2000);
        let started = Instant::now();

        let result = engine.search_products("rtx 4290 laptop", 10, "US").await;

        match result {
            Err(err @ SearchError::Transport(_)) => {
                assert!(!err.to_string().contains("4290"), "{err}");
            }
            other => panic!("expected a transport error, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_product_details_over_http() {
        let upstream = Upstream::start(vec![
            (
                StatusCode::OK,
                json!({
                    "status": "OK",
                    "data": { "asin": "B0C", "product_title": "Desk Lamp" }
                }),
            ),
            (StatusCode::INTERNAL_SERVER_ERROR, json!({})),
        ])
        .await;
        let engine = engine(&upstream.base_url, 10);

        let product = engine.product_details("B0C", "US").await.unwrap();
        assert_eq!(product.title, "Desk Lamp");
        assert!(engine.product_details("B0C", "US").await.is_none());

        let request = &upstream.requests()[0];
        assert_eq!(request.path, "/product-details");
        assert!(request.query.contains("asin=B0C"));
        assert_eq!(upstream.hits(), 2);
    }
}
