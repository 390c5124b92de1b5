use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized product as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Upstream identifier (ASIN)
    pub asin: String,
    pub title: String,
    /// Display price, `"N/A"` when the listing has none
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub num_ratings: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub is_prime: bool,
    pub is_best_seller: bool,
    pub is_amazon_choice: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub products: Vec<ProductRecord>,
    pub total_products: Option<u64>,
    /// The query as echoed by the search service
    pub query: String,
}

/// Product entry as the search service sends it. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawProduct {
    #[serde(default)]
    pub asin: Option<String>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub product_price: Option<Value>,
    #[serde(default)]
    pub product_original_price: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub product_star_rating: Option<Value>,
    #[serde(default)]
    pub product_num_ratings: Option<Value>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub product_photo: Option<String>,
    #[serde(default)]
    pub is_prime: Option<bool>,
    #[serde(default)]
    pub is_best_seller: Option<bool>,
    #[serde(default)]
    pub is_amazon_choice: Option<bool>,
    #[serde(default)]
    pub delivery: Option<String>,
    #[serde(default)]
    pub product_badge: Option<String>,
}

/// Accepts `4.5`, `"4.5"` and `"1,234"`.
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Prices arrive as `"$19.99"` but occasionally as bare numbers.
fn price(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl From<RawProduct> for ProductRecord {
    fn from(raw: RawProduct) -> Self {
        let rating = number(raw.product_star_rating.as_ref());
        let num_ratings = number(raw.product_num_ratings.as_ref())
            .filter(|n| *n >= 0.0)
            .map(|n| n as u64)
            .unwrap_or(0);

        Self {
            asin: raw.asin.unwrap_or_default(),
            title: raw.product_title.unwrap_or_default(),
            price: price(raw.product_price).unwrap_or_else(|| "N/A".to_string()),
            original_price: price(raw.product_original_price),
            currency: non_empty(raw.currency).unwrap_or_else(|| "USD".to_string()),
            rating,
            num_ratings,
            url: raw.product_url,
            image_url: raw.product_photo,
            is_prime: raw.is_prime.unwrap_or(false),
            is_best_seller: raw.is_best_seller.unwrap_or(false),
            is_amazon_choice: raw.is_amazon_choice.unwrap_or(false),
            delivery: raw.delivery,
            badge: raw.product_badge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawProduct {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let product = ProductRecord::from(raw(json!({ "asin": "B0TEST" })));

        assert_eq!(product.asin, "B0TEST");
        assert_eq!(product.title, "");
        assert_eq!(product.price, "N/A");
        assert_eq!(product.currency, "USD");
        assert_eq!(product.rating, None);
        assert_eq!(product.num_ratings, 0);
        assert!(!product.is_prime);
        assert!(!product.is_best_seller);
        assert!(!product.is_amazon_choice);
        assert_eq!(product.original_price, None);
        assert_eq!(product.delivery, None);
        assert_eq!(product.badge, None);
    }

    #[test]
    fn test_full_mapping() {
        let product = ProductRecord::from(raw(json!({
            "asin": "B0CHX3QBCH",
            "product_title": "Gaming Laptop 16\"",
            "product_price": "$999.99",
            "product_original_price": "$1,199.99",
            "currency": "USD",
            "product_star_rating": "4.6",
            "product_num_ratings": 1532,
            "product_url": "https://www.amazon.com/dp/B0CHX3QBCH",
            "product_photo": "https://m.media-amazon.com/images/I/x.jpg",
            "is_prime": true,
            "is_best_seller": false,
            "is_amazon_choice": true,
            "delivery": "FREE delivery Tue, Oct 21",
            "product_badge": "Limited time deal"
        })));

        assert_eq!(product.title, "Gaming Laptop 16\"");
        assert_eq!(product.price, "$999.99");
        assert_eq!(product.original_price.as_deref(), Some("$1,199.99"));
        assert_eq!(product.rating, Some(4.6));
        assert_eq!(product.num_ratings, 1532);
        assert!(product.is_prime);
        assert!(product.is_amazon_choice);
        assert_eq!(product.badge.as_deref(), Some("Limited time deal"));
    }

    #[test]
    fn test_lenient_numbers() {
        let product = ProductRecord::from(raw(json!({
            "product_star_rating": 4,
            "product_num_ratings": "12,408",
        })));
        assert_eq!(product.rating, Some(4.0));
        assert_eq!(product.num_ratings, 12408);

        let product = ProductRecord::from(raw(json!({ "product_price": 19.99 })));
        assert_eq!(product.price, "19.99");

        let product = ProductRecord::from(raw(json!({
            "product_star_rating": "not rated",
            "product_num_ratings": null,
            "product_price": "",
            "currency": null
        })));
        assert_eq!(product.rating, None);
        assert_eq!(product.num_ratings, 0);
        assert_eq!(product.price, "N/A");
        assert_eq!(product.currency, "USD");
    }

    #[test]
    fn test_camel_case_serialization() {
        let product = ProductRecord::from(raw(json!({
            "asin": "B0",
            "product_photo": "https://img",
            "is_prime": true
        })));
        let value = serde_json::to_value(&product).unwrap();

        assert_eq!(value["imageUrl"], "https://img");
        assert_eq!(value["isPrime"], true);
        assert_eq!(value["numRatings"], 0);
        assert!(value.get("badge").is_none());
    }
}
