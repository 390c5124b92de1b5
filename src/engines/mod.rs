use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::SearchError,
    models::{ProductRecord, SearchPage},
};

#[async_trait]
pub trait SearchEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Searches `keyword` and returns at most `max_results` products.
    async fn search_products(
        &self,
        keyword: &str,
        max_results: usize,
        region: &str,
    ) -> Result<SearchPage, SearchError>;

    /// Best effort lookup of a single product, `None` on any failure.
    async fn product_details(&self, id: &str, region: &str) -> Option<ProductRecord>;
}

pub mod amazon;

pub use amazon::AmazonSearch;

pub(crate) type SharedSearchEngine = Arc<dyn SearchEngine>;
