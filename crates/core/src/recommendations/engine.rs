use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rust_decimal::Decimal;
use tracing::debug;

use super::DEFAULT_TRENDING_LIMIT;
use crate::catalog::CatalogIndex;
use crate::domain::cart::CartItem;
use crate::domain::product::{Product, SimilarityResult};
use crate::similarity::SimilarityEngine;

/// Which products qualify as trending and how the sample is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrendingPolicy {
    /// Exclusive upper price bound; products must also cost more than zero.
    pub max_price: Decimal,
    /// Seed for the shuffle, so the same catalog always yields the same sample.
    pub seed: u64,
    pub default_limit: usize,
}

impl Default for TrendingPolicy {
    fn default() -> Self {
        Self { max_price: Decimal::new(20, 0), seed: 0x5eed, default_limit: DEFAULT_TRENDING_LIMIT }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RecommendationEngine {
    similarity: SimilarityEngine,
    trending: TrendingPolicy,
}

impl RecommendationEngine {
    pub fn new(similarity: SimilarityEngine, trending: TrendingPolicy) -> Self {
        Self { similarity, trending }
    }

    pub fn similarity(&self) -> &SimilarityEngine {
        &self.similarity
    }

    pub fn trending_policy(&self) -> &TrendingPolicy {
        &self.trending
    }

    pub fn recommend_for_item(
        &self,
        target: &Product,
        catalog: &CatalogIndex,
        limit: usize,
    ) -> Vec<SimilarityResult> {
        self.similarity.find_similar(target, catalog, limit)
    }

    /// Suggestions based on the most recently added cart item.
    ///
    /// Anything already in the cart (by case-insensitive name) is dropped
    /// after the top `limit` are chosen, so fewer than `limit` may come back.
    pub fn recommend_for_cart(
        &self,
        cart_items: &[CartItem],
        catalog: &CatalogIndex,
        limit: usize,
    ) -> Vec<SimilarityResult> {
        let Some(latest) = cart_items.last() else {
            return Vec::new();
        };

        let basis = catalog.find_by_name(&latest.name).cloned().unwrap_or_else(|| probe_product(latest));
        let in_cart = cart_items.iter().map(|item| item.name.to_lowercase()).collect::<Vec<_>>();

        let mut results = self.similarity.find_similar(&basis, catalog, limit);
        results.retain(|result| !in_cart.contains(&result.product.name.to_lowercase()));

        debug!(
            event_name = "core.recommendations.cart",
            basis = %basis.name,
            result_count = results.len(),
            "cart recommendations computed"
        );
        results
    }

    /// Suggestions based on the top search hit.
    pub fn recommend_for_query(
        &self,
        query: &str,
        search_results: &[Product],
        catalog: &CatalogIndex,
        limit: usize,
    ) -> Vec<SimilarityResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        match search_results.first() {
            Some(primary) => self.similarity.find_similar(primary, catalog, limit),
            None => Vec::new(),
        }
    }

    /// A seeded random sample of reasonably priced products.
    pub fn trending(&self, catalog: &CatalogIndex, limit: usize) -> Vec<Product> {
        let mut candidates = catalog
            .iter()
            .filter(|product| product.price > Decimal::ZERO && product.price < self.trending.max_price)
            .cloned()
            .collect::<Vec<_>>();

        let mut rng = StdRng::seed_from_u64(self.trending.seed);
        candidates.shuffle(&mut rng);
        candidates.truncate(limit);
        candidates
    }
}

/// Stand-in for a cart item the catalog does not know about.
fn probe_product(item: &CartItem) -> Product {
    Product {
        name: item.name.clone(),
        brand: String::new(),
        category: item.category.clone(),
        price: Decimal::ZERO,
        size: String::new(),
        tags: Default::default(),
        description: String::new(),
    }
}
