//! Catalog filtering and relevance ranking.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::CatalogIndex;
use crate::domain::intent::SearchFilters;
use crate::domain::product::Product;

/// Relevance points awarded by the text query.
///
/// The three name tiers are mutually exclusive; the remaining fields are
/// added on top of whichever name tier applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceWeights {
    pub exact_name: u32,
    pub name_prefix: u32,
    pub name_contains: u32,
    pub brand: u32,
    pub category: u32,
    pub tag: u32,
    pub description: u32,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            exact_name: 100,
            name_prefix: 80,
            name_contains: 60,
            brand: 40,
            category: 30,
            tag: 20,
            description: 10,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchEngine {
    weights: RelevanceWeights,
}

impl SearchEngine {
    pub fn new(weights: RelevanceWeights) -> Self {
        Self { weights }
    }

    /// Products matching every supplied predicate, most relevant first.
    ///
    /// Products with equal scores keep their catalog order.
    pub fn query(
        &self,
        catalog: &CatalogIndex,
        text: Option<&str>,
        filters: Option<&SearchFilters>,
    ) -> Vec<Product> {
        let needle = text.map(str::to_lowercase).filter(|needle| !needle.is_empty());
        let needle = needle.as_deref();

        let mut ranked = catalog
            .iter()
            .filter(|product| needle.map_or(true, |needle| matches_text(product, needle)))
            .filter(|product| filters.map_or(true, |filters| matches_filters(product, filters)))
            .map(|product| (needle.map_or(0, |needle| self.relevance(product, needle)), product))
            .collect::<Vec<_>>();

        // `sort_by` is stable.
        ranked.sort_by(|(left, _), (right, _)| right.cmp(left));

        debug!(
            event_name = "core.search.query",
            query = needle.unwrap_or(""),
            catalog_size = catalog.len(),
            result_count = ranked.len(),
            "search completed"
        );

        ranked.into_iter().map(|(_, product)| product.clone()).collect()
    }

    /// Relevance of `product` for an already lower-cased query.
    pub fn relevance(&self, product: &Product, needle: &str) -> u32 {
        let weights = &self.weights;
        let name = product.name.to_lowercase();

        let mut score = if name == needle {
            weights.exact_name
        } else if name.starts_with(needle) {
            weights.name_prefix
        } else if name.contains(needle) {
            weights.name_contains
        } else {
            0
        };

        if contains_ci(&product.brand, needle) {
            score = score.saturating_add(weights.brand);
        }
        if contains_ci(&product.category, needle) {
            score = score.saturating_add(weights.category);
        }
        if product.tags.iter().any(|tag| contains_ci(tag, needle)) {
            score = score.saturating_add(weights.tag);
        }
        if contains_ci(&product.description, needle) {
            score = score.saturating_add(weights.description);
        }

        score
    }
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

fn matches_text(product: &Product, needle: &str) -> bool {
    contains_ci(&product.name, needle)
        || contains_ci(&product.brand, needle)
        || contains_ci(&product.description, needle)
        || contains_ci(&product.category, needle)
        || product.tags.iter().any(|tag| contains_ci(tag, needle))
}

fn matches_filters(product: &Product, filters: &SearchFilters) -> bool {
    if let Some(brand) = &filters.brand {
        if !contains_ci(&product.brand, &brand.to_lowercase()) {
            return false;
        }
    }
    if let Some(min_price) = filters.min_price {
        if product.price < min_price {
            return false;
        }
    }
    if let Some(max_price) = filters.max_price {
        if product.price > max_price {
            return false;
        }
    }
    if let Some(category) = &filters.category {
        if !contains_ci(&product.category, &category.to_lowercase()) {
            return false;
        }
    }
    if let Some(size) = &filters.size {
        if !contains_ci(&product.size, &size.to_lowercase()) {
            return false;
        }
    }
    if !filters.tags.is_empty() {
        let any_tag = filters.tags.iter().any(|wanted| {
            let wanted = wanted.to_lowercase();
            product.tags.iter().any(|tag| contains_ci(tag, &wanted))
        });
        if !any_tag {
            return false;
        }
    }
    true
}
