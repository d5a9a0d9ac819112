//! Pairwise product similarity.
//!
//! The score is a weighted sum of category, tag, brand, name and price
//! signals, rounded to an integer in `0..=100`. Every term is symmetric, so
//! `similarity(a, b) == similarity(b, a)`.

mod categories;
mod edit_distance;

pub use categories::CategoryRelationTable;
pub use edit_distance::{edit_distance, similarity_ratio};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogIndex;
use crate::domain::product::{Product, SimilarityResult};

pub const MAX_SIMILARITY: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub same_category: f64,
    /// Mutually exclusive with `same_category`.
    pub related_category: f64,
    /// Per tag present in both products, uncapped.
    pub shared_tag: f64,
    pub same_brand: f64,
    /// Multiplier on the normalized name similarity.
    pub name: f64,
    /// Multiplier on the price proximity factor.
    pub price: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            same_category: 40.0,
            related_category: 20.0,
            shared_tag: 15.0,
            same_brand: 25.0,
            name: 20.0,
            price: 10.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SimilarityEngine {
    weights: SimilarityWeights,
    relations: CategoryRelationTable,
}

impl SimilarityEngine {
    pub fn new(weights: SimilarityWeights, relations: CategoryRelationTable) -> Self {
        Self { weights, relations }
    }

    pub fn weights(&self) -> &SimilarityWeights {
        &self.weights
    }

    pub fn relations(&self) -> &CategoryRelationTable {
        &self.relations
    }

    pub fn similarity(&self, left: &Product, right: &Product) -> u8 {
        let weights = &self.weights;
        let mut score = 0.0;

        if left.category == right.category {
            score += weights.same_category;
        } else if self.relations.are_related(&left.category, &right.category) {
            score += weights.related_category;
        }

        let shared_tags = left.tags.intersection(&right.tags).count();
        score += shared_tags as f64 * weights.shared_tag;

        if left.brand == right.brand {
            score += weights.same_brand;
        }

        score += similarity_ratio(&left.name.to_lowercase(), &right.name.to_lowercase()) * weights.name;
        score += price_proximity(left.price, right.price) * weights.price;

        score.round().clamp(0.0, f64::from(MAX_SIMILARITY)) as u8
    }

    /// Products similar to `target`, best first, excluding anything named like it.
    ///
    /// Equal scores keep catalog order.
    pub fn find_similar(
        &self,
        target: &Product,
        catalog: &CatalogIndex,
        limit: usize,
    ) -> Vec<SimilarityResult> {
        let mut scored = catalog
            .iter()
            .filter(|candidate| candidate.name != target.name)
            .map(|candidate| SimilarityResult {
                similarity: self.similarity(target, candidate),
                product: candidate.clone(),
            })
            .filter(|result| result.similarity > 0)
            .collect::<Vec<_>>();

        scored.sort_by(|left, right| right.similarity.cmp(&left.similarity));
        scored.truncate(limit);
        scored
    }
}

/// `1 - |a - b| / max(a, b)`, or `0` when both prices are zero.
pub fn price_proximity(left: Decimal, right: Decimal) -> f64 {
    let max = left.max(right);
    if max <= Decimal::ZERO {
        return 0.0;
    }
    let ratio = (left - right).abs() / max;
    (Decimal::ONE - ratio).to_f64().unwrap_or(0.0)
}
