//! Contextual product recommendations.
//!
//! Wraps [`SimilarityEngine`](crate::similarity::SimilarityEngine) to suggest
//! products for a single item, the current cart, or a search, plus a
//! reproducible "trending" sample.

mod engine;

pub use engine::{RecommendationEngine, TrendingPolicy};

/// Suggestions returned when the caller does not ask for a specific count.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 4;

/// Size of the trending sample when none is requested.
pub const DEFAULT_TRENDING_LIMIT: usize = 6;
