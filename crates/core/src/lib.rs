//! Catalog, search and recommendation engine for voice-driven shopping.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! catalog/config loading; intent parsing lives in `smartcart-agent`.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod recommendations;
pub mod search;
pub mod similarity;

pub use catalog::{CatalogError, CatalogIndex, PriceRange};
pub use domain::cart::{CartChange, CartItem, CartItemId, CartMutator, ShoppingCart};
pub use domain::categorizer::ItemCategorizer;
pub use domain::intent::{Intent, IntentAction, SearchFilters};
pub use domain::product::{Product, SimilarityResult};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recommendations::{RecommendationEngine, TrendingPolicy};
pub use search::{RelevanceWeights, SearchEngine};
pub use similarity::{CategoryRelationTable, SimilarityEngine, SimilarityWeights};
