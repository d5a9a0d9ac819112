use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub brand: String,
    /// Hierarchical label such as `Food - Produce`.
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub description: String,
}

impl Product {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvariantViolation("product name must not be empty".to_owned()));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::NegativePrice { name: self.name.clone(), price: self.price });
        }
        Ok(())
    }
}

/// A product annotated with its similarity to some reference product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimilarityResult {
    #[serde(flatten)]
    pub product: Product,
    /// Integer score in `0..=100`.
    pub similarity: u8,
}
