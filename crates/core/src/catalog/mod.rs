//! Read-only, in-memory product catalog.
//!
//! Catalogs are small enough that every query is a linear scan; no index
//! structures are kept beyond the product list itself.

pub mod fixtures;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::domain::product::Product;
use crate::errors::DomainError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog `{path}`: {message}")]
    Read { path: PathBuf, message: String },
    #[error("could not parse catalog `{path}`: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("catalog product #{index} is invalid: {source}")]
    InvalidProduct { index: usize, source: DomainError },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogIndex {
    products: Vec<Product>,
}

impl CatalogIndex {
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        for (index, product) in products.iter().enumerate() {
            product.validate().map_err(|source| CatalogError::InvalidProduct { index, source })?;
        }
        Ok(Self { products })
    }

    /// Loads a JSON array of products.
    pub fn load_json(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|error| CatalogError::Read {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        let products: Vec<Product> = serde_json::from_str(&raw).map_err(|error| {
            CatalogError::Parse { path: path.to_path_buf(), message: error.to_string() }
        })?;

        let catalog = Self::new(products)?;
        info!(
            event_name = "core.catalog.loaded",
            path = %path.display(),
            product_count = catalog.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// First product whose name equals `name`, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&Product> {
        let needle = name.trim().to_lowercase();
        self.products.iter().find(|product| product.name.to_lowercase() == needle)
    }

    pub fn brands(&self) -> Vec<String> {
        unique_sorted(self.products.iter().map(|product| product.brand.clone()))
    }

    pub fn categories(&self) -> Vec<String> {
        unique_sorted(self.products.iter().map(|product| product.category.clone()))
    }

    pub fn sizes(&self) -> Vec<String> {
        unique_sorted(self.products.iter().map(|product| product.size.clone()))
    }

    pub fn tags(&self) -> Vec<String> {
        unique_sorted(self.products.iter().flat_map(|product| product.tags.iter().cloned()))
    }

    pub fn price_range(&self) -> Option<PriceRange> {
        let min = self.products.iter().map(|product| product.price).min()?;
        let max = self.products.iter().map(|product| product.price).max()?;
        Some(PriceRange { min, max })
    }
}

impl<'a> IntoIterator for &'a CatalogIndex {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}

fn unique_sorted(values: impl Iterator<Item = String>) -> Vec<String> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{fixtures, CatalogError, CatalogIndex, PriceRange};

    #[test]
    fn facets_are_unique_and_sorted() {
        let catalog = CatalogIndex::new(vec![
            fixtures::product("Milk", "Horizon", "Food - Dairy", Decimal::new(499, 2), &["dairy"]),
            fixtures::product("Yogurt", "Chobani", "Food - Dairy", Decimal::new(129, 2), &["dairy", "protein"]),
            fixtures::product("Cheddar", "Horizon", "Food - Dairy", Decimal::new(399, 2), &["dairy"]),
        ])
        .expect("valid catalog");

        assert_eq!(catalog.brands(), vec!["Chobani".to_owned(), "Horizon".to_owned()]);
        assert_eq!(catalog.categories(), vec!["Food - Dairy".to_owned()]);
        assert_eq!(catalog.tags(), vec!["dairy".to_owned(), "protein".to_owned()]);
        assert_eq!(
            catalog.price_range(),
            Some(PriceRange { min: Decimal::new(129, 2), max: Decimal::new(499, 2) })
        );
    }

    #[test]
    fn empty_catalog_has_no_price_range() {
        let catalog = CatalogIndex::default();
        assert!(catalog.is_empty());
        assert_eq!(catalog.price_range(), None);
        assert!(catalog.brands().is_empty());
    }

    #[test]
    fn find_by_name_ignores_case() {
        let catalog = fixtures::demo_catalog();
        let found = catalog.find_by_name("ORGANIC BANANAS").expect("bananas in demo catalog");
        assert_eq!(found.name, "Organic Bananas");
        assert!(catalog.find_by_name("unobtainium").is_none());
    }

    #[test]
    fn new_rejects_negative_prices() {
        let result = CatalogIndex::new(vec![fixtures::product(
            "Broken",
            "Acme",
            "Home",
            Decimal::NEGATIVE_ONE,
            &[],
        )]);
        assert!(matches!(result, Err(CatalogError::InvalidProduct { index: 0, .. })));
    }

    #[test]
    fn load_json_reads_product_array() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[
  {"name": "Sparkling Water", "brand": "LaCroix", "category": "Food - Beverages",
   "price": 4.99, "size": "12 pack", "tags": ["beverage", "sparkling"], "description": "Lime"}
]"#,
        )
        .expect("write catalog");

        let catalog = CatalogIndex::load_json(&path).expect("catalog should load");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.products()[0].price, Decimal::new(499, 2));
    }

    #[test]
    fn load_json_reports_parse_failures() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{ not json").expect("write catalog");

        assert!(matches!(CatalogIndex::load_json(&path), Err(CatalogError::Parse { .. })));
        assert!(matches!(
            CatalogIndex::load_json(&dir.path().join("missing.json")),
            Err(CatalogError::Read { .. })
        ));
    }

    #[test]
    fn demo_catalog_is_valid() {
        let catalog = fixtures::demo_catalog();
        assert!(catalog.len() >= 20);
        assert!(CatalogIndex::new(catalog.products().to_vec()).is_ok());
    }
}
