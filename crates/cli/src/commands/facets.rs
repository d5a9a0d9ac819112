use serde::Serialize;
use smartcart_core::catalog::PriceRange;

use crate::commands::{load_context, CommandResult};

#[derive(Debug, Serialize)]
struct FacetOutput {
    product_count: usize,
    brands: Vec<String>,
    categories: Vec<String>,
    sizes: Vec<String>,
    tags: Vec<String>,
    price_range: Option<PriceRange>,
}

/// Distinct filter values for building search UIs.
pub fn run() -> CommandResult {
    let context = match load_context("facets", false) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let catalog = &context.catalog;

    let facets = FacetOutput {
        product_count: catalog.len(),
        brands: catalog.brands(),
        categories: catalog.categories(),
        sizes: catalog.sizes(),
        tags: catalog.tags(),
        price_range: catalog.price_range(),
    };
    CommandResult::success_with_data("facets", "catalog facets", &facets)
}
