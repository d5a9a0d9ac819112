use rust_decimal::Decimal;
use serde::Serialize;
use smartcart_core::domain::intent::SearchFilters;
use smartcart_core::domain::product::{Product, SimilarityResult};

use crate::commands::{load_context, CommandResult};

#[derive(Debug, Default, Clone)]
pub struct SearchArgs {
    pub query: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub tags: Vec<String>,
}

impl SearchArgs {
    fn filters(&self) -> Option<SearchFilters> {
        let filters = SearchFilters {
            brand: self.brand.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            category: self.category.clone(),
            size: self.size.clone(),
            tags: self.tags.iter().cloned().collect(),
        };
        (!filters.is_empty()).then_some(filters)
    }
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    results: Vec<Product>,
    recommendations: Vec<SimilarityResult>,
}

pub fn run(args: &SearchArgs) -> CommandResult {
    let context = match load_context("search", false) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let filters = args.filters();
    let query = args.query.as_deref();
    let results = context.config.search_engine().query(&context.catalog, query, filters.as_ref());
    let recommendations = context.config.recommendation_engine().recommend_for_query(
        query.unwrap_or(""),
        &results,
        &context.catalog,
        context.config.recommendations.default_limit,
    );

    let message = format!("{} matching products", results.len());
    CommandResult::success_with_data("search", message, &SearchOutput { results, recommendations })
}
