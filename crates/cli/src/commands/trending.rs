use crate::commands::{load_context, CommandResult};

pub fn run(limit: Option<usize>) -> CommandResult {
    let context = match load_context("trending", false) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let limit = limit.unwrap_or(context.config.recommendations.trending_limit);
    let products = context.config.recommendation_engine().trending(&context.catalog, limit);
    CommandResult::success_with_data("trending", format!("{} trending products", products.len()), &products)
}
