use crate::commands::{load_context, CommandResult};

pub fn run(name: &str, limit: Option<usize>) -> CommandResult {
    let context = match load_context("similar", false) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let Some(target) = context.catalog.find_by_name(name) else {
        return CommandResult::failure(
            "similar",
            "not_found",
            format!("no catalog product named `{name}`"),
            4,
        );
    };

    let limit = limit.unwrap_or(context.config.recommendations.default_limit);
    let results =
        context.config.recommendation_engine().recommend_for_item(target, &context.catalog, limit);
    let message = format!("{} products similar to {}", results.len(), target.name);
    CommandResult::success_with_data("similar", message, &results)
}
