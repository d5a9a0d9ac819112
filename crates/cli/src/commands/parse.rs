use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use smartcart_agent::grammar::IntentGrammar;
use smartcart_agent::llm::client_from_config;
use smartcart_agent::remote::{IntentSource, LlmIntentSource};
use smartcart_agent::resolver::{IntentOrigin, IntentResolver};
use smartcart_core::config::AppConfig;
use smartcart_core::domain::intent::Intent;

use crate::commands::{build_runtime, load_config, CommandResult};

#[derive(Debug, Serialize)]
struct ParseOutput {
    utterance: String,
    intent: Intent,
    origin: IntentOrigin,
}

pub fn run(text: &str, local_only: bool) -> CommandResult {
    let config = match load_config("parse", local_only) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let resolver = match build_resolver("parse", &config, local_only) {
        Ok(resolver) => resolver,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("parse") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let (intent, origin) = runtime.block_on(resolver.resolve_with_origin(text));
    let message = format!("resolved `{}` intent", intent.action);
    CommandResult::success_with_data(
        "parse",
        message,
        &ParseOutput { utterance: text.to_string(), intent, origin },
    )
}

/// Grammar from config, fronted by the configured model unless `local_only`.
pub(crate) fn build_resolver(
    command: &str,
    config: &AppConfig,
    local_only: bool,
) -> Result<IntentResolver, CommandResult> {
    let grammar = IntentGrammar::new(&config.grammar).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("grammar issue: {error}"), 2)
    })?;
    if local_only {
        return Ok(IntentResolver::local(grammar));
    }

    let client = client_from_config(&config.llm).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("llm issue: {error:#}"), 2)
    })?;
    let remote = client.map(|client| {
        let provider = format!("{:?}", config.llm.provider).to_lowercase();
        Arc::new(LlmIntentSource::new(client, provider)) as Arc<dyn IntentSource>
    });

    Ok(IntentResolver::new(grammar, remote, Duration::from_secs(config.llm.timeout_secs)))
}
