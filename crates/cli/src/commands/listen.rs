//! Line-oriented voice session.
//!
//! Each input line is one transcript: either plain text, treated as a final
//! result, or a JSON `{"text": ..., "isFinal": ...}` event. Every line gets
//! one JSON line back describing the turn and the cart after it.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use serde::Serialize;
use smartcart_agent::runtime::{TranscriptEvent, TurnOutcome, VoiceRuntime};
use smartcart_core::domain::cart::{CartItem, CartMutator, ShoppingCart};
use tracing::{info, warn};

use crate::commands::parse::build_resolver;
use crate::commands::{build_runtime, load_context, CommandResult};

#[derive(Debug, Serialize)]
struct TurnLine<'a> {
    turn: usize,
    #[serde(flatten)]
    outcome: TurnOutcome,
    cart: &'a [CartItem],
}

#[derive(Debug, Serialize)]
struct RejectedLine {
    turn: usize,
    error: String,
}

pub fn run(local_only: bool) -> CommandResult {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with_io(stdin.lock(), &mut stdout.lock(), local_only)
}

pub fn run_with_io(input: impl BufRead, output: &mut impl Write, local_only: bool) -> CommandResult {
    let context = match load_context("listen", local_only) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let resolver = match build_resolver("listen", &context.config, local_only) {
        Ok(resolver) => resolver,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("listen") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let voice = VoiceRuntime::new(
        resolver,
        Arc::new(context.catalog),
        context.config.search_engine(),
        context.config.recommendation_engine(),
    )
    .with_recommendation_limit(context.config.recommendations.default_limit);
    let mut cart = ShoppingCart::default();
    let mut turns = 0;

    info!(event_name = "cli.listen.started", local_only, "voice session started");
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                return CommandResult::failure("listen", "io", format!("failed to read input: {error}"), 3)
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        turns += 1;

        let rendered = match decode_event(line) {
            Ok(event) => {
                let outcome = runtime.block_on(voice.handle_transcript(&event, &mut cart));
                serde_json::to_string(&TurnLine { turn: turns, outcome, cart: cart.items() })
            }
            Err(error) => {
                warn!(event_name = "cli.listen.rejected", turn = turns, error = %error, "transcript rejected");
                serde_json::to_string(&RejectedLine { turn: turns, error: error.to_string() })
            }
        };
        let written = match rendered {
            Ok(rendered) => writeln!(output, "{rendered}").and_then(|()| output.flush()),
            Err(error) => return CommandResult::failure("listen", "serialization", error.to_string(), 3),
        };
        if let Err(error) = written {
            return CommandResult::failure("listen", "io", format!("failed to write output: {error}"), 3);
        }
    }

    info!(event_name = "cli.listen.finished", turns, cart_size = cart.len(), "voice session finished");
    CommandResult::success_with_data("listen", format!("processed {turns} transcripts"), &cart)
}

fn decode_event(line: &str) -> Result<TranscriptEvent, serde_json::Error> {
    if line.starts_with('{') {
        serde_json::from_str(line)
    } else {
        Ok(TranscriptEvent::final_text(line))
    }
}
