//! Intent resolution and voice-turn orchestration.
//!
//! - [`grammar`]: deterministic, priority-ordered local parser
//! - [`llm`] / [`remote`]: optional LLM-backed parser behind [`remote::IntentSource`]
//! - [`resolver`]: remote-first resolution with a total local fallback
//! - [`runtime`]: applies a resolved intent to the cart, search and recommendations
//!
//! The LLM is only ever a translator from speech to an [`smartcart_core::Intent`];
//! every ranking decision is made by `smartcart-core`.

pub mod grammar;
pub mod llm;
pub mod remote;
pub mod resolver;
pub mod runtime;

pub use grammar::{GrammarError, IntentGrammar};
pub use llm::{client_from_config, LlmClient};
pub use remote::{IntentSource, IntentSourceError, LlmIntentSource};
pub use resolver::{IntentOrigin, IntentResolver};
pub use runtime::{TranscriptEvent, TurnOutcome, VoiceRuntime};
