//! Network-backed intent parsing.
//!
//! The remote source only has to honour a narrow contract: given an
//! utterance, produce an [`Intent`] or an [`IntentSourceError`]. Falling back
//! to the local grammar is the resolver's job.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use smartcart_core::domain::intent::{Intent, IntentAction, SearchFilters};
use thiserror::Error;

use crate::llm::LlmClient;

#[derive(Debug, Error)]
pub enum IntentSourceError {
    #[error("remote intent source transport failed: {0}")]
    Transport(String),
    #[error("remote intent source timed out after {0} ms")]
    Timeout(u128),
    #[error("remote intent source returned malformed data: {0}")]
    Malformed(String),
    #[error("remote intent source payload has an invalid shape: {0}")]
    InvalidShape(String),
}

#[async_trait]
pub trait IntentSource: Send + Sync {
    async fn parse(&self, text: &str) -> Result<Intent, IntentSourceError>;

    fn source_name(&self) -> &str;
}

const PROMPT_TEMPLATE: &str = r#"You are a shopping list assistant. Parse the following speech input into a structured command.

Speech input: "{utterance}"

Extract the following information:
1. action: "add", "remove", or "search" (based on what the user wants to do)
2. item: the specific item name
3. quantity: the number of items (default to 1 if not specified)
4. filters: object with search criteria (only for search actions)

For search actions, extract these filters:
- brand: specific brand name
- minPrice: minimum price
- maxPrice: maximum price (from phrases like "under $5", "less than $10")
- category: product category
- size: product size
- tags: array of tags like "organic", "fresh", "fruit"

Examples:
- "add milk" -> {"action": "add", "item": "milk", "quantity": 1}
- "add 2 bananas" -> {"action": "add", "item": "banana", "quantity": 2}
- "remove apples" -> {"action": "remove", "item": "apple", "quantity": 1}
- "I need 3 bottles of water" -> {"action": "add", "item": "water", "quantity": 3}
- "find organic apples" -> {"action": "search", "item": "apple", "quantity": 1, "filters": {"tags": ["organic"]}}
- "search for toothpaste under $5" -> {"action": "search", "item": "toothpaste", "quantity": 1, "filters": {"maxPrice": 5}}
- "search for Nike shoes" -> {"action": "search", "item": "shoes", "quantity": 1, "filters": {"brand": "Nike"}}

Return ONLY a JSON object with action, item, quantity, and filters (if applicable). If the command is unclear or not related to shopping, return null."#;

pub fn render_prompt(utterance: &str) -> String {
    PROMPT_TEMPLATE.replace("{utterance}", &utterance.replace('"', "'"))
}

/// Any [`LlmClient`] driven by the fixed shopping prompt.
pub struct LlmIntentSource {
    client: Arc<dyn LlmClient>,
    name: String,
}

impl LlmIntentSource {
    pub fn new(client: Arc<dyn LlmClient>, name: impl Into<String>) -> Self {
        Self { client, name: name.into() }
    }
}

#[async_trait]
impl IntentSource for LlmIntentSource {
    async fn parse(&self, text: &str) -> Result<Intent, IntentSourceError> {
        let raw = self
            .client
            .complete(&render_prompt(text))
            .await
            .map_err(|error| IntentSourceError::Transport(format!("{error:#}")))?;
        parse_payload(&raw)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Strips an enclosing ```` ```json ```` or ```` ``` ```` fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    trimmed
}

#[derive(Debug, Deserialize)]
struct RemotePayload {
    action: Option<Value>,
    item: Option<Value>,
    #[serde(default)]
    quantity: Option<Value>,
    #[serde(default)]
    filters: Option<RemoteFilters>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFilters {
    brand: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    category: Option<String>,
    size: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Decodes and validates a raw model response.
pub fn parse_payload(raw: &str) -> Result<Intent, IntentSourceError> {
    let body = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|error| IntentSourceError::Malformed(error.to_string()))?;
    if value.is_null() {
        return Err(IntentSourceError::InvalidShape("model declined with null".to_string()));
    }

    let payload: RemotePayload = serde_json::from_value(value)
        .map_err(|error| IntentSourceError::InvalidShape(error.to_string()))?;
    validate_payload(payload)
}

fn validate_payload(payload: RemotePayload) -> Result<Intent, IntentSourceError> {
    let label = match payload.action {
        Some(Value::String(label)) => label,
        Some(other) => {
            return Err(IntentSourceError::InvalidShape(format!("action is not a string: {other}")))
        }
        None => return Err(IntentSourceError::InvalidShape("missing `action`".to_string())),
    };
    let action = IntentAction::from_label(&label)
        .ok_or_else(|| IntentSourceError::InvalidShape(format!("unknown action `{label}`")))?;

    let item = match payload.item {
        Some(Value::String(item)) => item.trim().to_string(),
        Some(other) => {
            return Err(IntentSourceError::InvalidShape(format!("item is not a string: {other}")))
        }
        None => return Err(IntentSourceError::InvalidShape("missing `item`".to_string())),
    };

    let quantity = payload
        .quantity
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|quantity| u32::try_from(quantity).ok())
        .filter(|quantity| *quantity > 0)
        .unwrap_or(1);

    let intent = match action {
        IntentAction::Add => Intent::add(item, quantity),
        IntentAction::Remove => Intent::remove(item),
        IntentAction::Search => {
            let filters = payload.filters.map(into_filters).filter(|filters| !filters.is_empty());
            Intent::search(item, filters)
        }
        IntentAction::None => Intent::none(),
    };
    Ok(intent)
}

fn into_filters(remote: RemoteFilters) -> SearchFilters {
    SearchFilters {
        brand: remote.brand,
        min_price: remote.min_price,
        max_price: remote.max_price,
        category: remote.category,
        size: remote.size,
        tags: remote.tags.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use smartcart_core::domain::intent::{Intent, SearchFilters};

    use super::{
        parse_payload, render_prompt, strip_code_fence, IntentSource, IntentSourceError,
        LlmIntentSource,
    };
    use crate::llm::LlmClient;

    struct CannedClient(Result<String, String>);

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.0.clone().map_err(|message| anyhow!(message))
        }
    }

    #[test]
    fn strips_tagged_and_untagged_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("Here you go:\n```json {\"a\":1} ```"), "{\"a\":1}");
    }

    #[test]
    fn valid_payloads_become_intents() {
        assert_eq!(
            parse_payload(r#"{"action":"add","item":"banana","quantity":2}"#).expect("valid"),
            Intent::add("banana", 2)
        );
        assert_eq!(
            parse_payload(r#"{"action":"REMOVE","item":"apple"}"#).expect("valid"),
            Intent::remove("apple")
        );
        assert_eq!(
            parse_payload(
                "```json\n{\"action\":\"search\",\"item\":\"toothpaste\",\"quantity\":1,\"filters\":{\"maxPrice\":5}}\n```"
            )
            .expect("valid"),
            Intent::search("toothpaste", Some(SearchFilters::with_max_price(Decimal::new(5, 0))))
        );
    }

    #[test]
    fn missing_zero_or_fractional_quantity_defaults_to_one() {
        for raw in [
            r#"{"action":"add","item":"milk"}"#,
            r#"{"action":"add","item":"milk","quantity":0}"#,
            r#"{"action":"add","item":"milk","quantity":1.5}"#,
            r#"{"action":"add","item":"milk","quantity":"two"}"#,
        ] {
            assert_eq!(parse_payload(raw).expect("valid"), Intent::add("milk", 1), "{raw}");
        }
    }

    #[test]
    fn filters_only_survive_on_search() {
        let intent = parse_payload(r#"{"action":"add","item":"milk","filters":{"brand":"Horizon"}}"#)
            .expect("valid");
        assert!(intent.filters.is_none());

        let intent = parse_payload(r#"{"action":"search","item":"shoes","filters":{}}"#).expect("valid");
        assert!(intent.filters.is_none());
    }

    #[test]
    fn malformed_and_invalid_payloads_are_rejected() {
        assert!(matches!(parse_payload("not json"), Err(IntentSourceError::Malformed(_))));
        assert!(matches!(parse_payload("null"), Err(IntentSourceError::InvalidShape(_))));
        assert!(matches!(
            parse_payload(r#"{"item":"milk"}"#),
            Err(IntentSourceError::InvalidShape(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"action":"add"}"#),
            Err(IntentSourceError::InvalidShape(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"action":"buy","item":"milk"}"#),
            Err(IntentSourceError::InvalidShape(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"action":"add","item":null}"#),
            Err(IntentSourceError::InvalidShape(_))
        ));
        assert!(matches!(parse_payload("[1,2]"), Err(IntentSourceError::InvalidShape(_))));
    }

    #[test]
    fn prompt_embeds_utterance() {
        let prompt = render_prompt("add \"two\" apples");
        assert!(prompt.contains("Speech input: \"add 'two' apples\""));
        assert!(prompt.contains("\"search\""));
    }

    #[tokio::test]
    async fn llm_source_maps_transport_failures() {
        let source =
            LlmIntentSource::new(Arc::new(CannedClient(Err("connection refused".into()))), "fake");
        let error = source.parse("add milk").await.expect_err("transport error");
        assert!(matches!(error, IntentSourceError::Transport(ref message) if message.contains("refused")));
        assert_eq!(source.source_name(), "fake");
    }

    #[tokio::test]
    async fn llm_source_parses_fenced_reply() {
        let reply = "```json\n{\"action\":\"add\",\"item\":\"milk\",\"quantity\":3}\n```".to_string();
        let source = LlmIntentSource::new(Arc::new(CannedClient(Ok(reply))), "fake");
        assert_eq!(source.parse("add three milk").await.expect("parsed"), Intent::add("milk", 3));
    }
}
