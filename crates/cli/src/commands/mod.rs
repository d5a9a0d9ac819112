pub mod config;
pub mod facets;
pub mod listen;
pub mod parse;
pub mod search;
pub mod similar;
pub mod trending;

use serde::Serialize;
use serde_json::Value;
use smartcart_core::catalog::{CatalogError, CatalogIndex};
use smartcart_core::config::{AppConfig, ConfigError, LlmProvider, LoadOptions};
use smartcart_core::errors::ApplicationError;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Success carrying a structured body under `data`.
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => {
                let payload = CommandOutcome {
                    command: command.to_string(),
                    status: "ok".to_string(),
                    error_class: None,
                    message: message.into(),
                    data: Some(data),
                };
                Self { exit_code: 0, output: serialize_payload(payload) }
            }
            Err(error) => Self::failure(command, "serialization", error.to_string(), 3),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Validated configuration plus the catalog it points at.
pub(crate) struct CommandContext {
    pub config: AppConfig,
    pub catalog: CatalogIndex,
}

/// Loads configuration. With `local_only` the LLM provider is forced off,
/// so an incomplete provider section cannot block grammar-only commands.
pub(crate) fn load_config(command: &str, local_only: bool) -> Result<AppConfig, CommandResult> {
    let mut options = LoadOptions::default();
    if local_only {
        options.overrides.llm_provider = Some(LlmProvider::Disabled);
    }
    AppConfig::load(options).map_err(|error| config_failure(command, error))
}

pub(crate) fn load_context(command: &str, local_only: bool) -> Result<CommandContext, CommandResult> {
    let config = load_config(command, local_only)?;
    let catalog = config.load_catalog().map_err(|error| catalog_failure(command, error))?;
    Ok(CommandContext { config, catalog })
}

fn config_failure(command: &str, error: ConfigError) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();
    let error = ApplicationError::from(error);
    warn!(
        event_name = "cli.command.config_rejected",
        command,
        correlation_id = %correlation_id,
        error = %error,
        "configuration rejected"
    );
    CommandResult::failure(command, "config_validation", format!("{error} (correlation id {correlation_id})"), 2)
}

fn catalog_failure(command: &str, error: CatalogError) -> CommandResult {
    let detail = error.to_string();
    let interface = ApplicationError::from(error).into_interface(Uuid::new_v4().to_string());
    CommandResult::failure(
        command,
        interface.error_class(),
        format!("{} ({detail})", interface.user_message()),
        3,
    )
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}
