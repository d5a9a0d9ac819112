use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use smartcart_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE, NESTED_CONFIG_FILE};
use toml::Value;

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl Field {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let catalog_path = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<built-in demo catalog>".to_string());
    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    let grammar = &config.grammar;

    vec![
        Field::new("catalog.path", catalog_path, &["SMARTCART_CATALOG_PATH"]),
        Field::new(
            "llm.provider",
            format!("{:?}", config.llm.provider).to_lowercase(),
            &["SMARTCART_LLM_PROVIDER"],
        ),
        Field::new("llm.model", config.llm.model.clone(), &["SMARTCART_LLM_MODEL"]),
        Field::new(
            "llm.base_url",
            config.llm.base_url.as_deref().unwrap_or("<unset>"),
            &["SMARTCART_LLM_BASE_URL"],
        ),
        Field::new("llm.api_key", api_key, &["SMARTCART_LLM_API_KEY"]),
        Field::new(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["SMARTCART_LLM_TIMEOUT_SECS"],
        ),
        Field::new("grammar.search_verbs", word_count(&grammar.search_verbs), &[]),
        Field::new("grammar.price_bounds", word_count(&grammar.price_bounds), &[]),
        Field::new("grammar.descriptive_tags", word_count(&grammar.descriptive_tags), &[]),
        Field::new("grammar.add_verbs", word_count(&grammar.add_verbs), &[]),
        Field::new("grammar.remove_verbs", word_count(&grammar.remove_verbs), &[]),
        Field::new(
            "similarity.category_groups",
            format!("{} groups", config.similarity.category_groups.len()),
            &[],
        ),
        Field::new(
            "recommendations.default_limit",
            config.recommendations.default_limit.to_string(),
            &["SMARTCART_RECOMMENDATIONS_DEFAULT_LIMIT"],
        ),
        Field::new(
            "recommendations.trending_limit",
            config.recommendations.trending_limit.to_string(),
            &["SMARTCART_RECOMMENDATIONS_TRENDING_LIMIT"],
        ),
        Field::new(
            "recommendations.trending_max_price",
            config.recommendations.trending_max_price.to_string(),
            &["SMARTCART_RECOMMENDATIONS_TRENDING_MAX_PRICE"],
        ),
        Field::new(
            "recommendations.trending_seed",
            config.recommendations.trending_seed.to_string(),
            &["SMARTCART_RECOMMENDATIONS_TRENDING_SEED"],
        ),
        Field::new(
            "logging.level",
            config.logging.level.clone(),
            &["SMARTCART_LOGGING_LEVEL", "SMARTCART_LOG_LEVEL"],
        ),
        Field::new(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["SMARTCART_LOGGING_FORMAT", "SMARTCART_LOG_FORMAT"],
        ),
    ]
}

fn word_count(words: &[String]) -> String {
    format!("{} words", words.len())
}

fn detect_config_path() -> Option<PathBuf> {
    [DEFAULT_CONFIG_FILE, NESTED_CONFIG_FILE].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
