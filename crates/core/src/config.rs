use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{fixtures, CatalogError, CatalogIndex};
use crate::recommendations::{
    RecommendationEngine, TrendingPolicy, DEFAULT_RECOMMENDATION_LIMIT, DEFAULT_TRENDING_LIMIT,
};
use crate::search::{RelevanceWeights, SearchEngine};
use crate::similarity::{CategoryRelationTable, SimilarityEngine, SimilarityWeights};

pub const DEFAULT_CONFIG_FILE: &str = "smartcart.toml";
pub const NESTED_CONFIG_FILE: &str = "config/smartcart.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub llm: LlmConfig,
    pub grammar: GrammarConfig,
    pub search: SearchConfig,
    pub similarity: SimilarityConfig,
    pub recommendations: RecommendationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    /// JSON product list; the demo catalog is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

/// Vocabulary the local intent grammar is compiled from.
///
/// Multi-word entries such as `"show me"` match any run of whitespace
/// between their words.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarConfig {
    pub search_verbs: Vec<String>,
    pub price_bounds: Vec<String>,
    pub descriptive_tags: Vec<String>,
    pub add_verbs: Vec<String>,
    pub remove_verbs: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct SearchConfig {
    pub weights: RelevanceWeights,
}

#[derive(Clone, Debug)]
pub struct SimilarityConfig {
    pub weights: SimilarityWeights,
    pub category_groups: BTreeMap<String, Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct RecommendationConfig {
    pub default_limit: usize,
    pub trending_limit: usize,
    pub trending_max_price: Decimal,
    pub trending_seed: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Disabled,
    Gemini,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub trending_seed: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            llm: LlmConfig {
                provider: LlmProvider::Disabled,
                api_key: None,
                base_url: None,
                model: "gemini-2.0-flash".to_string(),
                timeout_secs: 10,
            },
            grammar: GrammarConfig::default(),
            search: SearchConfig::default(),
            similarity: SimilarityConfig::default(),
            recommendations: RecommendationConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            search_verbs: words(&["find", "search", "show me", "look for"]),
            price_bounds: words(&["under", "below", "less than"]),
            descriptive_tags: words(&["organic", "fresh", "fruit"]),
            add_verbs: words(&["add", "get", "buy", "need", "want"]),
            remove_verbs: words(&["remove", "delete", "take out", "get rid of"]),
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            category_groups: CategoryRelationTable::retail_defaults().groups().clone(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        let trending = TrendingPolicy::default();
        Self {
            default_limit: DEFAULT_RECOMMENDATION_LIMIT,
            trending_limit: DEFAULT_TRENDING_LIMIT,
            trending_max_price: trending.max_price,
            trending_seed: trending.seed,
        }
    }
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected disabled|gemini|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl SimilarityConfig {
    pub fn engine(&self) -> SimilarityEngine {
        SimilarityEngine::new(self.weights, CategoryRelationTable::new(self.category_groups.clone()))
    }
}

impl RecommendationConfig {
    pub fn trending_policy(&self) -> TrendingPolicy {
        TrendingPolicy {
            max_price: self.trending_max_price,
            seed: self.trending_seed,
            default_limit: self.trending_limit,
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The configured catalog file, or the demo catalog when none is set.
    pub fn load_catalog(&self) -> Result<CatalogIndex, CatalogError> {
        match &self.catalog.path {
            Some(path) => CatalogIndex::load_json(path),
            None => Ok(fixtures::demo_catalog()),
        }
    }

    pub fn search_engine(&self) -> SearchEngine {
        SearchEngine::new(self.search.weights)
    }

    pub fn recommendation_engine(&self) -> RecommendationEngine {
        RecommendationEngine::new(self.similarity.engine(), self.recommendations.trending_policy())
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(grammar) = patch.grammar {
            if let Some(search_verbs) = grammar.search_verbs {
                self.grammar.search_verbs = search_verbs;
            }
            if let Some(price_bounds) = grammar.price_bounds {
                self.grammar.price_bounds = price_bounds;
            }
            if let Some(descriptive_tags) = grammar.descriptive_tags {
                self.grammar.descriptive_tags = descriptive_tags;
            }
            if let Some(add_verbs) = grammar.add_verbs {
                self.grammar.add_verbs = add_verbs;
            }
            if let Some(remove_verbs) = grammar.remove_verbs {
                self.grammar.remove_verbs = remove_verbs;
            }
        }

        if let Some(weights) = patch.search.and_then(|search| search.weights) {
            let target = &mut self.search.weights;
            if let Some(value) = weights.exact_name {
                target.exact_name = value;
            }
            if let Some(value) = weights.name_prefix {
                target.name_prefix = value;
            }
            if let Some(value) = weights.name_contains {
                target.name_contains = value;
            }
            if let Some(value) = weights.brand {
                target.brand = value;
            }
            if let Some(value) = weights.category {
                target.category = value;
            }
            if let Some(value) = weights.tag {
                target.tag = value;
            }
            if let Some(value) = weights.description {
                target.description = value;
            }
        }

        if let Some(similarity) = patch.similarity {
            if let Some(weights) = similarity.weights {
                let target = &mut self.similarity.weights;
                if let Some(value) = weights.same_category {
                    target.same_category = value;
                }
                if let Some(value) = weights.related_category {
                    target.related_category = value;
                }
                if let Some(value) = weights.shared_tag {
                    target.shared_tag = value;
                }
                if let Some(value) = weights.same_brand {
                    target.same_brand = value;
                }
                if let Some(value) = weights.name {
                    target.name = value;
                }
                if let Some(value) = weights.price {
                    target.price = value;
                }
            }
            // A configured table replaces the built-in one wholesale.
            if let Some(category_groups) = similarity.category_groups {
                self.similarity.category_groups = category_groups;
            }
        }

        if let Some(recommendations) = patch.recommendations {
            if let Some(default_limit) = recommendations.default_limit {
                self.recommendations.default_limit = default_limit;
            }
            if let Some(trending_limit) = recommendations.trending_limit {
                self.recommendations.trending_limit = trending_limit;
            }
            if let Some(trending_max_price) = recommendations.trending_max_price {
                self.recommendations.trending_max_price = trending_max_price;
            }
            if let Some(trending_seed) = recommendations.trending_seed {
                self.recommendations.trending_seed = trending_seed;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SMARTCART_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("SMARTCART_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("SMARTCART_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SMARTCART_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("SMARTCART_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("SMARTCART_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_env("SMARTCART_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SMARTCART_RECOMMENDATIONS_DEFAULT_LIMIT") {
            self.recommendations.default_limit =
                parse_env("SMARTCART_RECOMMENDATIONS_DEFAULT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("SMARTCART_RECOMMENDATIONS_TRENDING_LIMIT") {
            self.recommendations.trending_limit =
                parse_env("SMARTCART_RECOMMENDATIONS_TRENDING_LIMIT", &value)?;
        }
        if let Some(value) = read_env("SMARTCART_RECOMMENDATIONS_TRENDING_MAX_PRICE") {
            self.recommendations.trending_max_price =
                parse_env("SMARTCART_RECOMMENDATIONS_TRENDING_MAX_PRICE", &value)?;
        }
        if let Some(value) = read_env("SMARTCART_RECOMMENDATIONS_TRENDING_SEED") {
            self.recommendations.trending_seed =
                parse_env("SMARTCART_RECOMMENDATIONS_TRENDING_SEED", &value)?;
        }

        let log_level =
            read_env("SMARTCART_LOGGING_LEVEL").or_else(|| read_env("SMARTCART_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SMARTCART_LOGGING_FORMAT").or_else(|| read_env("SMARTCART_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(trending_seed) = overrides.trending_seed {
            self.recommendations.trending_seed = trending_seed;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_grammar(&self.grammar)?;
        validate_similarity(&self.similarity)?;
        validate_recommendations(&self.recommendations)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::Disabled => return Ok(()),
        LlmProvider::Gemini => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for the gemini provider (set SMARTCART_LLM_API_KEY)"
                        .to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let base_url = llm.base_url.as_deref().map(str::trim).unwrap_or_default();
            if base_url.is_empty() {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for the ollama provider (e.g. http://localhost:11434)"
                        .to_string(),
                ));
            }
        }
    }

    if let Some(base_url) = &llm.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm.model must not be empty when a provider is enabled".to_string(),
        ));
    }

    Ok(())
}

fn validate_grammar(grammar: &GrammarConfig) -> Result<(), ConfigError> {
    let lists = [
        ("grammar.search_verbs", &grammar.search_verbs),
        ("grammar.price_bounds", &grammar.price_bounds),
        ("grammar.descriptive_tags", &grammar.descriptive_tags),
        ("grammar.add_verbs", &grammar.add_verbs),
        ("grammar.remove_verbs", &grammar.remove_verbs),
    ];

    for (key, values) in lists {
        if values.is_empty() {
            return Err(ConfigError::Validation(format!("{key} must list at least one word")));
        }
        if values.iter().any(|value| value.trim().is_empty()) {
            return Err(ConfigError::Validation(format!("{key} must not contain blank entries")));
        }
    }

    Ok(())
}

fn validate_similarity(similarity: &SimilarityConfig) -> Result<(), ConfigError> {
    let weights = &similarity.weights;
    let all = [
        ("same_category", weights.same_category),
        ("related_category", weights.related_category),
        ("shared_tag", weights.shared_tag),
        ("same_brand", weights.same_brand),
        ("name", weights.name),
        ("price", weights.price),
    ];
    if let Some((name, _)) = all.iter().find(|(_, value)| !value.is_finite() || *value < 0.0) {
        return Err(ConfigError::Validation(format!(
            "similarity.weights.{name} must be a finite, non-negative number"
        )));
    }

    if similarity.category_groups.keys().any(|group| group.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "similarity.category_groups must not contain unnamed groups".to_string(),
        ));
    }

    Ok(())
}

fn validate_recommendations(recommendations: &RecommendationConfig) -> Result<(), ConfigError> {
    if recommendations.default_limit == 0 {
        return Err(ConfigError::Validation(
            "recommendations.default_limit must be greater than zero".to_string(),
        ));
    }
    if recommendations.trending_limit == 0 {
        return Err(ConfigError::Validation(
            "recommendations.trending_limit must be greater than zero".to_string(),
        ));
    }
    if recommendations.trending_max_price <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "recommendations.trending_max_price must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    llm: Option<LlmPatch>,
    grammar: Option<GrammarPatch>,
    search: Option<SearchPatch>,
    similarity: Option<SimilarityPatch>,
    recommendations: Option<RecommendationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GrammarPatch {
    search_verbs: Option<Vec<String>>,
    price_bounds: Option<Vec<String>>,
    descriptive_tags: Option<Vec<String>>,
    add_verbs: Option<Vec<String>>,
    remove_verbs: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    weights: Option<RelevanceWeightsPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RelevanceWeightsPatch {
    exact_name: Option<u32>,
    name_prefix: Option<u32>,
    name_contains: Option<u32>,
    brand: Option<u32>,
    category: Option<u32>,
    tag: Option<u32>,
    description: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarityPatch {
    weights: Option<SimilarityWeightsPatch>,
    category_groups: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarityWeightsPatch {
    same_category: Option<f64>,
    related_category: Option<f64>,
    shared_tag: Option<f64>,
    same_brand: Option<f64>,
    name: Option<f64>,
    price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    default_limit: Option<usize>,
    trending_limit: Option<usize>,
    trending_max_price: Option<Decimal>,
    trending_seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> Result<PathBuf, String> {
        let path = dir.path().join("smartcart.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn defaults_load_without_file_or_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.llm.provider == LlmProvider::Disabled, "remote parsing is off by default")?;
        ensure(config.catalog.path.is_none(), "demo catalog is used by default")?;
        ensure(config.recommendations.default_limit == 4, "default limit should be 4")?;
        ensure(config.recommendations.trending_limit == 6, "trending limit should be 6")?;
        ensure(
            config.recommendations.trending_max_price == Decimal::new(20, 0),
            "trending price ceiling should be 20",
        )?;
        ensure(
            config.grammar.search_verbs.iter().any(|verb| verb == "show me"),
            "multi-word search verbs should be present",
        )?;
        ensure(
            config.similarity.category_groups.contains_key("Food"),
            "retail category groups should be the default table",
        )?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact logs by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_GEMINI_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[llm]
provider = "gemini"
api_key = "${TEST_GEMINI_KEY}"
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.provider == LlmProvider::Gemini, "provider should come from file")?;
            ensure(
                config.llm.api_key.as_ref().map(|key| key.expose_secret() == "key-from-env")
                    == Some(true),
                "api key should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_GEMINI_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(&dir, "[llm]\napi_key = \"${SMARTCART_TEST_UNSET_VAR}\"\n")?;

        match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() }) {
            Err(ConfigError::MissingEnvInterpolation { var }) => {
                ensure(var == "SMARTCART_TEST_UNSET_VAR", "error should name the variable")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected interpolation failure".to_string()),
        }
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMARTCART_CATALOG_PATH", "from-env.json");
        env::set_var("SMARTCART_RECOMMENDATIONS_TRENDING_SEED", "99");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[catalog]
path = "from-file.json"

[recommendations]
trending_seed = 7
default_limit = 8

[logging]
level = "warn"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    trending_seed: Some(1234),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path == Some(PathBuf::from("from-env.json")),
                "env catalog path should win over file",
            )?;
            ensure(config.recommendations.default_limit == 8, "file value should beat default")?;
            ensure(config.recommendations.trending_seed == 1234, "override seed should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_vars(&["SMARTCART_CATALOG_PATH", "SMARTCART_RECOMMENDATIONS_TRENDING_SEED"]);
        result
    }

    #[test]
    fn weights_and_vocabulary_are_patched_field_by_field() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[grammar]
descriptive_tags = ["organic", "vegan"]

[search.weights]
brand = 55

[similarity.weights]
same_brand = 30.5

[similarity.category_groups]
snacks = ["Chips", "Pretzels"]
"#,
        )?;

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.grammar.descriptive_tags == vec!["organic".to_string(), "vegan".to_string()],
            "tag vocabulary should be replaced",
        )?;
        ensure(config.grammar.add_verbs.len() == 5, "untouched vocabularies keep defaults")?;
        ensure(config.search.weights.brand == 55, "brand weight should be patched")?;
        ensure(config.search.weights.exact_name == 100, "other relevance weights keep defaults")?;
        ensure(config.similarity.weights.same_brand == 30.5, "similarity weight should be patched")?;
        ensure(config.similarity.weights.same_category == 40.0, "unpatched weight keeps default")?;
        ensure(
            config.similarity.category_groups.len() == 1,
            "configured table replaces the built-in one",
        )?;
        ensure(
            config.similarity.engine().relations().are_related("Chips", "Pretzels"),
            "engine should use the configured table",
        )
    }

    #[test]
    fn gemini_without_api_key_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMARTCART_LLM_PROVIDER", "gemini");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.api_key")
            );
            ensure(has_message, "validation failure should mention llm.api_key")
        })();

        clear_vars(&["SMARTCART_LLM_PROVIDER"]);
        result
    }

    #[test]
    fn empty_vocabulary_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(&dir, "[grammar]\nremove_verbs = []\n")?;

        match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() }) {
            Err(ConfigError::Validation(message)) => {
                ensure(message.contains("grammar.remove_verbs"), "error should name the list")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected validation failure".to_string()),
        }
    }

    #[test]
    fn invalid_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMARTCART_LLM_TIMEOUT_SECS", "soon");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "SMARTCART_LLM_TIMEOUT_SECS", "error should name the variable")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected env override failure".to_string()),
        };

        clear_vars(&["SMARTCART_LLM_TIMEOUT_SECS"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "a required but absent file should fail",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMARTCART_LLM_PROVIDER", "gemini");
        env::set_var("SMARTCART_LLM_API_KEY", "AIza-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("AIza-secret-value"), "debug output should not contain api key")
        })();

        clear_vars(&["SMARTCART_LLM_PROVIDER", "SMARTCART_LLM_API_KEY"]);
        result
    }

    #[test]
    fn engines_are_built_from_config() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { trending_seed: Some(42), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        let catalog = config.load_catalog().map_err(|err| err.to_string())?;
        ensure(!catalog.is_empty(), "demo catalog should load")?;
        ensure(
            config.recommendation_engine().trending_policy().seed == 42,
            "trending seed should flow into the engine",
        )?;
        ensure(
            !config.search_engine().query(&catalog, Some("milk"), None).is_empty(),
            "search engine should be usable",
        )
    }
}
