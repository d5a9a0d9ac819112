use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use smartcart_core::config::{LlmConfig, LlmProvider};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_KEY_HEADER: &str = "x-goog-api-key";
const TEMPERATURE: f32 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 100;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Builds the client for the configured provider, or `None` when disabled.
pub fn client_from_config(config: &LlmConfig) -> Result<Option<Arc<dyn LlmClient>>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.provider {
        LlmProvider::Disabled => Ok(None),
        LlmProvider::Gemini => {
            let api_key =
                config.api_key.clone().ok_or_else(|| anyhow!("gemini requires llm.api_key"))?;
            let base_url = config.base_url.clone().unwrap_or_else(|| GEMINI_BASE_URL.to_string());
            Ok(Some(Arc::new(GeminiClient::new(base_url, &config.model, api_key, timeout)?)))
        }
        LlmProvider::Ollama => {
            let base_url =
                config.base_url.clone().ok_or_else(|| anyhow!("ollama requires llm.base_url"))?;
            Ok(Some(Arc::new(OllamaClient::new(base_url, &config.model, timeout)?)))
        }
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build().context("failed to build http client")
}

/// Google Gemini `generateContent`.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .header(GEMINI_KEY_HEADER, self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("gemini returned http {status}"));
        }

        let payload: GeminiResponse =
            response.json().await.context("gemini response was not valid json")?;
        payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text.trim().to_string())
            .ok_or_else(|| anyhow!("gemini response contained no candidates"))
    }
}

/// Local Ollama `/api/generate`.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions { temperature: TEMPERATURE, num_predict: MAX_OUTPUT_TOKENS },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .context("ollama request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("ollama returned http {status}"));
        }

        let payload: OllamaResponse =
            response.json().await.context("ollama response was not valid json")?;
        Ok(payload.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use smartcart_core::config::{LlmConfig, LlmProvider};

    use super::{client_from_config, GeminiClient, LlmClient};

    fn config(provider: LlmProvider) -> LlmConfig {
        LlmConfig {
            provider,
            api_key: None,
            base_url: None,
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn disabled_provider_builds_no_client() {
        let client = client_from_config(&config(LlmProvider::Disabled)).expect("no error");
        assert!(client.is_none());
    }

    #[test]
    fn gemini_without_key_is_an_error() {
        assert!(client_from_config(&config(LlmProvider::Gemini)).is_err());

        let with_key = LlmConfig {
            api_key: Some(SecretString::from("test-key".to_string())),
            ..config(LlmProvider::Gemini)
        };
        assert!(client_from_config(&with_key).expect("client builds").is_some());
    }

    #[test]
    fn ollama_requires_base_url() {
        assert!(client_from_config(&config(LlmProvider::Ollama)).is_err());

        let with_url = LlmConfig {
            base_url: Some("http://localhost:11434".to_string()),
            model: "llama3.1".to_string(),
            ..config(LlmProvider::Ollama)
        };
        assert!(client_from_config(&with_url).expect("client builds").is_some());
    }

    #[tokio::test]
    async fn gemini_transport_errors_do_not_reveal_the_key() {
        let client = GeminiClient::new(
            "http://127.0.0.1:1",
            "m",
            SecretString::from("SUPERSECRETKEY".to_string()),
            std::time::Duration::from_secs(2),
        )
        .expect("client builds");

        let error = client.complete("hi").await.expect_err("nothing listens on port 1");
        let rendered = format!("{error:#}");
        assert!(rendered.contains("gemini request failed"), "{rendered}");
        assert!(!rendered.contains("SUPERSECRETKEY"), "{rendered}");
    }

    #[test]
    fn gemini_endpoint_includes_model() {
        let client = GeminiClient::new(
            "https://example.test/v1beta/",
            "gemini-2.0-flash",
            SecretString::from("k".to_string()),
            std::time::Duration::from_secs(1),
        )
        .expect("client builds");
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
