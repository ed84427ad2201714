//! Google Gemini `generateContent` client
//!
//! The usable model id is discovered through the models-list endpoint once
//! and cached until an auth or not-found response invalidates it.

use super::types::{Role, Turn};
use super::{LlmError, TextGenerator};
use crate::config::GenerationConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";
const GENERATE_METHOD: &str = "generateContent";

/// Cached model id with explicit invalidation
#[derive(Debug, Default)]
pub struct ModelCache {
    model: RwLock<Option<String>>,
}

impl ModelCache {
    pub fn get(&self) -> Option<String> {
        self.model.read().clone()
    }

    pub fn set(&self, model: String) {
        *self.model.write() = Some(model);
    }

    pub fn invalidate(&self) {
        if self.model.write().take().is_some() {
            debug!("Model cache invalidated");
        }
    }
}

/// Gemini REST client
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    preferred_model: Option<String>,
    cache: ModelCache,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig, api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            preferred_model: config.preferred_model.clone(),
            cache: ModelCache::default(),
        })
    }

    /// Build a client with the key taken from the configured environment variable
    pub fn from_config(config: &GenerationConfig) -> crate::Result<Self> {
        let api_key = config.api_key()?;
        Ok(Self::new(config, api_key)?)
    }

    fn models_url(&self) -> String {
        format!("{}/v1beta/models?pageSize=100", self.base_url)
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/{}:{}", self.base_url, model, GENERATE_METHOD)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, LlmError> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::timeout(format!("Request timeout: {}", e))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {}", e))
                } else {
                    LlmError::network(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);
            let error = LlmError::from_status(status.as_u16(), &message);
            if error.invalidates_model() {
                self.cache.invalidate();
            }
            return Err(error);
        }

        Ok(body)
    }

    /// Convert a transcript into a request body
    ///
    /// The persona instructions travel as the first `user` content; agent
    /// turns become `model` contents.
    pub fn translate_request(turns: &[Turn]) -> GenerateRequest {
        let contents = turns
            .iter()
            .filter(|turn| !turn.text.trim().is_empty())
            .map(|turn| GeminiContent {
                role: Some(
                    match turn.role {
                        Role::System | Role::User => "user",
                        Role::Agent => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: turn.text.clone(),
                }],
            })
            .collect();

        GenerateRequest { contents }
    }

    /// First text part of the first candidate
    pub fn extract_reply(response: GenerateResponse) -> Result<String, LlmError> {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::empty_reply("No text in response candidates"));
        }
        Ok(text)
    }

    /// Choose the configured model if listed, else the first Gemini model
    /// that supports `generateContent`
    pub fn pick_model(models: &[ModelInfo], preferred: Option<&str>) -> Option<String> {
        let usable = |m: &&ModelInfo| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == GENERATE_METHOD)
        };

        if let Some(preferred) = preferred {
            let qualified = format!("models/{}", preferred);
            if let Some(model) = models
                .iter()
                .filter(usable)
                .find(|m| m.name == preferred || m.name == qualified)
            {
                return Some(model.name.clone());
            }
            warn!("Preferred model {} not available, falling back", preferred);
        }

        models
            .iter()
            .filter(usable)
            .find(|m| m.name.contains("gemini"))
            .map(|m| m.name.clone())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn resolve_model(&self) -> Result<String, LlmError> {
        if let Some(model) = self.cache.get() {
            return Ok(model);
        }

        let body = self.send(self.client.get(self.models_url())).await?;
        let list: ListModelsResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::unknown(format!("Failed to parse model list: {}", e)))?;

        let model = Self::pick_model(&list.models, self.preferred_model.as_deref())
            .ok_or_else(|| LlmError::no_model("No Gemini model supports generateContent"))?;

        info!(model = %model, "Resolved generation model");
        self.cache.set(model.clone());
        Ok(model)
    }

    async fn generate(&self, turns: &[Turn]) -> Result<String, LlmError> {
        let model = self.resolve_model().await?;
        let request = Self::translate_request(turns);

        let body = self
            .send(self.client.post(self.generate_url(&model)).json(&request))
            .await?;
        let response: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::unknown(format!("Failed to parse response: {}", e)))?;

        Self::extract_reply(response)
    }

    fn invalidate_model(&self) {
        self.cache.invalidate();
    }

    fn model_id(&self) -> Option<String> {
        self.cache.get()
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;

    fn model(name: &str, methods: &[&str]) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_pick_first_usable_gemini_model() {
        let models = vec![
            model("models/embedding-001", &["embedContent"]),
            model("models/gemini-1.5-pro", &["countTokens"]),
            model("models/gemini-1.5-flash", &["generateContent", "countTokens"]),
            model("models/gemini-2.0-flash", &["generateContent"]),
        ];
        assert_eq!(
            GeminiClient::pick_model(&models, None),
            Some("models/gemini-1.5-flash".to_string())
        );
    }

    #[test]
    fn test_pick_preferred_model() {
        let models = vec![
            model("models/gemini-1.5-flash", &["generateContent"]),
            model("models/gemini-2.0-flash", &["generateContent"]),
        ];
        assert_eq!(
            GeminiClient::pick_model(&models, Some("gemini-2.0-flash")),
            Some("models/gemini-2.0-flash".to_string())
        );
        // unknown preference falls back to discovery
        assert_eq!(
            GeminiClient::pick_model(&models, Some("gemini-ultra")),
            Some("models/gemini-1.5-flash".to_string())
        );
    }

    #[test]
    fn test_pick_model_none_usable() {
        let models = vec![model("models/text-bison", &["generateText"])];
        assert_eq!(GeminiClient::pick_model(&models, None), None);
    }

    #[test]
    fn test_translate_request_roles() {
        let turns = vec![
            Turn::system("You are Sarah."),
            Turn::agent("Hi! How can I help?"),
            Turn::user("I need a new kitchen."),
        ];
        let request = GeminiClient::translate_request(&turns);
        let json = serde_json::to_value(&request).unwrap();

        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "You are Sarah.");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
    }

    #[test]
    fn test_extract_reply() {
        let body = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "  Sure, when works for you?  "}]}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            GeminiClient::extract_reply(response).unwrap(),
            "Sure, when works for you?"
        );
    }

    #[test]
    fn test_extract_reply_empty() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let err = GeminiClient::extract_reply(response).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::EmptyReply);
    }

    #[test]
    fn test_parse_model_list() {
        let body = r#"{"models": [{"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent"]}]}"#;
        let list: ListModelsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(list.models.len(), 1);
        assert_eq!(list.models[0].supported_generation_methods, vec!["generateContent"]);
    }

    #[test]
    fn test_model_cache_invalidation() {
        let cache = ModelCache::default();
        assert_eq!(cache.get(), None);
        cache.set("models/gemini-1.5-flash".into());
        assert_eq!(cache.get().as_deref(), Some("models/gemini-1.5-flash"));
        cache.invalidate();
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_urls() {
        let client = GeminiClient::new(&GenerationConfig::default(), "test-key".into()).unwrap();
        assert_eq!(
            client.generate_url("models/gemini-1.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!client.models_url().contains("test-key"));
    }
}
