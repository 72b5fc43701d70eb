/*!
 * OpenAI-compatible chat completions client and translator.
 *
 * `OpenAI` is the HTTP client (retries, exponential backoff, client-side rate
 * limit). `OpenAITranslator` implements the `Translator` contract on top of it:
 * single texts are sent as plain chat turns, batches use a JSON protocol
 *
 * ```text
 * request:  {"items": [{"id": "0", "text": "..."}, ...]}
 * response: {"translations": [{"id": "0", "translation": "..."}, ...]}
 * ```
 *
 * The same client talks to LM Studio, which exposes the same API locally.
 */

use async_trait::async_trait;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::{Translator, TranslatorCapabilities};

/// Upper bound for a single backoff sleep
const MAX_BACKOFF_MS: u64 = 60_000;

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role of the message sender (system, user or assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Chat completions request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            response_format: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Ask the model to answer with a JSON object
    pub fn json_object(mut self) -> Self {
        self.response_format = Some(ResponseFormat { format_type: "json_object".to_string() });
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

/// Chat completions response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// HTTP client for OpenAI-compatible chat completions endpoints
#[derive(Debug)]
pub struct OpenAI {
    client: Client,
    api_key: String,
    endpoint: String,
    max_retries: u32,
    backoff_base_ms: u64,
    /// Requests per minute, `None` disables client-side limiting
    rate_limit: Option<u32>,
    last_request: Mutex<Option<Instant>>,
}

impl OpenAI {
    /// Create a new client with default retry settings
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, 30, 3, 1000, None)
    }

    /// Create a new client with explicit timeout, retry and rate-limit settings
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        rate_limit: Option<u32>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs.max(1)))
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            max_retries,
            backoff_base_ms,
            rate_limit: rate_limit.filter(|r| *r > 0),
            last_request: Mutex::new(None),
        }
    }

    fn completions_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/chat/completions", base)
    }

    /// Space request starts at least `60s / rate_limit` apart
    async fn wait_for_rate_limit(&self) {
        let Some(rpm) = self.rate_limit else {
            return;
        };
        let interval = Duration::from_millis(60_000 / rpm as u64);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self.backoff_base_ms.saturating_mul(1u64 << attempt.min(16));
        let jitter = rand::rng().random_range(0..=self.backoff_base_ms / 4);
        Duration::from_millis(exponential.saturating_add(jitter).min(MAX_BACKOFF_MS))
    }

    /// Send a chat request, retrying transient failures with exponential backoff
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = self.completions_url();
        let mut attempt = 0;

        loop {
            self.wait_for_rate_limit().await;

            let error = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<ChatResponse>()
                            .await
                            .map_err(|e| ProviderError::ParseError(e.to_string()));
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            error!("OpenAI authentication failed ({}): {}", status, message);
                            return Err(ProviderError::AuthenticationError(message));
                        }
                        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
                        s if s.is_server_error() => ProviderError::ApiError {
                            status_code: s.as_u16(),
                            message,
                        },
                        s => {
                            error!("OpenAI API error ({}): {}", s, message);
                            return Err(ProviderError::ApiError {
                                status_code: s.as_u16(),
                                message,
                            });
                        }
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => ProviderError::ConnectionError(e.to_string()),
                Err(e) => return Err(ProviderError::RequestFailed(e.to_string())),
            };

            if attempt >= self.max_retries {
                error!("OpenAI request failed after {} attempts: {}", attempt + 1, error);
                return Err(error);
            }
            let delay = self.backoff(attempt);
            warn!("OpenAI request failed ({}), retrying in {:?}", error, delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Text of the first choice
    pub fn extract_text(response: &ChatResponse) -> String {
        response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default()
    }
}

/// Sizing hints of a model family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCapabilities {
    pub batch_char_budget: usize,
    pub recommended_concurrency: usize,
    pub max_batch_size: usize,
}

impl ModelCapabilities {
    /// Look up a model, ignoring any `:tag` suffix; unknown models get conservative defaults
    pub fn for_model(model: &str) -> Self {
        let base = model.split(':').next().unwrap_or(model);
        match base {
            "gpt-4o" => Self { batch_char_budget: 180_000, recommended_concurrency: 12, max_batch_size: 120 },
            "gpt-4o-mini" => Self { batch_char_budget: 120_000, recommended_concurrency: 16, max_batch_size: 160 },
            "gpt-4o-mini-translation" => {
                Self { batch_char_budget: 180_000, recommended_concurrency: 18, max_batch_size: 200 }
            }
            _ => Self { batch_char_budget: 75_000, recommended_concurrency: 10, max_batch_size: 80 },
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchItem<'a> {
    id: String,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    translations: Vec<BatchTranslation>,
}

#[derive(Debug, Deserialize)]
struct BatchTranslation {
    id: serde_json::Value,
    translation: String,
}

/// Translator backed by an OpenAI-compatible chat model
#[derive(Debug)]
pub struct OpenAITranslator {
    client: OpenAI,
    model: String,
    temperature: f32,
    capabilities: ModelCapabilities,
    document_context: RwLock<Option<String>>,
}

impl OpenAITranslator {
    pub fn new(client: OpenAI, model: impl Into<String>, temperature: f32) -> Self {
        let model = model.into();
        let capabilities = ModelCapabilities::for_model(&model);
        debug!("Model {} capabilities: {:?}", model, capabilities);
        Self {
            client,
            model,
            temperature,
            capabilities,
            document_context: RwLock::new(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// System prompt for a language pair, including the document summary when set
    pub fn build_system_prompt(&self, target_language: &str, source_language: &str) -> String {
        let source = language_utils::display_name(source_language);
        let target = language_utils::display_name(target_language);

        let mut prompt = format!(
            "You are a professional document translator translating {source} into {target}.\n\n\
             Translate faithfully and idiomatically:\n\
             - keep the meaning, tone and level of formality of the source\n\
             - expand abbreviations only when the target language requires it\n\
             - keep proper nouns unless a standard translation exists\n\
             - adapt dates and numbers to {target} conventions\n\
             - keep placeholder tokens such as <TAB> or <NBSP> exactly where they are\n\n\
             Return only the translation, without explanations. Preserve whitespace and line breaks. \
             Leave text that is already in {target} unchanged."
        );

        if let Some(context) = self.document_context.read().as_deref() {
            prompt.push_str("\n\nDOCUMENT CONTEXT:\n");
            prompt.push_str(context);
        }
        prompt
    }

    /// User message carrying a batch as JSON
    pub fn build_batch_message(
        texts: &[&str],
        target_language: &str,
        source_language: &str,
        batch_context: Option<&str>,
    ) -> Result<String, ProviderError> {
        let items: Vec<BatchItem<'_>> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| BatchItem { id: i.to_string(), text })
            .collect();
        let payload = serde_json::to_string(&serde_json::json!({ "items": items }))
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let mut instructions = vec![
            format!(
                "Translate each item from {} to {}.",
                language_utils::display_name(source_language),
                language_utils::display_name(target_language)
            ),
            r#"Answer with a JSON object with a key "translations" holding an array."#.to_string(),
            r#"Each element has the keys "id" (string) and "translation" (string)."#.to_string(),
            "Keep whitespace, punctuation and line breaks as in the input.".to_string(),
            "Do not add explanations, markdown fences or extra fields.".to_string(),
        ];
        if let Some(context) = batch_context {
            instructions.push(format!("Batch context: {}", context));
        }

        Ok(format!("{}\n\nINPUT_JSON:\n{}", instructions.join("\n"), payload))
    }

    /// Parse the JSON batch answer into an id -> translation map
    pub fn parse_batch_response(content: &str) -> Result<HashMap<String, String>, ProviderError> {
        let cleaned = strip_code_fence(content.trim());
        let parsed: BatchResponse =
            serde_json::from_str(cleaned).map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(parsed
            .translations
            .into_iter()
            .map(|t| {
                let id = match t.id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (id, t.translation)
            })
            .collect())
    }
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fence(content: &str) -> &str {
    if !content.starts_with("```") {
        return content;
    }
    let after_open = content.find('\n').map(|i| &content[i + 1..]).unwrap_or("");
    let body = match after_open.rfind("```") {
        Some(i) => &after_open[..i],
        None => after_open,
    };
    body.trim()
}

#[async_trait]
impl Translator for OpenAITranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
        context: Option<&str>,
    ) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let mut user_message = format!(
            "Translate the following text to {}:\n\n{}",
            language_utils::display_name(target_language),
            text
        );
        if let Some(context) = context {
            user_message = format!("Context: {}\n\n{}", context, user_message);
        }

        let request = ChatRequest::new(
            &self.model,
            vec![
                ChatMessage::system(self.build_system_prompt(target_language, source_language)),
                ChatMessage::user(user_message),
            ],
        )
        .temperature(self.temperature);

        let response = self.client.complete(&request).await?;
        let translated = OpenAI::extract_text(&response);
        if translated.is_empty() {
            return Err(ProviderError::ParseError("Empty response from model".to_string()));
        }
        Ok(translated)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        source_language: &str,
        batch_context: Option<&str>,
    ) -> Result<Vec<String>, ProviderError> {
        let filled: Vec<usize> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, _)| i)
            .collect();
        if filled.is_empty() {
            return Ok(texts.to_vec());
        }

        let sent: Vec<&str> = filled.iter().map(|&i| texts[i].as_str()).collect();
        let total_chars: usize = sent.iter().map(|t| t.chars().count()).sum();
        if total_chars > self.capabilities.batch_char_budget {
            return Err(ProviderError::RequestFailed(format!(
                "Batch of {} characters exceeds the model budget of {}",
                total_chars, self.capabilities.batch_char_budget
            )));
        }

        let request = ChatRequest::new(
            &self.model,
            vec![
                ChatMessage::system(self.build_system_prompt(target_language, source_language)),
                ChatMessage::user(Self::build_batch_message(
                    &sent,
                    target_language,
                    source_language,
                    batch_context,
                )?),
            ],
        )
        .temperature(self.temperature)
        .json_object();

        let response = self.client.complete(&request).await?;
        let parsed = Self::parse_batch_response(&OpenAI::extract_text(&response))?;
        if parsed.len() != sent.len() {
            return Err(ProviderError::LengthMismatch {
                expected: sent.len(),
                actual: parsed.len(),
            });
        }

        let mut result = texts.to_vec();
        for (local_id, &original_index) in filled.iter().enumerate() {
            let translation = parsed.get(&local_id.to_string()).ok_or_else(|| {
                ProviderError::ParseError(format!("Missing translation for id {}", local_id))
            })?;
            result[original_index] = translation.clone();
        }
        Ok(result)
    }

    fn set_document_context(&self, summary: &str) {
        info!("Document context set: {}", summary.chars().take(100).collect::<String>());
        *self.document_context.write() = Some(summary.to_string());
    }

    fn capabilities(&self) -> TranslatorCapabilities {
        TranslatorCapabilities {
            supports_context: true,
            supports_async: true,
            recommended_concurrency: Some(self.capabilities.recommended_concurrency),
            batch_char_budget: Some(self.capabilities.batch_char_budget),
            max_batch_size: Some(self.capabilities.max_batch_size),
        }
    }
}
