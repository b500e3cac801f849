//! Ollama client implementation
//!
//! Async HTTP client for the Ollama chat API with streaming and
//! schema-constrained (`format`) output.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::core::{Config, EnsembleError, Message, Result, ToolCall, ToolDefinition};
use crate::llm::traits::{
    GenerateRequest, LanguageModel, ObjectResult, StreamResult, TextResult, TokenUsage,
};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions<'a>>,
    stream: bool,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(flatten)]
    extra: &'a serde_json::Map<String, serde_json::Value>,
}

/// Ollama tool call format
#[derive(Debug, Clone, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

/// Ollama function in tool call
#[derive(Debug, Clone, Deserialize)]
struct OllamaFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Message in a chat response
#[derive(Debug, Default, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

/// Ollama chat response; streaming chunks share the same shape
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaClient {
    /// Create a new Ollama client with default configuration
    pub fn new() -> Result<Self> {
        Self::from_config(&Config::default())
    }

    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ollama.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ollama_url(),
        })
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Base URL of the Ollama server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_request<'a>(
        request: &'a GenerateRequest,
        structured: bool,
        stream: bool,
    ) -> ChatRequest<'a> {
        let has_options = request.temperature.is_some()
            || request.max_tokens.is_some()
            || !request.extra.is_empty();

        let options = if has_options {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                extra: &request.extra,
            })
        } else {
            None
        };

        ChatRequest {
            model: &request.model,
            messages: request.messages(),
            tools: &request.tools,
            format: if structured {
                request.schema.as_ref()
            } else {
                None
            },
            options,
            stream,
        }
    }

    /// POST a chat request and check the status
    async fn send(&self, model: &str, body: &ChatRequest<'_>) -> Result<Response> {
        let request_json = serde_json::to_string(body)?;
        debug!(body = %request_json, "ollama request");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EnsembleError::provider(format!(
                        "Cannot connect to Ollama at {}. Is it running?",
                        self.base_url
                    ))
                } else {
                    EnsembleError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(EnsembleError::ModelNotFound(model.to_string()));
            }

            return Err(EnsembleError::provider(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    async fn chat(&self, request: &GenerateRequest, structured: bool) -> Result<ChatResponse> {
        let body = Self::chat_request(request, structured, false);
        let response = self.send(&request.model, &body).await?;

        let response_text = response.text().await?;
        debug!(response = %response_text, "ollama response");

        serde_json::from_str(&response_text)
            .map_err(|e| EnsembleError::provider(format!("Failed to parse response: {}", e)))
    }

    /// Open a streaming chat and expose its content deltas lazily
    async fn chat_stream(
        &self,
        request: &GenerateRequest,
        structured: bool,
    ) -> Result<StreamResult> {
        let body = Self::chat_request(request, structured, true);
        let response = self.send(&request.model, &body).await?;

        Ok(StreamResult::new(Box::pin(content_stream(response.bytes_stream()))))
    }
}

/// Lazily turn an NDJSON byte stream into content deltas
///
/// Lines are split on raw bytes so a character spanning two chunks is
/// decoded whole.
fn content_stream<S, B, E>(bytes: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    try_stream! {
        futures::pin_mut!(bytes);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = bytes.next().await {
            let chunk =
                chunk.map_err(|e| EnsembleError::provider(format!("Stream error: {}", e)))?;
            buffer.extend_from_slice(chunk.as_ref());

            while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline_pos).collect();

                if let Some(content) = parse_stream_bytes(&line)? {
                    yield content;
                }
            }
        }

        if let Some(content) = parse_stream_bytes(&buffer)? {
            yield content;
        }
    }
}

fn parse_stream_bytes(line: &[u8]) -> Result<Option<String>> {
    let line = std::str::from_utf8(line)
        .map_err(|e| EnsembleError::provider(format!("Stream chunk is not UTF-8: {}", e)))?;
    parse_stream_line(line.trim())
}

/// Extract the content delta from one NDJSON line, skipping empty ones
fn parse_stream_line(line: &str) -> Result<Option<String>> {
    if line.is_empty() {
        return Ok(None);
    }

    let chunk: ChatResponse = serde_json::from_str(line)
        .map_err(|e| EnsembleError::provider(format!("Failed to parse stream chunk: {}", e)))?;

    Ok(chunk
        .message
        .map(|m| m.content)
        .filter(|content| !content.is_empty()))
}

fn usage_of(response: &ChatResponse) -> Option<TokenUsage> {
    TokenUsage::from_counts(response.prompt_eval_count, response.eval_count)
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate_text(&self, request: &GenerateRequest) -> Result<TextResult> {
        let response = self.chat(request, false).await?;
        let usage = usage_of(&response);
        let message = response.message.unwrap_or_default();

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::new(tc.function.name, tc.function.arguments))
            .collect();

        Ok(TextResult {
            text: message.content,
            tool_calls,
            usage,
            model: response.model,
        })
    }

    async fn stream_text(&self, request: &GenerateRequest) -> Result<StreamResult> {
        self.chat_stream(request, false).await
    }

    async fn generate_object(&self, request: &GenerateRequest) -> Result<ObjectResult> {
        let response = self.chat(request, true).await?;
        let usage = usage_of(&response);
        let content = response.message.map(|m| m.content).unwrap_or_default();

        let object = serde_json::from_str(&content).map_err(|e| {
            EnsembleError::provider(format!("Model output is not valid JSON: {}", e))
        })?;

        Ok(ObjectResult {
            object,
            usage,
            model: response.model,
        })
    }

    async fn stream_object(&self, request: &GenerateRequest) -> Result<StreamResult> {
        self.chat_stream(request, true).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
