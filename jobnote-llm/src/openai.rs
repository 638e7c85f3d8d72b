//! OpenAI-compatible chat completions client.
//!
//! Used for locally hosted servers (LM Studio, llama.cpp server, vLLM) that
//! expose `/v1/chat/completions`; they usually ignore the bearer token but
//! some proxies insist on one being present.
use crate::traits::{GenerationOptions, LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use jobnote_http::HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenAiCompatClient {
    client: HttpClient,
    api_key: String,
    model: String,
    json_mode: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: Option<u32>,
}

impl OpenAiCompatClient {
    /// `json_mode` enables `response_format: json_object` for JSON requests;
    /// leave it off for servers that reject the field.
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        json_mode: bool,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = HttpClient::new(base_url)
            .map_err(|e| LlmError::Config(format!("HttpClient init failed: {e}")))?
            .with_timeout(timeout);

        Ok(Self {
            client,
            api_key,
            model,
            json_mode,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &GenerationOptions,
    ) -> Result<LlmResponse, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let req = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: (options.json_output && self.json_mode).then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        tracing::debug!(model = %self.model, base = %self.client.base_url(), "sending chat completion");
        let resp: ChatResponse = self
            .client
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await?;

        let Some(choice) = resp.choices.into_iter().next() else {
            return Err(LlmError::EmptyResponse(
                "no choices returned from chat completion".into(),
            ));
        };

        Ok(LlmResponse {
            text: choice.message.content.unwrap_or_default(),
            model: resp.model.or_else(|| Some(self.model.clone())),
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
