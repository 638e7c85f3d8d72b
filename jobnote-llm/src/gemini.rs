use crate::traits::{GenerationOptions, LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use jobnote_http::{Auth, HttpClient, RequestOpts};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<Vec<GeminiSafetySetting>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    total_token_count: Option<u32>,
}

/// Google Gemini API client.
///
/// Requires a valid API key and internet access.
pub struct GeminiClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new client against the public Gemini endpoint.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        Self::with_base_url(GEMINI_BASE_URL, api_key, model, timeout)
    }

    /// Create a client against a custom endpoint (proxies, tests).
    pub fn with_base_url(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = HttpClient::new(base_url)
            .map_err(|e| LlmError::Config(format!("HttpClient init failed: {e}")))?
            .with_timeout(timeout);
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    // Job descriptions trip the default filters often enough to matter.
    fn create_safety_settings() -> Vec<GeminiSafetySetting> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| GeminiSafetySetting {
            category,
            threshold: "BLOCK_ONLY_HIGH",
        })
        .collect()
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &GenerationOptions,
    ) -> Result<LlmResponse, LlmError> {
        let generation_config = GeminiGenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
            response_mime_type: options.json_output.then_some("application/json"),
        };

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(generation_config),
            safety_settings: Some(Self::create_safety_settings()),
            system_instruction: system_prompt.map(|sys| GeminiContent {
                parts: vec![GeminiPart {
                    text: sys.to_string(),
                }],
            }),
        };

        let path = format!("models/{}:generateContent", self.model);
        tracing::debug!(model = %self.model, json_output = options.json_output, "sending Gemini request");

        let opts = RequestOpts {
            auth: Some(Auth::Query {
                name: "key",
                value: Cow::Borrowed(self.api_key.trim()),
            }),
            ..Default::default()
        };
        let response: GeminiResponse = self.client.post_json_opts(&path, &request, opts).await?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(LlmError::EmptyResponse(
                "no candidates returned from Gemini".into(),
            ));
        };

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(LlmError::Api {
                status: 200,
                message: "content blocked by Gemini safety filters".into(),
            });
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            model: Some(self.model.clone()),
            tokens_used: response.usage_metadata.and_then(|u| u.total_token_count),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_camel_case_wire_names() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: "hi".into() }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                temperature: Some(0.1),
                max_output_tokens: None,
                response_mime_type: Some("application/json"),
            }),
            safety_settings: None,
            system_instruction: None,
        };
        let v = serde_json::to_value(&request).unwrap();
        assert_eq!(
            v["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert!(v["generationConfig"].get("maxOutputTokens").is_none());
        assert!(v.get("systemInstruction").is_none());
    }
}
