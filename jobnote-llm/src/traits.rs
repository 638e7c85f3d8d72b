use async_trait::async_trait;
use jobnote_common::ExtractionFailure;
use jobnote_http::HttpError;
use serde::{Deserialize, Serialize};

use crate::job::{
    self, ExtractionAttempt, ExtractionSettings, JobFields, RewriteSettings,
    EXTRACTION_SYSTEM_PROMPT, REWRITE_SYSTEM_PROMPT,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<HttpError> for LlmError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Api { status, message } => match status.as_u16() {
                401 | 403 => LlmError::Auth(message),
                429 => LlmError::RateLimit(message),
                code => LlmError::Api {
                    status: code,
                    message,
                },
            },
            HttpError::Network(message) => LlmError::Network(message),
            HttpError::Decode(message, snippet) => {
                LlmError::Decode(format!("{message} (body: {snippet})"))
            }
            HttpError::Url(message) | HttpError::Build(message) => LlmError::Config(message),
        }
    }
}

/// Knobs for a single `generate` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Ask the backend for a bare JSON object when it has a mode for that.
    pub json_output: bool,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &GenerationOptions,
    ) -> Result<LlmResponse, LlmError>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Structured field extraction: one request, no retry.
    ///
    /// Backend errors become [`ExtractionFailure::Backend`]; an empty or
    /// unparseable answer becomes [`ExtractionFailure::JsonDecode`] with the
    /// raw text attached.
    async fn extract_fields(
        &self,
        plain_text: &str,
        source_url: &str,
        settings: &ExtractionSettings,
    ) -> Result<JobFields, ExtractionFailure> {
        let (limited, truncated) = job::truncate_chars(plain_text, settings.max_input_chars);
        if truncated {
            tracing::warn!(
                original_chars = plain_text.chars().count(),
                max_chars = settings.max_input_chars,
                "page text truncated for extraction"
            );
        }

        let prompt = job::extraction_prompt(limited, source_url);
        let options = GenerationOptions {
            max_tokens: None,
            temperature: Some(settings.temperature),
            json_output: true,
        };

        tracing::info!(model = self.model_name(), "requesting field extraction");
        let attempt = match self
            .generate(&prompt, Some(EXTRACTION_SYSTEM_PROMPT), &options)
            .await
        {
            Ok(response) => ExtractionAttempt::from_response(prompt, response.text),
            Err(err) => ExtractionAttempt::from_error(prompt, &err),
        };
        attempt.log();
        attempt.into_result()
    }

    /// Ask the model to restructure a plain description as Markdown.
    ///
    /// Returns the trimmed model output as-is; callers decide whether the
    /// result is good enough to keep.
    async fn format_description(
        &self,
        plain_description: &str,
        settings: &RewriteSettings,
    ) -> Result<String, LlmError> {
        let (limited, truncated) =
            job::truncate_chars(plain_description, settings.max_input_chars);
        if truncated {
            tracing::warn!(
                max_chars = settings.max_input_chars,
                "description truncated for formatting"
            );
        }

        let prompt = job::rewrite_prompt(limited);
        let options = GenerationOptions {
            max_tokens: None,
            temperature: Some(settings.temperature),
            json_output: false,
        };

        tracing::info!(model = self.model_name(), "requesting description rewrite");
        let response = self
            .generate(&prompt, Some(REWRITE_SYSTEM_PROMPT), &options)
            .await?;
        Ok(response.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn http_status_maps_to_error_class() {
        let auth = LlmError::from(HttpError::Api {
            status: StatusCode::FORBIDDEN,
            message: "bad key".into(),
        });
        assert!(matches!(auth, LlmError::Auth(ref m) if m == "bad key"));

        let limited = LlmError::from(HttpError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".into(),
        });
        assert!(matches!(limited, LlmError::RateLimit(_)));

        let server = LlmError::from(HttpError::Api {
            status: StatusCode::BAD_GATEWAY,
            message: "upstream".into(),
        });
        assert!(matches!(server, LlmError::Api { status: 502, .. }));
    }
}
