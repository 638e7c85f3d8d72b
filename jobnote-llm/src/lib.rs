//! Provider‑agnostic LLM integration for jobnote.
//!
//! This crate exposes a common [`traits::LlmClient`] interface, the job
//! extraction protocol in [`job`], and two backends: hosted Gemini and
//! OpenAI-compatible chat completions for locally hosted servers. Use
//! [`build_llm_client`] to construct one from a [`jobnote_common::LlmConfig`].
//!
//! # Examples
//! ```no_run
//! use jobnote_common::{LlmConfig, Result};
//! use jobnote_llm::build_llm_client;
//!
//! # fn main() -> Result<()> {
//! let cfg = LlmConfig::Local {
//!     base_url: "http://localhost:1234/v1".into(),
//!     api_key: "not-needed".into(),
//!     model: "loaded-model-name".into(),
//!     max_input_chars: 64_000,
//!     json_mode: false,
//!     request_timeout_secs: 120,
//! };
//! let client = build_llm_client(&cfg)?;
//! assert_eq!(client.model_name(), "loaded-model-name");
//! # Ok(())
//! # }
//! ```
pub mod gemini;
pub mod job;
pub mod openai;
pub mod traits;

use gemini::GeminiClient;
use jobnote_common::{JobnoteError, LlmConfig};
use openai::OpenAiCompatClient;
use std::sync::Arc;
use std::time::Duration;

pub use job::{ExtractionSettings, JobFields, RewriteSettings};
pub use traits::{GenerationOptions, LlmClient, LlmError, LlmResponse};

/// Construct the backend selected by configuration.
pub fn build_llm_client(
    config: &LlmConfig,
) -> jobnote_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    let to_config_error = |e: LlmError| JobnoteError::Config(e.to_string());
    match config {
        LlmConfig::Gemini {
            api_key,
            model,
            request_timeout_secs,
            ..
        } => {
            let client = GeminiClient::new(
                api_key.clone(),
                model.clone(),
                Duration::from_secs(*request_timeout_secs),
            )
            .map_err(to_config_error)?;
            Ok(Arc::new(client))
        }
        LlmConfig::Local {
            base_url,
            api_key,
            model,
            json_mode,
            request_timeout_secs,
            ..
        } => {
            let client = OpenAiCompatClient::new(
                base_url,
                api_key.clone(),
                model.clone(),
                *json_mode,
                Duration::from_secs(*request_timeout_secs),
            )
            .map_err(to_config_error)?;
            Ok(Arc::new(client))
        }
    }
}
