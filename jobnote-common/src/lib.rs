//! Common types and utilities shared across jobnote crates.
//!
//! This crate defines the validated runtime configuration, the shared error
//! taxonomy, and observability helpers used throughout the workspace. It is
//! intentionally lightweight so that every crate can depend on it without
//! pulling in HTTP or browser stacks.
//!
//! # Overview
//!
//! - [`JobnoteConfig`]: top‑level runtime configuration, built once at startup
//! - [`LlmConfig`]: backend selection for the language model
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`JobnoteError`], [`ExtractionFailure`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use jobnote_common::{FormatterStrategy, JobnoteConfig, LlmConfig};
//!
//! let cfg = JobnoteConfig::new(
//!     "/tmp/jobs".into(),
//!     LlmConfig::Gemini {
//!         api_key: "key".into(),
//!         model: "gemini-1.5-flash".into(),
//!         max_input_chars: 15_000,
//!         request_timeout_secs: 120,
//!     },
//! );
//! assert_eq!(cfg.formatter.strategy, FormatterStrategy::Rewrite);
//! assert_eq!(cfg.browser.settle_secs, 5);
//! ```
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod observability;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
/// LM Studio and similar servers answer with whichever model is loaded.
pub const DEFAULT_LOCAL_MODEL: &str = "loaded-model-name";
pub const DEFAULT_LOCAL_API_KEY: &str = "not-needed";

pub const DEFAULT_GEMINI_MAX_INPUT_CHARS: usize = 15_000;
pub const DEFAULT_LOCAL_MAX_INPUT_CHARS: usize = 64_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_EXTRACTION_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_REWRITE_TEMPERATURE: f32 = 0.4;
/// A rewrite shorter than this fraction of its input is discarded.
pub const DEFAULT_MIN_LENGTH_RATIO: f64 = 0.5;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SETTLE_SECS: u64 = 5;
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1920, 1080);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Content selectors tried in order; the first match wins.
pub const DEFAULT_CONTENT_SELECTORS: &[&str] = &[
    "#jobDescriptionText",
    ".job-description",
    ".job-details",
    "#job-details",
    "article",
    "[role=\"main\"]",
    "main",
    "#content",
    ".content",
];

/// Configuration for the language-model backend.
///
/// Both variants speak the same extraction/formatting protocol; see the
/// `jobnote-llm` crate for the concrete clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LlmConfig {
    /// Hosted Google Gemini API.
    Gemini {
        api_key: String,
        model: String,
        max_input_chars: usize,
        request_timeout_secs: u64,
    },
    /// Locally hosted OpenAI-compatible server (LM Studio, llama.cpp, vLLM...).
    Local {
        base_url: String,
        api_key: String,
        model: String,
        max_input_chars: usize,
        /// Send `response_format: json_object` on extraction requests.
        json_mode: bool,
        request_timeout_secs: u64,
    },
}

impl LlmConfig {
    /// Upper bound on characters submitted in a single prompt.
    pub fn max_input_chars(&self) -> usize {
        match self {
            Self::Gemini {
                max_input_chars, ..
            }
            | Self::Local {
                max_input_chars, ..
            } => *max_input_chars,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Gemini { .. } => "gemini",
            Self::Local { .. } => "local",
        }
    }
}

/// Browser session settings for page rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    /// When false the browser is started with `--no-sandbox` (needed in most containers).
    pub sandbox: bool,
    pub page_load_timeout_secs: u64,
    /// Blind wait after navigation so client-side rendering can finish.
    pub settle_secs: u64,
    pub window_size: (u32, u32),
    pub user_agent: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            sandbox: true,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            settle_secs: DEFAULT_SETTLE_SECS,
            window_size: DEFAULT_WINDOW_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// How the plain description is turned into Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterStrategy {
    /// Second model call that restructures the text.
    Rewrite,
    /// Local HTML → Markdown conversion of the selected fragment.
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatterSettings {
    pub strategy: FormatterStrategy,
    pub temperature: f32,
    pub min_length_ratio: f64,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            strategy: FormatterStrategy::Rewrite,
            temperature: DEFAULT_REWRITE_TEMPERATURE,
            min_length_ratio: DEFAULT_MIN_LENGTH_RATIO,
        }
    }
}

/// What to do when the target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Write `"{stem} (2).md"`, `"{stem} (3).md"`, ...
    Suffix,
    Overwrite,
    Fail,
}

/// Validated runtime configuration.
///
/// Constructed once at startup (usually by `jobnote-config`) and passed by
/// reference into each pipeline component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobnoteConfig {
    pub destination_dir: PathBuf,
    pub llm: LlmConfig,
    pub extraction_temperature: f32,
    pub formatter: FormatterSettings,
    pub browser: BrowserSettings,
    pub selectors: Vec<String>,
    pub on_collision: CollisionPolicy,
    pub logging: LoggingSettings,
}

/// Console/file logging preferences for the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub format: observability::LogFormat,
    pub emit_stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: observability::LogFormat::Text,
            emit_stderr: true,
        }
    }
}

impl JobnoteConfig {
    /// Configuration with every tunable at its default.
    pub fn new(destination_dir: PathBuf, llm: LlmConfig) -> Self {
        Self {
            destination_dir,
            llm,
            extraction_temperature: DEFAULT_EXTRACTION_TEMPERATURE,
            formatter: FormatterSettings::default(),
            browser: BrowserSettings::default(),
            selectors: DEFAULT_CONTENT_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            on_collision: CollisionPolicy::Suffix,
            logging: LoggingSettings::default(),
        }
    }
}

/// Classified failure of the structured field extraction call.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExtractionFailure {
    /// The model answered, but not with a parseable JSON object.
    #[error("JsonDecodeFailure: {message}")]
    JsonDecode { message: String, raw: String },

    /// Transport, authentication, rate-limit or server error.
    #[error("BackendFailure: {0}")]
    Backend(String),
}

impl ExtractionFailure {
    /// Raw model output, when there was one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::JsonDecode { raw, .. } => Some(raw),
            Self::Backend(_) => None,
        }
    }
}

/// Error types used across the jobnote pipeline.
#[derive(thiserror::Error, Debug)]
pub enum JobnoteError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The browser session could not be started or the page failed to load.
    #[error("Render failure: {0}")]
    Render(String),

    /// Neither a heuristic container nor the body yielded any text.
    #[error("No extractable content found on the page")]
    SelectionEmpty,

    /// The structured extraction call failed.
    #[error("Extraction failure: {0}")]
    Extraction(#[from] ExtractionFailure),

    /// The destination directory or the document could not be written.
    #[error("Persistence failure at {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JobnoteError {
    /// Stable name of the error kind, used in console diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigurationError",
            Self::Render(_) => "RenderFailure",
            Self::SelectionEmpty => "SelectionEmpty",
            Self::Extraction(_) => "ExtractionFailure",
            Self::Persistence { .. } => "PersistenceFailure",
        }
    }
}

/// Convenient alias for results that use [`JobnoteError`].
pub type Result<T> = std::result::Result<T, JobnoteError>;
