//! Loader for jobnote configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults, which read the conventional `MARKDOWN_SAVE_PATH`,
//!    `GEMINI_API_KEY` and `LOCAL_LLM_BASE_URL` variables through `${VAR}`
//!    placeholders,
//! 2. YAML files or inline snippets added on the loader,
//! 3. `JOBNOTE__`-prefixed environment variables (`__` separates nesting,
//!    e.g. `JOBNOTE__LLM__PROVIDER=local`).
//!
//! `${VAR}` placeholders are expanded recursively. A value that still holds an
//! unresolved placeholder after expansion counts as unset, so a missing
//! `MARKDOWN_SAVE_PATH` surfaces as a configuration error instead of a
//! directory literally named `${MARKDOWN_SAVE_PATH}`.
use config::{Config, Environment, File, FileFormat};
use jobnote_common::observability::LogFormat;
use jobnote_common::{
    BrowserSettings, CollisionPolicy, FormatterSettings, FormatterStrategy, JobnoteConfig,
    JobnoteError, LlmConfig, LoggingSettings, Result,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

const DEFAULTS_YAML: &str = r#"
destination_dir: "${MARKDOWN_SAVE_PATH}"
llm:
  provider: "gemini"
  api_key: "${GEMINI_API_KEY}"
  base_url: "${LOCAL_LLM_BASE_URL}"
"#;

/// Configuration as written by the user, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub destination_dir: Option<String>,
    #[serde(default)]
    pub llm: Option<RawLlm>,
    #[serde(default)]
    pub extraction: Option<RawExtraction>,
    #[serde(default)]
    pub formatter: Option<RawFormatter>,
    #[serde(default)]
    pub browser: Option<RawBrowser>,
    #[serde(default)]
    pub selectors: Option<Vec<String>>,
    #[serde(default)]
    pub output: Option<RawOutput>,
    #[serde(default)]
    pub logging: Option<RawLogging>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLlm {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_input_chars: Option<usize>,
    pub json_mode: Option<bool>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawExtraction {
    pub temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFormatter {
    pub strategy: Option<FormatterStrategy>,
    pub temperature: Option<f32>,
    pub min_length_ratio: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawBrowser {
    pub webdriver_url: Option<String>,
    pub headless: Option<bool>,
    pub sandbox: Option<bool>,
    pub page_load_timeout_secs: Option<u64>,
    pub settle_secs: Option<u64>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawOutput {
    pub on_collision: Option<CollisionPolicy>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLogging {
    pub format: Option<String>,
    pub emit_stderr: Option<bool>,
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Replace strings that still carry a `${...}` placeholder with `null`.
fn drop_unresolved(v: &mut Value) {
    if matches!(v, Value::String(s) if s.contains("${")) {
        *v = Value::Null;
        return;
    }
    match v {
        Value::Array(arr) => arr.iter_mut().for_each(drop_unresolved),
        Value::Object(obj) => obj.values_mut().for_each(drop_unresolved),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (defaults + YAML + env overrides).
pub struct JobnoteConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for JobnoteConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl JobnoteConfigLoader {
    /// Start from the built-in defaults.
    ///
    /// ```
    /// use jobnote_config::JobnoteConfigLoader;
    ///
    /// let cfg = JobnoteConfigLoader::new()
    ///     .with_yaml_str("destination_dir: /tmp/jobs\nllm:\n  provider: local\n  base_url: http://localhost:1234/v1\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.destination_dir, std::path::PathBuf::from("/tmp/jobs"));
    /// assert_eq!(cfg.llm.provider_name(), "local");
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(File::from_str(DEFAULTS_YAML, FileFormat::Yaml));
        Self { builder }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when it does not exist.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests and CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge every source, expand placeholders and return the unvalidated schema.
    pub fn load_raw(self) -> Result<RawConfig> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("JOBNOTE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| JobnoteError::Config(e.to_string()))?;

        let mut v: Value = cfg
            .try_deserialize()
            .map_err(|e| JobnoteError::Config(e.to_string()))?;
        expand_env_in_value(&mut v);
        drop_unresolved(&mut v);

        serde_json::from_value(v).map_err(|e| JobnoteError::Config(e.to_string()))
    }

    /// Merge, expand and validate into a [`JobnoteConfig`].
    pub fn load(self) -> Result<JobnoteConfig> {
        let raw = self.load_raw()?;
        let config = raw.validate()?;
        tracing::debug!(
            provider = config.llm.provider_name(),
            destination = %config.destination_dir.display(),
            strategy = ?config.formatter.strategy,
            "configuration loaded"
        );
        Ok(config)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn missing(key: &str, hint: &str) -> JobnoteError {
    JobnoteError::Config(format!("{key} is not set ({hint})"))
}

fn check_temperature(key: &str, value: f32) -> Result<f32> {
    if (0.0..=2.0).contains(&value) {
        Ok(value)
    } else {
        Err(JobnoteError::Config(format!(
            "{key} must be between 0.0 and 2.0, got {value}"
        )))
    }
}

impl RawConfig {
    /// Check completeness and fill every tunable with its default.
    pub fn validate(self) -> Result<JobnoteConfig> {
        let destination = present(self.destination_dir).ok_or_else(|| {
            missing(
                "destination_dir",
                "set MARKDOWN_SAVE_PATH or destination_dir in jobnote.yaml",
            )
        })?;
        let destination_dir = PathBuf::from(shellexpand::tilde(&destination).into_owned());

        let llm = validate_llm(self.llm.unwrap_or_default())?;
        let mut config = JobnoteConfig::new(destination_dir, llm);

        if let Some(extraction) = self.extraction {
            if let Some(t) = extraction.temperature {
                config.extraction_temperature = check_temperature("extraction.temperature", t)?;
            }
        }

        if let Some(formatter) = self.formatter {
            let defaults = FormatterSettings::default();
            let min_length_ratio = formatter
                .min_length_ratio
                .unwrap_or(defaults.min_length_ratio);
            if !(0.0..=1.0).contains(&min_length_ratio) {
                return Err(JobnoteError::Config(format!(
                    "formatter.min_length_ratio must be between 0.0 and 1.0, got {min_length_ratio}"
                )));
            }
            config.formatter = FormatterSettings {
                strategy: formatter.strategy.unwrap_or(defaults.strategy),
                temperature: check_temperature(
                    "formatter.temperature",
                    formatter.temperature.unwrap_or(defaults.temperature),
                )?,
                min_length_ratio,
            };
        }

        if let Some(browser) = self.browser {
            config.browser = validate_browser(browser)?;
        }

        if let Some(selectors) = self.selectors {
            let selectors: Vec<String> = selectors
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if selectors.is_empty() {
                return Err(JobnoteError::Config(
                    "selectors must list at least one CSS selector when given".into(),
                ));
            }
            config.selectors = selectors;
        }

        if let Some(policy) = self.output.and_then(|o| o.on_collision) {
            config.on_collision = policy;
        }

        if let Some(logging) = self.logging {
            let defaults = LoggingSettings::default();
            let format = match present(logging.format) {
                Some(raw) => raw
                    .parse::<LogFormat>()
                    .map_err(|e| JobnoteError::Config(format!("logging.format: {e}")))?,
                None => defaults.format,
            };
            config.logging = LoggingSettings {
                format,
                emit_stderr: logging.emit_stderr.unwrap_or(defaults.emit_stderr),
            };
        }

        Ok(config)
    }
}

fn validate_llm(raw: RawLlm) -> Result<LlmConfig> {
    let provider = present(raw.provider)
        .ok_or_else(|| missing("llm.provider", "expected gemini or local"))?;
    let request_timeout_secs = raw
        .request_timeout_secs
        .unwrap_or(jobnote_common::DEFAULT_REQUEST_TIMEOUT_SECS)
        .max(1);

    match provider.to_ascii_lowercase().as_str() {
        "gemini" => {
            let api_key = present(raw.api_key)
                .ok_or_else(|| missing("llm.api_key", "set GEMINI_API_KEY"))?;
            Ok(LlmConfig::Gemini {
                api_key,
                model: present(raw.model)
                    .unwrap_or_else(|| jobnote_common::DEFAULT_GEMINI_MODEL.to_string()),
                max_input_chars: positive_or(
                    raw.max_input_chars,
                    jobnote_common::DEFAULT_GEMINI_MAX_INPUT_CHARS,
                ),
                request_timeout_secs,
            })
        }
        "local" => {
            let base_url = present(raw.base_url)
                .ok_or_else(|| missing("llm.base_url", "set LOCAL_LLM_BASE_URL"))?;
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(JobnoteError::Config(format!(
                    "llm.base_url must be an http(s) URL, got '{base_url}'"
                )));
            }
            Ok(LlmConfig::Local {
                base_url,
                api_key: present(raw.api_key)
                    .unwrap_or_else(|| jobnote_common::DEFAULT_LOCAL_API_KEY.to_string()),
                model: present(raw.model)
                    .unwrap_or_else(|| jobnote_common::DEFAULT_LOCAL_MODEL.to_string()),
                max_input_chars: positive_or(
                    raw.max_input_chars,
                    jobnote_common::DEFAULT_LOCAL_MAX_INPUT_CHARS,
                ),
                json_mode: raw.json_mode.unwrap_or(false),
                request_timeout_secs,
            })
        }
        other => Err(JobnoteError::Config(format!(
            "llm.provider '{other}' is not supported (expected gemini or local)"
        ))),
    }
}

fn positive_or(value: Option<usize>, default: usize) -> usize {
    value.filter(|v| *v > 0).unwrap_or(default)
}

fn validate_browser(raw: RawBrowser) -> Result<BrowserSettings> {
    let defaults = BrowserSettings::default();
    let page_load_timeout_secs = raw
        .page_load_timeout_secs
        .unwrap_or(defaults.page_load_timeout_secs);
    if page_load_timeout_secs == 0 {
        return Err(JobnoteError::Config(
            "browser.page_load_timeout_secs must be greater than zero".into(),
        ));
    }

    Ok(BrowserSettings {
        webdriver_url: present(raw.webdriver_url).unwrap_or(defaults.webdriver_url),
        headless: raw.headless.unwrap_or(defaults.headless),
        sandbox: raw.sandbox.unwrap_or(defaults.sandbox),
        page_load_timeout_secs,
        settle_secs: raw.settle_secs.unwrap_or(defaults.settle_secs),
        window_size: (
            raw.window_width.unwrap_or(defaults.window_size.0),
            raw.window_height.unwrap_or(defaults.window_size.1),
        ),
        user_agent: present(raw.user_agent).unwrap_or(defaults.user_agent),
    })
}
