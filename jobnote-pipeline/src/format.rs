use jobnote_common::{FormatterSettings, FormatterStrategy};
use jobnote_llm::{LlmClient, RewriteSettings};
use jobnote_web::markdown::fragment_to_markdown;

/// How the final description was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatKind {
    /// The model rewrite was kept.
    Rewritten,
    /// The HTML fragment was converted locally.
    Converted,
    /// Formatting was attempted but the plain text was kept.
    Degraded(String),
    /// Nothing to format.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub text: String,
    pub kind: FormatKind,
}

impl FormatOutcome {
    fn degraded(plain: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(%reason, "description formatting degraded to plain text");
        Self {
            text: plain.to_string(),
            kind: FormatKind::Degraded(reason),
        }
    }
}

/// Turns a plain description into Markdown, never failing the run.
#[derive(Debug, Clone)]
pub struct DescriptionFormatter {
    settings: FormatterSettings,
    max_input_chars: usize,
}

impl DescriptionFormatter {
    pub fn new(settings: FormatterSettings, max_input_chars: usize) -> Self {
        Self {
            settings,
            max_input_chars,
        }
    }

    /// Format `plain`, using `fragment_html` for the local strategy.
    pub async fn format(
        &self,
        llm: &dyn LlmClient,
        plain: &str,
        fragment_html: Option<&str>,
    ) -> FormatOutcome {
        if plain.trim().is_empty() {
            tracing::info!("empty description, skipping formatting");
            return FormatOutcome {
                text: String::new(),
                kind: FormatKind::Skipped,
            };
        }

        match self.settings.strategy {
            FormatterStrategy::Rewrite => self.rewrite(llm, plain).await,
            FormatterStrategy::Local => Self::convert(plain, fragment_html),
        }
    }

    async fn rewrite(&self, llm: &dyn LlmClient, plain: &str) -> FormatOutcome {
        let settings = RewriteSettings {
            max_input_chars: self.max_input_chars,
            temperature: self.settings.temperature,
        };

        let formatted = match llm.format_description(plain, &settings).await {
            Ok(text) => text,
            Err(err) => return FormatOutcome::degraded(plain, format!("backend error: {err}")),
        };

        let original_chars = plain.chars().count();
        let formatted_chars = formatted.chars().count();
        if formatted.is_empty() {
            return FormatOutcome::degraded(plain, "model returned an empty rewrite");
        }
        if (formatted_chars as f64) < original_chars as f64 * self.settings.min_length_ratio {
            return FormatOutcome::degraded(
                plain,
                format!(
                    "rewrite too short ({formatted_chars} of {original_chars} chars, ratio {})",
                    self.settings.min_length_ratio
                ),
            );
        }

        tracing::info!(original_chars, formatted_chars, "description rewritten");
        FormatOutcome {
            text: formatted,
            kind: FormatKind::Rewritten,
        }
    }

    fn convert(plain: &str, fragment_html: Option<&str>) -> FormatOutcome {
        let Some(fragment) = fragment_html else {
            return FormatOutcome::degraded(plain, "no content fragment to convert");
        };
        match fragment_to_markdown(fragment) {
            Some(markdown) => {
                tracing::info!(chars = markdown.chars().count(), "fragment converted locally");
                FormatOutcome {
                    text: markdown,
                    kind: FormatKind::Converted,
                }
            }
            None => FormatOutcome::degraded(plain, "local conversion produced no output"),
        }
    }
}
