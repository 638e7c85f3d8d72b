use crate::format::{DescriptionFormatter, FormatKind};
use chrono::{Local, NaiveDate};
use jobnote_common::{JobnoteConfig, JobnoteError, Result};
use jobnote_llm::{ExtractionSettings, LlmClient};
use jobnote_record::{assemble, persist, JobPosting};
use jobnote_web::browser::PageRenderer;
use jobnote_web::select::ContentSelector;
use std::path::PathBuf;
use std::sync::Arc;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub path: PathBuf,
    pub posting: JobPosting,
    pub format_kind: FormatKind,
    /// Selector that located the content; `None` for the body fallback.
    pub matched_selector: Option<String>,
}

/// Single-URL pipeline bound to one configuration, renderer and model backend.
pub struct Pipeline {
    config: JobnoteConfig,
    renderer: Arc<dyn PageRenderer>,
    llm: Arc<dyn LlmClient + Send + Sync>,
    selector: ContentSelector,
    formatter: DescriptionFormatter,
}

impl Pipeline {
    pub fn new(
        config: JobnoteConfig,
        renderer: Arc<dyn PageRenderer>,
        llm: Arc<dyn LlmClient + Send + Sync>,
    ) -> Self {
        let selector = ContentSelector::new(&config.selectors);
        let formatter =
            DescriptionFormatter::new(config.formatter.clone(), config.llm.max_input_chars());
        Self {
            config,
            renderer,
            llm,
            selector,
            formatter,
        }
    }

    /// Process `url`, dating the record with today's local date.
    pub async fn run(&self, url: &str) -> Result<PipelineOutcome> {
        self.run_dated(url, Local::now().date_naive()).await
    }

    /// Process `url` with an explicit `date_applied`.
    ///
    /// `url` is recorded as `link` exactly as given; only navigation sees it trimmed.
    pub async fn run_dated(&self, url: &str, date_applied: NaiveDate) -> Result<PipelineOutcome> {
        tracing::info!(
            %url,
            provider = self.config.llm.provider_name(),
            model = self.llm.model_name(),
            "pipeline started"
        );

        let page = self.renderer.render(url.trim()).await?;

        let selection = self.selector.select(&page.html).ok_or_else(|| {
            tracing::error!(%url, "no extractable content");
            JobnoteError::SelectionEmpty
        })?;
        tracing::info!(
            chars = selection.plain_text.chars().count(),
            "content selected"
        );

        let settings = ExtractionSettings {
            max_input_chars: self.config.llm.max_input_chars(),
            temperature: self.config.extraction_temperature,
        };
        let fields = self
            .llm
            .extract_fields(&selection.plain_text, url, &settings)
            .await?;
        let posting = JobPosting::from_fields(fields, url, date_applied);
        tracing::info!(
            company = %posting.company,
            role = %posting.role,
            "fields extracted"
        );

        let formatted = self
            .formatter
            .format(
                self.llm.as_ref(),
                &posting.description,
                Some(selection.fragment_html.as_str()),
            )
            .await;
        let posting = posting.with_description(formatted.text);

        let document = assemble(&posting);
        let path = persist(
            &self.config.destination_dir,
            &document.file_stem,
            &document.text,
            self.config.on_collision,
        )
        .await?;

        tracing::info!(path = %path.display(), "pipeline finished");
        Ok(PipelineOutcome {
            path,
            posting,
            format_kind: formatted.kind,
            matched_selector: selection.matched,
        })
    }
}
