use anyhow::Result;
use jobnote_common::{BrowserSettings, JobnoteError};
use jobnote_drivers::chrome::driver::JobnoteDriver;
use std::time::Duration;
use url::Url;

/// HTML snapshot of a rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// The URL that was requested, verbatim.
    pub url: String,
    /// Where the browser ended up after redirects, when known.
    pub final_url: Option<String>,
    pub html: String,
}

#[async_trait::async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load `url` and return the post-script HTML, or a `RenderFailure`.
    async fn render(&self, url: &str) -> jobnote_common::Result<RenderedPage>;
}

/// Renderer backed by a fresh WebDriver session per call.
pub struct WebDriverRenderer {
    settings: BrowserSettings,
}

impl WebDriverRenderer {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    async fn capture(&self, driver: &JobnoteDriver, url: &str) -> Result<RenderedPage> {
        let page = driver.goto(url).await?;
        page.settle(Duration::from_secs(self.settings.settle_secs)).await;
        let html = page.content().await?;
        let final_url = page.current_url().await.ok();
        Ok(RenderedPage {
            url: url.to_string(),
            final_url,
            html,
        })
    }
}

fn render_failure(err: anyhow::Error) -> JobnoteError {
    JobnoteError::Render(format!("{err:#}"))
}

/// Reject anything that is not an absolute http(s) URL before a browser is started.
pub fn validate_url(raw: &str) -> jobnote_common::Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| JobnoteError::Render(format!("invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(JobnoteError::Render(format!(
            "unsupported URL scheme '{other}' in '{raw}'"
        ))),
    }
}

#[async_trait::async_trait]
impl PageRenderer for WebDriverRenderer {
    async fn render(&self, url: &str) -> jobnote_common::Result<RenderedPage> {
        validate_url(url)?;

        tracing::info!(%url, "rendering page");
        let driver = JobnoteDriver::connect(&self.settings)
            .await
            .map_err(render_failure)?;

        // Closed on every path before the capture result is inspected.
        let result = self.capture(&driver, url).await;
        driver.close().await;

        let page = result.map_err(render_failure)?;
        tracing::info!(
            %url,
            final_url = page.final_url.as_deref().unwrap_or("-"),
            html_bytes = page.html.len(),
            "page rendered"
        );
        Ok(page)
    }
}
