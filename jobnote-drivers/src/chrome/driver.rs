use crate::chrome::{args::chrome_capabilities, page::JobnotePage};
use anyhow::{Context, Result};
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use jobnote_common::BrowserSettings;
use std::time::Duration;

/// Thin wrapper around a `fantoccini` WebDriver client.
///
/// One driver is one browser session. Call [`JobnoteDriver::close`] on every
/// exit path; dropping the driver without closing leaves the browser process
/// running until the WebDriver service reaps it.
pub struct JobnoteDriver {
    client: Client,
}

impl JobnoteDriver {
    /// Start a new session on the WebDriver service named in `settings`
    /// (Chromedriver at `http://localhost:9515` by default).
    pub async fn connect(settings: &BrowserSettings) -> Result<Self> {
        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities(settings))
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| {
                format!(
                    "failed to start a browser session at {}",
                    settings.webdriver_url
                )
            })?;

        let driver = Self { client };
        let timeouts = TimeoutConfiguration::new(
            Some(Duration::from_secs(30)),
            Some(Duration::from_secs(settings.page_load_timeout_secs)),
            Some(Duration::ZERO),
        );
        if let Err(err) = driver.client.update_timeouts(timeouts).await {
            driver.close().await;
            return Err(anyhow::Error::from(err).context("failed to set page-load timeout"));
        }

        tracing::debug!(
            webdriver = %settings.webdriver_url,
            headless = settings.headless,
            page_load_timeout_secs = settings.page_load_timeout_secs,
            "browser session started"
        );
        Ok(driver)
    }

    /// Navigate to `url`; returns once the browser reports the load complete
    /// or the page-load timeout fires.
    pub async fn goto(&self, url: &str) -> Result<JobnotePage> {
        self.client
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        Ok(JobnotePage::new(self.client.clone()))
    }

    /// Close the underlying browser session. Failures are logged, not returned.
    pub async fn close(self) {
        if let Err(err) = self.client.close().await {
            tracing::warn!(error = %err, "failed to close browser session");
        } else {
            tracing::debug!("browser session closed");
        }
    }
}
