use anyhow::Result;
use fantoccini::Client;
use std::time::Duration;

/// A navigated page in a live browser session.
pub struct JobnotePage {
    client: Client,
}

impl JobnotePage {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Blind wait for client-side rendering to finish.
    pub async fn settle(&self, wait: Duration) {
        if !wait.is_zero() {
            tracing::debug!(settle_ms = wait.as_millis() as u64, "waiting for page to settle");
            tokio::time::sleep(wait).await;
        }
    }

    /// Return the full page HTML source as currently rendered.
    pub async fn content(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::msg)
    }

    /// URL after redirects.
    pub async fn current_url(&self) -> Result<String> {
        let url = self.client.current_url().await?;
        Ok(url.to_string())
    }
}
