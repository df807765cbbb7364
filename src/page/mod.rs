//! Page automation seam.
//!
//! The orchestrator and the cascade resolver only talk to a [`PageDriver`].
//! Two drivers are provided: [`ChromePage`] drives a real browser, and
//! [`SnapshotPage`] works on a fetched or in-memory HTML document.

#[cfg(feature = "chrome")]
mod chrome;
mod client;
#[cfg(test)]
pub(crate) mod mock;
mod snapshot;

#[cfg(feature = "chrome")]
pub use chrome::ChromePage;
pub use client::HttpFetcher;
pub use snapshot::SnapshotPage;

use crate::config::{Config, Engine};
use crate::sites::Site;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Text and attributes of one element, read out of the page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ElementSnapshot {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
}

impl ElementSnapshot {
    /// Returns a non-blank attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
    }
}

/// Browser-like page primitives - enables mocking for tests.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Loads `url`, failing if it does not finish within `timeout`.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// URL of the loaded document, after redirects.
    async fn current_url(&self) -> Option<String>;

    /// Waits until `selector` matches, failing after `timeout`.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Reads every element matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>>;

    /// Reads the first element matching `selector`.
    async fn query(&self, selector: &str) -> Result<Option<ElementSnapshot>> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.query(selector).await?.is_some())
    }

    /// Clicks the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Runs a script expression in the page and returns its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Serialized DOM of the current document.
    async fn content(&self) -> Result<String>;

    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Releases the page and its browser session.
    async fn close(&self) -> Result<()>;
}

/// Opens a page for `site` using the configured engine.
pub async fn open(config: &Config, site: Site) -> Result<Box<dyn PageDriver>> {
    match config.engine {
        #[cfg(feature = "chrome")]
        Engine::Chrome => Ok(Box::new(ChromePage::launch(config).await?)),
        #[cfg(not(feature = "chrome"))]
        Engine::Chrome => {
            anyhow::bail!("Built without the `chrome` feature. Use --engine http instead.")
        }
        Engine::Http => {
            let fetcher = HttpFetcher::new(config, site).await?;
            Ok(Box::new(SnapshotPage::with_fetcher(fetcher)))
        }
    }
}
