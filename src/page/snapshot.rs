//! Static-document page backed by `scraper`.
//!
//! Loads a detail page over HTTP (or takes HTML directly) and answers
//! selector queries against it. No scripts run, so scripted probes fail and
//! the resolver falls through to plain selector strategies.

use super::client::HttpFetcher;
use super::{ElementSnapshot, PageDriver};
use crate::miner::inner_text;
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// A page that holds one HTML document.
///
/// `Html` is not `Send`, so the document is kept as text and each selector's
/// matches are cached after the first parse until the next load.
pub struct SnapshotPage {
    fetcher: Option<HttpFetcher>,
    html: RwLock<String>,
    url: RwLock<Option<String>>,
    matches: Mutex<HashMap<String, Vec<ElementSnapshot>>>,
}

impl SnapshotPage {
    /// Wraps an already loaded document. Navigation only records the URL.
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            fetcher: None,
            html: RwLock::new(html.into()),
            url: RwLock::new(None),
            matches: Mutex::default(),
        }
    }

    /// Sets the URL reported before any navigation.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = RwLock::new(Some(url.into()));
        self
    }

    /// Creates a page that fetches documents on navigation.
    pub fn with_fetcher(fetcher: HttpFetcher) -> Self {
        Self {
            fetcher: Some(fetcher),
            html: RwLock::new(String::new()),
            url: RwLock::new(None),
            matches: Mutex::default(),
        }
    }

    async fn select(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        let mut matches = self.matches.lock().await;
        if let Some(cached) = matches.get(selector) {
            return Ok(cached.clone());
        }

        let parsed = parse_selector(selector)?;
        let found = select_in(&self.html.read().await, &parsed);
        matches.insert(selector.to_string(), found.clone());
        Ok(found)
    }

    #[cfg(test)]
    async fn cached_selectors(&self) -> usize {
        self.matches.lock().await.len()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow::anyhow!("Invalid selector {}: {:?}", selector, e))
}

// Html is not Send, so parsing stays inside this synchronous helper.
fn select_in(html: &str, selector: &Selector) -> Vec<ElementSnapshot> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .map(|element| ElementSnapshot {
            text: inner_text(element).trim().to_string(),
            attrs: element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        })
        .collect()
}

#[async_trait]
impl PageDriver for SnapshotPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let Some(fetcher) = &self.fetcher else {
            debug!("Static page, recording {} without fetching", url);
            *self.url.write().await = Some(url.to_string());
            return Ok(());
        };

        let page = tokio::time::timeout(timeout, fetcher.fetch(url))
            .await
            .with_context(|| format!("Timed out after {:?}", timeout))??;

        *self.html.write().await = page.body;
        *self.url.write().await = Some(page.url);
        self.matches.lock().await.clear();
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.url.read().await.clone()
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<()> {
        // The document never changes after load, so there is nothing to wait for.
        if self.select(selector).await?.is_empty() {
            anyhow::bail!("Selector not present: {}", selector);
        }
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        self.select(selector).await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        if !self.exists(selector).await? {
            anyhow::bail!("Nothing to click for {}", selector);
        }
        debug!("Click on {} ignored on a static page", selector);
        Ok(())
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value> {
        anyhow::bail!("Scripts cannot run on a static page")
    }

    async fn content(&self) -> Result<String> {
        Ok(self.html.read().await.clone())
    }

    /// Saves the document as HTML next to where the image would go.
    async fn screenshot(&self, path: &Path) -> Result<()> {
        let path = path.with_extension("html");
        let html = self.html.read().await.clone();
        tokio::fs::write(&path, html)
            .await
            .with_context(|| format!("Failed to write page snapshot: {}", path.display()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sites::Site;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HTML: &str = r#"
        <html><body>
            <h1 class="title">  Widget X  </h1>
            <ul>
                <li><img class="thumb" src="//cdn.example.com/a.jpg" alt="front"></li>
                <li><img class="thumb" data-src="//cdn.example.com/b.jpg"></li>
            </ul>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_query_reads_text_and_attrs() {
        let page = SnapshotPage::from_html(HTML);

        let title = page.query("h1.title").await.unwrap().unwrap();
        assert_eq!(title.text, "Widget X");

        let thumbs = page.query_all("img.thumb").await.unwrap();
        assert_eq!(thumbs.len(), 2);
        assert_eq!(thumbs[0].attr("src"), Some("//cdn.example.com/a.jpg"));
        assert_eq!(thumbs[0].attr("alt"), Some("front"));
        assert_eq!(thumbs[1].attr("src"), None);
        assert_eq!(thumbs[1].attr("data-src"), Some("//cdn.example.com/b.jpg"));
    }

    #[tokio::test]
    async fn test_wait_for_missing_selector_fails_fast() {
        let page = SnapshotPage::from_html(HTML);
        assert!(page.wait_for("h1", Duration::from_secs(60)).await.is_ok());
        assert!(page.wait_for("#missing", Duration::from_secs(60)).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_selector_is_error() {
        let page = SnapshotPage::from_html(HTML);
        let err = page.query_all("li[").await.unwrap_err().to_string();
        assert!(err.contains("Invalid selector"));
    }

    #[tokio::test]
    async fn test_repeated_selector_served_from_cache() {
        let page = SnapshotPage::from_html(HTML);

        page.wait_for("h1.title", Duration::from_secs(1)).await.unwrap();
        let title = page.query("h1.title").await.unwrap().unwrap();
        assert_eq!(title.text, "Widget X");
        assert_eq!(page.query_all("img.thumb").await.unwrap().len(), 2);
        assert_eq!(page.query_all("img.thumb").await.unwrap().len(), 2);

        assert_eq!(page.cached_selectors().await, 2);
    }

    #[tokio::test]
    async fn test_evaluate_not_supported() {
        let page = SnapshotPage::from_html(HTML);
        assert!(page.evaluate("1 + 1").await.is_err());
    }

    #[tokio::test]
    async fn test_navigate_without_fetcher_records_url() {
        let page = SnapshotPage::from_html(HTML);
        assert!(page.current_url().await.is_none());

        page.navigate("https://detail.1688.com/offer/1.html", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(
            page.current_url().await.as_deref(),
            Some("https://detail.1688.com/offer/1.html")
        );
        assert!(page.content().await.unwrap().contains("Widget X"));
    }

    #[tokio::test]
    async fn test_navigate_with_fetcher_loads_document() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/offer/2.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HTML))
            .mount(&mock_server)
            .await;

        let config = Config { delay_ms: 0, delay_jitter_ms: 0, ..Config::default() };
        let fetcher = HttpFetcher::new(&config, Site::Alibaba).await.unwrap();
        let page = SnapshotPage::with_fetcher(fetcher);
        assert!(!page.exists("h1.title").await.unwrap());

        // Loading a document drops matches cached against the empty one
        let url = format!("{}/offer/2.html", mock_server.uri());
        page.navigate(&url, Duration::from_secs(5)).await.unwrap();
        assert!(page.exists("h1.title").await.unwrap());
    }

    #[tokio::test]
    async fn test_navigate_with_fetcher_propagates_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let config = Config { delay_ms: 0, delay_jitter_ms: 0, ..Config::default() };
        let fetcher = HttpFetcher::new(&config, Site::Alibaba).await.unwrap();
        let page = SnapshotPage::with_fetcher(fetcher);

        let err = page.navigate(&mock_server.uri(), Duration::from_secs(5)).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_screenshot_writes_html_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let page = SnapshotPage::from_html(HTML);

        page.screenshot(&dir.path().join("debug_snapshot.png")).await.unwrap();
        let saved = std::fs::read_to_string(dir.path().join("debug_snapshot.html")).unwrap();
        assert!(saved.contains("Widget X"));
    }
}
