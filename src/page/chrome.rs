//! Chrome DevTools page driver built on chromiumoxide.

use super::{ElementSnapshot, PageDriver};
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One browser with a single open tab.
pub struct ChromePage {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromePage {
    /// Launches a browser configured from `config` and opens a blank tab.
    pub async fn launch(config: &Config) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.window_width, config.window_height)
            .request_timeout(Duration::from_millis(config.navigation_timeout_ms))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--lang=zh-CN,zh,en-US,en");

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &config.chrome_path {
            debug!("Using Chrome at {}", path.display());
            builder = builder.chrome_executable(path);
        }

        if let Some(proxy) = &config.proxy {
            debug!("Configuring proxy: {}", proxy);
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        let browser_config =
            builder.build().map_err(|e| anyhow::anyhow!("Invalid browser config: {}", e))?;

        info!("Launching browser (headless: {})", config.headless);
        let (browser, mut handler) =
            Browser::launch(browser_config).await.context("Failed to launch Chrome")?;

        // CDP events must be drained for the session to make progress.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.context("Failed to open a tab")?;
        page.set_user_agent(config.user_agent.as_str())
            .await
            .context("Failed to set user agent")?;

        Ok(Self { browser: Mutex::new(browser), page, handler })
    }
}

/// Builds the in-page script that reads every match of `selector`.
fn query_script(selector: &str) -> Result<String> {
    let selector = serde_json::to_string(selector)?;
    Ok(format!(
        r#"(() => Array.from(document.querySelectorAll({selector})).map(el => ({{
            text: (el.innerText || el.textContent || '').trim(),
            attrs: Object.fromEntries(Array.from(el.attributes).map(a => [a.name, a.value]))
        }})))()"#
    ))
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .with_context(|| format!("Timed out after {:?}", timeout))?
            .with_context(|| format!("Navigation to {} failed", url))?;
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("Timed out waiting for {}", selector);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        let value = self.evaluate(&query_script(selector)?).await?;
        serde_json::from_value(value)
            .with_context(|| format!("Unexpected query result for {}", selector))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("Nothing to click for {}", selector))?;
        element.click().await.with_context(|| format!("Click on {} failed", selector))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await.context("Script evaluation failed")?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn content(&self) -> Result<String> {
        self.page.content().await.context("Failed to read page content")
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page
            .save_screenshot(params, path)
            .await
            .with_context(|| format!("Failed to save screenshot: {}", path.display()))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Err(e) = self.page.clone().close().await {
            warn!("Failed to close tab: {}", e);
        }

        let mut browser = self.browser.lock().await;
        browser.close().await.context("Failed to close browser")?;
        browser.wait().await.context("Browser did not exit")?;
        self.handler.abort();
        Ok(())
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_script_escapes_selector() {
        let script = query_script(r#"[data-tab-key="descriptionTab"]"#).unwrap();
        assert!(script.contains(r#"querySelectorAll("[data-tab-key=\"descriptionTab\"]")"#));
        assert!(script.contains("innerText"));
        assert!(script.contains("attributes"));
    }
}
