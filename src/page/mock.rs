//! Scriptable in-memory page for unit tests.

use super::{ElementSnapshot, PageDriver};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Answers queries from a fixed selector map and records every call.
#[derive(Default)]
pub struct MockPage {
    elements: HashMap<String, Vec<ElementSnapshot>>,
    script_result: Option<serde_json::Value>,
    html: String,
    url: Option<String>,
    fail_navigation: bool,
    fail_close: bool,
    calls: Mutex<Vec<String>>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, selector: &str, text: &str) -> Self {
        let element = ElementSnapshot { text: text.to_string(), attrs: HashMap::new() };
        self.with_elements(selector, vec![element])
    }

    pub fn with_image(mut self, selector: &str, attrs: &[(&str, &str)]) -> Self {
        let element = ElementSnapshot {
            text: String::new(),
            attrs: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        };
        self.elements.entry(selector.to_string()).or_default().push(element);
        self
    }

    pub fn with_elements(mut self, selector: &str, elements: Vec<ElementSnapshot>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }

    /// Every `evaluate` returns this value. Without it, scripts fail.
    pub fn with_script_result(mut self, value: serde_json::Value) -> Self {
        self.script_result = Some(value);
        self
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose name starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|call| call.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn present(&self, selector: &str) -> bool {
        self.elements.get(selector).is_some_and(|found| !found.is_empty())
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("navigate:{}", url));
        if self.fail_navigation {
            anyhow::bail!("net::ERR_CONNECTION_RESET");
        }
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.url.clone()
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("wait:{}", selector));
        if !self.present(selector) {
            anyhow::bail!("Timed out waiting for {}", selector);
        }
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        self.record(format!("query:{}", selector));
        Ok(self.elements.get(selector).cloned().unwrap_or_default())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.record(format!("click:{}", selector));
        if !self.present(selector) {
            anyhow::bail!("Nothing to click for {}", selector);
        }
        Ok(())
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value> {
        self.record("evaluate".to_string());
        self.script_result.clone().ok_or_else(|| anyhow::anyhow!("Scripts disabled"))
    }

    async fn content(&self) -> Result<String> {
        self.record("content".to_string());
        Ok(self.html.clone())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(format!("screenshot:{}", path.display()));
        anyhow::bail!("No display")
    }

    async fn close(&self) -> Result<()> {
        self.record("close".to_string());
        if self.fail_close {
            anyhow::bail!("Browser already gone");
        }
        Ok(())
    }
}
