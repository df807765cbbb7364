//! Selector cascades.
//!
//! A field is described as data: an ordered list of [`Strategy`] values and a
//! [`Validity`] predicate. [`Resolver::resolve`] walks the list and returns
//! the first valid text. A failing attempt (missing node, timeout, script
//! error) only moves the cascade on to the next one.

use crate::models::Field;
use crate::page::PageDriver;
use crate::text;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// One way of reading a field off the page.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// A single in-page script that scans every listed selector and returns
    /// the first node text passing the validity check.
    Scripted(&'static [&'static str]),
    /// Each selector in turn: bounded wait, then the first match's text.
    Selectors(&'static [&'static str]),
    /// Every selector is read; a later valid text replaces the current pick
    /// only when it is more than [`LONGER_BY`] times as long.
    Longest(&'static [&'static str]),
}

/// Length ratio a later candidate must beat under [`Strategy::Longest`].
pub const LONGER_BY: f64 = 1.2;

/// Acceptance rule for candidate text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    /// Text must be strictly longer than this many characters
    pub min_chars: usize,
    /// When non-empty, text must contain at least one marker
    pub markers: &'static [&'static str],
}

impl Validity {
    /// Any non-blank text.
    pub const ANY: Validity = Validity { min_chars: 0, markers: &[] };

    pub const fn longer_than(min_chars: usize) -> Self {
        Self { min_chars, markers: &[] }
    }

    pub const fn containing(markers: &'static [&'static str]) -> Self {
        Self { min_chars: 0, markers }
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        !candidate.is_empty()
            && candidate.chars().count() > self.min_chars
            && (self.markers.is_empty() || text::contains_any(candidate, self.markers))
    }
}

/// Cascade for a single text field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Waited for once before the strategies run; a timeout is not fatal.
    pub ready: Option<&'static str>,
    pub strategies: &'static [Strategy],
    pub validity: Validity,
}

/// Cascade for the repeated gallery images.
#[derive(Debug, Clone, Copy)]
pub struct ImageSpec {
    /// Container that must appear before images are read
    pub gallery: &'static str,
    /// Image selectors, all enumerated in order
    pub images: &'static [&'static str],
    /// Attributes holding the URL, `src` first then lazy-load ones
    pub attrs: &'static [&'static str],
    /// URLs containing any of these are placeholders
    pub skip_markers: &'static [&'static str],
    /// Rewrites a thumbnail URL to its large variant
    pub upscale: fn(&str) -> String,
}

/// Runs cascades against a page with a bounded per-probe wait.
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    probe_timeout: Duration,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Resolver {
    pub fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }

    /// Returns the first valid text produced by `spec`, or `NotFound`.
    pub async fn resolve<P>(&self, page: &P, spec: &FieldSpec) -> Field
    where
        P: PageDriver + ?Sized,
    {
        if let Some(ready) = spec.ready {
            if let Err(e) = page.wait_for(ready, self.probe_timeout).await {
                debug!("{}: page not ready ({:#}), trying anyway", spec.name, e);
            }
        }

        for (position, strategy) in spec.strategies.iter().enumerate() {
            if let Some(found) = self.attempt(page, strategy, &spec.validity).await {
                debug!("{}: strategy {} matched", spec.name, position + 1);
                return Field::Found(found);
            }
            debug!("{}: strategy {} gave nothing", spec.name, position + 1);
        }

        debug!("{}: not found", spec.name);
        Field::NotFound
    }

    async fn attempt<P>(&self, page: &P, strategy: &Strategy, validity: &Validity) -> Option<String>
    where
        P: PageDriver + ?Sized,
    {
        match strategy {
            Strategy::Scripted(selectors) => self.scripted(page, selectors, validity).await,
            Strategy::Selectors(selectors) => {
                for selector in selectors.iter() {
                    if let Some(found) = self.probe(page, selector, validity).await {
                        return Some(found);
                    }
                }
                None
            }
            Strategy::Longest(selectors) => self.longest(page, selectors, validity).await,
        }
    }

    async fn longest<P>(&self, page: &P, selectors: &[&str], validity: &Validity) -> Option<String>
    where
        P: PageDriver + ?Sized,
    {
        let mut best: Option<(String, usize)> = None;

        for selector in selectors {
            let text = match page.query(selector).await {
                Ok(Some(element)) if validity.accepts(&element.text) => element.text.trim().to_string(),
                Ok(_) => continue,
                Err(e) => {
                    debug!("{}: {:#}", selector, e);
                    continue;
                }
            };

            let chars = text.chars().count();
            match &best {
                Some((_, current)) if chars as f64 <= *current as f64 * LONGER_BY => {}
                _ => {
                    debug!("{}: picked {} chars", selector, chars);
                    best = Some((text, chars));
                }
            }
        }

        best.map(|(text, _)| text)
    }

    async fn scripted<P>(&self, page: &P, selectors: &[&str], validity: &Validity) -> Option<String>
    where
        P: PageDriver + ?Sized,
    {
        let script = match scripted_probe(selectors, validity) {
            Ok(script) => script,
            Err(e) => {
                warn!("Could not build probe script: {}", e);
                return None;
            }
        };

        match page.evaluate(&script).await {
            Ok(serde_json::Value::String(found)) if validity.accepts(&found) => {
                Some(found.trim().to_string())
            }
            Ok(_) => None,
            Err(e) => {
                debug!("Scripted probe failed: {:#}", e);
                None
            }
        }
    }

    async fn probe<P>(&self, page: &P, selector: &str, validity: &Validity) -> Option<String>
    where
        P: PageDriver + ?Sized,
    {
        if let Err(e) = page.wait_for(selector, self.probe_timeout).await {
            debug!("{}: {:#}", selector, e);
            return None;
        }

        match page.query(selector).await {
            Ok(Some(element)) if validity.accepts(&element.text) => {
                Some(element.text.trim().to_string())
            }
            Ok(_) => None,
            Err(e) => {
                debug!("{}: {:#}", selector, e);
                None
            }
        }
    }

    /// Collects gallery image URLs in page order without duplicates.
    ///
    /// Fails only when the gallery container never shows up; a broken image
    /// node is skipped.
    pub async fn collect_images<P>(&self, page: &P, spec: &ImageSpec) -> Result<Vec<String>>
    where
        P: PageDriver + ?Sized,
    {
        page.wait_for(spec.gallery, self.probe_timeout)
            .await
            .map_err(|e| anyhow::anyhow!("Gallery {} never appeared: {:#}", spec.gallery, e))?;

        let base = page.current_url().await.and_then(|url| Url::parse(&url).ok());
        let mut images = Vec::new();

        for selector in spec.images {
            let elements = match page.query_all(selector).await {
                Ok(elements) => elements,
                Err(e) => {
                    debug!("{}: {:#}", selector, e);
                    continue;
                }
            };

            for element in elements {
                let Some(raw) = spec.attrs.iter().find_map(|attr| element.attr(attr)) else {
                    continue;
                };
                let lowered = raw.to_lowercase();
                if text::contains_any(&lowered, spec.skip_markers) {
                    debug!("Skipping placeholder image {}", raw);
                    continue;
                }

                let url = absolutize(base.as_ref(), &text::upgrade_protocol(raw));
                text::push_unique(&mut images, (spec.upscale)(&url));
            }
        }

        debug!("Collected {} images", images.len());
        Ok(images)
    }
}

fn absolutize(base: Option<&Url>, url: &str) -> String {
    match base {
        Some(base) if Url::parse(url).is_err() => {
            base.join(url).map(String::from).unwrap_or_else(|_| url.to_string())
        }
        _ => url.to_string(),
    }
}

/// Builds the in-page script for [`Strategy::Scripted`].
pub fn scripted_probe(selectors: &[&str], validity: &Validity) -> Result<String> {
    let selectors = serde_json::to_string(selectors)?;
    let markers = serde_json::to_string(validity.markers)?;
    let min_chars = validity.min_chars;
    Ok(format!(
        r#"(() => {{
    const selectors = {selectors};
    const markers = {markers};
    for (const selector of selectors) {{
        let nodes = [];
        try {{ nodes = document.querySelectorAll(selector); }} catch (e) {{ continue; }}
        for (const el of nodes) {{
            const text = (el.innerText || el.textContent || '').trim();
            if (!text || Array.from(text).length <= {min_chars}) continue;
            if (markers.length && !markers.some(m => text.includes(m))) continue;
            return text;
        }}
    }}
    return null;
}})()"#
    ))
}
