//! Extraction orchestrator.
//!
//! Drives one loaded page through the stages
//! `Navigating → VerificationCheck → FieldExtraction → ImageCollection →
//! Aggregated`. Only a failed navigation or a missing title ends the attempt
//! early ([`Stage::Failed`]); every other problem leaves a `NotFound` field or
//! an empty list in the record.

use crate::cascade::Resolver;
use crate::config::Config;
use crate::error::ScrapeError;
use crate::miner;
use crate::models::{Field, ProductRecord, SellingPoints};
use crate::page::PageDriver;
use crate::sites::{Site, SiteProfile, VerificationProbe};
use crate::text;
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// File name of the diagnostic capture inside the screenshot directory.
pub const SCREENSHOT_FILE: &str = "debug_snapshot.png";

/// Orchestrator states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Navigating,
    VerificationCheck,
    FieldExtraction,
    ImageCollection,
    Aggregated,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Navigating => "navigating",
            Stage::VerificationCheck => "verification check",
            Stage::FieldExtraction => "field extraction",
            Stage::ImageCollection => "image collection",
            Stage::Aggregated => "aggregated",
            Stage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Timing and output settings for a scrape.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub navigation_timeout: Duration,
    /// Bounded wait for each selector probe
    pub selector_timeout: Duration,
    /// Pause while a verification challenge is on screen
    pub verification_wait: Duration,
    /// Pause after load and after opening the description tab
    pub settle_delay: Duration,
    /// Where the diagnostic screenshot goes; `None` skips it
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ScrapeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            selector_timeout: Duration::from_millis(config.selector_timeout_ms),
            verification_wait: Duration::from_secs(config.verification_wait_secs),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            screenshot_dir: config.screenshot_dir.clone(),
        }
    }
}

/// Scrapes product detail pages of one site.
pub struct Scraper {
    site: Site,
    options: ScrapeOptions,
    resolver: Resolver,
}

impl Scraper {
    pub fn new(site: Site, options: ScrapeOptions) -> Self {
        let resolver = Resolver::new(options.selector_timeout);
        Self { site, options, resolver }
    }

    /// Runs one scrape attempt and closes the page afterwards, whatever the
    /// outcome. A failure to close is logged, never returned.
    pub async fn scrape_session<P>(&self, page: P, url: &str) -> Result<ProductRecord, ScrapeError>
    where
        P: Deref,
        P::Target: PageDriver,
    {
        let result = self.scrape(&*page, url).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {:#}", e);
        }

        result
    }

    /// Runs one scrape attempt on `page`. The page is left open.
    pub async fn scrape<P>(&self, page: &P, url: &str) -> Result<ProductRecord, ScrapeError>
    where
        P: PageDriver + ?Sized,
    {
        let profile = self.site.profile();

        self.enter(Stage::Navigating, url);
        if let Err(e) = page.navigate(url, self.options.navigation_timeout).await {
            self.enter(Stage::Failed, url);
            return Err(ScrapeError::Navigation { url: url.to_string(), reason: format!("{:#}", e) });
        }

        self.enter(Stage::VerificationCheck, url);
        if challenge_present(page, &profile.verification).await {
            warn!(
                "Verification challenge on {}, waiting {}s for it to be completed by hand",
                url,
                self.options.verification_wait.as_secs()
            );
            tokio::time::sleep(self.options.verification_wait).await;
        }
        self.settle().await;

        self.enter(Stage::FieldExtraction, url);
        let title = self.resolver.resolve(page, &profile.title).await;
        if !title.is_found() {
            self.enter(Stage::Failed, url);
            return Err(ScrapeError::MissingTitle { url: url.to_string() });
        }
        info!("Title: {}", title);

        let price = self.resolver.resolve(page, &profile.price).await.map_text(text::normalize_price);
        if !price.is_found() {
            warn!("Price not found");
        }

        self.open_description(page, profile).await;
        let description = self.resolver.resolve(page, &profile.description).await;

        let brand = match &profile.brand {
            Some(spec) => {
                Field::from(self.resolver.resolve(page, spec).await.as_deref().and_then(text::parse_byline))
            }
            None => Field::NotFound,
        };

        let mut selling_points = match page.content().await {
            Ok(html) => miner::mine(&html, &profile.miner),
            Err(e) => {
                warn!("Could not read page content, no selling points: {:#}", e);
                SellingPoints::default()
            }
        };

        let description = match description.as_deref() {
            Some(found) => {
                selling_points.extend_features(text::extract_feature_sentences(found));
                description
            }
            None if profile.feature_fallback && !selling_points.features.is_empty() => {
                debug!("No description, building one from {} features", selling_points.features.len());
                Field::from_text(format!("Product features: {}", selling_points.features.join(" ")))
            }
            None => {
                warn!("Description not found");
                Field::NotFound
            }
        };

        self.enter(Stage::ImageCollection, url);
        let images = match self.resolver.collect_images(page, &profile.images).await {
            Ok(images) => images,
            Err(e) => {
                warn!("No gallery images: {:#}", e);
                Vec::new()
            }
        };

        self.enter(Stage::Aggregated, url);
        let record = ProductRecord {
            site: self.site,
            url: page.current_url().await.unwrap_or_else(|| url.to_string()),
            title,
            price,
            description,
            brand,
            images,
            selling_points,
        };

        self.save_screenshot(page).await;

        Ok(record)
    }

    fn enter(&self, stage: Stage, url: &str) {
        info!("[{}] {}: {}", self.site, stage, url);
    }

    async fn settle(&self) {
        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }
    }

    /// Clicks the first description tab that responds, then lets it load.
    async fn open_description<P>(&self, page: &P, profile: &SiteProfile)
    where
        P: PageDriver + ?Sized,
    {
        for tab in profile.description_tabs {
            match page.click(tab).await {
                Ok(()) => {
                    debug!("Opened description tab {}", tab);
                    self.settle().await;
                    return;
                }
                Err(e) => debug!("Tab {}: {:#}", tab, e),
            }
        }
    }

    async fn save_screenshot<P>(&self, page: &P)
    where
        P: PageDriver + ?Sized,
    {
        let Some(dir) = &self.options.screenshot_dir else {
            return;
        };

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Cannot create {}: {}", dir.display(), e);
            return;
        }

        let path = dir.join(SCREENSHOT_FILE);
        match page.screenshot(&path).await {
            Ok(()) => info!("Saved screenshot to {}", path.display()),
            Err(e) => warn!("Screenshot failed: {:#}", e),
        }
    }
}

/// True when a slider or captcha is showing.
async fn challenge_present<P>(page: &P, probe: &VerificationProbe) -> bool
where
    P: PageDriver + ?Sized,
{
    for selector in probe.selectors {
        match page.exists(selector).await {
            Ok(true) => {
                debug!("Challenge element {} present", selector);
                return true;
            }
            Ok(false) => {}
            Err(e) => debug!("{}: {:#}", selector, e),
        }
    }

    if probe.text_markers.is_empty() {
        return false;
    }

    match page.content().await {
        Ok(html) => text::contains_any(&html, probe.text_markers),
        Err(e) => {
            debug!("Could not read page for challenge text: {:#}", e);
            false
        }
    }
}
