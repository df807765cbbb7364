//! Scrape command implementation.

use crate::config::Config;
use crate::format::{self, Formatter};
use crate::page::{self, PageDriver};
use crate::prompt;
use crate::scrape::{ScrapeOptions, Scraper};
use crate::sites::Site;
use anyhow::{Context, Result};
use std::ops::Deref;
use tracing::{info, warn};

/// Scrapes one detail page and writes the prompt summary.
pub struct ScrapeCommand {
    config: Config,
}

impl ScrapeCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Scrapes `url` and returns the formatted record.
    ///
    /// The site is taken from `site` when given, otherwise detected from the URL.
    pub async fn execute(&self, url: &str, site: Option<Site>) -> Result<String> {
        let site = resolve_site(url, site)?;
        let page = page::open(&self.config, site)
            .await
            .with_context(|| format!("Failed to open a {} page", self.config.engine))?;

        self.execute_with_page(page, site, url).await
    }

    /// Scrapes with a provided page (for testing).
    pub async fn execute_with_page<P>(&self, page: P, site: Site, url: &str) -> Result<String>
    where
        P: Deref,
        P::Target: PageDriver,
    {
        info!("Scraping {} page: {}", site.display_name(), url);

        let scraper = Scraper::new(site, ScrapeOptions::from_config(&self.config));
        let record = scraper.scrape_session(page, url).await?;

        let prompts =
            prompt::synthesize_batch(&record, self.config.prompt_skip, self.config.prompt_images);

        if let Some(path) = &self.config.summary_path {
            match tokio::fs::write(path, format::summary_text(&record, &prompts)).await {
                Ok(()) => info!("Wrote {} prompts to {}", prompts.len(), path.display()),
                Err(e) => warn!("Failed to write summary {}: {}", path.display(), e),
            }
        }

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_record(&record))
    }
}

fn resolve_site(url: &str, site: Option<Site>) -> Result<Site> {
    site.or_else(|| Site::detect(url)).with_context(|| {
        format!("Cannot tell which site {} belongs to. Pass --site alibaba|amazon", url)
    })
}
