//! pdp-harvest - Product detail page scraper for Alibaba (1688) and Amazon
//!
//! Extracts title, price, description, gallery images and selling points, and
//! writes one image-generation prompt per gallery image.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pdp_harvest::commands::{PromptCommand, ScrapeCommand};
use pdp_harvest::config::{Config, Engine, OutputFormat};
use pdp_harvest::Site;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pdp-harvest",
    version,
    about = "Product detail page scraper with prompt synthesis",
    long_about = "Scrapes Alibaba (1688) and Amazon product detail pages through ordered selector \
                  cascades and turns the result into image-generation prompts."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "PDP_PROXY")]
    proxy: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a product detail page
    #[command(alias = "s")]
    Scrape {
        /// Detail page URL
        url: String,

        /// Site profile to use (detected from the URL when omitted)
        #[arg(long)]
        site: Option<Site>,

        /// Page engine: chrome or http
        #[arg(short, long)]
        engine: Option<Engine>,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,

        /// Number of gallery images to write prompts for
        #[arg(short, long)]
        images: Option<usize>,

        /// Gallery images to skip before the first prompt
        #[arg(long)]
        skip: Option<usize>,

        /// Where to write the prompt summary
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Do not save a diagnostic screenshot
        #[arg(long)]
        no_screenshot: bool,
    },

    /// Print prompts for a record saved with --format json
    #[command(alias = "p")]
    Prompt {
        /// Saved record (JSON)
        record: PathBuf,

        /// Number of prompts to write
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// List supported sites
    Sites,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }

    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Scrape { url, site, engine, headless, images, skip, summary, no_screenshot } => {
            if let Some(engine) = engine {
                config.engine = engine;
            }
            if headless {
                config.headless = true;
            }
            if let Some(images) = images {
                config.prompt_images = images;
            }
            if let Some(skip) = skip {
                config.prompt_skip = skip;
            }
            if let Some(summary) = summary {
                config.summary_path = Some(summary);
            }
            if no_screenshot {
                config.screenshot_dir = None;
            }

            let cmd = ScrapeCommand::new(config);
            let output = cmd.execute(&url, site).await?;
            println!("{}", output);
        }

        Commands::Prompt { record, count } => {
            let cmd = PromptCommand::new(config);
            let output = cmd.execute(&record, count).await?;
            println!("{}", output);
        }

        Commands::Sites => {
            println!("Supported sites:\n");
            println!("{:<10} {:<16} {:<24}", "Code", "Name", "Accept-Language");
            println!("{:-<10} {:-<16} {:-<24}", "", "", "");

            for site in Site::all() {
                println!(
                    "{:<10} {:<16} {:<24}",
                    site.to_string(),
                    site.display_name(),
                    site.accept_language()
                );
            }
        }
    }

    Ok(())
}
