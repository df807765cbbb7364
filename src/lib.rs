//! pdp-harvest - Product detail page scraper with prompt synthesis
//!
//! Drives an Alibaba (1688) or Amazon detail page through ordered selector
//! cascades, mines selling points from the rendered page, and turns the
//! result into one image-generation prompt per product image.

pub mod cascade;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod miner;
pub mod models;
pub mod page;
pub mod prompt;
pub mod scrape;
pub mod sites;
pub mod text;

pub use config::Config;
pub use error::ScrapeError;
pub use models::{Field, ImagePoint, ProductRecord, SellingPoints};
pub use page::PageDriver;
pub use scrape::{ScrapeOptions, Scraper};
pub use sites::Site;
