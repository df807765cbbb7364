//! CLI command implementations.

pub mod prompt;
pub mod scrape;

pub use prompt::PromptCommand;
pub use scrape::ScrapeCommand;
