//! Prompt command: synthesizes prompts from a saved record.

use crate::config::Config;
use crate::format::Formatter;
use crate::models::ProductRecord;
use crate::prompt;
use anyhow::{Context, Result};
use std::path::Path;

/// Turns a record saved with `--format json` back into prompts.
pub struct PromptCommand {
    config: Config,
}

impl PromptCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Reads the record at `path` and returns the formatted prompts.
    pub async fn execute(&self, path: &Path, count: Option<usize>) -> Result<String> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read record: {}", path.display()))?;

        let record: ProductRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse record: {}", path.display()))?;

        Ok(self.execute_record(&record, count))
    }

    /// Formats prompts for an already loaded record.
    pub fn execute_record(&self, record: &ProductRecord, count: Option<usize>) -> String {
        let limit = count.unwrap_or(self.config.prompt_images);
        let prompts = prompt::synthesize_batch(record, self.config.prompt_skip, limit);

        Formatter::new(self.config.format).format_prompts(&prompts)
    }
}
