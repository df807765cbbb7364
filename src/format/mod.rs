//! Output formatting for product records and prompts (table, JSON, markdown),
//! plus the plain-text summary file.

use crate::config::OutputFormat;
use crate::models::ProductRecord;
use crate::prompt::ImagePrompt;

/// Formats records and prompts for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a scraped record.
    pub fn format_record(&self, record: &ProductRecord) -> String {
        match self.format {
            OutputFormat::Json => self.json_record(record),
            OutputFormat::Table => self.table_record(record),
            OutputFormat::Markdown => self.markdown_record(record),
        }
    }

    /// Formats synthesized prompts.
    pub fn format_prompts(&self, prompts: &[ImagePrompt]) -> String {
        if prompts.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                _ => "No prompts generated.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(prompts).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_prompts(prompts),
            OutputFormat::Markdown => self.markdown_prompts(prompts),
        }
    }

    // JSON formatting

    fn json_record(&self, record: &ProductRecord) -> String {
        serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
    }

    // Table formatting

    fn table_record(&self, record: &ProductRecord) -> String {
        let mut lines = Vec::new();
        let points = &record.selling_points;

        lines.push(format!("Site:        {}", record.site.display_name()));
        lines.push(format!("Title:       {}", record.title));
        lines.push(format!("Price:       {}", record.price));
        if record.brand.is_found() {
            lines.push(format!("Brand:       {}", record.brand));
        }
        lines.push(format!("URL:         {}", record.url));
        lines.push(format!("Description: {}", truncate(record.description.as_str(), 120)));
        lines.push(format!("Images:      {}", record.images.len()));

        if !points.specifications.is_empty() {
            lines.push(String::new());
            lines.push("Specifications:".to_string());
            let key_width = points.specifications.keys().map(|k| k.chars().count()).max().unwrap_or(0);
            for (key, value) in &points.specifications {
                let pad = key_width - key.chars().count();
                lines.push(format!("  {}{}  {}", key, " ".repeat(pad), value));
            }
        }

        push_list(&mut lines, "Selling points:", &points.text_points, "  - ");
        push_list(&mut lines, "Features:", &points.features, "  - ");

        if !points.image_points.is_empty() {
            lines.push(String::new());
            lines.push(format!("Detail images with text: {}", points.image_points.len()));
        }

        lines.join("\n")
    }

    fn table_prompts(&self, prompts: &[ImagePrompt]) -> String {
        let mut lines = Vec::new();

        for prompt in prompts {
            let image = prompt.image_url.as_deref().unwrap_or("(no image)");
            lines.push(format!("#{:<3} {}", prompt.index + 1, image));
            lines.push(format!("     {}", prompt.prompt));
            lines.push(String::new());
        }

        lines.push(format!("Total: {} prompts", prompts.len()));
        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_record(&self, record: &ProductRecord) -> String {
        let mut lines = Vec::new();
        let points = &record.selling_points;

        lines.push(format!("## {}", record.title));
        lines.push(String::new());
        lines.push(format!("- **Site:** {}", record.site.display_name()));
        lines.push(format!("- **Price:** {}", record.price));
        if record.brand.is_found() {
            lines.push(format!("- **Brand:** {}", record.brand));
        }
        lines.push(format!("- **URL:** [View product]({})", record.url));

        if record.description.is_found() {
            lines.push(String::new());
            lines.push(record.description.to_string());
        }

        if !points.specifications.is_empty() {
            lines.push(String::new());
            lines.push("| Specification | Value |".to_string());
            lines.push("|---------------|-------|".to_string());
            for (key, value) in &points.specifications {
                lines.push(format!("| {} | {} |", key, value));
            }
        }

        if !points.text_points.is_empty() {
            lines.push(String::new());
            lines.push("### Selling points".to_string());
            lines.extend(points.text_points.iter().map(|p| format!("- {}", p)));
        }

        if !points.features.is_empty() {
            lines.push(String::new());
            lines.push("### Features".to_string());
            lines.extend(points.features.iter().map(|f| format!("- {}", f)));
        }

        if !record.images.is_empty() {
            lines.push(String::new());
            lines.push("### Images".to_string());
            for (i, url) in record.images.iter().enumerate() {
                lines.push(format!("{}. ![image {}]({})", i + 1, i + 1, url));
            }
        }

        lines.join("\n")
    }

    fn markdown_prompts(&self, prompts: &[ImagePrompt]) -> String {
        let mut lines = Vec::new();

        for prompt in prompts {
            lines.push(format!("### Image {}", prompt.index + 1));
            if let Some(url) = &prompt.image_url {
                lines.push(format!("![image {}]({})", prompt.index + 1, url));
            }
            lines.push(String::new());
            lines.push(format!("> {}", prompt.prompt));
            lines.push(String::new());
        }

        lines.push(format!("*{} prompts*", prompts.len()));
        lines.join("\n")
    }
}

/// Renders the plain-text summary file: product summary, specifications,
/// selling points, features, detail image points, then one prompt per image.
pub fn summary_text(record: &ProductRecord, prompts: &[ImagePrompt]) -> String {
    let points = &record.selling_points;
    let mut lines = vec!["===== Product summary =====".to_string()];

    if record.title.is_found() {
        lines.push(format!("Title: {}", record.title));
    }
    if record.price.is_found() {
        lines.push(format!("Price: {}", record.price));
    }
    if record.brand.is_found() {
        lines.push(format!("Brand: {}", record.brand));
    }
    lines.push(format!("URL: {}", record.url));

    if !points.specifications.is_empty() {
        lines.push(String::new());
        lines.push("Specifications:".to_string());
        for (key, value) in &points.specifications {
            lines.push(format!("- {}: {}", key, value));
        }
    }

    push_list(&mut lines, "Selling points:", &points.text_points, "- ");
    push_list(&mut lines, "Features:", &points.features, "- ");

    if !points.image_points.is_empty() {
        lines.push(String::new());
        lines.push("Detail image points:".to_string());
        for point in &points.image_points {
            let label = if point.alt.is_empty() { &point.url } else { &point.alt };
            lines.push(format!("- Image: {}", label));
            if !point.context.is_empty() {
                lines.push(format!("  Context: {}", point.context.join(" | ")));
            }
        }
    }

    for prompt in prompts {
        lines.push(String::new());
        lines.push(format!("===== Image {} prompt =====", prompt.index + 1));
        if let Some(url) = &prompt.image_url {
            lines.push(url.clone());
        }
        lines.push(prompt.prompt.clone());
    }

    lines.push(String::new());
    lines.join("\n")
}

fn push_list(lines: &mut Vec<String>, heading: &str, items: &[String], bullet: &str) {
    if items.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(heading.to_string());
    lines.extend(items.iter().map(|item| format!("{}{}", bullet, item)));
}

/// Cuts `text` to at most `max` characters, marking the cut with "...".
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
