//! Text cleanup shared by the extractors: price normalization, feature
//! sentence filtering, URL fixes and brand handling.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Sentinel stored in place of a field that could not be extracted.
pub const NOT_FOUND: &str = "未获取到";

/// Maximum number of feature sentences taken from a description.
pub const MAX_FEATURE_SENTENCES: usize = 5;

/// Tokens that mark a description sentence as contact or pricing noise.
/// Matched against the lower-cased sentence.
pub const SENTENCE_DENYLIST: &[&str] =
    &["联系", "咨询", "价格", "¥", "￥", "$", "电话", "qq", "微信"];

/// Currency-marked decimal number, e.g. `¥12.50` or `￥9.9`.
static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[¥￥](\d+\.?\d*)").unwrap());

static BYLINE_STORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Visit the\s+(.+?)\s+Store").unwrap());

static BYLINE_BRAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Brand:\s*(.+)").unwrap());

/// Returns true if `text` is one of the "not found" markers.
pub fn is_not_found(text: &str) -> bool {
    let text = text.trim();
    text == NOT_FOUND || text.eq_ignore_ascii_case("not found")
}

/// Normalizes a raw price widget text into `¥X` or `¥X - ¥Y`.
///
/// Two or more currency-marked numbers produce a range from the first to the
/// last one, a single number produces that value, and text without any
/// currency-marked number (promotional copy like "询价") is returned as-is.
/// Empty input and the sentinel come back as the sentinel.
pub fn normalize_price(raw: &str) -> String {
    if raw.trim().is_empty() || is_not_found(raw) {
        return NOT_FOUND.to_string();
    }

    let values: Vec<&str> = PRICE_PATTERN
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    match values.as_slice() {
        [] => raw.to_string(),
        [only] => format!("¥{}", only),
        [first, .., last] => format!("¥{} - ¥{}", first, last),
    }
}

/// Picks up to five feature-like sentences out of a free-form description.
///
/// Sentences are split on sentence-ending punctuation and newlines, must be
/// strictly between 10 and 100 characters long, and must not mention contact
/// details or prices.
pub fn extract_feature_sentences(description: &str) -> Vec<String> {
    description
        .split(['。', '！', '？', '!', '?', '\n', '\r'])
        .map(str::trim)
        .filter(|sentence| {
            let len = sentence.chars().count();
            len > 10 && len < 100
        })
        .filter(|sentence| !contains_any(&sentence.to_lowercase(), SENTENCE_DENYLIST))
        .take(MAX_FEATURE_SENTENCES)
        .map(String::from)
        .collect()
}

/// Adds `https:` to protocol-relative URLs (`//img.alicdn.com/...`).
pub fn upgrade_protocol(url: &str) -> String {
    let url = url.trim();
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Appends `item` unless an equal value is already present.
pub fn push_unique(items: &mut Vec<String>, item: String) -> bool {
    if items.contains(&item) {
        false
    } else {
        items.push(item);
        true
    }
}

/// Returns true if `haystack` contains any of `needles`.
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts a brand name from an Amazon byline such as
/// "Visit the Anker Store" or "Brand: Anker".
pub fn parse_byline(text: &str) -> Option<String> {
    let text = collapse_whitespace(text);
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = BYLINE_STORE.captures(&text) {
        return caps.get(1).map(|m| m.as_str().trim().to_string());
    }

    if let Some(caps) = BYLINE_BRAND.captures(&text) {
        return caps.get(1).map(|m| m.as_str().trim().to_string());
    }

    // Bare brand links from the overview table
    (text.chars().count() <= 40).then_some(text)
}

/// Removes a brand name from a title or feature line.
///
/// A leading brand is cut first; otherwise every whole-word occurrence is
/// removed. When nothing meaningful would remain the input is returned.
pub fn strip_brand(text: &str, brand: &str) -> String {
    let brand = brand.trim();
    if text.trim().is_empty() || brand.is_empty() {
        return text.to_string();
    }

    if text.to_lowercase().starts_with(&brand.to_lowercase()) {
        let rest: String = text.chars().skip(brand.chars().count()).collect();
        let rest = trim_leading_junk(&rest);
        if !rest.is_empty() {
            return rest;
        }
    }

    let Ok(pattern) = Regex::new(&format!(r"(?i)\b{}\b", regex_lite::escape(brand))) else {
        return text.to_string();
    };

    if !pattern.is_match(text) {
        return text.to_string();
    }

    let removed = collapse_whitespace(&pattern.replace_all(text, ""));
    let cleaned = trim_trailing_junk(&trim_leading_junk(&removed));

    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case(brand) {
        text.to_string()
    } else {
        cleaned
    }
}

fn trim_leading_junk(text: &str) -> String {
    text.trim_start_matches(|c: char| !(c.is_alphanumeric() || c == '(' || c == '['))
        .trim()
        .to_string()
}

fn trim_trailing_junk(text: &str) -> String {
    text.trim_end_matches(|c: char| !(c.is_alphanumeric() || c == ')' || c == ']'))
        .trim()
        .to_string()
}
