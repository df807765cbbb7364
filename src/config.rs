//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Page engine used to load detail pages
    #[serde(default)]
    pub engine: Engine,

    /// Run the browser without a window
    #[serde(default)]
    pub headless: bool,

    /// Chrome/Chromium executable (auto-detected when unset)
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// User agent presented by the browser engine
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Browser window width in pixels
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Browser window height in pixels
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay before each HTTP fetch in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Page load timeout in milliseconds
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Bounded wait for a single selector probe in milliseconds
    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,

    /// Grace period when a slider or captcha challenge is shown, in seconds
    #[serde(default = "default_verification_wait_secs")]
    pub verification_wait_secs: u64,

    /// Pause after load and after opening the description tab, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Directory for the diagnostic screenshot (none disables it)
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: Option<PathBuf>,

    /// Prompt summary file written after a scrape (none disables it)
    #[serde(default = "default_summary_path")]
    pub summary_path: Option<PathBuf>,

    /// Number of gallery images to synthesize prompts for
    #[serde(default = "default_prompt_images")]
    pub prompt_images: usize,

    /// Gallery images to skip before the first prompt
    #[serde(default)]
    pub prompt_skip: usize,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/121.0.0.0 Safari/537.36"
        .to_string()
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_delay_jitter_ms() -> u64 {
    2000
}

fn default_navigation_timeout_ms() -> u64 {
    60_000
}

fn default_selector_timeout_ms() -> u64 {
    5_000
}

fn default_verification_wait_secs() -> u64 {
    30
}

fn default_settle_delay_ms() -> u64 {
    3_000
}

fn default_screenshot_dir() -> Option<PathBuf> {
    Some(PathBuf::from("debug"))
}

fn default_summary_path() -> Option<PathBuf> {
    Some(PathBuf::from("prompts.txt"))
}

fn default_prompt_images() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            headless: false,
            chrome_path: None,
            user_agent: default_user_agent(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            selector_timeout_ms: default_selector_timeout_ms(),
            verification_wait_secs: default_verification_wait_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            screenshot_dir: default_screenshot_dir(),
            summary_path: default_summary_path(),
            prompt_images: default_prompt_images(),
            prompt_skip: 0,
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pdp-harvest").join("config.toml");
            if user_config.exists() {
                debug!("Found config in user config directory");
                return Self::from_file(user_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(proxy) = std::env::var("PDP_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(headless) = std::env::var("PDP_HEADLESS") {
            match headless.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.headless = true,
                "0" | "false" | "no" => self.headless = false,
                _ => debug!("Ignoring PDP_HEADLESS={}", headless),
            }
        }

        if let Ok(engine) = std::env::var("PDP_ENGINE") {
            if let Ok(e) = engine.parse() {
                self.engine = e;
            }
        }

        if let Ok(chrome) = std::env::var("PDP_CHROME") {
            if !chrome.trim().is_empty() {
                self.chrome_path = Some(PathBuf::from(chrome));
            }
        }

        self
    }
}

/// How detail pages are loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Real browser over the DevTools protocol; runs page scripts
    #[default]
    Chrome,
    /// Plain HTTP fetch parsed as a static document
    Http,
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "browser" => Ok(Engine::Chrome),
            "http" => Ok(Engine::Http),
            _ => Err(format!("Unknown engine: {}. Use: chrome, http", s)),
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::Chrome => write!(f, "chrome"),
            Engine::Http => write!(f, "http"),
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}
