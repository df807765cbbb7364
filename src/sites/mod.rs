//! Supported storefronts and their page profiles.

mod profile;
pub mod selectors;

pub use profile::{SiteProfile, VerificationProbe, ALIBABA, AMAZON};

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use url::Url;

/// Supported product detail page sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    /// Alibaba's 1688.com wholesale offer pages
    #[default]
    Alibaba,
    Amazon,
}

/// Error returned when a site name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteParseError(String);

impl fmt::Display for SiteParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown site: {}. Use: alibaba, amazon", self.0)
    }
}

impl std::error::Error for SiteParseError {}

impl Site {
    /// Guesses the site from a detail page URL.
    pub fn detect(url: &str) -> Option<Site> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_lowercase();

        if host.ends_with("1688.com") || host.ends_with("alibaba.com") {
            Some(Site::Alibaba)
        } else if host.split('.').any(|label| label == "amazon") {
            Some(Site::Amazon)
        } else {
            None
        }
    }

    /// Returns the extraction profile for this site.
    pub fn profile(&self) -> &'static SiteProfile {
        match self {
            Site::Alibaba => &ALIBABA,
            Site::Amazon => &AMAZON,
        }
    }

    /// Returns the Accept-Language header value for this site.
    pub fn accept_language(&self) -> &'static str {
        match self {
            Site::Alibaba => "zh-CN,zh;q=0.9,en;q=0.8",
            Site::Amazon => "en-US,en;q=0.9",
        }
    }

    /// Rewrites a gallery thumbnail URL to its high-resolution variant.
    pub fn upscale_image(&self, url: &str) -> String {
        (self.profile().images.upscale)(url)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Site::Alibaba => "Alibaba (1688)",
            Site::Amazon => "Amazon",
        }
    }

    /// Returns all supported sites.
    pub fn all() -> &'static [Site] {
        &[Site::Alibaba, Site::Amazon]
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Alibaba => write!(f, "alibaba"),
            Site::Amazon => write!(f, "amazon"),
        }
    }
}

impl FromStr for Site {
    type Err = SiteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alibaba" | "1688" => Ok(Site::Alibaba),
            "amazon" | "amz" => Ok(Site::Amazon),
            _ => Err(SiteParseError(s.to_string())),
        }
    }
}

fn upscale_alibaba(url: &str) -> String {
    url.replace("50x50", "800x800")
}

/// Amazon size tokens, tried in order.
static AMAZON_SIZE_TOKENS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"\._SS[0-9]+(?:_[A-Z0-9]+)?_\.").unwrap(),
        Regex::new(r"\._AC_US[0-9]+_\.").unwrap(),
        Regex::new(r"\._UX[0-9]+_\.").unwrap(),
        Regex::new(r"\._SY[0-9]+_\.").unwrap(),
    ]
});

/// Any other `._<modifiers>_.` block right before the extension.
static AMAZON_ANY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\._[^/]*?_\.(jpg|jpeg|png)").unwrap());

fn upscale_amazon(url: &str) -> String {
    let mut upscaled = url.to_string();
    for pattern in AMAZON_SIZE_TOKENS.iter() {
        upscaled = pattern.replace_all(&upscaled, "._SL1600_.").into_owned();
    }

    if upscaled == url {
        upscaled = AMAZON_ANY_TOKEN.replace_all(&upscaled, "._SL1600_.${1}").into_owned();
    }

    upscaled
}
