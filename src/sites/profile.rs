//! Per-site extraction profiles: which cascades, probes and miner rules to use.

use super::selectors::{alibaba, amazon};
use crate::cascade::{FieldSpec, ImageSpec, Strategy, Validity};
use crate::miner::MinerProfile;

/// Currency markers a price candidate must show.
const CNY_MARKERS: &[&str] = &["¥", "￥"];
const AMAZON_PRICE_MARKERS: &[&str] = &["$", "¥", "￥", "€", "£"];

/// Image URLs containing these are spacers or sprites, not product photos.
const PLACEHOLDER_MARKERS: &[&str] = &["sprite", "loading", "grey-pixel"];

/// Everything the orchestrator needs to know about one site.
#[derive(Debug)]
pub struct SiteProfile {
    pub title: FieldSpec,
    pub price: FieldSpec,
    /// Tabs that reveal the description, clicked in order until one works
    pub description_tabs: &'static [&'static str],
    pub description: FieldSpec,
    /// Build a description out of mined features when none is found
    pub feature_fallback: bool,
    pub brand: Option<FieldSpec>,
    pub images: ImageSpec,
    pub verification: VerificationProbe,
    pub miner: MinerProfile,
}

/// How to recognise an interactive challenge on a loaded page.
#[derive(Debug)]
pub struct VerificationProbe {
    pub selectors: &'static [&'static str],
    /// Substrings of the page HTML shown only on challenge pages
    pub text_markers: &'static [&'static str],
}

pub static ALIBABA: SiteProfile = SiteProfile {
    title: FieldSpec {
        name: "title",
        ready: None,
        strategies: &[Strategy::Selectors(alibaba::TITLE)],
        validity: Validity::ANY,
    },
    price: FieldSpec {
        name: "price",
        ready: Some(alibaba::PRICE_READY),
        strategies: &[Strategy::Scripted(alibaba::PRICE_SCAN), Strategy::Selectors(alibaba::PRICE)],
        validity: Validity::containing(CNY_MARKERS),
    },
    description_tabs: alibaba::DESCRIPTION_TABS,
    description: FieldSpec {
        name: "description",
        ready: None,
        strategies: &[
            Strategy::Scripted(alibaba::DESCRIPTION_SCAN),
            Strategy::Selectors(alibaba::DESCRIPTION),
        ],
        validity: Validity::longer_than(50),
    },
    feature_fallback: false,
    brand: None,
    images: ImageSpec {
        gallery: alibaba::GALLERY,
        images: alibaba::GALLERY_IMAGES,
        attrs: &["src", "data-src", "data-lazyload-src"],
        skip_markers: PLACEHOLDER_MARKERS,
        upscale: super::upscale_alibaba,
    },
    verification: VerificationProbe { selectors: alibaba::SLIDER, text_markers: &["请按住滑块"] },
    miner: MinerProfile {
        spec_rows: alibaba::SPEC_ROWS,
        spec_keys: alibaba::SPEC_KEYS,
        spec_values: alibaba::SPEC_VALUES,
        ignored_keys: &[],
        rich_text: alibaba::RICH_TEXT,
        rich_text_images: alibaba::RICH_TEXT_IMAGES,
        bullets: &[],
    },
};

pub static AMAZON: SiteProfile = SiteProfile {
    title: FieldSpec {
        name: "title",
        ready: Some(amazon::READY),
        strategies: &[Strategy::Selectors(amazon::TITLE)],
        validity: Validity::ANY,
    },
    price: FieldSpec {
        name: "price",
        ready: None,
        strategies: &[Strategy::Selectors(amazon::PRICE)],
        validity: Validity::containing(AMAZON_PRICE_MARKERS),
    },
    description_tabs: &[],
    description: FieldSpec {
        name: "description",
        ready: None,
        strategies: &[Strategy::Longest(amazon::DESCRIPTION)],
        validity: Validity::longer_than(100),
    },
    feature_fallback: true,
    brand: Some(FieldSpec {
        name: "brand",
        ready: None,
        strategies: &[Strategy::Selectors(amazon::BYLINE)],
        validity: Validity::ANY,
    }),
    images: ImageSpec {
        gallery: amazon::GALLERY,
        images: amazon::GALLERY_IMAGES,
        attrs: &["src", "data-old-hires", "data-src"],
        skip_markers: PLACEHOLDER_MARKERS,
        upscale: super::upscale_amazon,
    },
    verification: VerificationProbe {
        selectors: amazon::CAPTCHA,
        text_markers: &[
            "Enter the characters you see below",
            "Type the characters you see in this image",
        ],
    },
    miner: MinerProfile {
        spec_rows: amazon::SPEC_ROWS,
        spec_keys: amazon::SPEC_KEYS,
        spec_values: amazon::SPEC_VALUES,
        ignored_keys: &["Customer Reviews", "Best Sellers Rank"],
        rich_text: amazon::RICH_TEXT,
        rich_text_images: amazon::RICH_TEXT_IMAGES,
        bullets: amazon::BULLETS,
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alibaba_price_scans_before_selectors() {
        assert!(matches!(ALIBABA.price.strategies[0], Strategy::Scripted(_)));
        assert!(matches!(ALIBABA.price.strategies[1], Strategy::Selectors(_)));
        assert!(ALIBABA.price.validity.accepts("¥9.9"));
        assert!(!ALIBABA.price.validity.accepts("询价"));
    }

    #[test]
    fn test_description_cascades() {
        assert!(matches!(ALIBABA.description.strategies[0], Strategy::Scripted(_)));
        assert!(matches!(ALIBABA.description.strategies[1], Strategy::Selectors(_)));
        assert!(!ALIBABA.description.validity.accepts(&"x".repeat(50)));
        assert!(ALIBABA.description.validity.accepts(&"x".repeat(51)));

        assert!(matches!(AMAZON.description.strategies, [Strategy::Longest(_)]));
        assert!(!AMAZON.description.validity.accepts(&"x".repeat(100)));
        assert!(AMAZON.description.validity.accepts(&"x".repeat(101)));
    }

    #[test]
    fn test_feature_fallback_only_on_amazon() {
        assert!(!ALIBABA.feature_fallback);
        assert!(AMAZON.feature_fallback);
    }

    #[test]
    fn test_only_amazon_has_brand_and_bullets() {
        assert!(ALIBABA.brand.is_none());
        assert!(AMAZON.brand.is_some());
        assert!(ALIBABA.miner.bullets.is_empty());
        assert!(!AMAZON.miner.bullets.is_empty());
    }
}
