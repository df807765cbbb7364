//! CSS selectors for Alibaba (1688) and Amazon detail pages.
//!
//! Selectors are kept as plain strings because the same lists feed the live
//! page driver, the in-page scripted probes and the `scraper` based miner.
//! Lists are ordered: earlier entries win.
//!
//! **Update process**: when a field starts coming back as not found, capture
//! the page HTML, fix the list here and extend the fixture under
//! `tests/fixtures/`.

/// Selectors for 1688 offer pages.
pub mod alibaba {
    pub const TITLE: &[&str] = &[".title-first-column .title-text", ".title-content h1", "h1"];

    /// Price is rendered late; wait for any price-ish node first.
    pub const PRICE_READY: &str = "[class*=\"price\"]";

    /// Scanned in-page for the first node showing a currency marker.
    pub const PRICE_SCAN: &[&str] = &["[class*=\"price\"]", "[class*=\"discount\"]"];

    pub const PRICE: &[&str] =
        &[".price-content", ".price", "[class*=\"price-now\"]", "[class*=\"price-original\"]"];

    /// Tabs that lazy-load the long description when clicked.
    pub const DESCRIPTION_TABS: &[&str] =
        &["[data-tab-key=\"descriptionTab\"]", "#detailTab", ".detail-tab-trigger"];

    pub const DESCRIPTION: &[&str] = &[
        ".detail-desc-content",
        ".description-content",
        "#J_DetailDesc",
        ".desc-content",
        "[class*=\"description\"]",
        "[class*=\"detail\"]",
    ];

    /// Scanned in-page before the selector list; ends with a catch-all over
    /// every desc/detail block.
    pub const DESCRIPTION_SCAN: &[&str] = &[
        ".detail-desc-content",
        ".description-content",
        "#J_DetailDesc",
        ".desc-content",
        "[class*=\"description\"]",
        "[class*=\"detail\"]",
        "[class*=\"desc\"], [class*=\"detail\"]",
    ];

    pub const GALLERY: &str = ".detail-gallery-img, .detail-gallery-turn-wrapper img";
    pub const GALLERY_IMAGES: &[&str] = &[".detail-gallery-img", ".detail-gallery-turn-wrapper img"];

    pub const SPEC_ROWS: &[&str] = &[".od-pc-attribute-item"];
    pub const SPEC_KEYS: &[&str] = &[".od-pc-attribute-item-key"];
    pub const SPEC_VALUES: &[&str] = &[".od-pc-attribute-item-val"];

    pub const RICH_TEXT: &[&str] = &[
        ".detail-desc-decorate-richtext",
        ".desc-lazyload-container",
        ".detail-desc-decorate-content",
    ];
    pub const RICH_TEXT_IMAGES: &[&str] = &[".detail-desc-decorate-richtext img"];

    /// Slider challenge widgets.
    pub const SLIDER: &[&str] = &["#nc_1_n1z", ".nc_iconfont.btn_slide", "#nocaptcha"];
}

/// Selectors for Amazon product pages.
pub mod amazon {
    /// Any of these means the product page has rendered.
    pub const READY: &str = "#productTitle, #landingImage, #feature-bullets";

    pub const TITLE: &[&str] = &["#productTitle", "#title span", ".product-title-word-break"];

    pub const PRICE: &[&str] = &[
        "#corePrice_feature_div .a-price .a-offscreen",
        ".priceToPay .a-offscreen",
        "#priceblock_ourprice",
        "#priceblock_dealprice",
        ".a-price .a-offscreen",
    ];

    pub const DESCRIPTION: &[&str] = &[
        "#productDescription",
        "#aplus",
        ".aplus-v2",
        "#aplus3p_feature_div",
        "#askAplus_feature_div",
        "#dpx-product-description_feature_div",
        "#productDetails_feature_div",
        "#productDetails_techSpec_section_1",
        "#detailBulletsWrapper_feature_div",
        "#detailBullets_feature_div",
        "#prodDetails",
        "div.product-facts-detail",
    ];

    pub const BYLINE: &[&str] = &[
        "#bylineInfo",
        "div#bylineInfo_feature_div a.a-link-normal[href*='/stores/']",
        "div#bylineInfo_feature_div a.a-link-normal[href*='/BRAND/']",
        ".po-brand .po-break-word",
    ];

    pub const GALLERY: &str = "#landingImage, #imgTagWrapperId img, #altImages img";
    pub const GALLERY_IMAGES: &[&str] = &[
        "#landingImage",
        "#imgTagWrapperId img",
        "#imgBlkFront",
        "#ivLargeImage img",
        "#altImages ul li img",
        "#altImages .a-list-item img",
        "#imageBlock_feature_div img",
        "#thumbsBelowVisualSearchCarousel img",
        "#thumbImages img",
        "#image-block-pagination img",
    ];

    pub const BULLETS: &[&str] = &[
        "#feature-bullets li:not(.aok-hidden) span.a-list-item",
        "div[id='feature-bullets'] li:not(.aok-hidden)",
        "div.a-section.a-spacing-medium.a-spacing-top-small li",
        "div#featurebullets_feature_div ul.a-unordered-list li",
        "div#productDescription ul li",
        "div#dpx-product-description_feature_div ul li",
        "div#technicalSpecifications_feature_div ul li",
        "div.product-facts-detail ul li",
        "div.a-expander-content ul li",
    ];

    pub const SPEC_ROWS: &[&str] = &[
        "table.a-keyvalue tr",
        "#productDetails_techSpec_section_1 tr",
        "#productDetails_techSpec_section_2 tr",
        "#technicalSpecifications_section_1 tr",
        "#productOverview_feature_div tr",
    ];
    pub const SPEC_KEYS: &[&str] = &["th", "td.a-span3"];
    pub const SPEC_VALUES: &[&str] = &["td:not(.a-span3)", "td.a-span9"];

    pub const RICH_TEXT: &[&str] = &["#aplus", ".aplus-v2", "#productDescription"];
    pub const RICH_TEXT_IMAGES: &[&str] = &["#aplus img", ".aplus-v2 img"];

    pub const CAPTCHA: &[&str] = &[
        "input[name='captchacharacters']",
        "form[action='/errors/validateCaptcha']",
        "img[src*='captcha']",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    fn all_selectors() -> Vec<&'static str> {
        let lists: &[&[&str]] = &[
            alibaba::TITLE,
            alibaba::PRICE_SCAN,
            alibaba::PRICE,
            alibaba::DESCRIPTION_TABS,
            alibaba::DESCRIPTION,
            alibaba::DESCRIPTION_SCAN,
            alibaba::GALLERY_IMAGES,
            alibaba::SPEC_ROWS,
            alibaba::SPEC_KEYS,
            alibaba::SPEC_VALUES,
            alibaba::RICH_TEXT,
            alibaba::RICH_TEXT_IMAGES,
            alibaba::SLIDER,
            amazon::TITLE,
            amazon::PRICE,
            amazon::DESCRIPTION,
            amazon::BYLINE,
            amazon::GALLERY_IMAGES,
            amazon::BULLETS,
            amazon::SPEC_ROWS,
            amazon::SPEC_KEYS,
            amazon::SPEC_VALUES,
            amazon::RICH_TEXT,
            amazon::RICH_TEXT_IMAGES,
            amazon::CAPTCHA,
        ];
        let mut all: Vec<&str> = lists.iter().flat_map(|list| list.iter().copied()).collect();
        all.extend([alibaba::PRICE_READY, alibaba::GALLERY, amazon::READY, amazon::GALLERY]);
        all
    }

    #[test]
    fn test_all_selectors_parse() {
        for selector in all_selectors() {
            assert!(Selector::parse(selector).is_ok(), "selector does not parse: {}", selector);
        }
    }

    #[test]
    fn test_no_empty_lists() {
        assert!(!alibaba::TITLE.is_empty());
        assert!(!amazon::TITLE.is_empty());
        assert!(!alibaba::GALLERY_IMAGES.is_empty());
        assert!(!amazon::GALLERY_IMAGES.is_empty());
    }
}
