//! Selling-point mining over a rendered detail page.
//!
//! Works on the serialized DOM with `scraper`: spec tables become name/value
//! pairs, rich-text lines are sorted into keyword selling points and generic
//! features, and description images are kept with the text around them.

use crate::models::{ImagePoint, SellingPoints};
use crate::text::{self, contains_any};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Lines carrying any of these are selling points. Matched lower-cased.
pub const SELLING_KEYWORDS: &[&str] = &[
    "特点",
    "优点",
    "功能",
    "适用",
    "优势",
    "特色",
    "特征",
    "feature",
    "advantage",
    "function",
    "suitable for",
    "ideal for",
    "benefit",
];

/// Lines carrying any of these are contact or pricing noise.
pub const FEATURE_DENYLIST: &[&str] = &["联系", "咨询", "价格", "¥", "$", "电话"];

/// Context snippets and bullets must be longer than this.
const MIN_SNIPPET_CHARS: usize = 5;

/// Elements whose boundaries start a new line of text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p",
    "pre", "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Where selling information lives on a site's detail page.
#[derive(Debug, Clone, Copy)]
pub struct MinerProfile {
    /// Specification rows
    pub spec_rows: &'static [&'static str],
    /// Key cell inside a row, first match wins
    pub spec_keys: &'static [&'static str],
    /// Value cell inside a row, first match wins
    pub spec_values: &'static [&'static str],
    /// Rows with these keys are not specifications
    pub ignored_keys: &'static [&'static str],
    pub rich_text: &'static [&'static str],
    pub rich_text_images: &'static [&'static str],
    /// Bullet lists; the first list yielding anything is used
    pub bullets: &'static [&'static str],
}

/// Mines selling points out of a page's HTML.
pub fn mine(html: &str, profile: &MinerProfile) -> SellingPoints {
    let document = Html::parse_document(html);
    let mut points = SellingPoints::default();

    mine_specifications(&document, profile, &mut points);
    mine_rich_text(&document, profile, &mut points);
    mine_bullets(&document, profile, &mut points);
    mine_image_points(&document, profile, &mut points);

    debug!(
        "Mined {} specs, {} selling points, {} features, {} image points",
        points.specifications.len(),
        points.text_points.len(),
        points.features.len(),
        points.image_points.len()
    );

    points
}

/// Text of an element with a line break around every block element.
pub fn inner_text(element: ElementRef) -> String {
    let mut out = String::new();
    push_inner_text(element, &mut out);
    out
}

fn push_inner_text(element: ElementRef, out: &mut String) {
    let block = BLOCK_TAGS.contains(&element.value().name());
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            push_inner_text(child, out);
        } else if let Node::Text(text) = child.value() {
            out.push_str(text);
        }
    }
    if block {
        out.push('\n');
    }
}

fn parse_all(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|selector| match Selector::parse(selector) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping invalid selector {}: {:?}", selector, e);
                None
            }
        })
        .collect()
}

/// Trims a cell and drops directional marks Amazon sprinkles into tables.
fn clean_cell(raw: &str) -> String {
    let without_marks: String =
        raw.chars().filter(|c| !matches!(c, '\u{200e}' | '\u{200f}' | '\u{200b}')).collect();
    text::collapse_whitespace(&without_marks)
}

fn first_text(row: ElementRef, candidates: &[Selector]) -> Option<String> {
    candidates
        .iter()
        .find_map(|selector| row.select(selector).next())
        .map(|cell| clean_cell(&cell.text().collect::<String>()))
}

fn mine_specifications(document: &Html, profile: &MinerProfile, points: &mut SellingPoints) {
    let keys = parse_all(profile.spec_keys);
    let values = parse_all(profile.spec_values);

    for rows in parse_all(profile.spec_rows) {
        for row in document.select(&rows) {
            let (Some(key), Some(value)) = (first_text(row, &keys), first_text(row, &values))
            else {
                trace!("Spec row without key or value");
                continue;
            };

            let key = key.trim_end_matches([':', '：']).trim();
            if profile.ignored_keys.iter().any(|ignored| key.eq_ignore_ascii_case(ignored)) {
                continue;
            }
            points.add_specification(key, &value);
        }
    }
}

fn mine_rich_text(document: &Html, profile: &MinerProfile, points: &mut SellingPoints) {
    for containers in parse_all(profile.rich_text) {
        for container in document.select(&containers) {
            for line in inner_text(container).lines() {
                classify_line(line.trim(), points);
            }
        }
    }
}

fn classify_line(line: &str, points: &mut SellingPoints) {
    let len = line.chars().count();
    let lowered = line.to_lowercase();

    if contains_any(&lowered, SELLING_KEYWORDS) {
        if len > 10 && len < 200 {
            points.add_text_point(line);
        }
    } else if len > 10 && !contains_any(&lowered, FEATURE_DENYLIST) {
        points.add_feature(line);
    }
}

fn mine_bullets(document: &Html, profile: &MinerProfile, points: &mut SellingPoints) {
    for bullets in parse_all(profile.bullets) {
        let lines: Vec<String> = document
            .select(&bullets)
            .map(|bullet| text::collapse_whitespace(&bullet.text().collect::<String>()))
            .filter(|line| line.chars().count() > MIN_SNIPPET_CHARS && !is_table_label(line))
            .collect();

        if !lines.is_empty() {
            debug!("Found {} bullets", lines.len());
            points.extend_features(lines);
            return;
        }
    }
}

/// "Key: value" rows that leak into bullet lists.
fn is_table_label(line: &str) -> bool {
    line.chars().take(4).any(|c| c == ':')
}

/// Every embedded image in page order; a repeated URL is kept, a node
/// matched by two selectors is not.
fn mine_image_points(document: &Html, profile: &MinerProfile, points: &mut SellingPoints) {
    let mut seen = HashSet::new();
    for images in parse_all(profile.rich_text_images) {
        for img in document.select(&images) {
            if !seen.insert(img.id()) {
                continue;
            }
            let Some(src) = img.value().attr("src").map(str::trim).filter(|s| !s.is_empty())
            else {
                continue;
            };

            let url = text::upgrade_protocol(src);

            points.image_points.push(ImagePoint {
                url,
                alt: img.value().attr("alt").unwrap_or_default().trim().to_string(),
                context: image_context(img),
            });
        }
    }
}

/// Text just before and after the image's container.
fn image_context(img: ElementRef) -> Vec<String> {
    let Some(parent) = img.parent() else {
        return Vec::new();
    };

    let previous =
        parent.prev_siblings().find_map(|node| snippet(node.value(), ElementRef::wrap(node)));
    let next =
        parent.next_siblings().find_map(|node| snippet(node.value(), ElementRef::wrap(node)));

    [previous, next]
        .into_iter()
        .flatten()
        .filter(|text| text.chars().count() > MIN_SNIPPET_CHARS)
        .collect()
}

/// Non-blank text of a sibling node; blank whitespace nodes are skipped.
fn snippet(node: &Node, element: Option<ElementRef>) -> Option<String> {
    let text = match (node, element) {
        (Node::Text(text), _) => text.to_string(),
        (Node::Element(_), Some(element)) => element.text().collect(),
        _ => return None,
    };
    let text = text::collapse_whitespace(&text);
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::{ALIBABA, AMAZON};

    const ALIBABA_DETAIL: &str = r#"
        <html><body>
            <div class="od-pc-attribute">
                <div class="od-pc-attribute-item">
                    <span class="od-pc-attribute-item-key">材质：</span>
                    <span class="od-pc-attribute-item-val">304不锈钢</span>
                </div>
                <div class="od-pc-attribute-item">
                    <span class="od-pc-attribute-item-key">尺寸:</span>
                    <span class="od-pc-attribute-item-val"> 20cm x 10cm </span>
                </div>
                <div class="od-pc-attribute-item">
                    <span class="od-pc-attribute-item-key">颜色</span>
                    <span class="od-pc-attribute-item-val">   </span>
                </div>
                <div class="od-pc-attribute-item">
                    <span class="od-pc-attribute-item-key">产地</span>
                </div>
            </div>
            <div class="detail-desc-decorate-richtext">
                <p>产品特点：加厚不锈钢，耐腐蚀易清洗</p>
                <p>适用场景：家庭厨房、餐厅、户外野营均可使用</p>
                <p>特点</p>
                <p>精选食品级材料，安全无异味，经久耐用</p>
                <p>如需定制请联系客服，量大从优</p>
                <p>批发价格¥8.8起，欢迎询价</p>
                <p>短行</p>
                <p>精选食品级材料，安全无异味，经久耐用</p>
                <div class="img-box"><img src="//cbu01.alicdn.com/detail1.jpg" alt="细节图"></div>
                <p>高温抛光工艺，表面光滑亮丽</p>
                <span>小</span><div><img src="//cbu01.alicdn.com/detail2.jpg"></div><span>tiny</span>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_alibaba_specifications() {
        let points = mine(ALIBABA_DETAIL, &ALIBABA.miner);
        assert_eq!(points.specifications.len(), 2);
        assert_eq!(points.specifications["材质"], "304不锈钢");
        assert_eq!(points.specifications["尺寸"], "20cm x 10cm");
    }

    #[test]
    fn test_alibaba_text_points_and_features() {
        let points = mine(ALIBABA_DETAIL, &ALIBABA.miner);

        assert_eq!(
            points.text_points,
            vec!["产品特点：加厚不锈钢，耐腐蚀易清洗", "适用场景：家庭厨房、餐厅、户外野营均可使用"]
        );
        // Duplicate line kept once, contact and price lines dropped
        assert_eq!(
            points.features,
            vec!["精选食品级材料，安全无异味，经久耐用", "高温抛光工艺，表面光滑亮丽"]
        );
    }

    #[test]
    fn test_alibaba_image_points_with_context() {
        let points = mine(ALIBABA_DETAIL, &ALIBABA.miner);
        assert_eq!(points.image_points.len(), 2);

        let first = &points.image_points[0];
        assert_eq!(first.url, "https://cbu01.alicdn.com/detail1.jpg");
        assert_eq!(first.alt, "细节图");
        assert_eq!(
            first.context,
            vec!["精选食品级材料，安全无异味，经久耐用", "高温抛光工艺，表面光滑亮丽"]
        );

        // Neighbours of five characters or fewer are not context
        let second = &points.image_points[1];
        assert_eq!(second.alt, "");
        assert!(second.context.is_empty());
    }

    const AMAZON_DETAIL: &str = r#"
        <html><body>
            <div id="feature-bullets">
                <ul>
                    <li><span class="a-list-item"> Fast charging for phones and tablets </span></li>
                    <li class="aok-hidden"><span class="a-list-item">Hidden bullet text here</span></li>
                    <li><span class="a-list-item">Tiny</span></li>
                    <li><span class="a-list-item">Ideal for travel, fits in any pocket</span></li>
                </ul>
            </div>
            <table class="a-keyvalue">
                <tr><th> Product Dimensions </th><td>&lrm;5.8 x 2.7 x 1 inches</td></tr>
                <tr><th>Customer Reviews</th><td>4.5 out of 5 stars</td></tr>
                <tr><th>Item model number</th><td>A1229</td></tr>
            </table>
            <div id="productOverview_feature_div">
                <table>
                    <tr><td class="a-span3">Brand</td><td class="a-span9">Anker</td></tr>
                </table>
            </div>
            <div id="aplus">
                <h3>Designed to last</h3>
                <p>Our best feature is the tough aluminium shell</p>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_amazon_bullets_and_specs() {
        let points = mine(AMAZON_DETAIL, &AMAZON.miner);

        assert_eq!(points.specifications["Product Dimensions"], "5.8 x 2.7 x 1 inches");
        assert_eq!(points.specifications["Item model number"], "A1229");
        assert_eq!(points.specifications["Brand"], "Anker");
        assert!(!points.specifications.contains_key("Customer Reviews"));

        assert!(points.features.contains(&"Fast charging for phones and tablets".to_string()));
        assert!(points.features.contains(&"Ideal for travel, fits in any pocket".to_string()));
        assert!(!points.features.iter().any(|f| f.contains("Hidden")));
        assert!(!points.features.iter().any(|f| f == "Tiny"));
    }

    #[test]
    fn test_amazon_rich_text_english_keywords() {
        let points = mine(AMAZON_DETAIL, &AMAZON.miner);
        assert_eq!(points.text_points, vec!["Our best feature is the tough aluminium shell"]);
        assert!(points.features.contains(&"Designed to last".to_string()));
    }

    #[test]
    fn test_image_points_keep_repeated_urls() {
        let html = r#"
            <div id="aplus" class="aplus-v2">
                <img src="//m.media-amazon.com/banner.jpg" alt="top">
                <img src="//m.media-amazon.com/detail.jpg">
                <img src="//m.media-amazon.com/banner.jpg" alt="bottom">
            </div>
        "#;
        let points = mine(html, &AMAZON.miner);

        // Both selectors match the same nodes; each node counts once
        let alts: Vec<&str> = points.image_points.iter().map(|p| p.alt.as_str()).collect();
        assert_eq!(alts, vec!["top", "", "bottom"]);
        assert_eq!(points.image_points[2].url, "https://m.media-amazon.com/banner.jpg");
    }

    #[test]
    fn test_bullets_fall_back_to_later_lists() {
        let html = r#"
            <div id="feature-bullets"><ul><li><span class="a-list-item">abc</span></li></ul></div>
            <div class="a-expander-content"><ul>
                <li>RAM: 16 GB</li>
                <li>Works with every USB-C laptop</li>
            </ul></div>
        "#;
        let points = mine(html, &AMAZON.miner);
        assert_eq!(points.features, vec!["Works with every USB-C laptop"]);
    }

    #[test]
    fn test_empty_page_gives_empty_points() {
        let points = mine("<html><body></body></html>", &ALIBABA.miner);
        assert!(points.is_empty());
    }

    #[test]
    fn test_inner_text_breaks_blocks() {
        let html = Html::parse_fragment("<div><p>one <b>two</b></p><p>three</p>four<br>five</div>");
        let div = html.select(&Selector::parse("div").unwrap()).next().unwrap();
        let text = inner_text(div);
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["one two", "three", "four", "five"]);
    }
}
