//! Image-generation prompt synthesis.
//!
//! A prompt is a fixed sequence of short sentences: product title, priority
//! specifications, one rotating selling point, one rotating feature and four
//! constant directives. Rotation is `image_index mod len`, so consecutive
//! images of the same product highlight different points.

use crate::models::{ProductRecord, SellingPoints};
use serde::Serialize;

/// Specification names worth mentioning, in the order they are emitted.
pub const SPEC_PRIORITY: &[&str] = &[
    "尺寸",
    "规格",
    "材质",
    "型号",
    "Size",
    "Product Dimensions",
    "Material",
    "Model",
    "Item model number",
];

/// Appended to every prompt.
pub const DIRECTIVES: [&str; 4] = [
    "Visual style: Ultra-realistic product photography, sharp focus, intricate details, professional studio lighting, clean background unless contextually relevant.",
    "Composition: Dynamic angle if appropriate, or standard e-commerce shot. Highlight key product attributes visible in this specific image.",
    "Impression: Commercial-grade, highly attractive, enticing for online shoppers.",
    "Ensure all text in the generated image is in English, legible, and contextually correct if any text is part of the product design.",
];

/// Input for one prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptRequest<'a> {
    pub product: &'a ProductRecord,
    pub selling_points: &'a SellingPoints,
    pub image_index: usize,
}

impl PromptRequest<'_> {
    pub fn synthesize(self) -> String {
        synthesize(self.product, self.selling_points, self.image_index)
    }
}

/// A prompt paired with the gallery image it was written for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePrompt {
    /// Position among the selected images, starting at 0
    pub index: usize,
    pub image_url: Option<String>,
    pub prompt: String,
}

/// Picks `items[index mod len]`.
pub fn rotate<T>(items: &[T], index: usize) -> Option<&T> {
    if items.is_empty() {
        None
    } else {
        items.get(index % items.len())
    }
}

/// Builds the prompt for the image at `image_index`.
pub fn synthesize(product: &ProductRecord, points: &SellingPoints, image_index: usize) -> String {
    let mut sentences = Vec::new();

    if let Some(title) = product.display_title() {
        sentences.push(format!("Product: {}.", title));
    }

    for key in SPEC_PRIORITY {
        if let Some(value) = points.specifications.get(*key) {
            sentences.push(format!("{}: {}.", key, value));
        }
    }

    if let Some(point) = rotate(&points.text_points, image_index) {
        sentences.push(format!("Key selling point: {}.", point));
    }

    if let Some(feature) = rotate(&points.features, image_index) {
        sentences.push(format!("Feature to highlight: {}.", feature));
    }

    sentences.extend(DIRECTIVES.iter().map(|directive| directive.to_string()));
    sentences.join(" ")
}

/// Builds prompts for up to `limit` gallery images after skipping `skip`.
///
/// A record without any selected image still gets one prompt, not tied to an
/// image, so a text-only generation can run.
pub fn synthesize_batch(product: &ProductRecord, skip: usize, limit: usize) -> Vec<ImagePrompt> {
    let points = &product.selling_points;
    let mut prompts: Vec<ImagePrompt> = product
        .images
        .iter()
        .skip(skip)
        .take(limit)
        .enumerate()
        .map(|(index, url)| ImagePrompt {
            index,
            image_url: Some(url.clone()),
            prompt: synthesize(product, points, index),
        })
        .collect();

    if prompts.is_empty() && limit > 0 {
        prompts.push(ImagePrompt {
            index: 0,
            image_url: None,
            prompt: synthesize(product, points, 0),
        });
    }

    prompts
}
