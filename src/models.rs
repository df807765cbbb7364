//! Data models for scraped product records and mined selling points.

use crate::sites::Site;
use crate::text::{self, NOT_FOUND};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A scraped text field: either real page content or the "not found" marker.
///
/// Serializes as the plain string, with [`NOT_FOUND`] standing in for a
/// missing value, so JSON consumers never see `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field {
    Found(String),
    #[default]
    NotFound,
}

impl Field {
    /// Builds a field from extracted text. Blank text and the sentinel map to
    /// `NotFound`.
    pub fn from_text(text: impl AsRef<str>) -> Self {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() || text::is_not_found(trimmed) {
            Field::NotFound
        } else {
            Field::Found(trimmed.to_string())
        }
    }

    /// Returns the text if the field was found.
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Field::Found(value) => Some(value),
            Field::NotFound => None,
        }
    }

    /// Returns the text, or the sentinel.
    pub fn as_str(&self) -> &str {
        self.as_deref().unwrap_or(NOT_FOUND)
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Field::Found(_))
    }

    /// Transforms found text; a result that is blank or the sentinel becomes
    /// `NotFound`.
    pub fn map_text(self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            Field::Found(value) => Field::from_text(f(&value)),
            Field::NotFound => Field::NotFound,
        }
    }
}

impl From<Option<String>> for Field {
    fn from(value: Option<String>) -> Self {
        value.map(Field::from_text).unwrap_or_default()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(Field::from(value))
    }
}

/// Everything extracted from one product detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Site the page belongs to
    pub site: Site,
    /// Page URL after navigation
    pub url: String,
    /// Product title (always found for a returned record)
    pub title: Field,
    /// Normalized price (`¥X` or `¥X - ¥Y`) or raw promotional text
    pub price: Field,
    /// Long description
    pub description: Field,
    /// Brand from the byline, when the site shows one
    #[serde(default)]
    pub brand: Field,
    /// Gallery image URLs, unique, in page order
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub selling_points: SellingPoints,
}

impl ProductRecord {
    /// Returns the title with the brand removed, if both are known.
    pub fn display_title(&self) -> Option<String> {
        let title = self.title.as_deref()?;
        Some(match self.brand.as_deref() {
            Some(brand) => text::strip_brand(title, brand),
            None => title.to_string(),
        })
    }
}

/// Structured selling information mined from the detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellingPoints {
    /// Spec table rows, name to value
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    /// Lines carrying a selling keyword
    #[serde(default)]
    pub text_points: Vec<String>,
    /// Other descriptive lines
    #[serde(default)]
    pub features: Vec<String>,
    /// Images embedded in the rich-text description
    #[serde(default)]
    pub image_points: Vec<ImagePoint>,
}

impl SellingPoints {
    /// Adds a spec row when both sides are non-blank. Later rows with the same
    /// name replace earlier ones.
    pub fn add_specification(&mut self, name: &str, value: &str) -> bool {
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            return false;
        }
        self.specifications.insert(name.to_string(), value.to_string());
        true
    }

    pub fn add_text_point(&mut self, point: impl Into<String>) -> bool {
        text::push_unique(&mut self.text_points, point.into())
    }

    pub fn add_feature(&mut self, feature: impl Into<String>) -> bool {
        text::push_unique(&mut self.features, feature.into())
    }

    /// Appends features not already present, keeping first-seen order.
    pub fn extend_features<I>(&mut self, features: I)
    where
        I: IntoIterator<Item = String>,
    {
        for feature in features {
            self.add_feature(feature);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty()
            && self.text_points.is_empty()
            && self.features.is_empty()
            && self.image_points.is_empty()
    }
}

/// An image embedded in the description together with nearby text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    /// Text of the previous and next siblings of the image's container
    #[serde(default)]
    pub context: Vec<String>,
}
