use crate::models::{ListingDetails, MissingField};
use anyhow::{anyhow, Result};
use scraper::{Html, Selector};

const REMOVED_MARKER: &str = ".error404";
const CANONICAL_URL: &str = ".copy-url-in input";
const PRIMARY_IMAGE: &str = r#"meta[property="og:image"]"#;
const DISPLAY_ADDRESS: &str = "h2.heading";

/// Field clean-up rules applied after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalization {
    /// The image URL is cut at the first occurrence of this character.
    pub image_param_separator: char,
    /// Replace `&` in the address with `and`.
    pub ampersand_substitution: bool,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            image_param_separator: '?',
            ampersand_substitution: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The page carries the removed/unavailable marker.
    Sold,
    Rejected(Vec<MissingField>),
    Listing(ListingDetails),
}

pub struct ListingExtractor {
    removed_marker: Selector,
    canonical_url: Selector,
    primary_image: Selector,
    display_address: Selector,
    normalization: Normalization,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Failed to parse selector {}: {:?}", css, e))
}

impl ListingExtractor {
    pub fn new(normalization: Normalization) -> Result<Self> {
        Ok(Self {
            removed_marker: selector(REMOVED_MARKER)?,
            canonical_url: selector(CANONICAL_URL)?,
            primary_image: selector(PRIMARY_IMAGE)?,
            display_address: selector(DISPLAY_ADDRESS)?,
            normalization,
        })
    }

    pub fn is_removed(&self, document: &Html) -> bool {
        document.select(&self.removed_marker).next().is_some()
    }

    pub fn extract(&self, document: &Html) -> Extraction {
        if self.is_removed(document) {
            return Extraction::Sold;
        }

        let mls_url = document
            .select(&self.canonical_url)
            .next()
            .and_then(|el| el.value().attr("value"))
            .map(|value| value.trim().to_string())
            .unwrap_or_default();

        let img = document
            .select(&self.primary_image)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|content| self.normalize_image(content))
            .unwrap_or_default();

        let address = document
            .select(&self.display_address)
            .next()
            .map(|el| self.normalize_address(&el.text().collect::<String>()))
            .unwrap_or_default();

        let mut missing = Vec::new();
        if mls_url.is_empty() {
            missing.push(MissingField::MlsUrl);
        }
        if img.is_empty() {
            missing.push(MissingField::Img);
        }
        if address.is_empty() {
            missing.push(MissingField::Address);
        }

        if !missing.is_empty() {
            return Extraction::Rejected(missing);
        }

        Extraction::Listing(ListingDetails {
            mls_url,
            img,
            address,
        })
    }

    fn normalize_image(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        trimmed
            .split(self.normalization.image_param_separator)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn normalize_address(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if self.normalization.ampersand_substitution {
            trimmed.replace('&', "and")
        } else {
            trimmed.to_string()
        }
    }
}
