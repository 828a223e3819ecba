//! The fixed set of news categories and the listing page behind each one.
//!
//! | Key | Path |
//! |-----|------|
//! | `world` | `/news/world` |
//! | `politics` | `/news/politics` |
//! | `technology` | `/news/technology` |
//! | `business` | `/news/business` |
//! | `science` | `/news/science_and_environment` |
//! | `health` | `/news/health` |
//!
//! The paths track the current BBC News markup and will break when the site
//! moves sections around.

use crate::errors::{CategoryNotFound, RegistryError};
use crate::models::Category;
use std::collections::HashSet;
use url::Url;

/// Origin prepended to relative story links and category paths.
pub const BBC_ORIGIN: &str = "https://www.bbc.com";

const BBC_CATEGORIES: &[(&str, &str, &str)] = &[
    ("world", "🌍 World", "/news/world"),
    ("politics", "🏛 Politics", "/news/politics"),
    ("technology", "💻 Technology", "/news/technology"),
    ("business", "💼 Business", "/news/business"),
    ("science", "🔬 Science", "/news/science_and_environment"),
    ("health", "🏥 Health", "/news/health"),
];

/// Ordered lookup table of categories.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    /// Build a registry from an explicit table.
    ///
    /// # Errors
    ///
    /// Rejects empty or duplicate keys, empty labels and URLs that do not parse.
    pub fn new(categories: Vec<Category>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for category in &categories {
            if category.key.is_empty() {
                return Err(RegistryError::EmptyKey);
            }
            if !seen.insert(category.key.as_str()) {
                return Err(RegistryError::DuplicateKey(category.key.clone()));
            }
            if category.label.trim().is_empty() {
                return Err(RegistryError::MissingLabel(category.key.clone()));
            }
            if Url::parse(&category.source_url).is_err() {
                return Err(RegistryError::InvalidUrl {
                    key: category.key.clone(),
                    url: category.source_url.clone(),
                });
            }
        }
        Ok(Self { categories })
    }

    /// The built-in BBC News table.
    pub fn bbc() -> Result<Self, RegistryError> {
        Self::from_table(BBC_ORIGIN, BBC_CATEGORIES)
    }

    /// Build a registry from `(key, label, path)` rows served under `origin`.
    fn from_table(origin: &str, table: &[(&str, &str, &str)]) -> Result<Self, RegistryError> {
        Self::new(
            table
                .iter()
                .map(|(key, label, path)| Category::new(key, label, &format!("{origin}{path}")))
                .collect(),
        )
    }

    pub fn resolve(&self, key: &str) -> Result<&Category, CategoryNotFound> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| CategoryNotFound(key.to_string()))
    }

    /// Categories in menu order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}
