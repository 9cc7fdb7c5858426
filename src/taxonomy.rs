//! # Genre Taxonomy Module
//!
//! A fixed table of genre categories, each a display label plus matching
//! keywords, and the classifier that scores free-text genre tags against it.
//!
//! ## Matching
//!
//! A tag counts toward a category when any of the category's keywords is a
//! substring of the lower-cased tag, so `"indie pop"` matches keyword
//! `"pop"`. Each tag counts at most once per category no matter how many
//! keywords it hits.
//!
//! The taxonomy is built once at startup (from defaults or the config file)
//! and then only ever read.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// One category: label as shown in playlist names, plus its keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCategory {
    pub label: String,
    pub keywords: Vec<String>,
}

impl GenreCategory {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Does a single tag fall in this category?
    pub fn matches(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.keywords.iter().any(|k| tag.contains(k.as_str()))
    }

    /// Number of tags that fall in this category.
    pub fn score<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        tags.iter().filter(|tag| self.matches(tag.as_ref())).count()
    }

    /// Label without its leading glyph, e.g. `Rock` for `🎸 Rock`.
    pub fn plain_name(&self) -> &str {
        self.label
            .split_whitespace()
            .nth(1)
            .unwrap_or(self.label.as_str())
    }
}

/// Best category for a set of tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub category: Option<&'a GenreCategory>,
    pub score: usize,
}

/// Immutable ordered table of categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    categories: Vec<GenreCategory>,
}

impl Taxonomy {
    /// Build a taxonomy, rejecting empty labels or keyword lists.
    pub fn new(categories: Vec<GenreCategory>) -> Result<Self> {
        if categories.is_empty() {
            bail!("Taxonomy must contain at least one category");
        }
        for category in &categories {
            if category.label.trim().is_empty() {
                bail!("Taxonomy category labels cannot be empty");
            }
            if category.keywords.iter().all(|k| k.trim().is_empty()) {
                bail!("Taxonomy category '{}' has no keywords", category.label);
            }
        }
        let categories = categories
            .into_iter()
            .map(|c| GenreCategory {
                keywords: c
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
                label: c.label,
            })
            .collect();
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[GenreCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Score `tags` against every category in table order.
    ///
    /// Only a strictly higher score replaces the current best, so the first
    /// category to reach the maximum wins. A best score of 0 means the tags
    /// are unclassifiable.
    pub fn classify<S: AsRef<str>>(&self, tags: &[S]) -> Classification<'_> {
        let mut best = Classification { category: None, score: 0 };
        for category in &self.categories {
            let score = category.score(tags);
            if score > best.score {
                best = Classification { category: Some(category), score };
            }
        }
        best
    }

    /// A playlist is already categorized when its name starts with a label
    /// verbatim.
    pub fn is_categorized(&self, playlist_name: &str) -> bool {
        self.categories
            .iter()
            .any(|c| playlist_name.starts_with(c.label.as_str()))
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.label == label)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            categories: vec![
                GenreCategory::new(
                    "🎸 Rock",
                    &["rock", "metal", "punk", "grunge", "alternative", "indie rock", "hard rock"],
                ),
                GenreCategory::new("🎵 Pop", &["pop", "dance pop", "electropop", "synth-pop", "indie pop"]),
                GenreCategory::new(
                    "🎤 Hip-Hop",
                    &["hip hop", "rap", "trap", "southern hip hop", "gangster rap"],
                ),
                GenreCategory::new(
                    "🎧 Electronic",
                    &["electronic", "edm", "house", "techno", "dubstep", "trance", "drum and bass"],
                ),
                GenreCategory::new("🎷 Jazz", &["jazz", "bebop", "swing", "smooth jazz", "jazz fusion"]),
                GenreCategory::new(
                    "🎻 Classical",
                    &["classical", "orchestra", "symphony", "baroque", "opera"],
                ),
                GenreCategory::new(
                    "🤠 Country",
                    &["country", "americana", "folk", "bluegrass", "country rock"],
                ),
                GenreCategory::new("🎺 R&B", &["r&b", "soul", "funk", "neo soul", "motown"]),
                GenreCategory::new(
                    "🌍 World",
                    &["latin", "reggae", "afrobeat", "k-pop", "j-pop", "reggaeton", "bossa nova"],
                ),
                GenreCategory::new("😴 Chill", &["ambient", "lo-fi", "chill", "downtempo", "chillwave"]),
            ],
        }
    }
}
