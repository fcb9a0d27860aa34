//! Core data types for boards, pins and the images extracted from them.
//!
//! - [`BoardRef`] - The parsed form of a board URL
//! - [`BoardInfo`] - Identifier and display name resolved from a [`BoardRef`]
//! - [`Pin`] - One record of the board feed, as returned by the feed endpoint
//! - [`ImageVariant`] - One declared resolution of a pin's image
//! - [`ImageRecord`] - A downloadable image picked from a pin
//! - [`FeedPage`] - One page of the board feed plus its continuation token
//!
//! # Examples
//!
//! ```rust
//! use pinfetch::types::Pin;
//!
//! let pin: Pin = serde_json::from_value(serde_json::json!({
//!     "id": "1234",
//!     "description": "Roses in June",
//!     "images": {
//!         "orig": { "url": "https://i.pinimg.com/originals/aa.jpg", "width": 800, "height": 600 }
//!     }
//! })).unwrap();
//!
//! assert_eq!(pin.id_string(), "1234");
//! assert!(!pin.is_video());
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A board URL broken into its parts.
///
/// `source_url` is always `/<username>/<slug>/` and is what the Pinterest
/// resource endpoints expect as `source_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRef {
    pub username: String,
    pub slug: String,
    pub source_url: String,
}

impl BoardRef {
    /// Builds a board reference from its two path segments.
    pub fn new(username: impl Into<String>, slug: impl Into<String>) -> Self {
        let username = username.into();
        let slug = slug.into();
        let source_url = format!("/{}/{}/", username, slug);
        Self {
            username,
            slug,
            source_url,
        }
    }
}

/// Board identifier and display name, resolved once per download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInfo {
    pub id: String,
    pub name: String,
}

/// One declared image resolution of a pin.
///
/// Every field is optional because the feed is not consistent about them.
/// A field of the wrong JSON type reads as absent, so variants without a
/// string URL are never selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageVariant {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<f64>,
}

impl ImageVariant {
    /// Pixel area, treating missing dimensions as zero.
    pub fn area(&self) -> f64 {
        self.width.unwrap_or(0.0) * self.height.unwrap_or(0.0)
    }
}

/// One record of the board feed.
///
/// Only the fields the downloader looks at are modelled. `images` is keyed by
/// the variant name Pinterest uses (`orig`, `736x`, `236x`, ...); a sorted map
/// keeps iteration order stable across calls. Mistyped fields read as absent
/// instead of rejecting the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pin {
    #[serde(default)]
    pub id: Value,

    #[serde(default, deserialize_with = "lenient")]
    pub is_video: Option<bool>,

    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub auto_alt_text: Option<String>,

    #[serde(default, deserialize_with = "lenient_variants")]
    pub images: Option<BTreeMap<String, Option<ImageVariant>>>,
}

/// Reads any JSON value, yielding `None` when it does not fit `T`.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Reads the `images` object entry by entry; entries that are not objects become `None`.
fn lenient_variants<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<BTreeMap<String, Option<ImageVariant>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let variants = match Value::deserialize(deserializer)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(name, value)| (name, serde_json::from_value(value).ok()))
            .collect(),
        _ => return Ok(None),
    };
    Ok(Some(variants))
}

impl Pin {
    /// Whether the feed flagged this record as a video.
    pub fn is_video(&self) -> bool {
        self.is_video.unwrap_or(false)
    }

    /// The pin identifier rendered as text, whatever JSON type it came as.
    pub fn id_string(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// An image chosen from a pin, ready to be handed to the download sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Direct URL of the selected variant
    pub url: String,

    /// Matched extension including the dot, lowercased (`.jpg`, `.jpeg`, `.png`)
    pub ext: String,

    /// Sanitized display name without extension
    pub filename: String,
}

/// A single page of the board feed.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub pins: Vec<Pin>,

    /// Continuation token for the next page, `None` on the last page
    pub bookmark: Option<String>,
}
