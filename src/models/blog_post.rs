//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared format of a post body.
///
/// Only `markdown` is transformed on render. `html` is trusted admin markup;
/// anything else is shown as escaped text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentFormat {
    #[default]
    Markdown,
    Html,
    Other(String),
}

impl ContentFormat {
    /// Parse a stored or submitted format name. Blank means markdown; names
    /// are matched exactly, so `Markdown` is some other format.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s {
            "" | "markdown" => Self::Markdown,
            "html" => Self::Html,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Other(s) => s,
        }
    }

    /// Whether the rendered body may be emitted without escaping
    pub fn is_trusted_markup(&self) -> bool {
        matches!(self, Self::Markdown | Self::Html)
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContentFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Blog post entity
#[derive(Debug, Clone, Serialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    /// Unique, URL-safe identifier
    pub slug: String,
    pub content: String,
    pub content_format: ContentFormat,
    pub thumbnail: Option<String>,
    pub embed_url: Option<String>,
    pub embed_type: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of the admin post form, used for both create and update.
///
/// `slug` left blank means "derive from the title".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogPostInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_format: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default)]
    pub embed_type: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}
