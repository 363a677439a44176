use crate::error::Error;
use serde::{Deserialize, Serialize};
use url::Url;

/// Literal reported for a field whose whole cascade came up empty
pub const NOT_FOUND: &str = "No encontrado";

fn not_found() -> String {
    NOT_FOUND.to_string()
}

/// A URL submitted for extraction
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ExtractionTarget {
    #[serde(default)]
    pub url: String,
}

impl ExtractionTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Checks the URL is present and uses `http` or `https`
    pub fn validated(self) -> Result<Self, Error> {
        let trimmed = self.url.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("a URL is required".to_string()));
        }

        let parsed = Url::parse(trimmed)
            .map_err(|e| Error::Validation(format!("malformed URL '{}': {}", trimmed, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Validation(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        Ok(Self::new(trimmed))
    }
}

/// Represents the headline record pulled from one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Headline
    pub title: String,

    /// Subtitle / lead paragraph
    pub subtitle: String,

    /// Final URL of the page after redirects
    pub link: String,

    /// Absolute lead image URL
    pub image: String,
}

impl ExtractedRecord {
    /// Create a new record instance
    pub fn new(title: String, subtitle: String, link: String, image: String) -> Self {
        Self {
            title,
            subtitle,
            link,
            image,
        }
    }

    /// True when neither text field was found; usually means the page
    /// fills its content in client-side
    pub fn lacks_text(&self) -> bool {
        self.title == NOT_FOUND && self.subtitle == NOT_FOUND
    }
}

/// One column of an export: a record plus the caller's column header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    #[serde(default = "not_found")]
    pub title: String,

    #[serde(default = "not_found", alias = "bajada")]
    pub subtitle: String,

    #[serde(default = "not_found")]
    pub link: String,

    #[serde(default = "not_found")]
    pub image: String,

    /// Column header
    #[serde(default, alias = "nota")]
    pub label: String,
}

impl BatchEntry {
    pub fn new(record: ExtractedRecord, label: impl Into<String>) -> Self {
        Self {
            title: record.title,
            subtitle: record.subtitle,
            link: record.link,
            image: record.image,
            label: label.into(),
        }
    }
}
