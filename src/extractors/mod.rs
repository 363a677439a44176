pub mod dom;
pub mod strategy;

#[cfg(test)]
mod tests;

use crate::resolver::resolve;
use crate::results::{ExtractedRecord, NOT_FOUND};
use dom::{DomHandle, Document, PageSnapshot};
use regex::Regex;
use std::sync::LazyLock;
use strategy::{Descriptor, Field, StrategyTable};

/// Pulls the target out of a CSS `url(...)` value, quotes excluded
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)url\(\s*["']?(.*?)["']?\s*\)"#).unwrap());

/// Field values for one page, before the link is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    pub title: String,
    pub subtitle: String,
    pub image: String,
}

/// Runs every field's cascade over `dom`.
///
/// Each cascade stops at its first non-empty hit. A cascade that runs out
/// yields [`NOT_FOUND`] for that field only. Image hits are made absolute
/// against `page_url`.
pub fn extract_fields<D: DomHandle + ?Sized>(
    dom: &D,
    page_url: &str,
    strategies: &StrategyTable,
) -> Fields {
    let title = run_cascade(dom, Field::Title, strategies.cascade(Field::Title));
    let subtitle = run_cascade(dom, Field::Subtitle, strategies.cascade(Field::Subtitle));
    let image = run_cascade(dom, Field::Image, strategies.cascade(Field::Image))
        .map(|raw| resolve(&raw, page_url));

    Fields {
        title: title.unwrap_or_else(|| NOT_FOUND.to_string()),
        subtitle: subtitle.unwrap_or_else(|| NOT_FOUND.to_string()),
        image: image.unwrap_or_else(|| NOT_FOUND.to_string()),
    }
}

/// Builds the DOM for a snapshot and extracts a full record from it.
/// The link is the snapshot's final URL.
pub fn extract_record(snapshot: &PageSnapshot, strategies: &StrategyTable) -> ExtractedRecord {
    let doc = Document::from_snapshot(snapshot);
    let fields = extract_fields(&doc, &snapshot.url, strategies);

    ExtractedRecord::new(
        fields.title,
        fields.subtitle,
        snapshot.url.clone(),
        fields.image,
    )
}

fn run_cascade<D: DomHandle + ?Sized>(
    dom: &D,
    field: Field,
    descriptors: &[Descriptor],
) -> Option<String> {
    for (i, descriptor) in descriptors.iter().enumerate() {
        if let Some(value) = evaluate(dom, descriptor) {
            ::log::debug!("{:?} found by descriptor {}: {:?}", field, i, descriptor);
            return Some(value);
        }
    }

    ::log::debug!(
        "{:?} not found after {} descriptors",
        field,
        descriptors.len()
    );
    None
}

/// Value produced by a single descriptor, if it is non-empty after trimming
fn evaluate<D: DomHandle + ?Sized>(dom: &D, descriptor: &Descriptor) -> Option<String> {
    let raw = match descriptor {
        Descriptor::Text { selector } => dom.text(selector),
        Descriptor::Attribute {
            selector,
            attribute,
        } => dom.attribute(selector, attribute),
        Descriptor::Style { selector, property } => dom
            .style(selector, property)
            .and_then(|value| url_from_style(&value)),
        Descriptor::Meta { name } => dom.meta(name),
    }?;

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First `url(...)` target in a style value
pub fn url_from_style(value: &str) -> Option<String> {
    let captured = URL_PATTERN.captures(value)?.get(1)?.as_str();
    let unquoted = captured.trim().trim_matches(|c| c == '"' || c == '\'');
    Some(unquoted.to_string())
}
