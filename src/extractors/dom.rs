use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Queries the field extractor needs from a page, whichever backend
/// produced it. Every lookup answers for the first matching node only and
/// returns `None` for zero matches or an invalid selector.
pub trait DomHandle {
    /// Text content of the first node matching `selector`
    fn text(&self, selector: &str) -> Option<String>;

    /// Attribute value of the first node matching `selector`
    fn attribute(&self, selector: &str, attribute: &str) -> Option<String>;

    /// Style property value of the first node matching `selector`
    fn style(&self, selector: &str, property: &str) -> Option<String>;

    /// `content` of the first `<meta>` whose `property` or `name` is `name`
    fn meta(&self, name: &str) -> Option<String>;
}

/// A style value evaluated inside a live page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub selector: String,
    pub property: String,
    pub value: String,
}

/// Everything a backend hands back from one page load. Plain owned data so
/// it can cross await points; the DOM itself is built afterwards.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    /// Final URL after redirects
    pub url: String,

    /// Serialized markup
    pub html: String,

    /// Styles captured from the live page, empty for static fetches
    pub computed_styles: Vec<ComputedStyle>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            computed_styles: Vec::new(),
        }
    }
}

/// Parsed page backed by `scraper`
pub struct Document {
    html: Html,
    computed: HashMap<(String, String), String>,
}

impl Document {
    /// Parse static markup
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            computed: HashMap::new(),
        }
    }

    /// Parse a snapshot, keeping any styles the browser evaluated
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        let computed = snapshot
            .computed_styles
            .iter()
            .map(|s| {
                (
                    (s.selector.clone(), s.property.to_ascii_lowercase()),
                    s.value.clone(),
                )
            })
            .collect();

        Self {
            html: Html::parse_document(&snapshot.html),
            computed,
        }
    }

    fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let parsed = match Selector::parse(selector) {
            Ok(s) => s,
            Err(e) => {
                ::log::warn!("Skipping invalid selector '{}': {}", selector, e);
                return None;
            }
        };
        self.html.select(&parsed).next()
    }
}

impl DomHandle for Document {
    fn text(&self, selector: &str) -> Option<String> {
        self.first(selector).map(|el| el.text().collect::<String>())
    }

    fn attribute(&self, selector: &str, attribute: &str) -> Option<String> {
        self.first(selector)
            .and_then(|el| el.value().attr(attribute).map(String::from))
    }

    fn style(&self, selector: &str, property: &str) -> Option<String> {
        let key = (selector.to_string(), property.to_ascii_lowercase());
        if let Some(value) = self.computed.get(&key) {
            return Some(value.clone());
        }

        let inline = self.first(selector)?.value().attr("style")?;
        inline_declaration(inline, property)
    }

    fn meta(&self, name: &str) -> Option<String> {
        let selector = Selector::parse("meta").ok()?;
        self.html
            .select(&selector)
            .filter(|el| {
                let attrs = el.value();
                attrs.attr("property") == Some(name) || attrs.attr("name") == Some(name)
            })
            .find_map(|el| el.value().attr("content").map(String::from))
    }
}

/// Finds `property` in an inline `style` attribute.
///
/// Declarations are split on `;` outside parentheses and quotes so values
/// like `url("data:image/png;base64,...")` stay whole.
pub fn inline_declaration(style: &str, property: &str) -> Option<String> {
    split_declarations(style).into_iter().find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim().eq_ignore_ascii_case(property) {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

fn split_declarations(style: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&style[start..]);

    parts
}
