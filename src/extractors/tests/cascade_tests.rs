use crate::extractors::dom::DomHandle;
use crate::extractors::extract_fields;
use crate::extractors::strategy::{Descriptor, StrategyTable};
use crate::results::NOT_FOUND;
use std::cell::RefCell;
use std::collections::HashMap;

/// DOM stub that answers from a fixed map and records every query
#[derive(Default)]
struct RecordingDom {
    answers: HashMap<String, String>,
    queries: RefCell<Vec<String>>,
}

impl RecordingDom {
    fn with(mut self, key: &str, value: &str) -> Self {
        self.answers.insert(key.to_string(), value.to_string());
        self
    }

    fn answer(&self, key: String) -> Option<String> {
        self.queries.borrow_mut().push(key.clone());
        self.answers.get(&key).cloned()
    }

    fn queried(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl DomHandle for RecordingDom {
    fn text(&self, selector: &str) -> Option<String> {
        self.answer(format!("text:{}", selector))
    }

    fn attribute(&self, selector: &str, attribute: &str) -> Option<String> {
        self.answer(format!("attr:{}@{}", selector, attribute))
    }

    fn style(&self, selector: &str, property: &str) -> Option<String> {
        self.answer(format!("style:{}@{}", selector, property))
    }

    fn meta(&self, name: &str) -> Option<String> {
        self.answer(format!("meta:{}", name))
    }
}

fn table() -> StrategyTable {
    StrategyTable {
        title: vec![
            Descriptor::text(".t1"),
            Descriptor::text(".t2"),
            Descriptor::meta("og:title"),
        ],
        subtitle: vec![Descriptor::text(".s1"), Descriptor::text(".s2")],
        image: vec![
            Descriptor::meta("og:image"),
            Descriptor::style(".hero", "background-image"),
            Descriptor::attribute(".pic img", "src"),
        ],
    }
}

#[test]
fn test_first_hit_short_circuits() {
    let dom = RecordingDom::default()
        .with("text:.t1", "FIRST")
        .with("text:.t2", "SECOND")
        .with("meta:og:title", "THIRD");

    let fields = extract_fields(&dom, "https://x.test/", &table());

    assert_eq!(fields.title, "FIRST");
    let queried = dom.queried();
    assert!(queried.contains(&"text:.t1".to_string()));
    assert!(!queried.contains(&"text:.t2".to_string()));
    assert!(!queried.contains(&"meta:og:title".to_string()));
}

#[test]
fn test_blank_hit_falls_through() {
    let dom = RecordingDom::default()
        .with("text:.t1", "   ")
        .with("text:.t2", "  Second  ");

    let fields = extract_fields(&dom, "https://x.test/", &table());
    assert_eq!(fields.title, "Second");
}

#[test]
fn test_exhausted_cascades_yield_sentinel() {
    let dom = RecordingDom::default();
    let fields = extract_fields(&dom, "https://x.test/", &table());

    assert_eq!(fields.title, NOT_FOUND);
    assert_eq!(fields.subtitle, NOT_FOUND);
    assert_eq!(fields.image, NOT_FOUND);
    assert!(!fields.title.is_empty());

    // every descriptor of every field was tried
    assert_eq!(dom.queried().len(), 8);
}

#[test]
fn test_fields_are_independent() {
    let dom = RecordingDom::default().with("text:.s2", "Lead");
    let fields = extract_fields(&dom, "https://x.test/", &table());

    assert_eq!(fields.title, NOT_FOUND);
    assert_eq!(fields.subtitle, "Lead");
    assert_eq!(fields.image, NOT_FOUND);
}

#[test]
fn test_image_meta_wins_over_style_and_img() {
    let dom = RecordingDom::default()
        .with("meta:og:image", "/og.jpg")
        .with("style:.hero@background-image", "url(/bg.jpg)")
        .with("attr:.pic img@src", "/img.jpg");

    let fields = extract_fields(&dom, "https://x.test/a/b", &table());
    assert_eq!(fields.image, "https://x.test/og.jpg");
    assert!(
        !dom.queried()
            .contains(&"style:.hero@background-image".to_string())
    );
}

#[test]
fn test_style_without_url_is_a_miss() {
    let dom = RecordingDom::default()
        .with("style:.hero@background-image", "none")
        .with("attr:.pic img@src", "pics/p.png");

    let fields = extract_fields(&dom, "https://x.test/a/b", &table());
    assert_eq!(fields.image, "https://x.test/a/pics/p.png");
}

#[test]
fn test_unresolvable_image_still_counts_as_found() {
    let dom = RecordingDom::default()
        .with("meta:og:image", "relative.png")
        .with("attr:.pic img@src", "https://x.test/never.png");

    let fields = extract_fields(&dom, "not a base url", &table());
    assert_eq!(fields.image, NOT_FOUND);
    assert!(!dom.queried().contains(&"attr:.pic img@src".to_string()));
}

#[test]
fn test_url_from_style() {
    use crate::extractors::url_from_style;

    assert_eq!(
        url_from_style(r#"url("https://x.test/a.jpg")"#).as_deref(),
        Some("https://x.test/a.jpg")
    );
    assert_eq!(url_from_style("URL( '/b.jpg' )").as_deref(), Some("/b.jpg"));
    assert_eq!(url_from_style("url(c.jpg), url(d.jpg)").as_deref(), Some("c.jpg"));
    assert_eq!(url_from_style("none"), None);
}
