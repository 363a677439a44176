use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Logical fields pulled from a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Subtitle,
    Image,
}

/// One way of locating a field's value in a DOM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Descriptor {
    /// Trimmed text content of the first node matching `selector`
    Text { selector: String },

    /// Value of `attribute` on the first node matching `selector`
    Attribute { selector: String, attribute: String },

    /// Style `property` of the first node matching `selector`, parsed as `url(...)`
    Style { selector: String, property: String },

    /// `content` of a `<meta>` tag whose `property` or `name` equals `name`
    Meta { name: String },
}

impl Descriptor {
    pub fn text(selector: &str) -> Self {
        Descriptor::Text {
            selector: selector.to_string(),
        }
    }

    pub fn attribute(selector: &str, attribute: &str) -> Self {
        Descriptor::Attribute {
            selector: selector.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn style(selector: &str, property: &str) -> Self {
        Descriptor::Style {
            selector: selector.to_string(),
            property: property.to_string(),
        }
    }

    pub fn meta(name: &str) -> Self {
        Descriptor::Meta {
            name: name.to_string(),
        }
    }
}

/// Selector cascades for every field, tried in declared order.
///
/// Hashed class names change whenever the target site redeploys, so the
/// table is plain data and can be replaced from a JSON file without
/// touching the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyTable {
    pub title: Vec<Descriptor>,
    pub subtitle: Vec<Descriptor>,
    pub image: Vec<Descriptor>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self {
            title: vec![
                Descriptor::text(".sc-6ab2981a-2 span"),
                Descriptor::text(".sc-e612944f-4"),
                Descriptor::meta("og:title"),
                Descriptor::meta("twitter:title"),
            ],
            subtitle: vec![
                Descriptor::text(".sc-c214f8c1-16"),
                Descriptor::text(".sc-2af63f48-19"),
                Descriptor::meta("og:description"),
                Descriptor::meta("twitter:description"),
            ],
            image: vec![
                Descriptor::meta("og:image"),
                Descriptor::meta("twitter:image"),
                Descriptor::style(r#"[class^="sc-6ab2981a-0"]"#, "background-image"),
                Descriptor::attribute(".sc-e65546dd-2 img", "src"),
            ],
        }
    }
}

impl StrategyTable {
    /// Load a table from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Parse a table from a JSON string, rejecting empty cascades
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Every field needs at least one descriptor
    pub fn validate(&self) -> Result<(), Error> {
        for field in [Field::Title, Field::Subtitle, Field::Image] {
            if self.cascade(field).is_empty() {
                return Err(Error::Config(format!(
                    "strategy list for {:?} is empty",
                    field
                )));
            }
        }
        Ok(())
    }

    /// The ordered descriptors for `field`
    pub fn cascade(&self, field: Field) -> &[Descriptor] {
        match field {
            Field::Title => &self.title,
            Field::Subtitle => &self.subtitle,
            Field::Image => &self.image,
        }
    }

    /// `(selector, property)` pairs the image cascade reads styles from.
    /// A live browser evaluates these up front so they can be answered
    /// from the snapshot.
    pub fn style_queries(&self) -> Vec<(String, String)> {
        [&self.title, &self.subtitle, &self.image]
            .into_iter()
            .flatten()
            .filter_map(|d| match d {
                Descriptor::Style { selector, property } => {
                    Some((selector.clone(), property.clone()))
                }
                _ => None,
            })
            .collect()
    }
}
