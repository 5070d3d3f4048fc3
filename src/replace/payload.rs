//! Replacement payloads.
//!
//! A payload is a JSON object keyed by `slide-<index>`; each slide maps
//! shape keys to an entry whose optional `paragraphs` array lists the new
//! content. An entry without `paragraphs` asks for the shape to be left
//! blank.
//!
//! ```json
//! {
//!   "slide-0": {
//!     "title-1": { "paragraphs": [ { "text": "Quarterly review", "bold": true } ] },
//!     "body-2":  {}
//!   }
//! }
//! ```
//!
//! JSON parsers normally let a repeated key silently win over the earlier
//! one. Payloads are checked for repeats at every level first and rejected
//! with the JSON path of each.

use crate::error::{Error, Result, Violations};
use crate::ooxml::pptx::shapes::ParagraphSpec;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

/// Prefix every slide key carries.
pub const SLIDE_KEY_PREFIX: &str = "slide-";

/// New content for one shape.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct ShapeReplacement {
    #[serde(default)]
    pub paragraphs: Option<Vec<ParagraphSpec>>,
}

impl ShapeReplacement {
    /// Whether the shape is only cleared.
    #[inline]
    pub fn is_clear_only(&self) -> bool {
        self.paragraphs.is_none()
    }
}

/// A parsed replacement payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplacementSpec {
    slides: BTreeMap<String, BTreeMap<String, ShapeReplacement>>,
    ignored: Vec<String>,
}

impl ReplacementSpec {
    /// Read a payload file.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::Input(format!(
                "replacement payload not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Input(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parse a payload.
    ///
    /// Malformed JSON or field values are input errors; repeated keys are a
    /// validation error listing every repeat. Top-level keys that are not
    /// slide keys are skipped.
    pub fn from_json(text: &str) -> Result<Self> {
        let tree: Node = serde_json::from_str(text)
            .map_err(|e| Error::Input(format!("malformed replacement payload: {}", e)))?;

        let mut duplicates = Vec::new();
        tree.find_duplicates("$", &mut duplicates);
        if !duplicates.is_empty() {
            return Err(Error::Validation(Violations::new(
                format!("replacement payload has {} duplicate key(s)", duplicates.len()),
                duplicates,
            )));
        }

        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(text).map_err(|e| {
            Error::Input(format!("replacement payload must be a JSON object: {}", e))
        })?;

        let mut slides = BTreeMap::new();
        let mut ignored = Vec::new();
        for (key, value) in raw {
            if !key.starts_with(SLIDE_KEY_PREFIX) {
                tracing::warn!(key = %key, "ignoring non-slide key in replacement payload");
                ignored.push(key);
                continue;
            }
            let shapes: BTreeMap<String, ShapeReplacement> = serde_json::from_value(value)
                .map_err(|e| Error::Input(format!("invalid entry for '{}': {}", key, e)))?;
            slides.insert(key, shapes);
        }

        Ok(Self { slides, ignored })
    }

    pub fn slide(&self, slide: &str) -> Option<&BTreeMap<String, ShapeReplacement>> {
        self.slides.get(slide)
    }

    pub fn shape(&self, slide: &str, shape: &str) -> Option<&ShapeReplacement> {
        self.slides.get(slide).and_then(|shapes| shapes.get(shape))
    }

    /// Slides in key order.
    pub fn slides(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, ShapeReplacement>)> {
        self.slides.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Top-level keys skipped because they do not name a slide.
    pub fn ignored_keys(&self) -> &[String] {
        &self.ignored
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// A JSON value that keeps every object entry, repeats included.
enum Node {
    Leaf,
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
}

impl Node {
    fn find_duplicates(&self, path: &str, out: &mut Vec<String>) {
        match self {
            Node::Leaf => {},
            Node::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    item.find_duplicates(&format!("{}[{}]", path, i), out);
                }
            },
            Node::Object(entries) => {
                let mut seen = HashSet::new();
                let mut reported = HashSet::new();
                for (key, value) in entries {
                    if !seen.insert(key.as_str()) && reported.insert(key.as_str()) {
                        out.push(format!("duplicate key '{}' in {}", key, path));
                    }
                    value.find_duplicates(&format!("{}.{}", path, key), out);
                }
            },
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Node, E> {
        Ok(Node::Leaf)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Node, E> {
        Ok(Node::Leaf)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Node, E> {
        Ok(Node::Leaf)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Node, E> {
        Ok(Node::Leaf)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<Node, E> {
        Ok(Node::Leaf)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Node, E> {
        Ok(Node::Leaf)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Node, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Node>()? {
            items.push(item);
        }
        Ok(Node::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Node, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, Node>()? {
            entries.push((key, value));
        }
        Ok(Node::Object(entries))
    }
}
