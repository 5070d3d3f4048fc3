/// Slides of a deck, identified by stable surrogate keys.
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::pptx::shapes::{Shape, walk_shapes};
use crate::ooxml::xml::{XmlDocument, XmlElement};
use std::fmt;

/// Element path from the slide root to its shape tree.
pub const SHAPE_TREE_PATH: [&str; 2] = ["p:cSld", "p:spTree"];

/// Stable identity of a slide within one [`Presentation`].
///
/// Keys are minted when a deck is loaded (in deck order) and when a slide is
/// cloned. They never change as slides are deleted or moved, so every
/// structural operation is expressed against keys instead of positions.
///
/// [`Presentation`]: crate::ooxml::pptx::Presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlideKey(pub(crate) u32);

impl fmt::Display for SlideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slide#{}", self.0)
    }
}

/// A slide in a presentation.
///
/// Owns the parsed slide XML. Edits go through [`Slide::xml_mut`], which
/// marks the slide so its part is re-serialized on save; untouched slides
/// keep their original bytes.
#[derive(Debug, Clone)]
pub struct Slide {
    key: SlideKey,
    origin: SlideKey,
    partname: PackURI,
    r_id: String,
    slide_id: XmlElement,
    xml: XmlDocument,
    dirty: bool,
}

impl Slide {
    pub(crate) fn new(
        key: SlideKey,
        origin: SlideKey,
        partname: PackURI,
        r_id: String,
        slide_id: XmlElement,
        xml: XmlDocument,
    ) -> Self {
        Self {
            key,
            origin,
            partname,
            r_id,
            slide_id,
            xml,
            dirty: false,
        }
    }

    #[inline]
    pub fn key(&self) -> SlideKey {
        self.key
    }

    /// Key of the slide this one was loaded as or cloned from.
    ///
    /// Loaded slides are their own origin; clones of clones report the
    /// original loaded slide.
    #[inline]
    pub fn origin(&self) -> SlideKey {
        self.origin
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    /// rId of the presentation part's relationship to this slide.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Numeric `p:sldId/@id`.
    pub fn slide_id(&self) -> u32 {
        self.slide_id
            .attr("id")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// The `p:sldId` entry for this slide.
    #[inline]
    pub fn slide_id_element(&self) -> &XmlElement {
        &self.slide_id
    }

    #[inline]
    pub fn xml(&self) -> &XmlDocument {
        &self.xml
    }

    /// Mutable slide XML. Marks the slide for re-serialization.
    #[inline]
    pub fn xml_mut(&mut self) -> &mut XmlDocument {
        self.dirty = true;
        &mut self.xml
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Slide name from `p:cSld/@name`.
    pub fn name(&self) -> &str {
        self.xml
            .root()
            .child("p:cSld")
            .and_then(|c| c.attr("name"))
            .unwrap_or("")
    }

    pub fn shape_tree(&self) -> Option<&XmlElement> {
        self.xml.root().path(&SHAPE_TREE_PATH)
    }

    pub fn shape_tree_mut(&mut self) -> Option<&mut XmlElement> {
        self.xml_mut().root_mut().path_mut(&SHAPE_TREE_PATH)
    }

    /// Top-level shapes of the shape tree in document order.
    pub fn shapes(&self) -> Vec<Shape<'_>> {
        self.shape_tree()
            .map(|tree| tree.elements().filter_map(Shape::from_element).collect())
            .unwrap_or_default()
    }

    /// Text of every text-bearing shape, including grouped ones, one
    /// shape per line.
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(tree) = self.shape_tree() {
            walk_shapes(tree, &mut |_, shape| {
                if shape.has_text_frame() {
                    lines.push(shape.text());
                }
            });
        }
        lines.join("\n")
    }
}
