//! Per-shape snapshots of a deck's text content.
//!
//! An [`Inventory`] maps `slide-<i>` (deck position) to the text-bearing
//! shapes of that slide, keyed `<kind>-<ordinal>`. The ordinal counts
//! inventoried shapes in document order starting at 1, so a slide with a
//! title and a body yields `title-1` and `body-2`. Each entry records the
//! shape's geometry, paragraphs, how far its text runs past the bottom of
//! the frame, and any warnings the extractor raised.
//!
//! Extraction goes through [`InventoryExtractor`] so the overflow
//! measurement can be swapped; [`TextMetricsEstimator`] is the built-in
//! one.

pub mod estimate;

pub use estimate::{EstimatorOptions, TextMetricsEstimator};

use crate::error::Result;
use crate::ooxml::pptx::parts::PlaceholderInheritance;
use crate::ooxml::pptx::shapes::{
    Geometry, ParagraphSpec, PlaceholderInfo, Shape, ShapeType, TextFrame, walk_shapes,
};
use crate::ooxml::pptx::{Presentation, SlideKey};

/// Paragraph content and formatting as read back from a deck.
pub type ParagraphSnapshot = ParagraphSpec;

/// Produces inventories of a deck.
///
/// Implementations must only read the deck and must not cache across
/// calls: extracting the same deck twice yields the same inventory, and
/// extracting an edited deck reflects the edit.
pub trait InventoryExtractor {
    fn extract(&self, deck: &Presentation) -> Result<Inventory>;
}

/// Where a shape lives: its slide and its element path in the shape tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeLocator {
    pub slide: SlideKey,
    /// Element indices from `p:spTree` down to the shape
    pub path: Vec<usize>,
}

/// One inventoried shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeInventory {
    pub locator: ShapeLocator,
    pub name: String,
    /// Geometry in EMUs, inherited from the layout or master when the
    /// shape does not set its own
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
    pub placeholder: Option<PlaceholderInfo>,
    pub paragraphs: Vec<ParagraphSnapshot>,
    /// Inches of text below the frame bottom; 0 when the text fits
    pub overflow: f64,
    pub warnings: Vec<String>,
}

impl ShapeInventory {
    /// Paragraph texts joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_text(&self) -> bool {
        self.paragraphs.iter().any(|p| !p.text.trim().is_empty())
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
        }
    }
}

/// Inventoried shapes of one slide, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideInventory {
    pub name: String,
    pub key: SlideKey,
    shapes: Vec<(String, ShapeInventory)>,
}

impl SlideInventory {
    pub fn shape(&self, key: &str) -> Option<&ShapeInventory> {
        self.shapes.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    pub fn shape_mut(&mut self, key: &str) -> Option<&mut ShapeInventory> {
        self.shapes.iter_mut().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    pub fn shape_keys(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShapeInventory)> {
        self.shapes.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ShapeInventory)> {
        self.shapes.iter_mut().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Inventory of a whole deck, slides in deck order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Inventory {
    slides: Vec<SlideInventory>,
}

impl Inventory {
    pub fn slide(&self, name: &str) -> Option<&SlideInventory> {
        self.slides.iter().find(|s| s.name == name)
    }

    pub fn slide_mut(&mut self, name: &str) -> Option<&mut SlideInventory> {
        self.slides.iter_mut().find(|s| s.name == name)
    }

    pub fn slides(&self) -> &[SlideInventory] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut [SlideInventory] {
        &mut self.slides
    }

    pub fn shape(&self, slide: &str, shape: &str) -> Option<&ShapeInventory> {
        self.slide(slide)?.shape(shape)
    }

    /// Every `(slide, shape, entry)` triple in order.
    pub fn iter_shapes(&self) -> impl Iterator<Item = (&str, &str, &ShapeInventory)> {
        self.slides.iter().flat_map(|slide| {
            slide
                .iter()
                .map(move |(key, shape)| (slide.name.as_str(), key, shape))
        })
    }

    pub fn shape_count(&self) -> usize {
        self.slides.iter().map(SlideInventory::len).sum()
    }
}

/// Key of the n-th slide of a deck.
pub fn slide_name(position: usize) -> String {
    format!("slide-{}", position)
}

/// Kind prefix of a shape key.
pub fn shape_kind(shape: &Shape<'_>) -> &'static str {
    match shape.placeholder() {
        Some(ph) => match ph.effective_type() {
            "title" | "ctrTitle" => "title",
            "subTitle" => "subtitle",
            "body" => "body",
            "obj" => "content",
            _ => "placeholder",
        },
        None if shape.is_text_box() => "textbox",
        None => "shape",
    }
}

/// Whether a shape belongs in an inventory: an autoshape with a text body
/// that is not a slide-number, date, footer or header placeholder.
pub fn is_inventoried(shape: &Shape<'_>) -> bool {
    shape.shape_type() == ShapeType::Shape
        && shape.has_text_frame()
        && !shape.placeholder().is_some_and(|ph| ph.is_chrome())
}

/// Measurement hook: overflow in inches plus warnings for one shape.
pub(crate) type Measure<'m> =
    dyn FnMut(&Shape<'_>, &Geometry, &PlaceholderInheritance) -> (f64, Vec<String>) + 'm;

/// Walk the deck and build its inventory, asking `measure` for each
/// shape's overflow and warnings.
pub(crate) fn build_inventory(deck: &Presentation, measure: &mut Measure<'_>) -> Result<Inventory> {
    let mut slides = Vec::with_capacity(deck.slide_count());

    for (position, slide) in deck.slides().enumerate() {
        let inheritance = deck.placeholder_inheritance(slide.key())?;
        let mut shapes = Vec::new();

        if let Some(tree) = slide.shape_tree() {
            walk_shapes(tree, &mut |path, shape| {
                if !is_inventoried(&shape) {
                    return;
                }
                let placeholder = shape.placeholder();
                let geometry = shape
                    .own_geometry()
                    .or_else(|| placeholder.as_ref().and_then(|ph| inheritance.geometry(ph)))
                    .unwrap_or_default();
                let paragraphs = shape
                    .text_body()
                    .map(|body| TextFrame::new(body).paragraphs())
                    .unwrap_or_default();
                let (overflow, warnings) = measure(&shape, &geometry, &inheritance);

                let key = format!("{}-{}", shape_kind(&shape), shapes.len() + 1);
                shapes.push((
                    key,
                    ShapeInventory {
                        locator: ShapeLocator {
                            slide: slide.key(),
                            path: path.to_vec(),
                        },
                        name: shape.name().to_string(),
                        left: geometry.left,
                        top: geometry.top,
                        width: geometry.width,
                        height: geometry.height,
                        placeholder,
                        paragraphs,
                        overflow,
                        warnings,
                    },
                ));
            });
        }

        slides.push(SlideInventory {
            name: slide_name(position),
            key: slide.key(),
            shapes,
        });
    }

    Ok(Inventory { slides })
}

/// Inventory without measurement: every overflow is 0 and no warnings are
/// raised.
pub fn snapshot(deck: &Presentation) -> Result<Inventory> {
    build_inventory(deck, &mut |_, _, _| (0.0, Vec::new()))
}
