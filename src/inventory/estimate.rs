//! Text-metrics overflow estimation.
//!
//! Without a layout engine the height of a text frame is estimated from
//! font metrics: every glyph is taken to be `glyph_width_factor` em wide,
//! lines wrap greedily on whitespace, and line pitch follows the
//! paragraph's line spacing. The estimate is coarse but deterministic, and
//! it moves in the right direction when text is added or enlarged, which is
//! what a before/after regression check needs.

use super::{Inventory, InventoryExtractor, build_inventory};
use crate::common::unit::{EMUS_PER_PT, centipoints_to_pt, emu_to_inches, emu_to_pt_f64};
use crate::error::Result;
use crate::ooxml::pptx::Presentation;
use crate::ooxml::pptx::parts::PlaceholderInheritance;
use crate::ooxml::pptx::shapes::textframe::paragraph_text;
use crate::ooxml::pptx::shapes::{Geometry, PlaceholderInfo, Shape, TextFrame};
use crate::ooxml::xml::XmlElement;

const DEFAULT_LEFT_RIGHT_INSET: i64 = 91_440;
const DEFAULT_TOP_BOTTOM_INSET: i64 = 45_720;

/// Glyphs that mark a paragraph as a hand-typed bullet.
const BULLET_GLYPHS: &[char] = &[
    '•', '◦', '▪', '▫', '●', '○', '■', '□', '‣', '–', '-', '*',
];

/// Configuration for [`TextMetricsEstimator`].
///
/// # Examples
///
/// ```rust
/// use deckweave::inventory::EstimatorOptions;
///
/// let options = EstimatorOptions::new()
///     .with_glyph_width_factor(0.55)
///     .with_default_font_size(20.0);
/// assert_eq!(options.line_height_factor, 1.2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorOptions {
    /// Average glyph advance as a fraction of the font size
    pub glyph_width_factor: f64,
    /// Line pitch as a multiple of the font size at 100% line spacing
    pub line_height_factor: f64,
    /// Font size in points when neither the run nor the paragraph sets one
    pub default_font_size: f64,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            glyph_width_factor: 0.5,
            line_height_factor: 1.2,
            default_font_size: 18.0,
        }
    }
}

impl EstimatorOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_glyph_width_factor(mut self, factor: f64) -> Self {
        self.glyph_width_factor = factor;
        self
    }

    #[inline]
    pub fn with_line_height_factor(mut self, factor: f64) -> Self {
        self.line_height_factor = factor;
        self
    }

    #[inline]
    pub fn with_default_font_size(mut self, size: f64) -> Self {
        self.default_font_size = size;
        self
    }
}

/// How a text frame reacts to text that does not fit.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Autofit {
    /// Text spills out of the frame
    None,
    /// Text is shrunk by the stored scale factors
    Normal { font_scale: f64, line_reduction: f64 },
    /// The frame grows to fit the text
    Shape,
}

/// Built-in [`InventoryExtractor`] measuring overflow from font metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMetricsEstimator {
    options: EstimatorOptions,
}

impl TextMetricsEstimator {
    pub fn new(options: EstimatorOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &EstimatorOptions {
        &self.options
    }

    /// Overflow in inches (rounded to hundredths) and warnings for one
    /// shape.
    pub fn measure(
        &self,
        shape: &Shape<'_>,
        geometry: &Geometry,
        inheritance: &PlaceholderInheritance,
    ) -> (f64, Vec<String>) {
        let Some(body) = shape.text_body() else {
            return (0.0, Vec::new());
        };
        let frame = TextFrame::new(body);
        let body_pr = frame.body_properties();
        let placeholder = shape.placeholder();

        let body_attr =
            |key: &str| inherited_body_attr(body_pr, placeholder.as_ref(), inheritance, key);
        let inset = |key: &str, default: i64| {
            body_attr(key)
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(default)
        };
        let left = inset("lIns", DEFAULT_LEFT_RIGHT_INSET);
        let right = inset("rIns", DEFAULT_LEFT_RIGHT_INSET);
        let top = inset("tIns", DEFAULT_TOP_BOTTOM_INSET);
        let bottom = inset("bIns", DEFAULT_TOP_BOTTOM_INSET);
        let wrap = body_attr("wrap") != Some("none");

        let autofit = body_pr
            .and_then(autofit_of)
            .or_else(|| {
                let ph = placeholder.as_ref()?;
                ["a:spAutoFit", "a:normAutofit", "a:noAutofit"]
                    .iter()
                    .find_map(|name| inheritance.body_child(ph, name))
                    .map(autofit_from_element)
            })
            .unwrap_or(Autofit::None);

        let mut warnings = bullet_glyph_warnings(&frame);

        let has_text = frame
            .paragraph_elements()
            .any(|p| !paragraph_text(p).trim().is_empty());
        let usable_width = geometry.width - left - right;
        if has_text && usable_width <= 0 {
            warnings.push("text frame has no usable width".to_string());
            return (0.0, warnings);
        }
        if autofit == Autofit::Shape || !has_text {
            return (0.0, warnings);
        }

        let (font_scale, line_reduction) = match autofit {
            Autofit::Normal {
                font_scale,
                line_reduction,
            } => (font_scale, line_reduction),
            _ => (1.0, 0.0),
        };

        let mut height_pt = 0.0;
        for p in frame.paragraph_elements() {
            height_pt +=
                self.paragraph_height_pt(p, usable_width, wrap, font_scale, line_reduction);
        }

        let text_emu = (height_pt * EMUS_PER_PT as f64).round() as i64 + top + bottom;
        let overflow_emu = (text_emu - geometry.height).max(0);
        (round_hundredths(emu_to_inches(overflow_emu)), warnings)
    }

    fn paragraph_height_pt(
        &self,
        p: &XmlElement,
        usable_width: i64,
        wrap: bool,
        font_scale: f64,
        line_reduction: f64,
    ) -> f64 {
        let opts = &self.options;
        let font = paragraph_font_size(p).unwrap_or(opts.default_font_size) * font_scale;
        let ppr = p.child("a:pPr");

        let margin = ppr
            .and_then(|ppr| ppr.attr("marL"))
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        let glyph = (font * opts.glyph_width_factor).max(f64::EPSILON);
        let width_pt = emu_to_pt_f64(usable_width - margin).max(glyph);
        let capacity = (width_pt / glyph).floor().max(1.0) as usize;

        let natural_pitch = font * opts.line_height_factor;
        let pitch = match ppr.and_then(|ppr| ppr.child("a:lnSpc")) {
            Some(spacing) => spacing_pt(spacing, natural_pitch).unwrap_or(natural_pitch),
            None => natural_pitch,
        } * (1.0 - line_reduction);

        let before = ppr
            .and_then(|ppr| ppr.child("a:spcBef"))
            .and_then(|s| spacing_pt(s, natural_pitch))
            .unwrap_or(0.0);
        let after = ppr
            .and_then(|ppr| ppr.child("a:spcAft"))
            .and_then(|s| spacing_pt(s, natural_pitch))
            .unwrap_or(0.0);

        let lines = wrapped_line_count(&paragraph_text(p), capacity, wrap);
        before + lines as f64 * pitch + after
    }
}

impl InventoryExtractor for TextMetricsEstimator {
    fn extract(&self, deck: &Presentation) -> Result<Inventory> {
        build_inventory(deck, &mut |shape, geometry, inheritance| {
            self.measure(shape, geometry, inheritance)
        })
    }
}

/// A `a:bodyPr` attribute from the shape, else from its layout or master
/// placeholder.
fn inherited_body_attr<'a>(
    body_pr: Option<&'a XmlElement>,
    placeholder: Option<&PlaceholderInfo>,
    inheritance: &'a PlaceholderInheritance,
    key: &str,
) -> Option<&'a str> {
    body_pr
        .and_then(|b| b.attr(key))
        .or_else(|| inheritance.body_attr(placeholder?, key))
}

fn autofit_of(body_pr: &XmlElement) -> Option<Autofit> {
    body_pr
        .elements()
        .find(|e| matches!(e.name(), "a:spAutoFit" | "a:normAutofit" | "a:noAutofit"))
        .map(autofit_from_element)
}

fn autofit_from_element(element: &XmlElement) -> Autofit {
    let percent = |key: &str, default: f64| {
        element
            .attr(key)
            .and_then(|v| v.parse::<f64>().ok())
            .map_or(default, |v| v / 100_000.0)
    };
    match element.name() {
        "a:spAutoFit" => Autofit::Shape,
        "a:normAutofit" => Autofit::Normal {
            font_scale: percent("fontScale", 1.0),
            line_reduction: percent("lnSpcReduction", 0.0),
        },
        _ => Autofit::None,
    }
}

/// Size of the first run that sets one, else the end-of-paragraph size.
fn paragraph_font_size(p: &XmlElement) -> Option<f64> {
    p.elements()
        .filter(|e| matches!(e.name(), "a:r" | "a:fld"))
        .filter_map(|r| r.child("a:rPr")?.attr("sz")?.parse::<i64>().ok())
        .next()
        .or_else(|| p.child("a:endParaRPr")?.attr("sz")?.parse::<i64>().ok())
        .map(centipoints_to_pt)
}

/// Points of an `a:lnSpc`/`a:spcBef`/`a:spcAft` element. Percentages are
/// relative to the natural line pitch.
fn spacing_pt(spacing: &XmlElement, natural_pitch: f64) -> Option<f64> {
    if let Some(pts) = spacing.child("a:spcPts") {
        return pts
            .attr("val")?
            .parse::<i64>()
            .ok()
            .map(centipoints_to_pt);
    }
    let pct = spacing.child("a:spcPct")?.attr("val")?.parse::<f64>().ok()?;
    Some(natural_pitch * pct / 100_000.0)
}

/// Lines a paragraph occupies when wrapped at `capacity` characters.
///
/// Words wrap greedily; a word longer than a line is broken across lines.
/// Explicit line breaks always start a new line.
fn wrapped_line_count(text: &str, capacity: usize, wrap: bool) -> usize {
    let capacity = capacity.max(1);
    text.split('\n')
        .map(|segment| {
            if !wrap {
                return 1;
            }
            let mut lines = 1;
            let mut used = 0usize;
            for word in segment.split_whitespace() {
                let len = word.chars().count();
                let needed = if used == 0 { len } else { used + 1 + len };
                if needed <= capacity {
                    used = needed;
                    continue;
                }
                if used > 0 {
                    lines += 1;
                }
                lines += (len - 1) / capacity;
                used = (len - 1) % capacity + 1;
            }
            lines
        })
        .sum()
}

fn bullet_glyph_warnings(frame: &TextFrame<'_>) -> Vec<String> {
    let mut warnings = Vec::new();
    for (i, p) in frame.paragraph_elements().enumerate() {
        let formatted = p
            .child("a:pPr")
            .is_some_and(|ppr| {
                ppr.child("a:buChar").is_some() || ppr.child("a:buAutoNum").is_some()
            });
        if !formatted {
            continue;
        }
        let text = paragraph_text(p);
        let mut chars = text.trim_start().chars();
        if let (Some(glyph), Some(next)) = (chars.next(), chars.next())
            && BULLET_GLYPHS.contains(&glyph)
            && next.is_whitespace()
        {
            warnings.push(format!(
                "paragraph {} starts with a literal bullet glyph '{}' while bullet formatting is on",
                i, glyph
            ));
        }
    }
    warnings
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
