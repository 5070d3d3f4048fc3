//! Validated text replacement.
//!
//! A replacement runs in four steps, and nothing is written unless all of
//! them succeed:
//!
//! 1. every slide and shape the payload names must exist in the inventory
//!    taken before any change;
//! 2. every inventoried shape is blanked and the ones the payload gives
//!    paragraphs for are refilled;
//! 3. the edited deck is saved to a scratch file, reloaded and inventoried
//!    again;
//! 4. no shape may overflow more than it did before (beyond a tolerance)
//!    and the new inventory may not carry warnings.

use crate::common::output::write_atomically;
use crate::error::{Error, Result, Violations};
use crate::inventory::{Inventory, InventoryExtractor, ShapeInventory};
use crate::ooxml::pptx::shapes::shape_at_path_mut;
use crate::ooxml::pptx::shapes::textframe::{apply_paragraph, clear_text_body, paragraph_slot};
use crate::ooxml::pptx::{Presentation, SaveOptions};
use crate::replace::payload::ReplacementSpec;
use std::io::Write;
use std::path::Path;

/// Characters of existing text shown next to an unreplaced shape.
const PREVIEW_CHARS: usize = 50;

/// Options for [`replace`] and [`replace_file`].
///
/// # Examples
///
/// ```rust
/// use deckweave::replace::ReplaceOptions;
///
/// let options = ReplaceOptions::new()
///     .with_overflow_tolerance(0.05)
///     .with_fail_on_warnings(false);
/// assert_eq!(options.overflow_tolerance, 0.05);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReplaceOptions {
    /// Inches a shape's overflow may grow before the result is rejected
    pub overflow_tolerance: f64,
    /// Reject when the re-extracted inventory reports any warning
    pub fail_on_warnings: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            overflow_tolerance: 0.01,
            fail_on_warnings: true,
        }
    }
}

impl ReplaceOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_overflow_tolerance(mut self, inches: f64) -> Self {
        self.overflow_tolerance = inches;
        self
    }

    #[inline]
    pub fn with_fail_on_warnings(mut self, fail: bool) -> Self {
        self.fail_on_warnings = fail;
        self
    }
}

/// Outcome of a successful replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceReport {
    pub slides: usize,
    /// Inventoried shapes visited
    pub shapes_processed: usize,
    /// Shapes whose text was cleared
    pub shapes_cleared: usize,
    /// Shapes refilled from the payload
    pub shapes_replaced: usize,
    /// Non-fatal problems, as `slide/shape: message`
    pub warnings: Vec<String>,
}

/// Check that every slide and shape key in `spec` exists in `inventory`.
///
/// All problems are collected. For each unknown shape the message lists
/// the slide's shapes the payload does not mention, with a preview of
/// their text, since one of them is usually the intended target.
pub fn validate_references(inventory: &Inventory, spec: &ReplacementSpec) -> Result<()> {
    let mut items = Vec::new();

    for (slide_key, shapes) in spec.slides() {
        let Some(slide) = inventory.slide(slide_key) else {
            items.push(format!("Slide '{}' not found in inventory", slide_key));
            continue;
        };

        for shape_key in shapes.keys() {
            if slide.shape(shape_key).is_some() {
                continue;
            }
            let mut unused: Vec<String> = slide
                .iter()
                .filter(|(key, _)| !shapes.contains_key(*key))
                .map(|(key, shape)| describe_unused(key, shape))
                .collect();
            unused.sort();
            let unused = if unused.is_empty() {
                "none".to_string()
            } else {
                unused.join(", ")
            };
            items.push(format!(
                "Shape '{}' not found in '{}'. Shapes without replacements: {}",
                shape_key, slide_key, unused
            ));
        }
    }

    if items.is_empty() {
        return Ok(());
    }
    Err(Error::Validation(Violations::new(
        format!("{} invalid shape reference(s) in replacement payload", items.len()),
        items,
    )))
}

fn describe_unused(key: &str, shape: &ShapeInventory) -> String {
    match shape.paragraphs.first() {
        Some(first) if !first.text.is_empty() => {
            let mut preview: String = first.text.chars().take(PREVIEW_CHARS).collect();
            if first.text.chars().count() > PREVIEW_CHARS {
                preview.push_str("...");
            }
            format!("{} ('{}')", key, preview)
        },
        _ => key.to_string(),
    }
}

/// Validate `spec` against `inventory`, then clear every inventoried shape
/// of `deck` and refill the ones `spec` gives paragraphs for.
///
/// `inventory` must have been extracted from `deck` as it is now. Shapes
/// the payload does not mention are left blank.
pub fn apply(
    deck: &mut Presentation,
    inventory: &Inventory,
    spec: &ReplacementSpec,
) -> Result<ReplaceReport> {
    validate_references(inventory, spec)?;

    let mut report = ReplaceReport {
        slides: deck.slide_count(),
        ..ReplaceReport::default()
    };

    tracing::info!(shapes = inventory.shape_count(), "clearing and refilling text");
    for (slide_key, shape_key, shape) in inventory.iter_shapes() {
        report.shapes_processed += 1;

        let slide = deck.slide_mut(shape.locator.slide).ok_or_else(|| {
            Error::Input(format!("inventory names {} which is not in the deck", slide_key))
        })?;
        let body = slide
            .shape_tree_mut()
            .and_then(|tree| shape_at_path_mut(tree, &shape.locator.path))
            .and_then(|sp| sp.child_mut("p:txBody"));
        let Some(body) = body else {
            tracing::warn!(slide = slide_key, shape = shape_key, "shape has no text body");
            report
                .warnings
                .push(format!("{}/{}: shape has no text body", slide_key, shape_key));
            continue;
        };

        clear_text_body(body);
        report.shapes_cleared += 1;

        let Some(paragraphs) = spec
            .shape(slide_key, shape_key)
            .and_then(|entry| entry.paragraphs.as_ref())
        else {
            tracing::debug!(slide = slide_key, shape = shape_key, "cleared");
            continue;
        };

        report.shapes_replaced += 1;
        for (i, paragraph) in paragraphs.iter().enumerate() {
            for warning in apply_paragraph(paragraph_slot(body, i), paragraph) {
                tracing::warn!(slide = slide_key, shape = shape_key, "{}", warning);
                report
                    .warnings
                    .push(format!("{}/{}: {}", slide_key, shape_key, warning));
            }
        }
        tracing::debug!(
            slide = slide_key,
            shape = shape_key,
            paragraphs = paragraphs.len(),
            "replaced"
        );
    }

    Ok(report)
}

/// Compare the inventory of the edited deck against the one taken before.
///
/// Returns the warnings found in `after` when they are not fatal.
pub fn check_regression(
    before: &Inventory,
    after: &Inventory,
    options: &ReplaceOptions,
) -> Result<Vec<String>> {
    let mut overflows = Vec::new();
    let mut warnings = Vec::new();

    for (slide_key, shape_key, shape) in after.iter_shapes() {
        let original = before
            .shape(slide_key, shape_key)
            .map_or(0.0, |s| s.overflow);
        if shape.overflow > original + options.overflow_tolerance {
            overflows.push(format!(
                "{}/{}: overflow worsened by {:.2}\" (was {:.2}\", now {:.2}\")",
                slide_key,
                shape_key,
                shape.overflow - original,
                original,
                shape.overflow
            ));
        }
        for warning in &shape.warnings {
            warnings.push(format!("{}/{}: {}", slide_key, shape_key, warning));
        }
    }

    let fatal_warnings = options.fail_on_warnings && !warnings.is_empty();
    if overflows.is_empty() && !fatal_warnings {
        return Ok(warnings);
    }

    let summary = format!(
        "{} overflow regression(s) and {} warning(s) in the edited deck",
        overflows.len(),
        if options.fail_on_warnings { warnings.len() } else { 0 }
    );
    let mut items = overflows;
    if options.fail_on_warnings {
        items.extend(warnings);
    }
    Err(Error::Validation(Violations::new(summary, items)))
}

/// Run a whole replacement in memory and return the bytes of the validated
/// deck.
///
/// `deck` is not modified. The edited copy is saved to a scratch file and
/// reloaded before it is measured, so the check sees exactly what would be
/// written.
pub fn replace(
    deck: &Presentation,
    spec: &ReplacementSpec,
    extractor: &dyn InventoryExtractor,
    options: &ReplaceOptions,
) -> Result<(Vec<u8>, ReplaceReport)> {
    let before = extractor.extract(deck)?;

    let mut edited = deck.clone();
    let mut report = apply(&mut edited, &before, spec)?;
    let bytes = edited.save_to_bytes(&SaveOptions::default())?;

    tracing::info!("checking edited deck for overflow regressions");
    let mut scratch = tempfile::Builder::new()
        .prefix("deckweave-")
        .suffix(".pptx")
        .tempfile()?;
    scratch.write_all(&bytes)?;
    scratch.flush()?;
    let reloaded = Presentation::open(scratch.path())?;
    let after = extractor.extract(&reloaded)?;
    drop(scratch);

    report.warnings.extend(check_regression(&before, &after, options)?);
    Ok((bytes, report))
}

/// Apply the payload at `payload` to the deck at `input` and write the
/// result to `output`.
///
/// Missing files are input errors. The output is written atomically and
/// only once every check has passed.
pub fn replace_file(
    input: &Path,
    payload: &Path,
    output: &Path,
    extractor: &dyn InventoryExtractor,
    options: &ReplaceOptions,
) -> Result<ReplaceReport> {
    if !input.is_file() {
        return Err(Error::Input(format!("input deck not found: {}", input.display())));
    }
    let spec = ReplacementSpec::from_path(payload)?;
    let deck = Presentation::open(input)?;

    let (bytes, report) = replace(&deck, &spec, extractor, options)?;
    write_atomically(output, &bytes)?;

    tracing::info!(
        output = %output.display(),
        processed = report.shapes_processed,
        cleared = report.shapes_cleared,
        replaced = report.shapes_replaced,
        "wrote updated deck"
    );
    Ok(report)
}
