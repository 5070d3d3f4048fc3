//! Slide sequence recomposition.
//!
//! [`compose`] rebuilds a deck from a template and a [`SequenceSpec`]: the
//! output has exactly one slide per sequence slot, slot `i` carrying the
//! content of template slide `sequence[i]`. Repeated indices yield
//! independent clones.
//!
//! The work happens on a copy of the template in three passes over stable
//! [`SlideKey`]s: clone what repeats, delete what is unused, then put the
//! survivors in slot order. Keys never shift, so no pass invalidates the
//! bookkeeping of another.

mod sequence;

pub use sequence::SequenceSpec;

use crate::common::output::write_atomically;
use crate::error::{Error, Result, Violations};
use crate::ooxml::pptx::{Presentation, SaveOptions, SlideKey};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Options for [`compose_file`].
///
/// # Examples
///
/// ```rust
/// use deckweave::compose::ComposeOptions;
///
/// let options = ComposeOptions::new().with_prune_orphans(false);
/// assert!(!options.prune_orphans);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ComposeOptions {
    /// Drop parts the deletions left unreachable (notes, media used only by
    /// deleted slides) when the result is saved.
    pub prune_orphans: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            prune_orphans: true,
        }
    }
}

impl ComposeOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_prune_orphans(mut self, prune: bool) -> Self {
        self.prune_orphans = prune;
        self
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions::new().with_prune_orphans(self.prune_orphans)
    }
}

/// What a composition did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComposeReport {
    /// Slides in the output.
    pub slots: usize,
    pub clones_created: usize,
    pub slides_deleted: usize,
    /// Slides that had to move to reach their slot.
    pub moves: usize,
}

/// Check every index of `sequence` against a deck of `count` slides.
///
/// Each distinct offending value is reported once, in first-seen order.
fn check_range(sequence: &SequenceSpec, count: usize) -> Result<()> {
    let mut seen = HashSet::new();
    let items: Vec<String> = sequence
        .indices()
        .iter()
        .filter(|&&index| index >= count && seen.insert(index))
        .map(|index| match count {
            0 => format!("slide index {} is out of range; the template has no slides", index),
            _ => format!(
                "slide index {} is out of range; valid range is [0,{}]",
                index,
                count - 1
            ),
        })
        .collect();

    if items.is_empty() {
        return Ok(());
    }
    Err(Error::Validation(Violations::new(
        format!(
            "{} slide index(es) out of range for a {}-slide template",
            items.len(),
            count
        ),
        items,
    )))
}

/// Recompose `template` according to `sequence`.
///
/// The template itself is never modified; the returned deck is a separate
/// in-memory copy. Every index is checked before any work is done, and all
/// out-of-range values are reported together.
pub fn compose(
    template: &Presentation,
    sequence: &SequenceSpec,
) -> Result<(Presentation, ComposeReport)> {
    check_range(sequence, template.slide_count())?;

    let mut deck = template.clone();
    let originals = deck.slide_keys().to_vec();
    let mut report = ComposeReport {
        slots: sequence.len(),
        ..ComposeReport::default()
    };

    // duplication
    tracing::info!(
        slots = sequence.len(),
        template_slides = originals.len(),
        "duplicating repeated slides"
    );
    let mut claimed: HashSet<usize> = HashSet::new();
    let mut plan: Vec<SlideKey> = Vec::with_capacity(sequence.len());
    for (slot, &index) in sequence.indices().iter().enumerate() {
        let source = originals[index];
        let key = if claimed.insert(index) {
            source
        } else {
            report.clones_created += 1;
            deck.duplicate_slide(source)?
        };
        tracing::debug!(slot, index, slide = %key, "slot assigned");
        plan.push(key);
    }

    // deletion
    let keep: HashSet<SlideKey> = plan.iter().copied().collect();
    let unused: Vec<SlideKey> = deck
        .slide_keys()
        .iter()
        .copied()
        .filter(|key| !keep.contains(key))
        .collect();
    tracing::info!(slides = unused.len(), "deleting unused slides");
    for key in unused {
        deck.delete_slide(key)?;
        report.slides_deleted += 1;
    }

    // reorder
    report.moves = deck
        .slide_keys()
        .iter()
        .zip(&plan)
        .filter(|(current, wanted)| current != wanted)
        .count();
    tracing::info!(moves = report.moves, "reordering slides");
    deck.set_order(plan)?;

    verify(template, &deck, sequence)?;
    Ok((deck, report))
}

/// Confirm every output slot holds the template slide it asked for.
fn verify(template: &Presentation, deck: &Presentation, sequence: &SequenceSpec) -> Result<()> {
    let origin_index: HashMap<SlideKey, usize> = template
        .slide_keys()
        .iter()
        .enumerate()
        .map(|(i, key)| (*key, i))
        .collect();

    let mut items = Vec::new();
    if deck.slide_count() != sequence.len() {
        items.push(format!(
            "deck has {} slides, expected {}",
            deck.slide_count(),
            sequence.len()
        ));
    }
    for (slot, (slide, &wanted)) in deck.slides().zip(sequence.indices()).enumerate() {
        let got = origin_index.get(&slide.origin()).copied();
        if got != Some(wanted) {
            items.push(format!(
                "slot {} holds {} instead of template slide {}",
                slot,
                slide.key(),
                wanted
            ));
        }
    }

    if items.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(Violations::new(
            "recomposed deck does not match the requested sequence",
            items,
        )))
    }
}

/// Compose from a template file into an output file.
///
/// The template is read fully into memory before anything else happens, so
/// `output` may name the template itself. The output is written atomically
/// and only after composition succeeded; on any error nothing is written.
pub fn compose_file(
    template: &Path,
    output: &Path,
    sequence: &SequenceSpec,
    options: &ComposeOptions,
) -> Result<ComposeReport> {
    if !template.is_file() {
        return Err(Error::Input(format!(
            "template not found: {}",
            template.display()
        )));
    }
    let source = Presentation::open(template)?;
    let (mut deck, report) = compose(&source, sequence)?;
    let bytes = deck.save_to_bytes(&options.save_options())?;
    write_atomically(output, &bytes)?;

    tracing::info!(
        output = %output.display(),
        slides = report.slots,
        clones = report.clones_created,
        deleted = report.slides_deleted,
        "wrote recomposed deck"
    );
    Ok(report)
}
