//! Deckweave - slide recomposition and validated text replacement for
//! PowerPoint decks
//!
//! This library edits `.pptx` packages in memory and writes results only
//! after they have been checked.
//!
//! # Features
//!
//! - **Slide sequences**: rebuild a deck from a template and a list of slide
//!   indices, duplicating, dropping and reordering slides as needed
//! - **Text replacement**: rewrite the paragraphs of named shapes from a JSON
//!   payload, rejecting edits that make text overflow its frame
//! - **Inventories**: per-shape snapshots of geometry, text and overflow
//! - **OOXML model**: packages, relationships, slides, shapes and text frames
//!
//! # Example - Recomposing a deck
//!
//! ```no_run
//! use deckweave::compose::{ComposeOptions, SequenceSpec, compose_file};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sequence: SequenceSpec = "0,3,3,1".parse()?;
//! let report = compose_file(
//!     Path::new("template.pptx"),
//!     Path::new("deck.pptx"),
//!     &sequence,
//!     &ComposeOptions::default(),
//! )?;
//! println!("{} slides, {} duplicated", report.slots, report.clones_created);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Replacing text
//!
//! ```no_run
//! use deckweave::inventory::TextMetricsEstimator;
//! use deckweave::replace::{ReplaceOptions, replace_file};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = replace_file(
//!     Path::new("deck.pptx"),
//!     Path::new("replacements.json"),
//!     Path::new("final.pptx"),
//!     &TextMetricsEstimator::default(),
//!     &ReplaceOptions::default(),
//! )?;
//! println!("{} shapes replaced", report.shapes_replaced);
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod compose;
pub mod error;
pub mod inventory;
pub mod ooxml;
pub mod replace;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result, Violations};
