//! PowerPoint (.pptx) presentation support.
//!
//! The deck model loads every part of a package into memory and parses the
//! XML it edits into an owned element tree:
//!
//! - [`Package`]: the .pptx file, checked to be PresentationML
//! - [`Presentation`]: the editable deck; slide order, cloning, deletion,
//!   saving
//! - [`Slide`]: one slide, identified by a stable [`SlideKey`]
//! - [`shapes`]: shape views, placeholders and text-frame editing
//! - [`parts`]: presentation, layout and master parts
//!
//! # Example
//!
//! ```rust,no_run
//! use deckweave::ooxml::pptx::Package;
//!
//! let package = Package::open("presentation.pptx")?;
//! let pres = package.presentation()?;
//!
//! for slide in pres.slides() {
//!     println!("{}: {}", slide.key(), slide.text());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod format;
pub mod media;
pub mod package;
pub mod parts;
pub mod presentation;
pub mod sections;
pub mod shapes;
pub mod slide;

pub use format::{Alignment, RgbColor};
pub use media::{MediaEntry, MediaPool};
pub use package::Package;
pub use presentation::{Presentation, SaveOptions};
pub use sections::{Section, SectionList};
pub use slide::{Slide, SlideKey};
