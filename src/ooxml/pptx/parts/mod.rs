/// Parts for PowerPoint presentation documents.
///
/// This module contains wrapper types for the XML parts of a .pptx package
/// the deck model reads and rewrites.
pub mod presentation;
pub mod slide;

pub use presentation::PresentationPart;
pub use slide::{
    PlaceholderInheritance, PlaceholderTemplate, SlideLayoutPart, SlideMasterPart, new_slide_xml,
};
