//! Owned XML element tree for editing part content.
//!
//! Parts are parsed into [`XmlElement`] trees that keep element order,
//! attribute order and qualified names exactly as read, so a part that is
//! loaded and saved without edits keeps its structure.

mod element;

pub use element::{XmlDocument, XmlElement, XmlNode};
