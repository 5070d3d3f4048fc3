/// Open Packaging Conventions (OPC) implementation.
///
/// This module provides the subset of the OPC specification a deck editor
/// needs to load a `.pptx` container, edit its part graph and write it back:
///
/// - Package structure (parts, relationships)
/// - Content type management
/// - ZIP-based physical packaging
/// - Reachability-based pruning of orphaned parts
///
/// # Performance Features
///
/// - Uses `memchr` for fast relationship reference counting in part XML
/// - Uses `atoi_simd` for fast integer parsing of rIds and partname indices
/// - Uses `quick-xml` for streaming parsing of content types and relationships

pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use error::{OpcError, Result};
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::Part;
pub use rel::{Relationship, Relationships};
