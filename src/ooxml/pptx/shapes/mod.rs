//! Shape views and text-frame editing for slide shape trees.

pub mod base;
pub mod textframe;

pub use base::{Geometry, PlaceholderInfo, Shape, ShapeType, shape_at_path_mut, walk_shapes};
pub use textframe::{ParagraphSpec, TextFrame};
