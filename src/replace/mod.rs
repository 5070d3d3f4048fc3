//! Text replacement driven by a JSON payload.
//!
//! [`ReplacementSpec`] parses and checks the payload; [`replace`] and
//! [`replace_file`] apply it to a deck and refuse to produce output that
//! overflows more than the original or carries inventory warnings.

mod engine;
pub mod payload;

pub use engine::{
    ReplaceOptions, ReplaceReport, apply, check_regression, replace, replace_file,
    validate_references,
};
pub use payload::{ReplacementSpec, ShapeReplacement};
