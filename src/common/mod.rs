//! Common utilities shared by the OOXML layer and the deck engines.
//!
//! This module holds the small, format-agnostic helpers: length unit
//! conversions between points, inches and EMUs, and XML text escaping.

pub mod output;
pub mod unit;
pub mod xml;
