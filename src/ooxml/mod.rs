//! Office Open XML (OOXML) layer.
//!
//! The module is organized into three layers:
//!
//! 1. **OPC Layer** (`opc`): Low-level package handling (ZIP, parts, relationships)
//! 2. **XML tree** (`xml`): An owned, order-preserving element tree used to
//!    edit part XML in place and serialize it back
//! 3. **PresentationML** (`pptx`): The deck model, with stable slide
//!    identities, slide cloning and text-frame editing
//!
//! # Example
//!
//! ```rust,no_run
//! use deckweave::ooxml::pptx::Package;
//!
//! let pkg = Package::open("deck.pptx")?;
//! let pres = pkg.presentation()?;
//! println!("{} slides", pres.slide_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod error;
pub mod opc;
pub mod pptx;
pub mod xml;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{OoxmlError, Result};
