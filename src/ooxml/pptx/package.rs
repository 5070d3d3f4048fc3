/// Package implementation for PowerPoint presentations.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::OpcPackage;
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::part::Part;
use crate::ooxml::pptx::presentation::Presentation;
use std::path::Path;

/// A PowerPoint (.pptx) package.
///
/// This is the entry point for reading a deck. It wraps an OPC package
/// whose main part has been checked to be PresentationML.
///
/// # Examples
///
/// ```rust,no_run
/// use deckweave::ooxml::pptx::Package;
///
/// let pkg = Package::open("presentation.pptx")?;
/// let pres = pkg.presentation()?;
/// println!("Presentation has {} slides", pres.slide_count());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Package {
    /// The underlying OPC package
    opc: OpcPackage,
}

impl Package {
    /// Open a .pptx (or .pptm, .potx, .ppsx) package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    /// Load a package from in-memory ZIP bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    fn from_opc(opc: OpcPackage) -> Result<Self> {
        main_presentation_part(&opc)?;
        Ok(Self { opc })
    }

    /// An editable deck over a copy of this package.
    pub fn presentation(&self) -> Result<Presentation> {
        Presentation::from_package(self.opc.clone())
    }

    /// An editable deck that takes over this package.
    pub fn into_presentation(self) -> Result<Presentation> {
        Presentation::from_package(self.opc)
    }

    /// Get the underlying OPC package.
    #[inline]
    pub fn opc_package(&self) -> &OpcPackage {
        &self.opc
    }
}

/// The package's main part, provided it is a presentation, macro-enabled
/// presentation, template or slideshow.
pub(crate) fn main_presentation_part(opc: &OpcPackage) -> Result<&Part> {
    let main_part = opc
        .main_document_part()
        .map_err(|e| OoxmlError::PartNotFound(format!("main presentation part: {}", e)))?;

    let content_type = main_part.content_type();
    if !ct::PML_MAIN_TYPES.contains(&content_type) {
        return Err(OoxmlError::InvalidContentType {
            expected: ct::PML_MAIN_TYPES.join(" or "),
            got: content_type.to_string(),
        });
    }
    Ok(main_part)
}
