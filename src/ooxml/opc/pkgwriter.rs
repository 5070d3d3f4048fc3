//! Package writer for OPC packages.
//!
//! Serializes `[Content_Types].xml` first, then the package relationships,
//! then every part in partname order followed by its `.rels` part. The
//! output is deterministic for a given package.

use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use std::collections::BTreeMap;

/// Package writer that serializes an OPC package to ZIP bytes.
pub struct PackageWriter;

impl PackageWriter {
    /// Serialize an OPC package to bytes.
    pub fn to_bytes(package: &OpcPackage) -> Result<Vec<u8>> {
        let mut phys_writer = PhysPkgWriter::new();

        let cti = ContentTypesItem::from_package(package);
        phys_writer.write(&PackURI::new(CONTENT_TYPES_URI)?, cti.to_xml().as_bytes())?;

        let package_uri = PackURI::new(PACKAGE_URI)?;
        phys_writer.write(&package_uri.rels_uri(), package.rels().to_xml().as_bytes())?;

        for part in package.iter_parts() {
            phys_writer.write(part.partname(), part.blob())?;
            if !part.rels().is_empty() {
                phys_writer.write(
                    &part.partname().rels_uri(),
                    part.rels().to_xml().as_bytes(),
                )?;
            }
        }

        phys_writer.finish()
    }
}

/// Default and Override entries of `[Content_Types].xml`.
struct ContentTypesItem {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn from_package(package: &OpcPackage) -> Self {
        let mut cti = Self {
            defaults: BTreeMap::new(),
            overrides: BTreeMap::new(),
        };
        cti.defaults
            .insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        cti.defaults.insert("xml".to_string(), ct::XML.to_string());

        for part in package.iter_parts() {
            cti.add_content_type(part.partname(), part.content_type());
        }
        cti
    }

    /// Use an extension default when the pair is well known, otherwise an
    /// override for the specific partname.
    fn add_content_type(&mut self, partname: &PackURI, content_type: &str) {
        let ext = partname.ext().to_ascii_lowercase();
        if ct::for_extension(&ext) == Some(content_type) {
            self.defaults.insert(ext, content_type.to_string());
        } else {
            self.overrides
                .insert(partname.to_string(), content_type.to_string());
        }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.overrides.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns=""#);
        xml.push_str(namespace::OPC_CONTENT_TYPES);
        xml.push_str(r#"">"#);

        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            ));
        }
        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::part::Part;

    #[test]
    fn test_content_types_xml() {
        let mut pkg = OpcPackage::new();
        pkg.add_part(Part::new(
            PackURI::new("/ppt/media/image1.png").unwrap(),
            ct::PNG.to_string(),
            vec![1, 2, 3],
        ));
        pkg.add_part(Part::new(
            PackURI::new("/ppt/slides/slide1.xml").unwrap(),
            ct::PML_SLIDE.to_string(),
            b"<p:sld/>".to_vec(),
        ));

        let xml = ContentTypesItem::from_package(&pkg).to_xml();

        assert!(xml.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
        assert!(xml.contains(r#"<Default Extension="rels""#));
        assert!(xml.contains(r#"<Override PartName="/ppt/slides/slide1.xml""#));
        assert!(!xml.contains(r#"PartName="/ppt/media/image1.png""#));
    }
}
