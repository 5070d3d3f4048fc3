//! Low-level, read-only API to a serialized Open Packaging Convention (OPC) package.
//!
//! Content types are resolved through `[Content_Types].xml` (overrides first,
//! then extension defaults) and parts are discovered by walking relationships
//! from the package root. Zip members no relationship reaches are ignored.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::rel::Relationships;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::{HashMap, HashSet};

/// Content type map for looking up content types by part name or extension.
pub(crate) struct ContentTypeMap {
    /// Maps lowercase file extensions to default content types
    defaults: HashMap<String, String>,

    /// Maps specific partnames to override content types
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    /// Parse content types from [Content_Types].xml.
    pub(crate) fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self {
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        };
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let is_default = match e.local_name().as_ref() {
                        b"Default" => true,
                        b"Override" => false,
                        _ => {
                            buf.clear();
                            continue;
                        },
                    };

                    let mut key = None;
                    let mut content_type = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Extension" | b"PartName" => {
                                key = Some(attr.unescape_value()?.into_owned())
                            },
                            b"ContentType" => {
                                content_type = Some(attr.unescape_value()?.into_owned())
                            },
                            _ => {},
                        }
                    }

                    if let (Some(key), Some(ct)) = (key, content_type) {
                        if is_default {
                            map.defaults.insert(key.to_ascii_lowercase(), ct);
                        } else {
                            map.overrides.insert(key.to_ascii_lowercase(), ct);
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Content types parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Content type of a partname: override first, then extension default.
    pub(crate) fn get(&self, pack_uri: &PackURI) -> Result<String> {
        if let Some(ct) = self.overrides.get(&pack_uri.as_str().to_ascii_lowercase()) {
            return Ok(ct.clone());
        }
        self.defaults
            .get(&pack_uri.ext().to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| OpcError::ContentTypeNotFound(pack_uri.to_string()))
    }
}

/// Parts and package relationships discovered from a physical package.
pub struct PackageReader {
    pkg_rels: Relationships,
    parts: Vec<Part>,
}

impl PackageReader {
    /// Walk the relationship graph of a preloaded package.
    pub fn from_phys_reader(phys_reader: &PhysPkgReader) -> Result<Self> {
        let content_types = ContentTypeMap::from_xml(phys_reader.content_types_xml()?)?;

        let package_uri = PackURI::new(PACKAGE_URI)?;
        let pkg_rels = Self::load_rels(phys_reader, &package_uri)?;

        let mut parts = Vec::with_capacity(phys_reader.len());
        let mut visited: HashSet<PackURI> = HashSet::new();
        let mut work_queue: Vec<PackURI> = Vec::new();

        Self::enqueue_targets(&pkg_rels, &mut visited, &mut work_queue);

        while let Some(partname) = work_queue.pop() {
            if !phys_reader.contains(&partname) {
                tracing::warn!(partname = %partname, "relationship targets a missing part");
                continue;
            }

            let rels = Self::load_rels(phys_reader, &partname)?;
            Self::enqueue_targets(&rels, &mut visited, &mut work_queue);

            let blob = phys_reader.blob_for(&partname)?.to_vec();
            let content_type = content_types.get(&partname)?;
            parts.push(Part::with_rels(partname, content_type, blob, rels));
        }

        Ok(Self { pkg_rels, parts })
    }

    fn load_rels(phys_reader: &PhysPkgReader, source_uri: &PackURI) -> Result<Relationships> {
        let base_uri = source_uri.base_uri();
        match phys_reader.rels_xml_for(source_uri) {
            Some(xml) => Relationships::from_xml(base_uri, xml),
            None => Ok(Relationships::new(base_uri.to_string())),
        }
    }

    fn enqueue_targets(
        rels: &Relationships,
        visited: &mut HashSet<PackURI>,
        work_queue: &mut Vec<PackURI>,
    ) {
        for rel in rels.iter().filter(|rel| !rel.is_external()) {
            if let Ok(partname) = rel.target_partname()
                && visited.insert(partname.clone())
            {
                work_queue.push(partname);
            }
        }
    }

    /// Take ownership of the package-level relationships and all parts.
    pub fn into_parts(self) -> (Relationships, Vec<Part>) {
        (self.pkg_rels, self.parts)
    }
}
