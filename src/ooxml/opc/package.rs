/// Objects that implement reading and writing OPC packages.
///
/// `OpcPackage` holds an entire package in memory: the package-level
/// relationships and every part reachable from them, keyed by partname.
use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// An Open Packaging Convention package in memory.
#[derive(Debug, Clone)]
pub struct OpcPackage {
    /// Package-level relationships
    rels: Relationships,

    /// All parts in the package, ordered by partname
    parts: BTreeMap<PackURI, Part>,
}

impl OpcPackage {
    /// Create a new empty OPC package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: BTreeMap::new(),
        }
    }

    /// Open an OPC package from a file.
    ///
    /// # Example
    /// ```no_run
    /// use deckweave::ooxml::opc::OpcPackage;
    ///
    /// let pkg = OpcPackage::open("deck.pptx").unwrap();
    /// println!("{} parts", pkg.iter_parts().count());
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_phys_reader(&PhysPkgReader::open(path)?)
    }

    /// Load an OPC package from in-memory ZIP bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_phys_reader(&PhysPkgReader::from_bytes(data)?)
    }

    fn from_phys_reader(phys_reader: &PhysPkgReader) -> Result<Self> {
        let (rels, parts) = PackageReader::from_phys_reader(phys_reader)?.into_parts();
        Ok(Self {
            rels,
            parts: parts
                .into_iter()
                .map(|part| (part.partname().clone(), part))
                .collect(),
        })
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self)
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// The part the package's `officeDocument` relationship points at.
    pub fn main_document_part(&self) -> Result<&Part> {
        let partname = self
            .rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname()?;
        self.get_part(&partname)
    }

    #[inline]
    pub fn part(&self, partname: &PackURI) -> Option<&Part> {
        self.parts.get(partname)
    }

    #[inline]
    pub fn part_mut(&mut self, partname: &PackURI) -> Option<&mut Part> {
        self.parts.get_mut(partname)
    }

    /// Like [`OpcPackage::part`] but with a `PartNotFound` error.
    pub fn get_part(&self, partname: &PackURI) -> Result<&Part> {
        self.parts
            .get(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    pub fn get_part_mut(&mut self, partname: &PackURI) -> Result<&mut Part> {
        self.parts
            .get_mut(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    #[inline]
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname)
    }

    /// Parts in partname order.
    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    /// Add a part, replacing any part with the same name.
    pub fn add_part(&mut self, part: Part) {
        self.parts.insert(part.partname().clone(), part);
    }

    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Part> {
        self.parts.remove(partname)
    }

    /// First unused partname of the form `{prefix}{N}.{ext}`, N starting at 1.
    ///
    /// `next_partname("/ppt/slides/slide", "xml")` yields
    /// `/ppt/slides/slide4.xml` when slides 1 to 3 exist.
    pub fn next_partname(&self, prefix: &str, ext: &str) -> Result<PackURI> {
        let used: HashSet<u32> = self
            .parts
            .keys()
            .filter(|name| {
                name.as_str().starts_with(prefix) && name.ext().eq_ignore_ascii_case(ext)
            })
            .filter_map(PackURI::idx)
            .collect();
        let n = (1u32..)
            .find(|n| !used.contains(n))
            .ok_or_else(|| OpcError::InvalidPackUri(format!("no free index for {}", prefix)))?;
        PackURI::new(format!("{}{}.{}", prefix, n, ext))
    }

    /// Partnames reachable from the package root through internal relationships.
    pub fn reachable_partnames(&self) -> HashSet<PackURI> {
        let mut visited: HashSet<PackURI> = HashSet::new();
        let mut stack: Vec<PackURI> = Self::internal_targets(&self.rels).collect();

        while let Some(partname) = stack.pop() {
            if !visited.insert(partname.clone()) {
                continue;
            }
            if let Some(part) = self.parts.get(&partname) {
                stack.extend(Self::internal_targets(part.rels()));
            }
        }

        visited
    }

    /// Remove every part no relationship chain from the root reaches.
    ///
    /// Returns the removed partnames.
    pub fn drop_unreachable_parts(&mut self) -> Vec<PackURI> {
        let reachable = self.reachable_partnames();
        let orphans: Vec<PackURI> = self
            .parts
            .keys()
            .filter(|name| !reachable.contains(*name))
            .cloned()
            .collect();
        for name in &orphans {
            self.parts.remove(name);
        }
        orphans
    }

    fn internal_targets(rels: &Relationships) -> impl Iterator<Item = PackURI> + '_ {
        rels.iter()
            .filter(|rel| !rel.is_external())
            .filter_map(|rel| rel.target_partname().ok())
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;

    fn sample_package() -> OpcPackage {
        let mut pkg = OpcPackage::new();
        let pres = PackURI::new("/ppt/presentation.xml").unwrap();
        let slide = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        let image = PackURI::new("/ppt/media/image1.png").unwrap();

        pkg.rels_mut()
            .add_internal(relationship_type::OFFICE_DOCUMENT, &pres);

        let mut pres_part = Part::new(
            pres,
            ct::PML_PRESENTATION_MAIN.to_string(),
            b"<p:presentation/>".to_vec(),
        );
        pres_part.relate_to(&slide, relationship_type::SLIDE);
        pkg.add_part(pres_part);

        let mut slide_part = Part::new(slide, ct::PML_SLIDE.to_string(), b"<p:sld/>".to_vec());
        slide_part.relate_to(&image, relationship_type::IMAGE);
        slide_part
            .rels_mut()
            .add_external(relationship_type::HYPERLINK, "https://example.com");
        pkg.add_part(slide_part);

        pkg.add_part(Part::new(image, ct::PNG.to_string(), vec![0x89, b'P', b'N', b'G']));
        pkg
    }

    #[test]
    fn test_round_trip_bytes() {
        let pkg = sample_package();
        let reloaded = OpcPackage::from_bytes(pkg.to_bytes().unwrap()).unwrap();

        assert_eq!(reloaded.iter_parts().count(), 3);
        let main = reloaded.main_document_part().unwrap();
        assert_eq!(main.content_type(), ct::PML_PRESENTATION_MAIN);

        let slide = reloaded
            .part(&PackURI::new("/ppt/slides/slide1.xml").unwrap())
            .unwrap();
        assert_eq!(slide.rels().len(), 2);
        assert!(slide.rels().iter().any(|rel| rel.is_external()));
    }

    #[test]
    fn test_next_partname() {
        let pkg = sample_package();
        assert_eq!(
            pkg.next_partname("/ppt/slides/slide", "xml").unwrap().as_str(),
            "/ppt/slides/slide2.xml"
        );
        assert_eq!(
            pkg.next_partname("/ppt/notesSlides/notesSlide", "xml").unwrap().as_str(),
            "/ppt/notesSlides/notesSlide1.xml"
        );
    }

    #[test]
    fn test_drop_unreachable_parts() {
        let mut pkg = sample_package();
        let slide = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        let pres = PackURI::new("/ppt/presentation.xml").unwrap();

        pkg.get_part_mut(&pres).unwrap().rels_mut().retain(|_| false);
        let removed = pkg.drop_unreachable_parts();

        assert_eq!(removed.len(), 2);
        assert!(!pkg.contains_part(&slide));
        assert!(pkg.contains_part(&pres));
    }
}
