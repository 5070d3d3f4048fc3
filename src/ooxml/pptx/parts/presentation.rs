/// Presentation part - the main part in a .pptx package.
///
/// Corresponds to `/ppt/presentation.xml` in the package.
use crate::ooxml::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::Part;
use crate::ooxml::pptx::sections::{SECTION_LIST_EXT_URI, SectionList};
use crate::ooxml::xml::{XmlDocument, XmlElement};
use std::collections::HashSet;

/// Children of `p:presentation` in schema order.
const PRESENTATION_ORDER: &[&str] = &[
    "p:sldMasterIdLst",
    "p:notesMasterIdLst",
    "p:handoutMasterIdLst",
    "p:sldIdLst",
    "p:sldSz",
    "p:notesSz",
    "p:smartTags",
    "p:embeddedFontLst",
    "p:custShowLst",
    "p:photoAlbum",
    "p:custDataLst",
    "p:kinsoku",
    "p:defaultTextStyle",
    "p:modifyVerifier",
    "p:extLst",
];

/// The main presentation part, parsed.
///
/// Holds the presentation-level slide list (`p:sldIdLst`), the slide size,
/// custom shows and the section list extension.
#[derive(Debug, Clone)]
pub struct PresentationPart {
    partname: PackURI,
    xml: XmlDocument,
}

impl PresentationPart {
    /// Parse a PresentationPart from an OPC Part.
    pub fn from_part(part: &Part) -> Result<Self> {
        Ok(Self {
            partname: part.partname().clone(),
            xml: XmlDocument::parse(part.blob())?,
        })
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn xml(&self) -> &XmlDocument {
        &self.xml
    }

    /// `p:sldId` entries in deck order.
    pub fn slide_id_entries(&self) -> Vec<&XmlElement> {
        self.xml
            .root()
            .child("p:sldIdLst")
            .map(|lst| lst.children_named("p:sldId").collect())
            .unwrap_or_default()
    }

    /// Prefix bound to the officeDocument relationships namespace on the
    /// root element, `r` when undeclared.
    pub fn relationship_prefix(&self) -> String {
        relationship_prefix(self.xml.root())
    }

    /// Slide size in EMUs from `p:sldSz`.
    pub fn slide_size(&self) -> Option<(i64, i64)> {
        let size = self.xml.root().child("p:sldSz")?;
        Some((size.attr("cx")?.parse().ok()?, size.attr("cy")?.parse().ok()?))
    }

    /// Replace the slide list. An empty list removes `p:sldIdLst`, which
    /// the schema requires to be non-empty when present.
    pub fn set_slide_ids(&mut self, entries: Vec<XmlElement>) {
        let root = self.xml.root_mut();
        root.remove_children("p:sldIdLst");
        if entries.is_empty() {
            return;
        }
        let mut lst = XmlElement::new("p:sldIdLst");
        for entry in entries {
            lst.push(entry);
        }
        root.insert_ordered(lst, PRESENTATION_ORDER);
    }

    /// Remove custom-show entries that point at slide relationships not in
    /// `live_r_ids`. Returns the number of removed entries.
    pub fn prune_custom_shows(&mut self, live_r_ids: &HashSet<String>) -> usize {
        let r_attr = format!("{}:id", self.relationship_prefix());
        let mut removed = 0;
        if let Some(shows) = self.xml.root_mut().child_mut("p:custShowLst") {
            for show in shows.elements_mut() {
                if let Some(lst) = show.child_mut("p:sldLst") {
                    lst.retain_elements(|sld| {
                        let keep = sld.attr(&r_attr).is_none_or(|id| live_r_ids.contains(id));
                        if !keep {
                            removed += 1;
                        }
                        keep
                    });
                }
            }
        }
        removed
    }

    fn section_list_element(&self) -> Option<&XmlElement> {
        self.xml
            .root()
            .child("p:extLst")?
            .children_named("p:ext")
            .find(|ext| ext.attr("uri") == Some(SECTION_LIST_EXT_URI))?
            .elements()
            .find(|e| e.local_name() == "sectionLst")
    }

    fn section_list_element_mut(&mut self) -> Option<&mut XmlElement> {
        self.xml
            .root_mut()
            .child_mut("p:extLst")?
            .elements_mut()
            .find(|ext| ext.is("p:ext") && ext.attr("uri") == Some(SECTION_LIST_EXT_URI))?
            .elements_mut()
            .find(|e| e.local_name() == "sectionLst")
    }

    /// Sections of the deck; empty when the deck has none.
    pub fn sections(&self) -> SectionList {
        self.section_list_element()
            .map(SectionList::from_element)
            .unwrap_or_default()
    }

    /// Rewrite the section list. Does nothing for a deck without one.
    pub fn set_sections(&mut self, sections: &SectionList) {
        if let Some(lst) = self.section_list_element_mut() {
            sections.write_into(lst);
        }
    }

    pub fn to_xml_bytes(&self) -> Vec<u8> {
        self.xml.to_xml_bytes()
    }
}

/// Prefix an element's namespace declarations bind to the officeDocument
/// relationships namespace, `r` when undeclared.
pub(crate) fn relationship_prefix(root: &XmlElement) -> String {
    use crate::ooxml::opc::constants::namespace::OFC_RELATIONSHIPS;
    root.attrs()
        .iter()
        .find(|(key, value)| key.starts_with("xmlns:") && value == OFC_RELATIONSHIPS)
        .map(|(key, _)| key["xmlns:".len()..].to_string())
        .unwrap_or_else(|| "r".to_string())
}
