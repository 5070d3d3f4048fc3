//! Presentation sections (`p14:sectionLst`).
//!
//! Sections group slides by `p:sldId/@id`. PowerPoint requires every
//! section to cover a contiguous run of slides, so after a deck is recomposed
//! the list is regrouped from the final slide order instead of being edited
//! in place.

use crate::ooxml::xml::XmlElement;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

/// `p:ext/@uri` of the section list extension.
pub const SECTION_LIST_EXT_URI: &str = "{521415D9-36F7-43E2-AB2F-B90AF26B5E84}";

/// A section in a presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section name
    pub name: String,
    /// Section ID (GUID format)
    pub id: String,
    /// Slide IDs in this section
    pub slide_ids: Vec<u32>,
}

impl Section {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            slide_ids: Vec::new(),
        }
    }

    /// Create a section with slide IDs.
    pub fn with_slides(mut self, slide_ids: impl IntoIterator<Item = u32>) -> Self {
        self.slide_ids.extend(slide_ids);
        self
    }

    fn to_element(&self, prefix: &str) -> XmlElement {
        let mut list = XmlElement::new(format!("{prefix}:sldIdLst"));
        for id in &self.slide_ids {
            list.push(XmlElement::new(format!("{prefix}:sldId")).with_attr("id", id.to_string()));
        }
        XmlElement::new(format!("{prefix}:section"))
            .with_attr("name", self.name.clone())
            .with_attr("id", self.id.clone())
            .with_child(list)
    }
}

/// Sections of a presentation, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionList {
    sections: Vec<Section>,
}

impl SectionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Read a `sectionLst` element, whatever prefix it carries.
    pub fn from_element(section_lst: &XmlElement) -> Self {
        let sections = section_lst
            .elements()
            .filter(|e| e.local_name() == "section")
            .map(|e| {
                let ids = e
                    .elements()
                    .filter(|c| c.local_name() == "sldIdLst")
                    .flat_map(|list| list.elements())
                    .filter(|c| c.local_name() == "sldId")
                    .filter_map(|c| c.attr("id")?.parse().ok());
                Section::new(e.attr("name").unwrap_or(""), e.attr("id").unwrap_or(""))
                    .with_slides(ids)
            })
            .collect();
        Self { sections }
    }

    /// Write the sections as children of `section_lst`, replacing its
    /// current content but keeping its own attributes and namespace
    /// declarations.
    pub fn write_into(&self, section_lst: &mut XmlElement) {
        let prefix = match section_lst.name().find(':') {
            Some(pos) => section_lst.name()[..pos].to_string(),
            None => "p14".to_string(),
        };
        section_lst.children_mut().clear();
        for section in &self.sections {
            section_lst.push(section.to_element(&prefix));
        }
    }

    /// Regroup sections for a new slide order.
    ///
    /// `order` lists, for each final slide, its new `sldId` and the `sldId`
    /// of the loaded slide its content comes from. Consecutive slides whose
    /// source belongs to the same section form one section. The first run of
    /// a section keeps its GUID; later runs of the same section get a GUID
    /// derived from the original one and the run number. Slides whose source
    /// is in no section join the preceding run. Sections left without slides
    /// are kept, placed after the runs of the sections that preceded them.
    pub fn regroup(&self, order: &[(u32, u32)]) -> SectionList {
        if self.sections.is_empty() {
            return SectionList::new();
        }

        let owner: HashMap<u32, usize> = self
            .sections
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.slide_ids.iter().map(move |id| (*id, i)))
            .collect();

        // (source section index, slide ids)
        let mut runs: Vec<(usize, Vec<u32>)> = Vec::new();
        for &(new_id, source_id) in order {
            let section = owner
                .get(&source_id)
                .copied()
                .or_else(|| runs.last().map(|(s, _)| *s))
                .unwrap_or(0);
            match runs.last_mut() {
                Some((s, ids)) if *s == section => ids.push(new_id),
                _ => runs.push((section, vec![new_id])),
            }
        }

        for index in 0..self.sections.len() {
            if runs.iter().any(|(s, _)| *s == index) {
                continue;
            }
            let at = runs
                .iter()
                .rposition(|(s, _)| *s < index)
                .map_or(0, |p| p + 1);
            runs.insert(at, (index, Vec::new()));
        }

        let mut seen: HashMap<usize, u32> = HashMap::new();
        let sections = runs
            .into_iter()
            .map(|(index, ids)| {
                let source = &self.sections[index];
                let repeat = seen.entry(index).or_insert(0);
                let id = if *repeat == 0 {
                    source.id.clone()
                } else {
                    derived_guid(&source.id, *repeat)
                };
                *repeat += 1;
                Section::new(source.name.clone(), id).with_slides(ids)
            })
            .collect();
        SectionList { sections }
    }
}

/// A braced uppercase GUID derived from a section GUID and a run number.
fn derived_guid(base: &str, run: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    hasher.update(run.to_le_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(32);
    for byte in &digest[..16] {
        let _ = write!(hex, "{:02X}", byte);
    }
    format!(
        "{{{}-{}-{}-{}-{}}}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xml::XmlDocument;

    fn two_sections() -> SectionList {
        let mut list = SectionList::new();
        list.add_section(Section::new("Intro", "{A}").with_slides([256, 257]));
        list.add_section(Section::new("Body", "{B}").with_slides([258]));
        list
    }

    #[test]
    fn test_from_element() {
        let xml = br#"<p14:sectionLst xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main"><p14:section name="Intro" id="{A}"><p14:sldIdLst><p14:sldId id="256"/><p14:sldId id="257"/></p14:sldIdLst></p14:section><p14:section name="Empty" id="{C}"><p14:sldIdLst/></p14:section></p14:sectionLst>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let list = SectionList::from_element(doc.root());
        assert_eq!(list.len(), 2);
        assert_eq!(list.sections()[0].slide_ids, vec![256, 257]);
        assert!(list.sections()[1].slide_ids.is_empty());
    }

    #[test]
    fn test_regroup_identity_keeps_sections() {
        let list = two_sections();
        let regrouped = list.regroup(&[(256, 256), (257, 257), (258, 258)]);
        assert_eq!(regrouped, list);
    }

    #[test]
    fn test_regroup_drops_deleted_and_keeps_empty_section() {
        let list = two_sections();
        let regrouped = list.regroup(&[(256, 256)]);
        assert_eq!(regrouped.len(), 2);
        assert_eq!(regrouped.sections()[0].slide_ids, vec![256]);
        assert_eq!(regrouped.sections()[1].name, "Body");
        assert!(regrouped.sections()[1].slide_ids.is_empty());
    }

    #[test]
    fn test_regroup_split_section_gets_new_guid() {
        let list = two_sections();
        // Intro, Body, Intro again (clone of 256 as 259)
        let regrouped = list.regroup(&[(256, 256), (258, 258), (259, 256)]);
        let sections = regrouped.sections();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].id, "{A}");
        assert_eq!(sections[2].name, "Intro");
        assert_ne!(sections[2].id, "{A}");
        assert_eq!(sections[2].id.len(), 38);
        assert_eq!(sections[2].slide_ids, vec![259]);
        // deterministic
        assert_eq!(derived_guid("{A}", 1), sections[2].id);
    }

    #[test]
    fn test_write_into_keeps_prefix() {
        let mut lst = XmlElement::new("p14:sectionLst").with_attr("xmlns:p14", "urn:x");
        two_sections().write_into(&mut lst);
        assert_eq!(lst.attr("xmlns:p14"), Some("urn:x"));
        let xml = lst.to_xml_string();
        assert!(xml.contains(r#"<p14:section name="Intro" id="{A}">"#));
        assert!(xml.contains(r#"<p14:sldId id="258"/>"#));
    }
}
