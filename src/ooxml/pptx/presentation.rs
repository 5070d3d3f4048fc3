/// Main presentation object - the high-level API for working with a deck.
use crate::common::output::write_atomically;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::OpcPackage;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::media::MediaPool;
use crate::ooxml::pptx::package::main_presentation_part;
use crate::ooxml::pptx::parts::presentation::relationship_prefix;
use crate::ooxml::pptx::parts::{
    PlaceholderInheritance, PresentationPart, SlideLayoutPart, new_slide_xml,
};
use crate::ooxml::pptx::shapes::{Shape, ShapeType};
use crate::ooxml::pptx::slide::{SHAPE_TREE_PATH, Slide, SlideKey};
use crate::ooxml::xml::{XmlDocument, XmlElement};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Smallest `p:sldId/@id` the schema allows.
const MIN_SLIDE_ID: u32 = 256;

/// Relationship types a cloned slide never inherits from its source.
const SLIDE_SCOPED_RELTYPES: &[&str] = &[rt::SLIDE_LAYOUT, rt::NOTES_SLIDE];

/// Relationship types dropped from an edited slide once nothing in its XML
/// references them.
const PRUNABLE_RELTYPES: &[&str] = &[rt::IMAGE, rt::HYPERLINK, rt::MEDIA, rt::AUDIO, rt::VIDEO];

/// Options for [`Presentation::save_to_bytes`].
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    /// Drop parts no relationship chain reaches any more (notes of deleted
    /// slides, media only they used).
    pub prune_orphans: bool,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prune_orphans(mut self, prune: bool) -> Self {
        self.prune_orphans = prune;
        self
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            prune_orphans: true,
        }
    }
}

/// A PowerPoint presentation held entirely in memory.
///
/// Slides are addressed by [`SlideKey`]. The deck order is a list of keys;
/// deleting a slide removes its key and reordering permutes the list, so a
/// key obtained before any structural edit keeps naming the same slide
/// afterwards. Nothing touches the package's parts until
/// [`Presentation::save_to_bytes`], which writes slides back, rebuilds the
/// slide list and drops whatever the edits orphaned.
///
/// # Examples
///
/// ```rust,no_run
/// use deckweave::ooxml::pptx::{Presentation, SaveOptions};
///
/// let mut pres = Presentation::open("deck.pptx")?;
/// let first = pres.slide_keys()[0];
/// let copy = pres.duplicate_slide(first)?;
/// pres.move_slide(copy, 1)?;
/// pres.save("out.pptx", &SaveOptions::default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Presentation {
    package: OpcPackage,
    part: PresentationPart,
    slides: HashMap<SlideKey, Slide>,
    order: Vec<SlideKey>,
    /// `sldId` each loaded slide had when the deck was opened
    loaded_ids: HashMap<SlideKey, u32>,
    next_key: u32,
}

impl Presentation {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(OpcPackage::open(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_package(OpcPackage::from_bytes(data)?)
    }

    /// Build the deck model over a loaded package.
    ///
    /// The main part must be a presentation, macro-enabled presentation,
    /// template or slideshow.
    pub fn from_package(package: OpcPackage) -> Result<Self> {
        let main = main_presentation_part(&package)?;
        let part = PresentationPart::from_part(main)?;
        let r_attr = format!("{}:id", part.relationship_prefix());

        let mut slides = HashMap::new();
        let mut order = Vec::new();
        let mut loaded_ids = HashMap::new();
        let mut next_key = 0u32;

        for entry in part.slide_id_entries() {
            let r_id = entry.attr(&r_attr).ok_or_else(|| {
                OoxmlError::InvalidFormat("p:sldId without a relationship id".to_string())
            })?;
            let partname = main.related_partname(r_id)?;
            let xml = XmlDocument::parse(package.get_part(&partname)?.blob())?;

            let key = SlideKey(next_key);
            next_key += 1;
            let slide = Slide::new(key, key, partname, r_id.to_string(), entry.clone(), xml);
            loaded_ids.insert(key, slide.slide_id());
            order.push(key);
            slides.insert(key, slide);
        }

        tracing::debug!(slides = order.len(), "loaded presentation");

        Ok(Self {
            package,
            part,
            slides,
            order,
            loaded_ids,
            next_key,
        })
    }

    #[inline]
    pub fn package(&self) -> &OpcPackage {
        &self.package
    }

    #[inline]
    pub fn presentation_part(&self) -> &PresentationPart {
        &self.part
    }

    /// Slide width and height in EMUs.
    pub fn slide_size(&self) -> Option<(i64, i64)> {
        self.part.slide_size()
    }

    #[inline]
    pub fn slide_count(&self) -> usize {
        self.order.len()
    }

    /// Slide keys in deck order.
    #[inline]
    pub fn slide_keys(&self) -> &[SlideKey] {
        &self.order
    }

    pub fn slide(&self, key: SlideKey) -> Option<&Slide> {
        self.slides.get(&key)
    }

    pub fn slide_mut(&mut self, key: SlideKey) -> Option<&mut Slide> {
        self.slides.get_mut(&key)
    }

    /// Slide at a deck position.
    pub fn slide_at(&self, index: usize) -> Option<&Slide> {
        self.order.get(index).and_then(|key| self.slides.get(key))
    }

    /// Slides in deck order.
    pub fn slides(&self) -> impl Iterator<Item = &Slide> {
        self.order.iter().filter_map(|key| self.slides.get(key))
    }

    /// Deck position of a slide.
    pub fn position(&self, key: SlideKey) -> Option<usize> {
        self.order.iter().position(|k| *k == key)
    }

    /// Relationship table of a slide's part.
    pub fn slide_rels(&self, key: SlideKey) -> Result<&Relationships> {
        let slide = self.require(key)?;
        Ok(self.package.get_part(slide.partname())?.rels())
    }

    /// Placeholder properties the slide inherits from its layout and master.
    pub fn placeholder_inheritance(&self, key: SlideKey) -> Result<PlaceholderInheritance> {
        PlaceholderInheritance::for_slide(&self.package, self.require(key)?.partname())
    }

    /// Content-addressed view of the media the slides reference.
    pub fn media_pool(&self) -> Result<MediaPool> {
        MediaPool::from_presentation(self)
    }

    fn require(&self, key: SlideKey) -> Result<&Slide> {
        self.slides
            .get(&key)
            .ok_or_else(|| OoxmlError::UnknownSlide(key.to_string()))
    }

    /// Append an independent copy of a slide to the end of the deck.
    ///
    /// The copy is a new slide part on the source's layout. The layout's
    /// placeholders are instantiated and then removed, and every shape of
    /// the source (plus its background) is deep-copied. Relationships the
    /// copied XML references are re-minted in the copy's own table and
    /// bound to the same targets, so images and other parts are shared
    /// rather than duplicated. Notes are not copied.
    pub fn duplicate_slide(&mut self, source: SlideKey) -> Result<SlideKey> {
        let src = self.require(source)?;
        let layout = SlideLayoutPart::for_slide(&self.package, src.partname())?;
        let partname = self.package.next_partname("/ppt/slides/slide", "xml")?;

        let mut xml = new_slide_xml(src.xml().root(), &layout);
        let tree = xml
            .root_mut()
            .path_mut(&SHAPE_TREE_PATH)
            .ok_or_else(|| OoxmlError::InvalidFormat("slide without a shape tree".to_string()))?;
        tree.retain_elements(|e| {
            !Shape::from_element(e)
                .is_some_and(|s| s.shape_type() == ShapeType::Shape && s.is_placeholder())
        });
        if let Some(src_tree) = src.shape_tree() {
            for child in src_tree.elements() {
                if !matches!(child.name(), "p:nvGrpSpPr" | "p:grpSpPr") {
                    tree.push(child.clone());
                }
            }
        }

        let mut rels = Relationships::new(partname.base_uri().to_string());
        rels.add_internal(rt::SLIDE_LAYOUT, layout.partname());
        let src_rels = self.package.get_part(src.partname())?.rels();
        let prefix = format!("{}:", relationship_prefix(src.xml().root()));

        let mut referenced: SmallVec<[String; 8]> = SmallVec::new();
        xml.root().visit(&mut |el| {
            for (key, value) in el.attrs() {
                if key.starts_with(&prefix)
                    && src_rels.get(value).is_some()
                    && !referenced.contains(value)
                {
                    referenced.push(value.clone());
                }
            }
        });

        let mut remap: HashMap<String, String> = HashMap::new();
        for old in &referenced {
            let Some(rel) = src_rels.get(old) else {
                continue;
            };
            if SLIDE_SCOPED_RELTYPES.contains(&rel.reltype()) {
                continue;
            }
            let new = if rel.is_external() {
                rels.add_external(rel.reltype(), rel.target_ref())
            } else {
                rels.add_internal(rel.reltype(), &rel.target_partname()?)
            };
            remap.insert(old.clone(), new);
        }

        xml.root_mut().visit_mut(&mut |el| {
            for (key, value) in el.attrs_mut().iter_mut() {
                if key.starts_with(&prefix)
                    && let Some(new) = remap.get(value.as_str())
                {
                    *value = new.clone();
                }
            }
        });

        let origin = src.origin();
        let blob = xml.to_xml_bytes();
        self.package.add_part(Part::with_rels(
            partname.clone(),
            ct::PML_SLIDE.to_string(),
            blob,
            rels,
        ));

        let slide_id = self
            .slides
            .values()
            .map(Slide::slide_id)
            .max()
            .map_or(MIN_SLIDE_ID, |max| (max + 1).max(MIN_SLIDE_ID));
        let r_id = self
            .package
            .get_part_mut(self.part.partname())?
            .rels_mut()
            .add_internal(rt::SLIDE, &partname);
        let sld_id = XmlElement::new("p:sldId")
            .with_attr("id", slide_id.to_string())
            .with_attr(format!("{}:id", self.part.relationship_prefix()), r_id.clone());

        let key = SlideKey(self.next_key);
        self.next_key += 1;
        let mut slide = Slide::new(key, origin, partname, r_id, sld_id, xml);
        slide.mark_dirty();

        tracing::debug!(
            %source,
            clone = %key,
            part = %slide.partname(),
            rels = remap.len(),
            "duplicated slide"
        );

        self.slides.insert(key, slide);
        self.order.push(key);
        Ok(key)
    }

    /// Remove a slide from the deck.
    ///
    /// Its part stays in the package until the next save, which drops it
    /// with everything else it alone referenced.
    pub fn delete_slide(&mut self, key: SlideKey) -> Result<()> {
        let slide = self
            .slides
            .remove(&key)
            .ok_or_else(|| OoxmlError::UnknownSlide(key.to_string()))?;
        self.order.retain(|k| *k != key);
        self.package
            .get_part_mut(self.part.partname())?
            .rels_mut()
            .remove(slide.r_id());
        tracing::debug!(slide = %key, part = %slide.partname(), "deleted slide");
        Ok(())
    }

    /// Replace the deck order with a permutation of the current keys.
    pub fn set_order(&mut self, order: Vec<SlideKey>) -> Result<()> {
        let current: HashSet<SlideKey> = self.order.iter().copied().collect();
        let requested: HashSet<SlideKey> = order.iter().copied().collect();
        if order.len() != self.order.len() || requested != current {
            return Err(OoxmlError::InvalidFormat(format!(
                "new order must be a permutation of the {} slides in the deck",
                self.order.len()
            )));
        }
        self.order = order;
        Ok(())
    }

    /// Move a slide to a deck position, keeping the relative order of the
    /// others.
    pub fn move_slide(&mut self, key: SlideKey, to: usize) -> Result<()> {
        let from = self
            .position(key)
            .ok_or_else(|| OoxmlError::UnknownSlide(key.to_string()))?;
        if to >= self.order.len() {
            return Err(OoxmlError::InvalidFormat(format!(
                "position {} is past the end of a {}-slide deck",
                to,
                self.order.len()
            )));
        }
        let key = self.order.remove(from);
        self.order.insert(to, key);
        Ok(())
    }

    /// Write the deck back into its package and serialize it.
    pub fn save_to_bytes(&mut self, options: &SaveOptions) -> Result<Vec<u8>> {
        self.flush_slides()?;

        let entries = self
            .slides()
            .map(|s| s.slide_id_element().clone())
            .collect();
        self.part.set_slide_ids(entries);

        let live: HashSet<String> = self.slides().map(|s| s.r_id().to_string()).collect();
        let pres_partname = self.part.partname().clone();
        self.package
            .get_part_mut(&pres_partname)?
            .rels_mut()
            .retain(|rel| rel.reltype() != rt::SLIDE || live.contains(rel.r_id()));

        let sections = self.part.sections();
        if !sections.is_empty() {
            let order: Vec<(u32, u32)> = self
                .slides()
                .map(|s| {
                    let source = self.loaded_ids.get(&s.origin()).copied().unwrap_or(0);
                    (s.slide_id(), source)
                })
                .collect();
            self.part.set_sections(&sections.regroup(&order));
        }

        let removed_from_shows = self.part.prune_custom_shows(&live);
        if removed_from_shows > 0 {
            tracing::debug!(entries = removed_from_shows, "pruned custom shows");
        }

        let blob = self.part.to_xml_bytes();
        self.package.get_part_mut(&pres_partname)?.set_blob(blob);

        if options.prune_orphans {
            let dropped = self.package.drop_unreachable_parts();
            if !dropped.is_empty() {
                tracing::debug!(parts = dropped.len(), "dropped unreachable parts");
            }
        }

        Ok(self.package.to_bytes()?)
    }

    /// Save to a file, replacing it atomically.
    pub fn save<P: AsRef<Path>>(&mut self, path: P, options: &SaveOptions) -> Result<()> {
        let bytes = self.save_to_bytes(options)?;
        write_atomically(path.as_ref(), &bytes)?;
        Ok(())
    }

    /// Serialize edited slides into their parts and drop media and
    /// hyperlink relationships their XML no longer references.
    fn flush_slides(&mut self) -> Result<()> {
        for slide in self.slides.values_mut().filter(|s| s.is_dirty()) {
            let part = self.package.get_part_mut(slide.partname())?;
            part.set_blob(slide.xml().to_xml_bytes());

            let unused: Vec<String> = part
                .rels()
                .iter()
                .filter(|rel| PRUNABLE_RELTYPES.contains(&rel.reltype()))
                .filter(|rel| part.rel_ref_count(rel.r_id()) == 0)
                .map(|rel| rel.r_id().to_string())
                .collect();
            for r_id in &unused {
                part.rels_mut().remove(r_id);
            }
            slide.mark_clean();
        }
        Ok(())
    }

    /// Partname of the presentation part.
    pub fn partname(&self) -> &PackURI {
        self.part.partname()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{DeckBuilder, SlideFixture};

    fn titles(pres: &Presentation) -> Vec<String> {
        pres.slides().map(crate::testutil::slide_title).collect()
    }

    #[test]
    fn test_load_assigns_keys_in_deck_order() {
        let pres = Presentation::from_bytes(DeckBuilder::with_titles(3).build()).unwrap();
        assert_eq!(pres.slide_count(), 3);
        assert_eq!(titles(&pres), vec!["Slide 0", "Slide 1", "Slide 2"]);
        let keys = pres.slide_keys().to_vec();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(pres.slide_at(1).unwrap().slide_id(), 257);
        assert_eq!(pres.slide_size(), Some((9_144_000, 6_858_000)));
    }

    #[test]
    fn test_rejects_non_presentation_main_part() {
        let bytes = DeckBuilder::with_titles(1)
            .main_content_type(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
            )
            .build();
        let err = Presentation::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, OoxmlError::InvalidContentType { .. }));
    }

    #[test]
    fn test_duplicate_shares_media_under_new_rel() {
        let bytes = DeckBuilder::new()
            .slide(SlideFixture::new("Photo").body(["caption"]).with_picture())
            .build();
        let mut pres = Presentation::from_bytes(bytes).unwrap();
        let source = pres.slide_keys()[0];
        let clone = pres.duplicate_slide(source).unwrap();

        assert_eq!(pres.slide_count(), 2);
        assert_eq!(pres.slide(clone).unwrap().origin(), source);
        assert_eq!(pres.slide(clone).unwrap().text(), pres.slide(source).unwrap().text());
        assert_eq!(pres.slide(clone).unwrap().slide_id(), 257);

        let src_rels = pres.slide_rels(source).unwrap();
        let clone_rels = pres.slide_rels(clone).unwrap();
        let image_target = |rels: &Relationships| {
            rels.iter()
                .find(|r| r.reltype() == rt::IMAGE)
                .map(|r| r.target_partname().unwrap())
        };
        assert_eq!(image_target(src_rels), image_target(clone_rels));
        assert!(clone_rels.iter().any(|r| r.reltype() == rt::SLIDE_LAYOUT));
        assert!(!clone_rels.iter().any(|r| r.reltype() == rt::NOTES_SLIDE));

        let pool = pres.media_pool().unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_clone_edits_are_independent() {
        let mut pres = Presentation::from_bytes(DeckBuilder::with_titles(1).build()).unwrap();
        let source = pres.slide_keys()[0];
        let clone = pres.duplicate_slide(source).unwrap();

        crate::testutil::set_title(pres.slide_mut(clone).unwrap(), "Changed");
        assert_eq!(crate::testutil::slide_title(pres.slide(source).unwrap()), "Slide 0");

        let bytes = pres.save_to_bytes(&SaveOptions::default()).unwrap();
        let reopened = Presentation::from_bytes(bytes).unwrap();
        assert_eq!(titles(&reopened), vec!["Slide 0", "Changed"]);
    }

    #[test]
    fn test_delete_and_reorder_round_trip() {
        let mut pres = Presentation::from_bytes(DeckBuilder::with_titles(4).build()).unwrap();
        let keys = pres.slide_keys().to_vec();
        pres.delete_slide(keys[1]).unwrap();
        pres.set_order(vec![keys[3], keys[0], keys[2]]).unwrap();
        assert!(pres.set_order(vec![keys[0]]).is_err());
        assert!(pres.delete_slide(keys[1]).is_err());

        let bytes = pres.save_to_bytes(&SaveOptions::default()).unwrap();
        let reopened = Presentation::from_bytes(bytes).unwrap();
        assert_eq!(titles(&reopened), vec!["Slide 3", "Slide 0", "Slide 2"]);
        assert!(
            !reopened
                .package()
                .contains_part(&PackURI::new("/ppt/slides/slide2.xml").unwrap())
        );
    }

    #[test]
    fn test_prune_orphans_drops_notes_of_deleted_slides() {
        let bytes = DeckBuilder::new()
            .slide(SlideFixture::new("Keep"))
            .slide(SlideFixture::new("Drop").with_notes("speaker notes"))
            .build();
        let notes = PackURI::new("/ppt/notesSlides/notesSlide2.xml").unwrap();

        let mut pres = Presentation::from_bytes(bytes.clone()).unwrap();
        let drop = pres.slide_keys()[1];
        pres.delete_slide(drop).unwrap();
        let pruned = Presentation::from_bytes(pres.save_to_bytes(&SaveOptions::default()).unwrap())
            .unwrap();
        assert!(!pruned.package().contains_part(&notes));

        let mut pres = Presentation::from_bytes(bytes).unwrap();
        pres.delete_slide(drop).unwrap();
        let kept = pres
            .save_to_bytes(&SaveOptions::new().with_prune_orphans(false))
            .unwrap();
        let raw = crate::ooxml::opc::phys_pkg::PhysPkgReader::from_bytes(kept).unwrap();
        assert!(raw.contains(&notes));
    }

    #[test]
    fn test_move_slide() {
        let mut pres = Presentation::from_bytes(DeckBuilder::with_titles(3).build()).unwrap();
        let last = pres.slide_keys()[2];
        pres.move_slide(last, 0).unwrap();
        assert_eq!(titles(&pres), vec!["Slide 2", "Slide 0", "Slide 1"]);
        assert!(pres.move_slide(last, 3).is_err());
    }

    #[test]
    fn test_sections_follow_recomposed_order() {
        let bytes = DeckBuilder::with_titles(3)
            .sections(&[("Intro", &[0]), ("Main", &[1, 2])])
            .build();
        let mut pres = Presentation::from_bytes(bytes).unwrap();
        let keys = pres.slide_keys().to_vec();
        let clone = pres.duplicate_slide(keys[0]).unwrap();
        pres.delete_slide(keys[1]).unwrap();
        pres.set_order(vec![keys[0], keys[2], clone]).unwrap();

        let reopened =
            Presentation::from_bytes(pres.save_to_bytes(&SaveOptions::default()).unwrap()).unwrap();
        let sections = reopened.presentation_part().sections();
        let ids: Vec<Vec<u32>> = sections.sections().iter().map(|s| s.slide_ids.clone()).collect();
        assert_eq!(ids, vec![vec![256], vec![258], vec![259]]);
        assert_eq!(sections.sections()[2].name, "Intro");
    }
}
