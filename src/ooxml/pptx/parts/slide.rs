/// Slide layout and slide master parts.
///
/// A slide inherits placeholder geometry and text-body settings from its
/// layout, which inherits from its master. These types expose the pieces of
/// that chain the deck model needs: the layout's placeholders (to seed a
/// new slide) and a resolver for inherited placeholder properties.
use crate::ooxml::error::Result;
use crate::ooxml::opc::OpcPackage;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::pptx::shapes::{Geometry, PlaceholderInfo, Shape, ShapeType};
use crate::ooxml::pptx::slide::SHAPE_TREE_PATH;
use crate::ooxml::xml::{XmlDocument, XmlElement};

/// Inheritable properties of one layout or master placeholder.
#[derive(Debug, Clone)]
pub struct PlaceholderTemplate {
    pub info: PlaceholderInfo,
    pub name: String,
    pub geometry: Option<Geometry>,
    /// The placeholder's `a:bodyPr`, if it has a text body.
    pub body_pr: Option<XmlElement>,
}

impl PlaceholderTemplate {
    fn from_shape(shape: Shape<'_>) -> Option<Self> {
        if shape.shape_type() != ShapeType::Shape {
            return None;
        }
        Some(Self {
            info: shape.placeholder()?,
            name: shape.name().to_string(),
            geometry: shape.own_geometry(),
            body_pr: shape.text_body().and_then(|b| b.child("a:bodyPr")).cloned(),
        })
    }
}

fn placeholder_templates(xml: &XmlDocument) -> Vec<PlaceholderTemplate> {
    xml.root()
        .path(&SHAPE_TREE_PATH)
        .map(|tree| {
            tree.elements()
                .filter_map(Shape::from_element)
                .filter_map(PlaceholderTemplate::from_shape)
                .collect()
        })
        .unwrap_or_default()
}

/// Partname of the part `source` relates to with `reltype`.
pub fn related_partname(
    package: &OpcPackage,
    source: &PackURI,
    reltype: &str,
) -> Result<PackURI> {
    Ok(package
        .get_part(source)?
        .rels()
        .part_with_reltype(reltype)?
        .target_partname()?)
}

/// A slide layout part (`/ppt/slideLayouts/slideLayoutN.xml`).
#[derive(Debug, Clone)]
pub struct SlideLayoutPart {
    partname: PackURI,
    xml: XmlDocument,
}

impl SlideLayoutPart {
    pub fn load(package: &OpcPackage, partname: &PackURI) -> Result<Self> {
        Ok(Self {
            partname: partname.clone(),
            xml: XmlDocument::parse(package.get_part(partname)?.blob())?,
        })
    }

    /// Layout used by the slide at `slide_partname`.
    pub fn for_slide(package: &OpcPackage, slide_partname: &PackURI) -> Result<Self> {
        let partname = related_partname(package, slide_partname, rt::SLIDE_LAYOUT)?;
        Self::load(package, &partname)
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    /// Layout name from `p:cSld/@name`.
    pub fn name(&self) -> &str {
        self.xml
            .root()
            .child("p:cSld")
            .and_then(|c| c.attr("name"))
            .unwrap_or("")
    }

    pub fn master_partname(&self, package: &OpcPackage) -> Result<PackURI> {
        related_partname(package, &self.partname, rt::SLIDE_MASTER)
    }

    pub fn placeholders(&self) -> Vec<PlaceholderTemplate> {
        placeholder_templates(&self.xml)
    }

    /// Placeholder shapes a new slide based on this layout starts with.
    ///
    /// Date, footer and slide-number placeholders are not instantiated.
    /// Each clone placeholder carries only its identity; position, size and
    /// formatting stay inherited from the layout.
    pub fn instantiate_placeholders(&self) -> Vec<XmlElement> {
        self.placeholders()
            .into_iter()
            .filter(|ph| !ph.info.is_chrome())
            .enumerate()
            .map(|(i, ph)| new_placeholder_sp(i as u32 + 2, &ph))
            .collect()
    }
}

fn new_placeholder_sp(id: u32, template: &PlaceholderTemplate) -> XmlElement {
    let mut ph = XmlElement::new("p:ph");
    if let Some(ph_type) = &template.info.ph_type {
        ph.set_attr("type", ph_type.clone());
    }
    if let Some(idx) = template.info.idx {
        ph.set_attr("idx", idx.to_string());
    }

    let nv_sp_pr = XmlElement::new("p:nvSpPr")
        .with_child(
            XmlElement::new("p:cNvPr")
                .with_attr("id", id.to_string())
                .with_attr("name", template.name.clone()),
        )
        .with_child(
            XmlElement::new("p:cNvSpPr")
                .with_child(XmlElement::new("a:spLocks").with_attr("noGrp", "1")),
        )
        .with_child(XmlElement::new("p:nvPr").with_child(ph));

    XmlElement::new("p:sp")
        .with_child(nv_sp_pr)
        .with_child(XmlElement::new("p:spPr"))
}

/// A slide master part (`/ppt/slideMasters/slideMasterN.xml`).
#[derive(Debug, Clone)]
pub struct SlideMasterPart {
    partname: PackURI,
    xml: XmlDocument,
}

impl SlideMasterPart {
    pub fn load(package: &OpcPackage, partname: &PackURI) -> Result<Self> {
        Ok(Self {
            partname: partname.clone(),
            xml: XmlDocument::parse(package.get_part(partname)?.blob())?,
        })
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    pub fn placeholders(&self) -> Vec<PlaceholderTemplate> {
        placeholder_templates(&self.xml)
    }
}

/// Placeholder properties a slide can inherit, from its layout and master.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderInheritance {
    layout: Vec<PlaceholderTemplate>,
    master: Vec<PlaceholderTemplate>,
}

impl PlaceholderInheritance {
    pub fn new(layout: Vec<PlaceholderTemplate>, master: Vec<PlaceholderTemplate>) -> Self {
        Self { layout, master }
    }

    /// Load the chain for a slide. A slide without a layout, or a layout
    /// without a master, inherits nothing from the missing levels.
    pub fn for_slide(package: &OpcPackage, slide_partname: &PackURI) -> Result<Self> {
        let Ok(layout) = SlideLayoutPart::for_slide(package, slide_partname) else {
            return Ok(Self::default());
        };
        let master = match layout.master_partname(package) {
            Ok(partname) => SlideMasterPart::load(package, &partname)?.placeholders(),
            Err(_) => Vec::new(),
        };
        Ok(Self::new(layout.placeholders(), master))
    }

    /// Layout placeholder matching by `idx`, then by type.
    pub fn layout_match(&self, info: &PlaceholderInfo) -> Option<&PlaceholderTemplate> {
        self.layout
            .iter()
            .find(|ph| ph.info.same_idx(info))
            .or_else(|| self.layout.iter().find(|ph| ph.info.same_type(info)))
    }

    /// Master placeholder matching by master type.
    pub fn master_match(&self, info: &PlaceholderInfo) -> Option<&PlaceholderTemplate> {
        let wanted = info.master_type();
        self.master.iter().find(|ph| ph.info.master_type() == wanted)
    }

    /// First geometry found walking layout then master.
    pub fn geometry(&self, info: &PlaceholderInfo) -> Option<Geometry> {
        let layout = self.layout_match(info);
        layout
            .and_then(|ph| ph.geometry)
            .or_else(|| self.master_match(layout.map_or(info, |ph| &ph.info))?.geometry)
    }

    /// Inherited `a:bodyPr` attribute, walking layout then master.
    pub fn body_attr(&self, info: &PlaceholderInfo, key: &str) -> Option<&str> {
        let layout = self.layout_match(info);
        layout
            .and_then(|ph| ph.body_pr.as_ref()?.attr(key))
            .or_else(|| {
                self.master_match(layout.map_or(info, |ph| &ph.info))?
                    .body_pr
                    .as_ref()?
                    .attr(key)
            })
    }

    /// Inherited `a:bodyPr` child (such as `a:spAutoFit`), walking layout
    /// then master.
    pub fn body_child(&self, info: &PlaceholderInfo, name: &str) -> Option<&XmlElement> {
        let layout = self.layout_match(info);
        layout
            .and_then(|ph| ph.body_pr.as_ref()?.child(name))
            .or_else(|| {
                self.master_match(layout.map_or(info, |ph| &ph.info))?
                    .body_pr
                    .as_ref()?
                    .child(name)
            })
    }
}

/// Skeleton of a new slide modelled on `source` and seeded from `layout`.
///
/// The root keeps the source's attributes (namespace declarations, `show`),
/// `p:cSld` keeps its name and background, and the shape tree holds the
/// source's group properties plus the layout's instantiated placeholders.
/// The colour-map override and transition are carried over.
pub fn new_slide_xml(source: &XmlElement, layout: &SlideLayoutPart) -> XmlDocument {
    let mut root = XmlElement::new(source.name());
    *root.attrs_mut() = source.attrs().to_vec();

    let source_csld = source.child("p:cSld");
    let mut csld = XmlElement::new("p:cSld");
    if let Some(src) = source_csld {
        *csld.attrs_mut() = src.attrs().to_vec();
        if let Some(bg) = src.child("p:bg") {
            csld.push(bg.clone());
        }
    }

    let source_tree = source.path(&SHAPE_TREE_PATH);
    let mut tree = XmlElement::new("p:spTree");
    tree.push(
        source_tree
            .and_then(|t| t.child("p:nvGrpSpPr"))
            .cloned()
            .unwrap_or_else(default_nv_grp_sp_pr),
    );
    tree.push(
        source_tree
            .and_then(|t| t.child("p:grpSpPr"))
            .cloned()
            .unwrap_or_else(|| XmlElement::new("p:grpSpPr")),
    );
    for placeholder in layout.instantiate_placeholders() {
        tree.push(placeholder);
    }
    csld.push(tree);
    root.push(csld);

    root.push(source.child("p:clrMapOvr").cloned().unwrap_or_else(|| {
        XmlElement::new("p:clrMapOvr").with_child(XmlElement::new("a:masterClrMapping"))
    }));
    if let Some(transition) = source.child("p:transition") {
        root.push(transition.clone());
    }

    XmlDocument::new(root)
}

fn default_nv_grp_sp_pr() -> XmlElement {
    XmlElement::new("p:nvGrpSpPr")
        .with_child(
            XmlElement::new("p:cNvPr")
                .with_attr("id", "1")
                .with_attr("name", ""),
        )
        .with_child(XmlElement::new("p:cNvGrpSpPr"))
        .with_child(XmlElement::new("p:nvPr"))
}
