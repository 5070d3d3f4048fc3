/// Base shape types for PowerPoint presentations.
use crate::ooxml::xml::XmlElement;

/// Shape type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    /// An autoshape or text box (p:sp)
    Shape,
    /// A picture shape (p:pic)
    Picture,
    /// A graphic frame containing a table or chart (p:graphicFrame)
    GraphicFrame,
    /// A group shape (p:grpSp)
    GroupShape,
    /// A connector shape (p:cxnSp)
    Connector,
    /// An ink or content part (p:contentPart)
    ContentPart,
}

impl ShapeType {
    /// Shape type for an element name, if the element is a shape.
    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "p:sp" => Some(Self::Shape),
            "p:pic" => Some(Self::Picture),
            "p:graphicFrame" => Some(Self::GraphicFrame),
            "p:grpSp" => Some(Self::GroupShape),
            "p:cxnSp" => Some(Self::Connector),
            "p:contentPart" => Some(Self::ContentPart),
            _ => None,
        }
    }
}

/// Position and size in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Geometry {
    /// Read `a:off`/`a:ext` from an `a:xfrm` or `p:xfrm` element.
    pub fn from_xfrm(xfrm: &XmlElement) -> Option<Self> {
        let off = xfrm.child("a:off")?;
        let ext = xfrm.child("a:ext")?;
        let num = |el: &XmlElement, key: &str| -> Option<i64> { el.attr(key)?.parse().ok() };
        Some(Self {
            left: num(off, "x")?,
            top: num(off, "y")?,
            width: num(ext, "cx")?,
            height: num(ext, "cy")?,
        })
    }

    #[inline]
    pub fn bottom(&self) -> i64 {
        self.top + self.height
    }
}

/// Placeholder identity from `p:nvPr/p:ph`.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct PlaceholderInfo {
    /// `type` attribute; absent means an object (content) placeholder
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ph_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idx: Option<u32>,
}

impl PlaceholderInfo {
    /// Effective type, defaulting to `obj` as the schema does.
    pub fn effective_type(&self) -> &str {
        self.ph_type.as_deref().unwrap_or("obj")
    }

    /// Slide number, date and footer placeholders.
    pub fn is_chrome(&self) -> bool {
        matches!(self.effective_type(), "sldNum" | "dt" | "ftr" | "hdr")
    }

    /// Same `idx` on both sides.
    pub fn same_idx(&self, other: &PlaceholderInfo) -> bool {
        matches!((self.idx, other.idx), (Some(a), Some(b)) if a == b)
    }

    /// Same role, treating `ctrTitle` as `title`.
    pub fn same_type(&self, other: &PlaceholderInfo) -> bool {
        layout_type(self.effective_type()) == layout_type(other.effective_type())
    }

    /// Master placeholder type this placeholder inherits from.
    pub fn master_type(&self) -> &str {
        match self.effective_type() {
            "ctrTitle" | "title" => "title",
            "subTitle" | "obj" | "body" => "body",
            other => other,
        }
    }
}

fn layout_type(ph_type: &str) -> &str {
    match ph_type {
        "ctrTitle" => "title",
        other => other,
    }
}

/// A read-only view of one shape element in a shape tree.
#[derive(Debug, Clone, Copy)]
pub struct Shape<'a> {
    element: &'a XmlElement,
    shape_type: ShapeType,
}

impl<'a> Shape<'a> {
    /// Wrap an element if it is a shape.
    pub fn from_element(element: &'a XmlElement) -> Option<Self> {
        let shape_type = ShapeType::from_element_name(element.name())?;
        Some(Self {
            element,
            shape_type,
        })
    }

    #[inline]
    pub fn element(&self) -> &'a XmlElement {
        self.element
    }

    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// The `p:nv*Pr` non-visual properties container.
    fn nv_props(&self) -> Option<&'a XmlElement> {
        self.element
            .elements()
            .find(|e| e.name().starts_with("p:nv") && e.name().ends_with("Pr"))
    }

    /// Shape id from `p:cNvPr/@id`.
    pub fn id(&self) -> Option<u32> {
        self.nv_props()?.child("p:cNvPr")?.attr("id")?.parse().ok()
    }

    /// Shape name from `p:cNvPr/@name`.
    pub fn name(&self) -> &'a str {
        self.nv_props()
            .and_then(|nv| nv.child("p:cNvPr"))
            .and_then(|c| c.attr("name"))
            .unwrap_or("")
    }

    pub fn placeholder(&self) -> Option<PlaceholderInfo> {
        let ph = self.nv_props()?.child("p:nvPr")?.child("p:ph")?;
        Some(PlaceholderInfo {
            ph_type: ph.attr("type").map(str::to_string),
            idx: ph.attr("idx").and_then(|v| v.parse().ok()),
        })
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder().is_some()
    }

    /// Whether this is a text box (`p:cNvSpPr/@txBox="1"`).
    pub fn is_text_box(&self) -> bool {
        self.nv_props()
            .and_then(|nv| nv.child("p:cNvSpPr"))
            .and_then(|c| c.attr("txBox"))
            .is_some_and(|v| v == "1" || v == "true")
    }

    /// Geometry written on the shape itself, without inheritance.
    pub fn own_geometry(&self) -> Option<Geometry> {
        let xfrm = match self.shape_type {
            ShapeType::GraphicFrame => self.element.child("p:xfrm"),
            ShapeType::GroupShape => self.element.path(&["p:grpSpPr", "a:xfrm"]),
            _ => self.element.path(&["p:spPr", "a:xfrm"]),
        }?;
        Geometry::from_xfrm(xfrm)
    }

    /// The `p:txBody` text container, if any.
    pub fn text_body(&self) -> Option<&'a XmlElement> {
        self.element.child("p:txBody")
    }

    pub fn has_text_frame(&self) -> bool {
        self.text_body().is_some()
    }

    /// Concatenated text of every paragraph, newline separated.
    pub fn text(&self) -> String {
        self.text_body()
            .map(|body| super::TextFrame::new(body).text())
            .unwrap_or_default()
    }
}

/// Visit every shape of a shape tree in document order, descending into
/// groups. The callback receives the element-index path from the tree root.
pub fn walk_shapes<'a>(tree: &'a XmlElement, f: &mut impl FnMut(&[usize], Shape<'a>)) {
    let mut path = Vec::new();
    walk_inner(tree, &mut path, f);
}

fn walk_inner<'a>(
    container: &'a XmlElement,
    path: &mut Vec<usize>,
    f: &mut impl FnMut(&[usize], Shape<'a>),
) {
    for (i, child) in container.elements().enumerate() {
        let Some(shape) = Shape::from_element(child) else {
            continue;
        };
        path.push(i);
        f(path.as_slice(), shape);
        if shape.shape_type() == ShapeType::GroupShape {
            walk_inner(child, path, f);
        }
        path.pop();
    }
}

/// Element at an element-index path produced by [`walk_shapes`].
pub fn shape_at_path_mut<'a>(
    tree: &'a mut XmlElement,
    path: &[usize],
) -> Option<&'a mut XmlElement> {
    let mut el = tree;
    for &i in path {
        el = el.elements_mut().nth(i)?;
    }
    Some(el)
}
