use crate::common::xml::escape_xml;
use crate::ooxml::error::{OoxmlError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A node inside an element's content.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
}

/// An XML element with qualified name, ordered attributes and children.
///
/// Names are kept as written (`a:pPr`), and namespace declarations are plain
/// attributes. Lookups by name therefore use the prefixes that PresentationML
/// parts conventionally carry (`p:`, `a:`, `r:`).
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    /// Qualified name, e.g. `a:pPr`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.find(':') {
            Some(pos) => &self.name[pos + 1..],
            None => &self.name,
        }
    }

    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == key)?;
        Some(self.attrs.remove(pos).1)
    }

    #[inline]
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    #[inline]
    pub fn attrs_mut(&mut self) -> &mut Vec<(String, String)> {
        &mut self.attrs
    }

    #[inline]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given qualified name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(name))
    }

    /// Follow a path of child names, e.g. `["p:cSld", "p:spTree"]`.
    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        names.iter().try_fold(self, |el, name| el.child(name))
    }

    pub fn path_mut(&mut self, names: &[&str]) -> Option<&mut XmlElement> {
        let mut el = self;
        for name in names {
            el = el.child_mut(name)?;
        }
        Some(el)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.is(name))
    }

    /// First descendant (depth-first, document order) with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.is(name) {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant with the given name, in document order.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            if child.is(name) {
                found.push(child);
            }
            child.collect_named(name, found);
        }
    }

    /// Visit this element and every descendant element mutably, parents first.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut XmlElement)) {
        f(self);
        for child in self.elements_mut() {
            child.visit_mut(f);
        }
    }

    /// Visit this element and every descendant element, parents first.
    pub fn visit(&self, f: &mut impl FnMut(&XmlElement)) {
        f(self);
        for child in self.elements() {
            child.visit(f);
        }
    }

    /// Append a child element.
    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert a child element at a node index.
    pub fn insert(&mut self, index: usize, child: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
    }

    /// Insert a child element respecting a schema sequence.
    ///
    /// `order` lists sibling names in schema order. The child goes before
    /// the first existing sibling whose name comes later in `order`; names
    /// missing from `order` are treated as trailing. Returns a reference to
    /// the inserted element.
    pub fn insert_ordered(&mut self, child: XmlElement, order: &[&str]) -> &mut XmlElement {
        let rank = |name: &str| order.iter().position(|n| *n == name).unwrap_or(order.len());
        let child_rank = rank(child.name());
        let index = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if rank(e.name()) > child_rank))
            .unwrap_or(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            _ => unreachable!("element was just inserted at this index"),
        }
    }

    /// The named child, inserted in schema order when missing.
    pub fn get_or_insert(&mut self, name: &str, order: &[&str]) -> &mut XmlElement {
        let found = self.elements().position(|e| e.is(name));
        match found {
            Some(pos) => self
                .elements_mut()
                .nth(pos)
                .unwrap_or_else(|| unreachable!("child position was just found")),
            None => self.insert_ordered(XmlElement::new(name), order),
        }
    }

    /// Keep only the child elements for which `keep` returns true. Text
    /// nodes are untouched.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&XmlElement) -> bool) {
        self.children.retain(|node| match node {
            XmlNode::Element(e) => keep(e),
            _ => true,
        });
    }

    /// Remove every child element with the given name.
    pub fn remove_children(&mut self, name: &str) {
        self.retain_elements(|e| !e.is(name));
    }

    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Replace all content with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        let text = text.into();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// Serialize this element (without an XML declaration).
    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(256);
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            write_attr_value(out, value);
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for node in &self.children {
            match node {
                XmlNode::Element(e) => e.write_xml(out),
                XmlNode::Text(t) => out.push_str(&escape_xml(t)),
                XmlNode::CData(t) => {
                    out.push_str("<![CDATA[");
                    out.push_str(t);
                    out.push_str("]]>");
                },
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn write_attr_value(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
}

/// A parsed XML part: its root element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parse a part blob. Whitespace-only text is kept so untouched
    /// content such as `<a:t> </a:t>` survives a round trip.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => stack.push(element_from_start(e)?),
                Ok(Event::Empty(ref e)) => {
                    let element = element_from_start(e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => root = Some(element),
                    }
                },
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| OoxmlError::Xml("unbalanced end tag".to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => root = Some(element),
                    }
                },
                Ok(Event::Text(ref t)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = String::from_utf8(t.to_vec()).map_err(|_| {
                            OoxmlError::Xml("Invalid UTF-8 in text content".to_string())
                        })?;
                        push_text(current, &text);
                    }
                },
                Ok(Event::GeneralRef(ref r)) => {
                    if let Some(current) = stack.last_mut() {
                        let name = std::str::from_utf8(r).map_err(|_| {
                            OoxmlError::Xml("Invalid UTF-8 in entity reference".to_string())
                        })?;
                        let ch = resolve_entity(name).ok_or_else(|| {
                            OoxmlError::Xml(format!("Unknown entity reference &{};", name))
                        })?;
                        push_text(current, ch.encode_utf8(&mut [0u8; 4]));
                    }
                },
                Ok(Event::CData(ref t)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = String::from_utf8(t.to_vec()).map_err(|_| {
                            OoxmlError::Xml("Invalid UTF-8 in CDATA".to_string())
                        })?;
                        current.children.push(XmlNode::CData(text));
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(format!("XML parsing error: {}", e))),
                _ => {},
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(OoxmlError::Xml("unclosed element at end of input".to_string()));
        }
        root.map(Self::new)
            .ok_or_else(|| OoxmlError::Xml("No root element found".to_string()))
    }

    #[inline]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    pub fn into_root(self) -> XmlElement {
        self.root
    }

    /// Serialize with a standalone XML declaration.
    pub fn to_xml_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        self.root.write_xml(&mut out);
        out.into_bytes()
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8(e.name().as_ref().to_vec())
        .map_err(|_| OoxmlError::Xml("Invalid UTF-8 in tag name".to_string()))?;
    let mut element = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())
            .map_err(|_| OoxmlError::Xml("Invalid UTF-8 in attribute key".to_string()))?;
        let value = attr.unescape_value()?.into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn push_text(element: &mut XmlElement, text: &str) {
    if let Some(XmlNode::Text(last)) = element.children.last_mut() {
        last.push_str(text);
    } else {
        element.children.push(XmlNode::Text(text.to_string()));
    }
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>R&amp;D &lt;draft&gt; &#x2013; 1</a:t></a:r></a:p><a:p><a:r><a:t> </a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;

    #[test]
    fn test_parse_and_query() {
        let doc = XmlDocument::parse(SLIDE.as_bytes()).unwrap();
        let root = doc.root();
        assert_eq!(root.name(), "p:sld");
        assert_eq!(root.local_name(), "sld");
        assert!(root.attr("xmlns:a").is_some());

        let tree = root.path(&["p:cSld", "p:spTree"]).unwrap();
        let texts: Vec<String> = tree.find_all("a:t").iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["R&D <draft> \u{2013} 1".to_string(), " ".to_string()]);
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let doc = XmlDocument::parse(SLIDE.as_bytes()).unwrap();
        let bytes = doc.to_xml_bytes();
        let again = XmlDocument::parse(&bytes).unwrap();
        assert_eq!(doc, again);
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains("R&amp;D &lt;draft&gt;"));
        assert!(xml.contains("<a:bodyPr/>"));
    }

    #[test]
    fn test_insert_ordered() {
        let order = ["a:lnSpc", "a:spcBef", "a:spcAft", "a:buNone", "a:buChar", "a:defRPr"];
        let mut ppr = XmlElement::new("a:pPr").with_child(XmlElement::new("a:defRPr"));
        ppr.insert_ordered(XmlElement::new("a:spcBef"), &order);
        ppr.insert_ordered(XmlElement::new("a:buChar"), &order);
        ppr.insert_ordered(XmlElement::new("a:lnSpc"), &order);
        ppr.get_or_insert("a:spcBef", &order).set_attr("x", "1");

        let names: Vec<&str> = ppr.elements().map(XmlElement::name).collect();
        assert_eq!(names, vec!["a:lnSpc", "a:spcBef", "a:buChar", "a:defRPr"]);
        assert_eq!(ppr.child("a:spcBef").unwrap().attr("x"), Some("1"));
    }

    #[test]
    fn test_attr_editing() {
        let mut el = XmlElement::new("a:pPr").with_attr("marL", "0").with_attr("lvl", "1");
        el.set_attr("marL", "365760");
        assert_eq!(el.attrs()[0], ("marL".to_string(), "365760".to_string()));
        assert_eq!(el.remove_attr("lvl"), Some("1".to_string()));
        assert_eq!(el.attr("lvl"), None);
        assert_eq!(el.to_xml_string(), r#"<a:pPr marL="365760"/>"#);
    }

    #[test]
    fn test_attribute_escaping() {
        let el = XmlElement::new("a:latin").with_attr("typeface", "A \"B\" & <C>\n");
        let xml = el.to_xml_string();
        let parsed = XmlDocument::parse(xml.as_bytes()).unwrap();
        assert_eq!(parsed.root().attr("typeface"), Some("A \"B\" & <C>\n"));
    }

    #[test]
    fn test_malformed_input() {
        assert!(XmlDocument::parse(b"").is_err());
        assert!(XmlDocument::parse(b"<a><b></a>").is_err());
    }

    #[test]
    fn test_get_or_insert_reuses_existing_child() {
        let order = ["a:rPr", "a:t"];
        let mut run = XmlElement::new("a:r").with_child(XmlElement::new("a:t"));
        run.get_or_insert("a:t", &order).set_text("first");
        run.get_or_insert("a:rPr", &order).set_attr("b", "1");
        run.get_or_insert("a:t", &order).set_text("second");

        let names: Vec<&str> = run.elements().map(XmlElement::name).collect();
        assert_eq!(names, vec!["a:rPr", "a:t"]);
        assert_eq!(run.child("a:t").unwrap().text(), "second");
        assert_eq!(run.child("a:rPr").unwrap().attr("b"), Some("1"));
    }
}
