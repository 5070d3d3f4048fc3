//! Text frames: reading paragraph content and rewriting it in place.
//!
//! A text frame is the `p:txBody` of a shape: `a:bodyPr`, an optional
//! `a:lstStyle`, then one or more `a:p` paragraphs. Each paragraph carries
//! optional `a:pPr` properties, runs (`a:r`, `a:br`, `a:fld`) and a
//! trailing `a:endParaRPr`.

use crate::common::unit::{
    bullet_hanging_indent_emu, bullet_margin_emu, centipoints_to_pt, pt_to_centipoints,
};
use crate::ooxml::pptx::format::{Alignment, RgbColor, scheme_color_for, theme_name_for};
use crate::ooxml::xml::XmlElement;
use serde::{Deserialize, Serialize};

/// Default run size used for bullet geometry when none is requested.
pub const DEFAULT_BULLET_FONT_SIZE: f64 = 18.0;

/// The literal glyph installed for bulleted paragraphs.
pub const BULLET_CHAR: &str = "•";

const PARAGRAPH_ORDER: &[&str] = &["a:pPr", "a:r", "a:endParaRPr"];

const PPR_ORDER: &[&str] = &[
    "a:lnSpc",
    "a:spcBef",
    "a:spcAft",
    "a:buClrTx",
    "a:buClr",
    "a:buSzTx",
    "a:buSzPct",
    "a:buSzPts",
    "a:buFontTx",
    "a:buFont",
    "a:buNone",
    "a:buAutoNum",
    "a:buChar",
    "a:buBlip",
    "a:tabLst",
    "a:defRPr",
    "a:extLst",
];

const RUN_ORDER: &[&str] = &["a:rPr", "a:t"];

const RPR_ORDER: &[&str] = &[
    "a:ln",
    "a:noFill",
    "a:solidFill",
    "a:gradFill",
    "a:blipFill",
    "a:pattFill",
    "a:grpFill",
    "a:effectLst",
    "a:effectDag",
    "a:highlight",
    "a:uLnTx",
    "a:uLn",
    "a:uFillTx",
    "a:uFill",
    "a:latin",
    "a:ea",
    "a:cs",
    "a:sym",
    "a:hlinkClick",
    "a:hlinkMouseOver",
    "a:rtl",
    "a:extLst",
];

const BULLET_MARKERS: &[&str] = &["a:buChar", "a:buNone", "a:buAutoNum", "a:buFont"];
const FILLS: &[&str] = &[
    "a:noFill",
    "a:solidFill",
    "a:gradFill",
    "a:blipFill",
    "a:pattFill",
    "a:grpFill",
];

fn is_false(value: &bool) -> bool {
    !*value
}

/// One paragraph's content and formatting.
///
/// This is both the request format of a replacement payload and the
/// snapshot format of an inventory, so a requested paragraph can be compared
/// field by field with what was written. Sizes and spacings are in points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphSpec {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bullet: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_before: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_after: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
}

/// Read-only view of a `p:txBody`.
#[derive(Debug, Clone, Copy)]
pub struct TextFrame<'a> {
    body: &'a XmlElement,
}

impl<'a> TextFrame<'a> {
    pub fn new(body: &'a XmlElement) -> Self {
        Self { body }
    }

    pub fn body_properties(&self) -> Option<&'a XmlElement> {
        self.body.child("a:bodyPr")
    }

    pub fn paragraph_elements(&self) -> impl Iterator<Item = &'a XmlElement> {
        self.body.children_named("a:p")
    }

    /// Paragraph texts joined by newlines.
    pub fn text(&self) -> String {
        self.paragraph_elements()
            .map(paragraph_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Snapshot of every paragraph.
    pub fn paragraphs(&self) -> Vec<ParagraphSpec> {
        self.paragraph_elements().map(read_paragraph).collect()
    }
}

/// Text of one `a:p`: runs and fields concatenated, line breaks as `\n`.
pub fn paragraph_text(p: &XmlElement) -> String {
    let mut text = String::new();
    for child in p.elements() {
        match child.name() {
            "a:r" | "a:fld" => {
                if let Some(t) = child.child("a:t") {
                    text.push_str(&t.text());
                }
            },
            "a:br" => text.push('\n'),
            _ => {},
        }
    }
    text
}

fn read_paragraph(p: &XmlElement) -> ParagraphSpec {
    let mut spec = ParagraphSpec {
        text: paragraph_text(p),
        ..Default::default()
    };

    if let Some(ppr) = p.child("a:pPr") {
        spec.bullet = ppr.child("a:buChar").is_some() || ppr.child("a:buAutoNum").is_some();
        spec.level = ppr.attr("lvl").and_then(|v| v.parse().ok());
        spec.alignment = ppr.attr("algn").and_then(Alignment::from_algn);
        spec.space_before = spacing_points(ppr.child("a:spcBef"));
        spec.space_after = spacing_points(ppr.child("a:spcAft"));
        spec.line_spacing = spacing_points(ppr.child("a:lnSpc"));
    }

    let rpr = p
        .elements()
        .find(|e| e.is("a:r"))
        .and_then(|r| r.child("a:rPr"))
        .or_else(|| p.child("a:endParaRPr"));
    if let Some(rpr) = rpr {
        spec.bold = rpr.attr("b").map(xml_bool);
        spec.italic = rpr.attr("i").map(xml_bool);
        spec.underline = rpr.attr("u").map(|u| u != "none");
        spec.font_size = rpr
            .attr("sz")
            .and_then(|v| v.parse::<i64>().ok())
            .map(centipoints_to_pt);
        spec.font_name = rpr
            .child("a:latin")
            .and_then(|l| l.attr("typeface"))
            .map(str::to_string);
        if let Some(fill) = rpr.child("a:solidFill") {
            if let Some(rgb) = fill.child("a:srgbClr") {
                spec.color = rgb.attr("val").map(str::to_string);
            } else if let Some(scheme) = fill.child("a:schemeClr") {
                spec.theme_color = scheme.attr("val").map(|v| {
                    theme_name_for(v)
                        .map(str::to_string)
                        .unwrap_or_else(|| v.to_string())
                });
            }
        }
    }

    spec
}

fn xml_bool(value: &str) -> bool {
    matches!(value, "1" | "true")
}

fn spacing_points(spacing: Option<&XmlElement>) -> Option<f64> {
    spacing?
        .child("a:spcPts")?
        .attr("val")?
        .parse::<i64>()
        .ok()
        .map(centipoints_to_pt)
}

/// Blank a text frame the way PowerPoint's "clear" does.
///
/// Every paragraph but the first is removed; the first loses its runs,
/// breaks and fields but keeps `a:pPr` and `a:endParaRPr`, so the frame
/// keeps its first-paragraph formatting.
pub fn clear_text_body(body: &mut XmlElement) {
    let mut seen_first = false;
    body.retain_elements(|e| {
        if !e.is("a:p") {
            return true;
        }
        let keep = !seen_first;
        seen_first = true;
        keep
    });

    match body.child_mut("a:p") {
        Some(p) => p.retain_elements(|e| !matches!(e.name(), "a:r" | "a:br" | "a:fld")),
        None => body.push(XmlElement::new("a:p")),
    }
}

/// Paragraph slot for descriptor `index`: the first existing paragraph for
/// index 0, a newly appended paragraph otherwise.
pub fn paragraph_slot(body: &mut XmlElement, index: usize) -> &mut XmlElement {
    if index == 0 && body.child("a:p").is_some() {
        return body
            .child_mut("a:p")
            .unwrap_or_else(|| unreachable!("paragraph presence was just checked"));
    }
    body.insert_ordered(XmlElement::new("a:p"), &["a:bodyPr", "a:lstStyle", "a:p", "a:extLst"])
}

/// Write a descriptor into a paragraph.
///
/// Returns non-fatal problems (unknown theme color, malformed hex color).
pub fn apply_paragraph(p: &mut XmlElement, spec: &ParagraphSpec) -> Vec<String> {
    let mut warnings = Vec::new();
    let ppr = p.get_or_insert("a:pPr", PARAGRAPH_ORDER);

    for marker in BULLET_MARKERS {
        ppr.remove_children(marker);
    }

    if spec.bullet {
        let level = spec.level.unwrap_or(0);
        if level == 0 {
            ppr.remove_attr("lvl");
        } else {
            ppr.set_attr("lvl", level.to_string());
        }
        let font_size = spec.font_size.unwrap_or(DEFAULT_BULLET_FONT_SIZE);
        ppr.set_attr("marL", bullet_margin_emu(font_size, level).to_string());
        ppr.set_attr("indent", bullet_hanging_indent_emu(font_size).to_string());
        ppr.insert_ordered(
            XmlElement::new("a:buChar").with_attr("char", BULLET_CHAR),
            PPR_ORDER,
        );
        if spec.alignment.is_none() {
            ppr.set_attr("algn", Alignment::Left.to_algn());
        }
    } else {
        ppr.set_attr("marL", "0");
        ppr.set_attr("indent", "0");
        ppr.insert_ordered(XmlElement::new("a:buNone"), PPR_ORDER);
    }

    if let Some(alignment) = spec.alignment {
        ppr.set_attr("algn", alignment.to_algn());
    }

    for (name, value) in [
        ("a:spcBef", spec.space_before),
        ("a:spcAft", spec.space_after),
        ("a:lnSpc", spec.line_spacing),
    ] {
        if let Some(points) = value {
            let spacing = ppr.get_or_insert(name, PPR_ORDER);
            spacing.children_mut().clear();
            spacing.push(
                XmlElement::new("a:spcPts").with_attr("val", pt_to_centipoints(points).to_string()),
            );
        }
    }

    let existing = p.elements().position(|e| e.is("a:r"));
    let run = match existing {
        Some(pos) => p
            .elements_mut()
            .nth(pos)
            .unwrap_or_else(|| unreachable!("run position was just found")),
        None => p.insert_ordered(XmlElement::new("a:r"), PARAGRAPH_ORDER),
    };
    run.get_or_insert("a:t", RUN_ORDER).set_text(spec.text.as_str());
    apply_font(run, spec, &mut warnings);

    warnings
}

fn apply_font(run: &mut XmlElement, spec: &ParagraphSpec, warnings: &mut Vec<String>) {
    let rpr = run.get_or_insert("a:rPr", RUN_ORDER);

    if let Some(bold) = spec.bold {
        rpr.set_attr("b", if bold { "1" } else { "0" });
    }
    if let Some(italic) = spec.italic {
        rpr.set_attr("i", if italic { "1" } else { "0" });
    }
    if let Some(underline) = spec.underline {
        rpr.set_attr("u", if underline { "sng" } else { "none" });
    }
    if let Some(size) = spec.font_size {
        rpr.set_attr("sz", pt_to_centipoints(size).to_string());
    }
    if let Some(name) = &spec.font_name {
        rpr.get_or_insert("a:latin", RPR_ORDER)
            .set_attr("typeface", name.as_str());
    }

    let mut color = None;
    if let Some(hex) = &spec.color {
        match RgbColor::from_hex(hex) {
            Some(rgb) => color = Some(XmlElement::new("a:srgbClr").with_attr("val", rgb.to_hex())),
            None => warnings.push(format!(
                "invalid color '{}': expected 6 hexadecimal digits",
                hex
            )),
        }
    }
    if color.is_none()
        && let Some(theme_name) = &spec.theme_color
    {
        match scheme_color_for(theme_name) {
            Some(value) => color = Some(XmlElement::new("a:schemeClr").with_attr("val", value)),
            None => warnings.push(format!("unknown theme color name '{}'", theme_name)),
        }
    }

    if let Some(color) = color {
        rpr.retain_elements(|e| !FILLS.contains(&e.name()));
        rpr.insert_ordered(XmlElement::new("a:solidFill").with_child(color), RPR_ORDER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xml::XmlDocument;

    fn body(xml: &str) -> XmlElement {
        XmlDocument::parse(xml.as_bytes()).unwrap().into_root()
    }

    const BODY: &str = r#"<p:txBody xmlns:p="p" xmlns:a="a"><a:bodyPr/><a:lstStyle/><a:p><a:pPr algn="ctr"><a:lnSpc><a:spcPct val="90000"/></a:lnSpc></a:pPr><a:r><a:rPr lang="en-US" b="1" sz="2400"/><a:t>First</a:t></a:r><a:br/><a:r><a:t>line</a:t></a:r><a:endParaRPr lang="en-US"/></a:p><a:p><a:r><a:t>Second</a:t></a:r></a:p></p:txBody>"#;

    #[test]
    fn test_read_paragraphs() {
        let body = body(BODY);
        let frame = TextFrame::new(&body);
        assert_eq!(frame.text(), "First\nline\nSecond");

        let paragraphs = frame.paragraphs();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].alignment, Some(Alignment::Center));
        assert_eq!(paragraphs[0].bold, Some(true));
        assert_eq!(paragraphs[0].font_size, Some(24.0));
        assert_eq!(paragraphs[0].line_spacing, None);
        assert!(!paragraphs[1].bullet);
    }

    #[test]
    fn test_clear_keeps_first_paragraph_properties() {
        let mut body = body(BODY);
        clear_text_body(&mut body);

        let paragraphs: Vec<&XmlElement> = body.children_named("a:p").collect();
        assert_eq!(paragraphs.len(), 1);
        let names: Vec<&str> = paragraphs[0].elements().map(XmlElement::name).collect();
        assert_eq!(names, vec!["a:pPr", "a:endParaRPr"]);
        assert_eq!(TextFrame::new(&body).text(), "");
    }

    #[test]
    fn test_clear_empty_body_adds_paragraph() {
        let mut body = body(r#"<p:txBody xmlns:p="p" xmlns:a="a"><a:bodyPr/></p:txBody>"#);
        clear_text_body(&mut body);
        assert_eq!(body.children_named("a:p").count(), 1);
    }

    #[test]
    fn test_apply_bullet_paragraph() {
        let mut body = body(BODY);
        clear_text_body(&mut body);
        let spec = ParagraphSpec {
            text: "Revenue grew".to_string(),
            bullet: true,
            level: Some(1),
            font_size: Some(20.0),
            ..Default::default()
        };
        let warnings = apply_paragraph(paragraph_slot(&mut body, 0), &spec);
        assert!(warnings.is_empty());

        let p = body.child("a:p").unwrap();
        let ppr = p.child("a:pPr").unwrap();
        assert_eq!(ppr.attr("lvl"), Some("1"));
        assert_eq!(ppr.attr("marL"), Some("812800"));
        assert_eq!(ppr.attr("indent"), Some("-203200"));
        assert_eq!(ppr.attr("algn"), Some("l"));
        assert_eq!(ppr.child("a:buChar").unwrap().attr("char"), Some(BULLET_CHAR));
        let names: Vec<&str> = ppr.elements().map(XmlElement::name).collect();
        assert_eq!(names, vec!["a:lnSpc", "a:buChar"]);

        let names: Vec<&str> = p.elements().map(XmlElement::name).collect();
        assert_eq!(names, vec!["a:pPr", "a:r", "a:endParaRPr"]);

        let snapshot = &TextFrame::new(&body).paragraphs()[0];
        assert_eq!(snapshot.text, "Revenue grew");
        assert!(snapshot.bullet);
        assert_eq!(snapshot.level, Some(1));
        assert_eq!(snapshot.font_size, Some(20.0));
    }

    #[test]
    fn test_apply_plain_paragraph_with_formatting() {
        let mut body = body(r#"<p:txBody xmlns:p="p" xmlns:a="a"><a:bodyPr/><a:p/></p:txBody>"#);
        clear_text_body(&mut body);
        let first = ParagraphSpec {
            text: "Heading".to_string(),
            alignment: Some(Alignment::Right),
            space_before: Some(6.0),
            space_after: Some(3.5),
            line_spacing: Some(28.0),
            bold: Some(true),
            italic: Some(false),
            underline: Some(true),
            font_name: Some("Arial".to_string()),
            color: Some("#FF0000".to_string()),
            ..Default::default()
        };
        let second = ParagraphSpec {
            text: "Body".to_string(),
            theme_color: Some("ACCENT_2".to_string()),
            ..Default::default()
        };
        assert!(apply_paragraph(paragraph_slot(&mut body, 0), &first).is_empty());
        assert!(apply_paragraph(paragraph_slot(&mut body, 1), &second).is_empty());

        let paragraphs = TextFrame::new(&body).paragraphs();
        assert_eq!(paragraphs.len(), 2);
        let p0 = &paragraphs[0];
        assert_eq!(p0.alignment, Some(Alignment::Right));
        assert_eq!(p0.space_before, Some(6.0));
        assert_eq!(p0.space_after, Some(3.5));
        assert_eq!(p0.line_spacing, Some(28.0));
        assert_eq!(p0.bold, Some(true));
        assert_eq!(p0.italic, Some(false));
        assert_eq!(p0.underline, Some(true));
        assert_eq!(p0.font_name.as_deref(), Some("Arial"));
        assert_eq!(p0.color.as_deref(), Some("FF0000"));
        assert_eq!(paragraphs[1].theme_color.as_deref(), Some("ACCENT_2"));

        let p = body.child("a:p").unwrap();
        let ppr = p.child("a:pPr").unwrap();
        assert_eq!(ppr.attr("marL"), Some("0"));
        assert_eq!(ppr.attr("indent"), Some("0"));
        let names: Vec<&str> = ppr.elements().map(XmlElement::name).collect();
        assert_eq!(names, vec!["a:lnSpc", "a:spcBef", "a:spcAft", "a:buNone"]);

        let rpr = p.child("a:r").unwrap().child("a:rPr").unwrap();
        let names: Vec<&str> = rpr.elements().map(XmlElement::name).collect();
        assert_eq!(names, vec!["a:solidFill", "a:latin"]);
    }

    #[test]
    fn test_color_warnings() {
        let mut p = XmlElement::new("a:p");
        let spec = ParagraphSpec {
            text: "x".to_string(),
            color: Some("red".to_string()),
            theme_color: Some("ACCENT_9".to_string()),
            ..Default::default()
        };
        let warnings = apply_paragraph(&mut p, &spec);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[1].contains("ACCENT_9"));
        assert!(p.find("a:solidFill").is_none());

        let spec = ParagraphSpec {
            text: "x".to_string(),
            color: Some("12".to_string()),
            theme_color: Some("TEXT_1".to_string()),
            ..Default::default()
        };
        let warnings = apply_paragraph(&mut p, &spec);
        assert_eq!(warnings.len(), 1);
        assert_eq!(p.find("a:schemeClr").unwrap().attr("val"), Some("tx1"));
    }

    #[test]
    fn test_apply_rewrites_existing_run_in_place() {
        let mut body = body(BODY);
        let p = body.child_mut("a:p").unwrap();
        let spec = ParagraphSpec {
            text: "Rewritten".to_string(),
            italic: Some(true),
            ..Default::default()
        };
        apply_paragraph(p, &spec);

        let runs: Vec<&XmlElement> = p.children_named("a:r").collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].child("a:t").unwrap().text(), "Rewritten");
        let rpr = runs[0].child("a:rPr").unwrap();
        assert_eq!(rpr.attr("i"), Some("1"));
        assert_eq!(rpr.attr("sz"), Some("2400"));
        assert_eq!(runs[1].child("a:t").unwrap().text(), "line");
    }
}
