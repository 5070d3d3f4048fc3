//! Synthetic decks for unit tests.
//!
//! Builds small but structurally complete .pptx packages in memory: a
//! presentation part, one master with a theme, one "Title and Content"
//! layout, and slides carrying a title placeholder, a body placeholder, a
//! slide-number placeholder and optional picture, text box, hyperlink and
//! notes.

use crate::ooxml::opc::constants::{content_type as ct, namespace as ns, relationship_type as rt};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use crate::ooxml::pptx::Slide;
use crate::ooxml::pptx::shapes::{shape_at_path_mut, walk_shapes};
use crate::ooxml::xml::XmlElement;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfixture";

pub const BODY_LEFT: i64 = 457_200;
pub const BODY_TOP: i64 = 1_600_200;
pub const BODY_WIDTH: i64 = 8_229_600;
pub const BODY_HEIGHT: i64 = 4_525_963;

const NS_DECLS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const GROUP_PROPS: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

/// One slide of a synthetic deck.
#[derive(Debug, Clone)]
pub struct SlideFixture {
    title: String,
    body: Vec<String>,
    body_height: i64,
    body_font_size: Option<u32>,
    textbox: Option<String>,
    picture: bool,
    hyperlink: Option<String>,
    notes: Option<String>,
}

impl SlideFixture {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            body: Vec::new(),
            body_height: BODY_HEIGHT,
            body_font_size: None,
            textbox: None,
            picture: false,
            hyperlink: None,
            notes: None,
        }
    }

    pub fn body<I, S>(mut self, paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body = paragraphs.into_iter().map(Into::into).collect();
        self
    }

    pub fn body_height(mut self, emu: i64) -> Self {
        self.body_height = emu;
        self
    }

    /// Run size of the body paragraphs, in points.
    pub fn body_font_size(mut self, pt: u32) -> Self {
        self.body_font_size = Some(pt);
        self
    }

    pub fn textbox(mut self, text: &str) -> Self {
        self.textbox = Some(text.to_string());
        self
    }

    pub fn with_picture(mut self) -> Self {
        self.picture = true;
        self
    }

    /// Link the first body run to an external URL.
    pub fn with_hyperlink(mut self, url: &str) -> Self {
        self.hyperlink = Some(url.to_string());
        self
    }

    pub fn with_notes(mut self, text: &str) -> Self {
        self.notes = Some(text.to_string());
        self
    }

    fn slide_xml(&self) -> String {
        let mut tree = String::from(GROUP_PROPS);
        tree.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="274638"/><a:ext cx="8229600" cy="1143000"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            self.title
        ));

        let size_attr = self
            .body_font_size
            .map(|pt| format!(r#" sz="{}""#, pt * 100))
            .unwrap_or_default();
        let mut paragraphs = String::new();
        for (i, text) in self.body.iter().enumerate() {
            let link = match (&self.hyperlink, i) {
                (Some(_), 0) => r#"<a:hlinkClick r:id="rId3"/>"#,
                _ => "",
            };
            paragraphs.push_str(&format!(
                r#"<a:p><a:r><a:rPr lang="en-US"{size_attr} dirty="0">{link}</a:rPr><a:t>{text}</a:t></a:r></a:p>"#
            ));
        }
        if paragraphs.is_empty() {
            paragraphs.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#);
        }
        tree.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="{BODY_LEFT}" y="{BODY_TOP}"/><a:ext cx="{BODY_WIDTH}" cy="{}"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
            self.body_height
        ));

        if let Some(text) = &self.textbox {
            tree.push_str(&format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="4" name="TextBox 3"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="6172200"/><a:ext cx="4114800" cy="369332"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr wrap="square"><a:spAutoFit/></a:bodyPr><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
            ));
        }

        if self.picture {
            tree.push_str(r#"<p:pic><p:nvPicPr><p:cNvPr id="5" name="Picture 4"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="6400800" y="4572000"/><a:ext cx="1828800" cy="1371600"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
        }

        tree.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="6" name="Slide Number Placeholder 5"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldNum" sz="quarter" idx="12"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:fld id="{B6F15528-21DE-4FAA-801E-634DDDAF4B2B}" type="slidenum"><a:rPr lang="en-US"/><a:t>‹#›</a:t></a:fld><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#);

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS_DECLS}><p:cSld><p:spTree>{tree}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
        )
    }
}

/// Builder for a synthetic deck.
#[derive(Debug, Clone)]
pub struct DeckBuilder {
    slides: Vec<SlideFixture>,
    main_content_type: String,
    sections: Vec<(String, Vec<usize>)>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            slides: Vec::new(),
            main_content_type: ct::PML_PRESENTATION_MAIN.to_string(),
            sections: Vec::new(),
        }
    }

    /// `n` slides titled `Slide i` with one body paragraph `Body i`.
    pub fn with_titles(n: usize) -> Self {
        (0..n).fold(Self::new(), |deck, i| {
            deck.slide(SlideFixture::new(&format!("Slide {i}")).body([format!("Body {i}")]))
        })
    }

    pub fn slide(mut self, slide: SlideFixture) -> Self {
        self.slides.push(slide);
        self
    }

    pub fn main_content_type(mut self, content_type: &str) -> Self {
        self.main_content_type = content_type.to_string();
        self
    }

    /// Sections as (name, slide indices).
    pub fn sections(mut self, sections: &[(&str, &[usize])]) -> Self {
        self.sections = sections
            .iter()
            .map(|(name, slides)| (name.to_string(), slides.to_vec()))
            .collect();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let n = self.slides.len();
        let mut writer = PhysPkgWriter::new();
        let mut put = |uri: &str, blob: &[u8]| {
            writer.write(&PackURI::new(uri).unwrap(), blob).unwrap();
        };

        // content types
        let mut overrides = format!(
            r#"<Override PartName="/ppt/presentation.xml" ContentType="{}"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{}"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{}"/><Override PartName="/ppt/theme/theme1.xml" ContentType="{}"/>"#,
            self.main_content_type,
            ct::PML_SLIDE_MASTER,
            ct::PML_SLIDE_LAYOUT,
            ct::OFC_THEME
        );
        for (i, slide) in self.slides.iter().enumerate() {
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}"/>"#,
                i + 1,
                ct::PML_SLIDE
            ));
            if slide.notes.is_some() {
                overrides.push_str(&format!(
                    r#"<Override PartName="/ppt/notesSlides/notesSlide{}.xml" ContentType="{}"/>"#,
                    i + 1,
                    ct::PML_NOTES_SLIDE
                ));
            }
        }
        put(
            CONTENT_TYPES_URI,
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="{}"><Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="{}"/><Default Extension="png" ContentType="{}"/>{overrides}</Types>"#,
                ns::OPC_CONTENT_TYPES,
                ct::OPC_RELATIONSHIPS,
                ct::XML,
                ct::PNG
            )
            .as_bytes(),
        );

        put(
            "/_rels/.rels",
            rels_xml(&[("rId1", rt::OFFICE_DOCUMENT, "ppt/presentation.xml", false)]).as_bytes(),
        );

        // presentation
        let mut sld_ids = String::new();
        let mut pres_rels: Vec<(String, &str, String, bool)> = vec![(
            "rId1".to_string(),
            rt::SLIDE_MASTER,
            "slideMasters/slideMaster1.xml".to_string(),
            false,
        )];
        for i in 0..n {
            sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2));
            pres_rels.push((
                format!("rId{}", i + 2),
                rt::SLIDE,
                format!("slides/slide{}.xml", i + 1),
                false,
            ));
        }
        pres_rels.push((format!("rId{}", n + 2), rt::THEME, "theme/theme1.xml".to_string(), false));
        let sld_id_lst = if n == 0 {
            String::new()
        } else {
            format!("<p:sldIdLst>{sld_ids}</p:sldIdLst>")
        };
        put(
            "/ppt/presentation.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS_DECLS} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{sld_id_lst}<p:sldSz cx="9144000" cy="6858000" type="screen4x3"/><p:notesSz cx="6858000" cy="9144000"/>{}</p:presentation>"#,
                self.sections_xml()
            )
            .as_bytes(),
        );
        let pres_rels: Vec<(&str, &str, &str, bool)> = pres_rels
            .iter()
            .map(|(id, t, target, ext)| (id.as_str(), *t, target.as_str(), *ext))
            .collect();
        put("/ppt/_rels/presentation.xml.rels", rels_xml(&pres_rels).as_bytes());

        // master, layout, theme
        put("/ppt/slideMasters/slideMaster1.xml", MASTER_XML.as_bytes());
        put(
            "/ppt/slideMasters/_rels/slideMaster1.xml.rels",
            rels_xml(&[
                ("rId1", rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml", false),
                ("rId2", rt::THEME, "../theme/theme1.xml", false),
            ])
            .as_bytes(),
        );
        put("/ppt/slideLayouts/slideLayout1.xml", LAYOUT_XML.as_bytes());
        put(
            "/ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            rels_xml(&[("rId1", rt::SLIDE_MASTER, "../slideMasters/slideMaster1.xml", false)])
                .as_bytes(),
        );
        put("/ppt/theme/theme1.xml", THEME_XML.as_bytes());

        let mut image_written = false;
        for (i, slide) in self.slides.iter().enumerate() {
            let number = i + 1;
            put(&format!("/ppt/slides/slide{number}.xml"), slide.slide_xml().as_bytes());

            let notes_target = format!("../notesSlides/notesSlide{number}.xml");
            let mut rels = vec![(
                "rId1",
                rt::SLIDE_LAYOUT,
                "../slideLayouts/slideLayout1.xml",
                false,
            )];
            if slide.picture {
                rels.push(("rId2", rt::IMAGE, "../media/image1.png", false));
            }
            if let Some(url) = &slide.hyperlink {
                rels.push(("rId3", rt::HYPERLINK, url.as_str(), true));
            }
            if slide.notes.is_some() {
                rels.push(("rId4", rt::NOTES_SLIDE, notes_target.as_str(), false));
            }
            put(&format!("/ppt/slides/_rels/slide{number}.xml.rels"), rels_xml(&rels).as_bytes());

            if slide.picture && !image_written {
                put("/ppt/media/image1.png", PNG_BYTES);
                image_written = true;
            }

            if let Some(text) = &slide.notes {
                put(
                    &format!("/ppt/notesSlides/notesSlide{number}.xml"),
                    format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes {NS_DECLS}><p:cSld><p:spTree>{GROUP_PROPS}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:notes>"#
                    )
                    .as_bytes(),
                );
                let slide_target = format!("../slides/slide{number}.xml");
                put(
                    &format!("/ppt/notesSlides/_rels/notesSlide{number}.xml.rels"),
                    rels_xml(&[("rId1", rt::SLIDE, slide_target.as_str(), false)]).as_bytes(),
                );
            }
        }

        writer.finish().unwrap()
    }

    fn sections_xml(&self) -> String {
        if self.sections.is_empty() {
            return String::new();
        }
        let mut xml = format!(
            r#"<p:extLst><p:ext uri="{{521415D9-36F7-43E2-AB2F-B90AF26B5E84}}"><p14:sectionLst xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main">"#
        );
        for (n, (name, slides)) in self.sections.iter().enumerate() {
            xml.push_str(&format!(
                r#"<p14:section name="{name}" id="{{0000000{n}-0000-0000-0000-000000000000}}"><p14:sldIdLst>"#
            ));
            for index in slides {
                xml.push_str(&format!(r#"<p14:sldId id="{}"/>"#, 256 + index));
            }
            xml.push_str("</p14:sldIdLst></p14:section>");
        }
        xml.push_str("</p14:sectionLst></p:ext></p:extLst>");
        xml
    }
}

impl Default for DeckBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn rels_xml(rels: &[(&str, &str, &str, bool)]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">"#,
        ns::OPC_RELATIONSHIPS
    );
    for (id, reltype, target, external) in rels {
        let mode = if *external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{reltype}" Target="{target}"{mode}/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

const LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="obj" preserve="1"><p:cSld name="Title and Content"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Content Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="4" name="Slide Number Placeholder 3"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldNum" sz="quarter" idx="12"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#;

const MASTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="274638"/><a:ext cx="8229600" cy="1143000"/></a:xfrm></p:spPr><p:txBody><a:bodyPr anchor="ctr"><a:normAutofit/></a:bodyPr><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Text Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="1600200"/><a:ext cx="8229600" cy="4525963"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#;

const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2><a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2><a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4><a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6><a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme></a:themeElements></a:theme>"#;

/// Text of the slide's title placeholder.
pub fn slide_title(slide: &Slide) -> String {
    let mut title = String::new();
    if let Some(tree) = slide.shape_tree() {
        walk_shapes(tree, &mut |_, shape| {
            if shape.placeholder().is_some_and(|ph| ph.effective_type() == "title") {
                title = shape.text();
            }
        });
    }
    title
}

/// Overwrite the text of the title placeholder's first run.
pub fn set_title(slide: &mut Slide, text: &str) {
    let mut path = None;
    if let Some(tree) = slide.shape_tree() {
        walk_shapes(tree, &mut |p, shape| {
            if shape.placeholder().is_some_and(|ph| ph.effective_type() == "title") {
                path = Some(p.to_vec());
            }
        });
    }
    let path = path.expect("slide has a title placeholder");
    let tree = slide.shape_tree_mut().expect("slide has a shape tree");
    let sp: &mut XmlElement = shape_at_path_mut(tree, &path).expect("title path is valid");
    let run = sp
        .path_mut(&["p:txBody", "a:p", "a:r", "a:t"])
        .expect("title has a run");
    run.set_text(text);
}
