//! Assembles the `.pptx` ZIP package from slide parts and their media.

use crate::media::MediaKind;
use crate::slide::{inches_to_emu, SlidePart};
use crate::template::{self, content_type, rel, NS_A, NS_CONTENT_TYPES, NS_P, NS_R};
use crate::xml::{el, relationships_xml, XmlWriter};
use dompptx_core::{Error, Presentation, Result};
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Relationship ids of presentation.xml that precede the slides.
const FIXED_PRESENTATION_RELS: usize = 5;

/// First id PowerPoint accepts in `p:sldIdLst`.
const FIRST_SLIDE_ID: usize = 256;

/// Notes page size in EMU (portrait 7.5in x 10in).
const NOTES_SIZE: (i64, i64) = (6_858_000, 9_144_000);

/// Writes a [`Presentation`] as a .pptx package.
pub struct PptxWriter<'a> {
    presentation: &'a Presentation,
}

impl<'a> PptxWriter<'a> {
    pub fn new(presentation: &'a Presentation) -> Self {
        Self { presentation }
    }

    /// Write the package to `path`, replacing any existing file.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut out = self.write_to(BufWriter::new(file))?;
        out.flush()?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }

    /// Write the package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Write the package into `writer` and hand it back.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut slides = Vec::with_capacity(self.presentation.slides.len());
        let mut next_media = 1;
        for slide in &self.presentation.slides {
            slides.push(SlidePart::build(slide, &mut next_media)?);
        }

        let mut zip = ZipWriter::new(writer);
        let count = slides.len();

        add_part(&mut zip, "[Content_Types].xml", self.content_types_xml(count)?.as_bytes())?;
        add_part(&mut zip, "_rels/.rels", package_rels_xml()?.as_bytes())?;
        add_part(&mut zip, "docProps/app.xml", template::APP_PROPS_XML.as_bytes())?;
        add_part(&mut zip, "docProps/core.xml", template::CORE_PROPS_XML.as_bytes())?;
        add_part(&mut zip, "ppt/presentation.xml", self.presentation_xml(count)?.as_bytes())?;
        add_part(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            presentation_rels_xml(count)?.as_bytes(),
        )?;
        add_part(
            &mut zip,
            "ppt/slideMasters/slideMaster1.xml",
            template::SLIDE_MASTER_XML.as_bytes(),
        )?;
        add_part(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            template::SLIDE_MASTER_RELS_XML.as_bytes(),
        )?;
        add_part(
            &mut zip,
            "ppt/slideLayouts/slideLayout1.xml",
            template::SLIDE_LAYOUT_XML.as_bytes(),
        )?;
        add_part(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            template::SLIDE_LAYOUT_RELS_XML.as_bytes(),
        )?;
        add_part(&mut zip, "ppt/theme/theme1.xml", template::THEME_XML.as_bytes())?;
        add_part(&mut zip, "ppt/presProps.xml", template::PRES_PROPS_XML.as_bytes())?;
        add_part(&mut zip, "ppt/viewProps.xml", template::VIEW_PROPS_XML.as_bytes())?;
        add_part(&mut zip, "ppt/tableStyles.xml", template::TABLE_STYLES_XML.as_bytes())?;

        for (index, part) in slides.iter().enumerate() {
            let number = index + 1;
            add_part(&mut zip, &format!("ppt/slides/slide{}.xml", number), part.xml.as_bytes())?;
            add_part(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                part.rels.as_bytes(),
            )?;
            for media in &part.media {
                add_part(&mut zip, &format!("ppt/media/{}", media.name), &media.bytes)?;
            }
        }

        log::debug!("Packaged {} slide(s), {} media file(s)", count, next_media - 1);

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish package: {}", e)))
    }

    fn content_types_xml(&self, slide_count: usize) -> Result<String> {
        let mut w = XmlWriter::new()?;
        w.start(el("Types").attr("xmlns", NS_CONTENT_TYPES))?;
        w.empty(el("Default").attr("Extension", "rels").attr("ContentType", content_type::RELS))?;
        w.empty(el("Default").attr("Extension", "xml").attr("ContentType", content_type::XML))?;
        for kind in MediaKind::all() {
            w.empty(
                el("Default")
                    .attr("Extension", kind.extension())
                    .attr("ContentType", kind.content_type()),
            )?;
        }

        let mut overrides = vec![
            ("/ppt/presentation.xml".to_string(), content_type::PRESENTATION),
            ("/ppt/slideMasters/slideMaster1.xml".to_string(), content_type::SLIDE_MASTER),
            ("/ppt/slideLayouts/slideLayout1.xml".to_string(), content_type::SLIDE_LAYOUT),
            ("/ppt/theme/theme1.xml".to_string(), content_type::THEME),
            ("/ppt/presProps.xml".to_string(), content_type::PRES_PROPS),
            ("/ppt/viewProps.xml".to_string(), content_type::VIEW_PROPS),
            ("/ppt/tableStyles.xml".to_string(), content_type::TABLE_STYLES),
            ("/docProps/core.xml".to_string(), content_type::CORE_PROPERTIES),
            ("/docProps/app.xml".to_string(), content_type::EXTENDED_PROPERTIES),
        ];
        overrides.extend(
            (1..=slide_count).map(|n| (format!("/ppt/slides/slide{}.xml", n), content_type::SLIDE)),
        );
        for (part_name, content_type) in &overrides {
            w.empty(
                el("Override")
                    .attr("PartName", part_name)
                    .attr("ContentType", content_type),
            )?;
        }

        w.end("Types")?;
        w.finish()
    }

    fn presentation_xml(&self, slide_count: usize) -> Result<String> {
        let layout = &self.presentation.layout;

        let mut w = XmlWriter::new()?;
        w.start(
            el("p:presentation")
                .attr("xmlns:a", NS_A)
                .attr("xmlns:r", NS_R)
                .attr("xmlns:p", NS_P)
                .attr("saveSubsetFonts", 1),
        )?;

        w.start(el("p:sldMasterIdLst"))?;
        w.empty(el("p:sldMasterId").attr("id", 2_147_483_648u32).attr("r:id", "rId1"))?;
        w.end("p:sldMasterIdLst")?;

        if slide_count > 0 {
            w.start(el("p:sldIdLst"))?;
            for index in 0..slide_count {
                w.empty(
                    el("p:sldId")
                        .attr("id", FIRST_SLIDE_ID + index)
                        .attr("r:id", slide_rel_id(index)),
                )?;
            }
            w.end("p:sldIdLst")?;
        }

        w.empty(
            el("p:sldSz")
                .attr("cx", inches_to_emu(layout.width))
                .attr("cy", inches_to_emu(layout.height)),
        )?;
        w.empty(el("p:notesSz").attr("cx", NOTES_SIZE.0).attr("cy", NOTES_SIZE.1))?;
        w.end("p:presentation")?;
        w.finish()
    }
}

fn slide_rel_id(index: usize) -> String {
    format!("rId{}", FIXED_PRESENTATION_RELS + index + 1)
}

fn package_rels_xml() -> Result<String> {
    relationships_xml(&[
        ("rId1".to_string(), rel::OFFICE_DOCUMENT, "ppt/presentation.xml".to_string()),
        ("rId2".to_string(), rel::CORE_PROPERTIES, "docProps/core.xml".to_string()),
        ("rId3".to_string(), rel::EXTENDED_PROPERTIES, "docProps/app.xml".to_string()),
    ])
}

fn presentation_rels_xml(slide_count: usize) -> Result<String> {
    let mut entries = vec![
        ("rId1".to_string(), rel::SLIDE_MASTER, "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), rel::THEME, "theme/theme1.xml".to_string()),
        ("rId3".to_string(), rel::PRES_PROPS, "presProps.xml".to_string()),
        ("rId4".to_string(), rel::VIEW_PROPS, "viewProps.xml".to_string()),
        ("rId5".to_string(), rel::TABLE_STYLES, "tableStyles.xml".to_string()),
    ];
    entries.extend(
        (0..slide_count).map(|i| (slide_rel_id(i), rel::SLIDE, format!("slides/slide{}.xml", i + 1))),
    );
    relationships_xml(&entries)
}

fn add_part<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, bytes: &[u8]) -> Result<()> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)
        .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
    zip.write_all(bytes)?;
    Ok(())
}
