//! DrawingML for one slide and its relationships.
//!
//! Geometry arrives in inches and type, line and shadow sizes in points;
//! both are written as EMU.

use crate::media::EmbeddedImage;
use crate::template::{rel, NS_A, NS_ASVG, NS_P, NS_R};
use crate::xml::{el, relationships_xml, XmlWriter};
use dompptx_core::{
    HAlign, HexColor, ImageObject, LineStyle, Placement, Result, ShadowDescriptor,
    ShapeDescriptor, ShapeKind, Slide, SlideObject, TextBlock, TextRun, VAlign,
};

pub const EMU_PER_INCH: f64 = 914_400.0;
pub const EMU_PER_POINT: f64 = 12_700.0;

/// DrawingML angles are sixty-thousandths of a degree.
const ANGLE_UNITS: f64 = 60_000.0;
const FULL_TURN: i64 = 360 * 60_000;

/// DrawingML percentages are thousandths of a percent.
const PERCENT_UNITS: f64 = 100_000.0;

/// `roundRect` adjust value for a fully rounded short side.
const ROUND_RECT_MAX_ADJ: f64 = 50_000.0;

/// Extension URI marking an SVG blip.
const SVG_BLIP_EXT: &str = "{96DAC541-7B7A-43D3-8B79-37D633B846F1}";

/// Font size bounds accepted by `a:rPr/@sz`, in hundredths of a point.
const MIN_FONT_SIZE: i64 = 100;
const MAX_FONT_SIZE: i64 = 400_000;

pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

pub fn points_to_emu(points: f64) -> i64 {
    (points * EMU_PER_POINT).round() as i64
}

/// A media file referenced by a slide, named `imageN.ext`.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The XML of one slide plus everything it references.
#[derive(Debug, Clone)]
pub struct SlidePart {
    pub xml: String,
    pub rels: String,
    pub media: Vec<MediaFile>,
}

struct Picture {
    embed: String,
    svg_embed: Option<String>,
}

/// Relationship entries of a slide. `rId1` is always the layout.
struct SlideRels {
    entries: Vec<(String, &'static str, String)>,
}

impl SlideRels {
    fn new() -> Self {
        Self {
            entries: vec![(
                "rId1".to_string(),
                rel::SLIDE_LAYOUT,
                "../slideLayouts/slideLayout1.xml".to_string(),
            )],
        }
    }

    fn add_image(&mut self, media_name: &str) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries
            .push((id.clone(), rel::IMAGE, format!("../media/{}", media_name)));
        id
    }

    fn to_xml(&self) -> Result<String> {
        relationships_xml(&self.entries)
    }
}

impl SlidePart {
    /// Serialise `slide`. Media files are numbered from `next_media`, which
    /// is advanced past the files this slide adds.
    pub fn build(slide: &Slide, next_media: &mut usize) -> Result<Self> {
        let mut rels = SlideRels::new();
        let mut media = Vec::new();

        let mut w = XmlWriter::new()?;
        w.start(
            el("p:sld")
                .attr("xmlns:a", NS_A)
                .attr("xmlns:r", NS_R)
                .attr("xmlns:p", NS_P),
        )?;
        w.start(el("p:cSld"))?;
        w.start(el("p:spTree"))?;
        write_group_properties(&mut w)?;

        // Object ids start after the group's own id of 1.
        let mut next_id = 2;
        for object in &slide.objects {
            match object {
                SlideObject::Shape(shape) => write_shape(&mut w, next_id, shape)?,
                SlideObject::Text(text) => write_text(&mut w, next_id, text)?,
                SlideObject::Image(image) => {
                    let Some(picture) = embed_image(image, &mut rels, &mut media, next_media)
                    else {
                        continue;
                    };
                    write_picture(&mut w, next_id, &image.placement, &picture)?
                }
            }
            next_id += 1;
        }

        w.end("p:spTree")?;
        w.end("p:cSld")?;
        w.start(el("p:clrMapOvr"))?;
        w.empty(el("a:masterClrMapping"))?;
        w.end("p:clrMapOvr")?;
        w.end("p:sld")?;

        Ok(Self {
            xml: w.finish()?,
            rels: rels.to_xml()?,
            media,
        })
    }
}

/// Decode an image and register its media files, or skip it with a warning.
fn embed_image(
    image: &ImageObject,
    rels: &mut SlideRels,
    media: &mut Vec<MediaFile>,
    next_media: &mut usize,
) -> Option<Picture> {
    let embedded = match EmbeddedImage::from_data_uri(&image.data) {
        Ok(embedded) => embedded,
        Err(e) => {
            log::warn!("Leaving out image: {}", e);
            return None;
        }
    };

    let mut add_file = |extension: &str, bytes: Vec<u8>| {
        let name = format!("image{}.{}", *next_media, extension);
        *next_media += 1;
        let id = rels.add_image(&name);
        media.push(MediaFile { name, bytes });
        id
    };

    Some(match embedded.fallback {
        Some(png) => {
            let embed = add_file("png", png);
            let svg_embed = add_file(embedded.kind.extension(), embedded.bytes);
            Picture {
                embed,
                svg_embed: Some(svg_embed),
            }
        }
        None => Picture {
            embed: add_file(embedded.kind.extension(), embedded.bytes),
            svg_embed: None,
        },
    })
}

fn write_group_properties(w: &mut XmlWriter) -> Result<()> {
    w.start(el("p:nvGrpSpPr"))?;
    w.empty(el("p:cNvPr").attr("id", 1).attr("name", ""))?;
    w.empty(el("p:cNvGrpSpPr"))?;
    w.empty(el("p:nvPr"))?;
    w.end("p:nvGrpSpPr")?;

    w.start(el("p:grpSpPr"))?;
    w.start(el("a:xfrm"))?;
    w.empty(el("a:off").attr("x", 0).attr("y", 0))?;
    w.empty(el("a:ext").attr("cx", 0).attr("cy", 0))?;
    w.empty(el("a:chOff").attr("x", 0).attr("y", 0))?;
    w.empty(el("a:chExt").attr("cx", 0).attr("cy", 0))?;
    w.end("a:xfrm")?;
    w.end("p:grpSpPr")
}

fn write_xfrm(w: &mut XmlWriter, placement: &Placement) -> Result<()> {
    w.start(el("a:xfrm"))?;
    w.empty(
        el("a:off")
            .attr("x", inches_to_emu(placement.x))
            .attr("y", inches_to_emu(placement.y)),
    )?;
    w.empty(
        el("a:ext")
            .attr("cx", inches_to_emu(placement.w).max(0))
            .attr("cy", inches_to_emu(placement.h).max(0)),
    )?;
    w.end("a:xfrm")
}

fn write_geometry(w: &mut XmlWriter, kind: ShapeKind, rect_radius: Option<f64>) -> Result<()> {
    w.start(el("a:prstGeom").attr("prst", kind.preset()))?;
    match (kind, rect_radius) {
        (ShapeKind::RoundRect, Some(factor)) => {
            let adj = (factor.clamp(0.0, 1.0) * ROUND_RECT_MAX_ADJ).round() as i64;
            w.start(el("a:avLst"))?;
            w.empty(el("a:gd").attr("name", "adj").attr("fmla", format!("val {}", adj)))?;
            w.end("a:avLst")?;
        }
        _ => w.empty(el("a:avLst"))?,
    }
    w.end("a:prstGeom")
}

fn write_solid_fill(w: &mut XmlWriter, color: &HexColor) -> Result<()> {
    w.start(el("a:solidFill"))?;
    w.empty(el("a:srgbClr").attr("val", color))?;
    w.end("a:solidFill")
}

fn write_line(w: &mut XmlWriter, line: Option<&LineStyle>) -> Result<()> {
    match line {
        Some(line) => {
            w.start(el("a:ln").attr("w", points_to_emu(line.width)))?;
            write_solid_fill(w, &line.color)?;
            w.end("a:ln")
        }
        None => {
            w.start(el("a:ln"))?;
            w.empty(el("a:noFill"))?;
            w.end("a:ln")
        }
    }
}

fn write_shadow(w: &mut XmlWriter, shadow: &ShadowDescriptor) -> Result<()> {
    let dir = ((shadow.angle.rem_euclid(360.0) * ANGLE_UNITS).round() as i64) % FULL_TURN;
    let alpha = (shadow.opacity.clamp(0.0, 1.0) * PERCENT_UNITS).round() as i64;

    w.start(el("a:effectLst"))?;
    w.start(
        el("a:outerShdw")
            .attr("blurRad", points_to_emu(shadow.blur).max(0))
            .attr("dist", points_to_emu(shadow.offset).max(0))
            .attr("dir", dir)
            .attr("algn", "bl")
            .attr("rotWithShape", 0),
    )?;
    w.start(el("a:srgbClr").attr("val", &shadow.color))?;
    w.empty(el("a:alpha").attr("val", alpha))?;
    w.end("a:srgbClr")?;
    w.end("a:outerShdw")?;
    w.end("a:effectLst")
}

fn write_shape(w: &mut XmlWriter, id: usize, shape: &ShapeDescriptor) -> Result<()> {
    w.start(el("p:sp"))?;
    w.start(el("p:nvSpPr"))?;
    w.empty(el("p:cNvPr").attr("id", id).attr("name", format!("Shape {}", id)))?;
    w.empty(el("p:cNvSpPr"))?;
    w.empty(el("p:nvPr"))?;
    w.end("p:nvSpPr")?;

    w.start(el("p:spPr"))?;
    write_xfrm(w, &shape.placement)?;
    write_geometry(w, shape.kind, shape.rect_radius)?;
    match &shape.fill {
        Some(color) => write_solid_fill(w, color)?,
        None => w.empty(el("a:noFill"))?,
    }
    write_line(w, shape.line.as_ref())?;
    if let Some(shadow) = &shape.shadow {
        write_shadow(w, shadow)?;
    }
    w.end("p:spPr")?;
    w.end("p:sp")
}

fn align_value(align: HAlign) -> &'static str {
    match align {
        HAlign::Left => "l",
        HAlign::Center => "ctr",
        HAlign::Right => "r",
        HAlign::Justify => "just",
    }
}

fn anchor_value(valign: VAlign) -> &'static str {
    match valign {
        VAlign::Top => "t",
        VAlign::Middle => "ctr",
    }
}

fn font_size_value(points: f64) -> i64 {
    ((points * 100.0).round() as i64).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

fn write_run(w: &mut XmlWriter, run: &TextRun) -> Result<()> {
    w.start(el("a:r"))?;
    w.start(
        el("a:rPr")
            .attr("lang", "en-US")
            .attr("sz", font_size_value(run.style.font_size))
            .attr_opt("b", run.style.bold.then_some(1))
            .attr("dirty", 0),
    )?;
    write_solid_fill(w, &run.style.color)?;
    w.empty(el("a:latin").attr("typeface", &run.style.font_face))?;
    w.end("a:rPr")?;
    w.text_element(el("a:t"), &run.text)?;
    w.end("a:r")
}

fn write_text(w: &mut XmlWriter, id: usize, text: &TextBlock) -> Result<()> {
    w.start(el("p:sp"))?;
    w.start(el("p:nvSpPr"))?;
    w.empty(el("p:cNvPr").attr("id", id).attr("name", format!("Text {}", id)))?;
    w.empty(el("p:cNvSpPr").attr("txBox", 1))?;
    w.empty(el("p:nvPr"))?;
    w.end("p:nvSpPr")?;

    w.start(el("p:spPr"))?;
    write_xfrm(w, &text.placement)?;
    write_geometry(w, ShapeKind::Rect, None)?;
    w.empty(el("a:noFill"))?;
    w.end("p:spPr")?;

    let inset = points_to_emu(text.margin).max(0);
    w.start(el("p:txBody"))?;
    w.start(
        el("a:bodyPr")
            .attr("wrap", if text.wrap { "square" } else { "none" })
            .attr("lIns", inset)
            .attr("tIns", inset)
            .attr("rIns", inset)
            .attr("bIns", inset)
            .attr("rtlCol", 0)
            .attr("anchor", anchor_value(text.valign)),
    )?;
    if text.auto_fit {
        w.empty(el("a:spAutoFit"))?;
    } else {
        w.empty(el("a:noAutofit"))?;
    }
    w.end("a:bodyPr")?;
    w.empty(el("a:lstStyle"))?;

    w.start(el("a:p"))?;
    w.empty(el("a:pPr").attr("algn", align_value(text.align)))?;
    for run in &text.runs {
        write_run(w, run)?;
    }
    w.end("a:p")?;
    w.end("p:txBody")?;
    w.end("p:sp")
}

fn write_picture(
    w: &mut XmlWriter,
    id: usize,
    placement: &Placement,
    picture: &Picture,
) -> Result<()> {
    w.start(el("p:pic"))?;
    w.start(el("p:nvPicPr"))?;
    w.empty(el("p:cNvPr").attr("id", id).attr("name", format!("Picture {}", id)))?;
    w.start(el("p:cNvPicPr"))?;
    w.empty(el("a:picLocks").attr("noChangeAspect", 1))?;
    w.end("p:cNvPicPr")?;
    w.empty(el("p:nvPr"))?;
    w.end("p:nvPicPr")?;

    w.start(el("p:blipFill"))?;
    match &picture.svg_embed {
        Some(svg_embed) => {
            w.start(el("a:blip").attr("r:embed", &picture.embed))?;
            w.start(el("a:extLst"))?;
            w.start(el("a:ext").attr("uri", SVG_BLIP_EXT))?;
            w.empty(
                el("asvg:svgBlip")
                    .attr("xmlns:asvg", NS_ASVG)
                    .attr("r:embed", svg_embed),
            )?;
            w.end("a:ext")?;
            w.end("a:extLst")?;
            w.end("a:blip")?;
        }
        None => w.empty(el("a:blip").attr("r:embed", &picture.embed))?,
    }
    w.start(el("a:stretch"))?;
    w.empty(el("a:fillRect"))?;
    w.end("a:stretch")?;
    w.end("p:blipFill")?;

    w.start(el("p:spPr"))?;
    write_xfrm(w, placement)?;
    write_geometry(w, ShapeKind::Rect, None)?;
    w.end("p:spPr")?;
    w.end("p:pic")
}
