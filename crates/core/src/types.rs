//! Domain types for the slide being built from a DOM subtree.
//!
//! Geometry is expressed in inches and sizes of strokes, fonts and shadows
//! in points, the units the presentation writer expects.

use crate::dom::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CSS reference pixels per inch.
pub const PX_PER_INCH: f64 = 96.0;

/// CSS pixels to points.
pub const PX_TO_PT: f64 = 0.75;

/// A presentation holding the slides produced by an export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    /// Page layout shared by every slide.
    pub layout: SlideLayout,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create an empty presentation with the given layout.
    pub fn new(layout: SlideLayout) -> Self {
        Self {
            layout,
            slides: Vec::new(),
        }
    }

    /// Append a new, empty slide and return it for drawing.
    pub fn add_slide(&mut self) -> &mut Slide {
        self.slides.push(Slide::new());
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }

    /// Total number of drawing objects across all slides.
    pub fn object_count(&self) -> usize {
        self.slides.iter().map(|s| s.objects.len()).sum()
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new(SlideLayout::LAYOUT_16X9)
    }
}

/// Physical page size of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlideLayout {
    /// Layout name as presentation tools know it.
    pub name: &'static str,

    /// Width in inches.
    pub width: f64,

    /// Height in inches.
    pub height: f64,
}

impl SlideLayout {
    /// Widescreen 16:9, 10in x 5.625in.
    pub const LAYOUT_16X9: SlideLayout = SlideLayout {
        name: "LAYOUT_16x9",
        width: 10.0,
        height: 5.625,
    };
}

/// A single slide and its drawing objects in z-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Slide {
    pub objects: Vec<SlideObject>,
}

impl Slide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a geometric shape.
    pub fn add_shape(&mut self, shape: ShapeDescriptor) {
        self.objects.push(SlideObject::Shape(shape));
    }

    /// Add a block of styled text runs.
    pub fn add_text(&mut self, text: TextBlock) {
        self.objects.push(SlideObject::Text(text));
    }

    /// Add an image given as a data URI.
    pub fn add_image(&mut self, image: ImageObject) {
        self.objects.push(SlideObject::Image(image));
    }
}

/// One drawing command on a slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SlideObject {
    Shape(ShapeDescriptor),
    Text(TextBlock),
    Image(ImageObject),
}

/// Position and size of a slide object, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A six-digit uppercase RGB hex code such as `FF0000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    /// Wrap an already formatted hex code. The caller guarantees the format.
    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    /// Pure black, used wherever a color fails to parse but one is required.
    pub fn black() -> Self {
        Self("000000".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Preset geometry of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Rect,
    RoundRect,
    Ellipse,
}

impl ShapeKind {
    /// DrawingML preset geometry name.
    pub fn preset(&self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::RoundRect => "roundRect",
            ShapeKind::Ellipse => "ellipse",
        }
    }
}

/// Outline of a shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: HexColor,

    /// Stroke width in points.
    pub width: f64,
}

/// An outer drop shadow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShadowDescriptor {
    /// Direction the shadow is cast, in degrees within `[0, 360)`.
    pub angle: f64,

    /// Distance from the shape, in points.
    pub offset: f64,

    /// Blur radius, in points.
    pub blur: f64,

    pub color: HexColor,

    /// Opacity within `0..=1`.
    pub opacity: f64,
}

/// A filled and/or outlined geometric shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    pub placement: Placement,
    pub fill: Option<HexColor>,
    pub line: Option<LineStyle>,
    pub shadow: Option<ShadowDescriptor>,

    /// Corner rounding relative to the shape size, `0..=1`. Only used by
    /// [`ShapeKind::RoundRect`].
    pub rect_radius: Option<f64>,
}

/// Character formatting of a text run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub color: HexColor,
    pub font_face: String,

    /// Font size in points.
    pub font_size: f64,
    pub bold: bool,
}

/// A fragment of text sharing one style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl HAlign {
    /// Map a computed `text-align` value. `start`/`end` are resolved for
    /// left-to-right text; unknown keywords fall back to left.
    pub fn from_css(text_align: &str) -> Self {
        match text_align.trim() {
            "center" | "-webkit-center" => HAlign::Center,
            "right" | "end" | "-webkit-right" => HAlign::Right,
            "justify" => HAlign::Justify,
            _ => HAlign::Left,
        }
    }
}

/// Vertical anchoring of text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Middle,
}

impl VAlign {
    /// Approximate flex centering: `align-items: center` anchors the text in
    /// the middle, everything else at the top.
    pub fn from_align_items(align_items: &str) -> Self {
        if align_items.trim() == "center" {
            VAlign::Middle
        } else {
            VAlign::Top
        }
    }
}

/// A text box made of ordered runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub placement: Placement,
    pub runs: Vec<TextRun>,
    pub align: HAlign,
    pub valign: VAlign,

    /// Inner inset on all sides, in points.
    pub margin: f64,
    pub wrap: bool,
    pub auto_fit: bool,
}

/// A raster or vector image embedded as a data URI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageObject {
    pub placement: Placement,

    /// `data:image/png;base64,...` or `data:image/svg+xml;base64,...`.
    pub data: String,
}

/// Mapping from viewport pixels to slide inches for one export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutContext {
    /// Viewport position of the export root, in pixels.
    pub root_x: f64,
    pub root_y: f64,

    /// Uniform scale applied after the pixel-to-inch conversion.
    pub scale: f64,

    /// Centering offsets on the slide, in inches.
    pub off_x: f64,
    pub off_y: f64,
}

impl LayoutContext {
    /// Fit the root box into the slide, preserving aspect ratio and centering it.
    pub fn fit(root: &Rect, layout: &SlideLayout) -> Self {
        let content_w = root.width / PX_PER_INCH;
        let content_h = root.height / PX_PER_INCH;

        let mut scale = (layout.width / content_w).min(layout.height / content_h);
        if !scale.is_finite() {
            scale = 1.0;
        }

        Self {
            root_x: root.x,
            root_y: root.y,
            scale,
            off_x: (layout.width - content_w * scale) / 2.0,
            off_y: (layout.height - content_h * scale) / 2.0,
        }
    }

    /// Convert a viewport box into slide coordinates.
    pub fn place(&self, rect: &Rect) -> Placement {
        Placement {
            x: self.off_x + (rect.x - self.root_x) / PX_PER_INCH * self.scale,
            y: self.off_y + (rect.y - self.root_y) / PX_PER_INCH * self.scale,
            w: rect.width / PX_PER_INCH * self.scale,
            h: rect.height / PX_PER_INCH * self.scale,
        }
    }

    /// Convert a CSS pixel length to points at the export scale.
    pub fn px_to_pt(&self, px: f64) -> f64 {
        px * PX_TO_PT * self.scale
    }
}

/// Options recognised by an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Output file name, `export.pptx` unless set.
    pub file_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_name: "export.pptx".to_string(),
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        if !file_name.trim().is_empty() {
            self.file_name = file_name;
        }
        self
    }
}

/// How the caller identifies the export root.
#[derive(Debug, Clone, Copy)]
pub enum ExportTarget<'a, N> {
    /// A node handle already resolved by the caller.
    Element(N),
    /// A selector resolved against the document.
    Selector(&'a str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_wide_root() {
        let root = Rect::new(0.0, 0.0, 200.0, 100.0);
        let ctx = LayoutContext::fit(&root, &SlideLayout::LAYOUT_16X9);

        // 200px = 2.0833in wide, so width is the binding dimension.
        assert!((ctx.scale - 4.8).abs() < 1e-9);
        assert!(ctx.off_x.abs() < 1e-9);
        assert!((ctx.off_y - 0.3125).abs() < 1e-9);
    }

    #[test]
    fn test_fit_zero_size_root_is_finite() {
        let root = Rect::new(10.0, 10.0, 0.0, 0.0);
        let ctx = LayoutContext::fit(&root, &SlideLayout::LAYOUT_16X9);
        assert_eq!(ctx.scale, 1.0);
        assert!(ctx.off_x.is_finite());
    }

    #[test]
    fn test_place_relative_to_root() {
        let root = Rect::new(100.0, 50.0, 960.0, 540.0);
        let ctx = LayoutContext::fit(&root, &SlideLayout::LAYOUT_16X9);
        let p = ctx.place(&Rect::new(196.0, 50.0, 96.0, 48.0));

        assert!((p.x - 1.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        assert!((p.w - 1.0).abs() < 1e-9);
        assert!((p.h - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_halign_from_css() {
        assert_eq!(HAlign::from_css("start"), HAlign::Left);
        assert_eq!(HAlign::from_css("end"), HAlign::Right);
        assert_eq!(HAlign::from_css("center"), HAlign::Center);
        assert_eq!(HAlign::from_css("justify"), HAlign::Justify);
        assert_eq!(HAlign::from_css(""), HAlign::Left);
    }

    #[test]
    fn test_valign_from_align_items() {
        assert_eq!(VAlign::from_align_items("center"), VAlign::Middle);
        assert_eq!(VAlign::from_align_items("flex-start"), VAlign::Top);
    }

    #[test]
    fn test_export_options_defaults() {
        assert_eq!(ExportOptions::default().file_name, "export.pptx");
        assert_eq!(ExportOptions::new().with_file_name("  ").file_name, "export.pptx");

        let opts: ExportOptions = serde_json::from_str(r#"{"fileName":"deck.pptx"}"#).unwrap();
        assert_eq!(opts.file_name, "deck.pptx");
        let opts: ExportOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.file_name, "export.pptx");
    }

    #[test]
    fn test_add_slide() {
        let mut pres = Presentation::default();
        pres.add_slide().add_image(ImageObject {
            placement: Placement { x: 0.0, y: 0.0, w: 1.0, h: 1.0 },
            data: "data:image/png;base64,".to_string(),
        });
        assert_eq!(pres.slides.len(), 1);
        assert_eq!(pres.object_count(), 1);
    }
}
