//! Depth-first walk of a DOM subtree emitting slide objects.
//!
//! Every visible element is placed on the slide independently. Its own
//! background, border and shadow become a shape (or a gradient image),
//! then the element is either an image leaf, a text leaf, or a container
//! whose children are visited in document order. Sibling order is the
//! z-order of the slide, so children are never visited out of order.

use crate::classify::is_text_container;
use crate::css::gradient::{gradient_svg, GradientStroke};
use crate::css::text::apply_text_transform;
use crate::css::{is_transparent_black, parse_color, px_or_zero, text_style, visible_shadow};
use crate::dom::{ComputedStyle, DomView, NodeKind, Rect};
use crate::error::{Error, Result};
use crate::image::{processed_image, ImageLoader};
use crate::types::{
    ExportTarget, HAlign, ImageObject, LayoutContext, LineStyle, Placement, Presentation,
    ShapeDescriptor, ShapeKind, Slide, SlideLayout, TextBlock, TextRun, VAlign,
};
use regex::Regex;
use std::sync::LazyLock;

/// Line breaks and tabs inside a run.
static BREAKS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\n\r\t]+").unwrap());

/// Runs of two or more whitespace characters.
static SPACES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// An `<img>` child within this many pixels of its parent's size makes the
/// parent a plain wrapper.
const IMAGE_WRAPPER_TOLERANCE: f64 = 2.0;

/// Divisor of the smaller side giving a fully rounded corner factor.
const RADIUS_FACTOR_DIVISOR: f64 = 1.75;

/// Resolve the export root, failing when a selector matches nothing.
pub fn resolve_root<D: DomView>(dom: &D, target: ExportTarget<'_, D::NodeId>) -> Result<D::NodeId> {
    match target {
        ExportTarget::Element(node) => Ok(node),
        ExportTarget::Selector(selector) => dom
            .query_selector(selector)
            .ok_or_else(|| Error::RootNotFound(selector.to_string())),
    }
}

/// Build a one-slide presentation reproducing the subtree at `root`.
pub fn build_presentation<D: DomView>(
    dom: &D,
    root: D::NodeId,
    images: &dyn ImageLoader,
) -> Presentation {
    let layout = SlideLayout::LAYOUT_16X9;
    let mut presentation = Presentation::new(layout);

    let context = LayoutContext::fit(&dom.bounding_rect(root), &layout);
    let emitter = SlideEmitter::new(dom, images, context);
    emitter.visit(root, presentation.add_slide());

    log::debug!(
        "Exported {} slide objects at scale {:.3}",
        presentation.object_count(),
        context.scale
    );
    presentation
}

/// Walks a subtree and draws it onto a slide.
pub struct SlideEmitter<'a, D: DomView> {
    dom: &'a D,
    images: &'a dyn ImageLoader,
    context: LayoutContext,
}

impl<'a, D: DomView> SlideEmitter<'a, D> {
    pub fn new(dom: &'a D, images: &'a dyn ImageLoader, context: LayoutContext) -> Self {
        Self {
            dom,
            images,
            context,
        }
    }

    /// Emit `node` and its visible descendants onto `slide`.
    pub fn visit(&self, node: D::NodeId, slide: &mut Slide) {
        if self.dom.node_kind(node) != NodeKind::Element {
            return;
        }
        let Some(style) = self.dom.computed_style(node) else {
            return;
        };
        if style.is_hidden() {
            log::debug!("Skipping hidden <{}>", self.dom.tag_name(node));
            return;
        }

        let rect = self.dom.bounding_rect(node);
        if rect.is_empty() {
            return;
        }

        let placement = self.context.place(&rect);
        let is_image_wrapper = self.is_image_wrapper(node, &rect);

        self.emit_box(style, &rect, placement, is_image_wrapper, slide);

        if self.dom.tag_name(node) == "img" {
            self.emit_image(node, style, &rect, placement, slide);
            return;
        }

        if is_text_container(self.dom, node) {
            self.emit_text(node, style, placement, slide);
            return;
        }

        for child in self.dom.children(node) {
            self.visit(child, slide);
        }
    }

    /// A parent whose single `<img>` child fills it: its background would
    /// show as a halo around the rounded image.
    fn is_image_wrapper(&self, node: D::NodeId, rect: &Rect) -> bool {
        let mut images = self
            .dom
            .children(node)
            .into_iter()
            .filter(|&c| self.dom.tag_name(c) == "img");

        match (images.next(), images.next()) {
            (Some(img), None) => self
                .dom
                .bounding_rect(img)
                .same_size_as(rect, IMAGE_WRAPPER_TOLERANCE),
            _ => false,
        }
    }

    /// Background, border and shadow of the element itself.
    fn emit_box(
        &self,
        style: &ComputedStyle,
        rect: &Rect,
        placement: Placement,
        is_image_wrapper: bool,
        slide: &mut Slide,
    ) {
        let fill = parse_color(&style.background_color).filter(|_| !is_image_wrapper);

        let border_color = parse_color(&style.border_color);
        let border_width = px_or_zero(&style.border_width);
        let border = border_color.filter(|_| border_width > 0.0);

        let radius = px_or_zero(&style.border_radius);
        let box_shadow = style.box_shadow.trim();
        let has_shadow = !box_shadow.is_empty() && box_shadow != "none";

        if style.background_image.contains("linear-gradient") {
            let stroke = border.clone().map(|color| GradientStroke {
                color,
                width: border_width,
            });
            match gradient_svg(
                rect.width,
                rect.height,
                &style.background_image,
                radius,
                stroke.as_ref(),
            ) {
                Some(doc) => slide.add_image(ImageObject {
                    placement,
                    data: doc.data_uri(),
                }),
                None => log::debug!("Unsupported gradient: {}", style.background_image),
            }
            return;
        }

        if fill.is_none() && border.is_none() && !has_shadow {
            return;
        }

        let mut shape = ShapeDescriptor {
            kind: ShapeKind::Rect,
            placement,
            line: border.clone().map(|color| LineStyle {
                color,
                width: self.context.px_to_pt(border_width),
            }),
            fill,
            shadow: None,
            rect_radius: None,
        };

        if has_shadow {
            shape.shadow = visible_shadow(box_shadow, self.context.scale);

            // A shadow needs a surface to be rendered against.
            if shape.fill.is_none()
                && border.is_none()
                && !style.background_color.is_empty()
                && !is_transparent_black(&style.background_color)
            {
                shape.fill = parse_color(&style.background_color);
            }
        }

        let min_side = rect.width.min(rect.height);
        if radius >= min_side / 2.0 - 1.0 {
            shape.kind = ShapeKind::Ellipse;
        } else if radius > 0.0 {
            shape.kind = ShapeKind::RoundRect;
            shape.rect_radius = Some((radius / (min_side / RADIUS_FACTOR_DIVISOR)).min(1.0));
        }

        slide.add_shape(shape);
    }

    fn emit_image(
        &self,
        node: D::NodeId,
        style: &ComputedStyle,
        rect: &Rect,
        placement: Placement,
        slide: &mut Slide,
    ) {
        let Some(src) = self.dom.attribute(node, "src").filter(|s| !s.is_empty()) else {
            log::debug!("Skipping <img> without src");
            return;
        };

        let mut radius = px_or_zero(&style.border_radius);
        if radius == 0.0 {
            // Clipping by a rounded parent.
            if let Some(parent_style) = self.dom.parent(node).and_then(|p| self.dom.computed_style(p)) {
                if parent_style.overflow.trim() != "visible" {
                    radius = px_or_zero(&parent_style.border_radius);
                }
            }
        }

        if let Some(data) = processed_image(self.images, src, rect.width, rect.height, radius) {
            slide.add_image(ImageObject { placement, data });
        }
    }

    fn emit_text(
        &self,
        node: D::NodeId,
        style: &ComputedStyle,
        placement: Placement,
        slide: &mut Slide,
    ) {
        let runs = self.text_runs(node, style);
        if runs.is_empty() {
            return;
        }

        slide.add_text(TextBlock {
            placement,
            runs,
            align: HAlign::from_css(&style.text_align),
            valign: VAlign::from_align_items(&style.align_items),
            margin: 0.0,
            wrap: true,
            auto_fit: false,
        });
    }

    /// One run per direct child node, in document order.
    fn text_runs(&self, node: D::NodeId, style: &ComputedStyle) -> Vec<TextRun> {
        let child_nodes = self.dom.child_nodes(node);
        let last = child_nodes.len().saturating_sub(1);
        let mut runs = Vec::new();

        for (index, child) in child_nodes.into_iter().enumerate() {
            let (raw, run_style) = match self.dom.node_kind(child) {
                NodeKind::Text => (self.dom.node_value(child).unwrap_or("").to_string(), style),
                NodeKind::Element => (
                    self.dom.text_content(child),
                    self.dom.computed_style(child).unwrap_or(style),
                ),
                NodeKind::Other => continue,
            };

            let mut text = collapse_whitespace(&raw);
            if index == 0 {
                text = text.trim_start().to_string();
            }
            if index == last {
                text = text.trim_end().to_string();
            }
            let text = apply_text_transform(&text, &run_style.text_transform);

            if !text.is_empty() {
                runs.push(TextRun {
                    text,
                    style: text_style(run_style, self.context.scale),
                });
            }
        }

        runs
    }
}

fn collapse_whitespace(text: &str) -> String {
    let text = BREAKS_REGEX.replace_all(text, " ");
    SPACES_REGEX.replace_all(&text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{encode_data_uri, DataUriLoader};
    use crate::snapshot::DomSnapshot;
    use crate::types::SlideObject;

    fn build(json: &str) -> Presentation {
        let dom = DomSnapshot::from_json(json).unwrap();
        build_presentation(&dom, dom.root(), &DataUriLoader)
    }

    fn objects(pres: &Presentation) -> &[SlideObject] {
        &pres.slides[0].objects
    }

    fn shape(obj: &SlideObject) -> &ShapeDescriptor {
        match obj {
            SlideObject::Shape(s) => s,
            other => panic!("expected shape, got {:?}", other),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    const RED_BOX: &str = r#"{
        "root": {
            "tag": "div",
            "rect": { "x": 0, "y": 0, "width": 200, "height": 100 },
            "children": [{
                "tag": "div",
                "style": { "backgroundColor": "rgb(255, 0, 0)" },
                "rect": { "x": 10, "y": 10, "width": 50, "height": 50 }
            }]
        }
    }"#;

    #[test]
    fn test_solid_box_placement() {
        let pres = build(RED_BOX);
        let objs = objects(&pres);
        assert_eq!(objs.len(), 1);

        let s = shape(&objs[0]);
        assert_eq!(s.kind, ShapeKind::Rect);
        assert_eq!(s.fill.as_ref().map(|c| c.as_str()), Some("FF0000"));
        assert!(s.line.is_none());

        // scale 4.8, centered vertically with 0.3125in margins
        let scale = 4.8;
        assert!(approx(s.placement.x, 10.0 / 96.0 * scale));
        assert!(approx(s.placement.y, 0.3125 + 10.0 / 96.0 * scale));
        assert!(approx(s.placement.w, 50.0 / 96.0 * scale));
        assert!(approx(s.placement.h, 50.0 / 96.0 * scale));
    }

    #[test]
    fn test_idempotent() {
        assert_eq!(build(RED_BOX), build(RED_BOX));
    }

    #[test]
    fn test_opacity_zero_prunes_subtree() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "rect": { "x": 0, "y": 0, "width": 200, "height": 100 },
                "children": [{
                    "tag": "div",
                    "style": { "opacity": "0", "backgroundColor": "rgb(0, 0, 255)" },
                    "rect": { "x": 0, "y": 0, "width": 100, "height": 100 },
                    "children": [{
                        "tag": "div",
                        "style": { "backgroundColor": "rgb(255, 0, 0)" },
                        "rect": { "x": 0, "y": 0, "width": 50, "height": 50 }
                    }]
                }]
            } }"#,
        );
        assert!(objects(&pres).is_empty());
    }

    #[test]
    fn test_hidden_and_zero_size_skipped() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "rect": { "x": 0, "y": 0, "width": 200, "height": 100 },
                "children": [
                    { "tag": "div", "style": { "display": "none", "backgroundColor": "rgb(1, 1, 1)" },
                      "rect": { "x": 0, "y": 0, "width": 10, "height": 10 } },
                    { "tag": "div", "style": { "visibility": "hidden", "backgroundColor": "rgb(1, 1, 1)" },
                      "rect": { "x": 0, "y": 0, "width": 10, "height": 10 } },
                    { "tag": "div", "style": { "backgroundColor": "rgb(1, 1, 1)" },
                      "rect": { "x": 0, "y": 0, "width": 0, "height": 10 } }
                ]
            } }"#,
        );
        assert!(objects(&pres).is_empty());
    }

    #[test]
    fn test_shape_kinds() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "rect": { "x": 0, "y": 0, "width": 960, "height": 540 },
                "children": [
                    { "tag": "div", "style": { "backgroundColor": "rgb(1, 1, 1)", "borderRadius": "50px" },
                      "rect": { "x": 0, "y": 0, "width": 100, "height": 100 } },
                    { "tag": "div", "style": { "backgroundColor": "rgb(1, 1, 1)", "borderRadius": "10px" },
                      "rect": { "x": 0, "y": 0, "width": 100, "height": 70 } },
                    { "tag": "div", "style": { "backgroundColor": "rgb(1, 1, 1)" },
                      "rect": { "x": 0, "y": 0, "width": 200, "height": 1 } }
                ]
            } }"#,
        );
        let objs = objects(&pres);
        assert_eq!(objs.len(), 3);

        assert_eq!(shape(&objs[0]).kind, ShapeKind::Ellipse);

        let rounded = shape(&objs[1]);
        assert_eq!(rounded.kind, ShapeKind::RoundRect);
        assert!(approx(rounded.rect_radius.unwrap(), 10.0 / (70.0 / 1.75)));

        // Boxes under 2px thick fall within the ellipse rule even unrounded.
        assert_eq!(shape(&objs[2]).kind, ShapeKind::Ellipse);
    }

    #[test]
    fn test_horizontal_rule_is_ellipse() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "rect": { "x": 0, "y": 0, "width": 960, "height": 540 },
                "children": [
                    { "tag": "hr", "style": { "backgroundColor": "rgb(128, 128, 128)" },
                      "rect": { "x": 0, "y": 100, "width": 200, "height": 1 } },
                    { "tag": "div", "style": { "backgroundColor": "rgb(128, 128, 128)" },
                      "rect": { "x": 0, "y": 200, "width": 200, "height": 2 } }
                ]
            } }"#,
        );
        let objs = objects(&pres);
        assert_eq!(objs.len(), 2);

        let rule = shape(&objs[0]);
        assert_eq!(rule.kind, ShapeKind::Ellipse);
        assert!(rule.rect_radius.is_none());
        assert_eq!(rule.fill.as_ref().unwrap().as_str(), "808080");

        assert_eq!(shape(&objs[1]).kind, ShapeKind::Rect);
    }

    #[test]
    fn test_border_only_shape() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "style": { "borderWidth": "2px", "borderColor": "rgb(0, 0, 255)" },
                "rect": { "x": 0, "y": 0, "width": 960, "height": 540 }
            } }"#,
        );
        let s = shape(&objects(&pres)[0]);
        assert!(s.fill.is_none());
        let line = s.line.as_ref().unwrap();
        assert_eq!(line.color.as_str(), "0000FF");
        // scale is 1.0 for a 960x540 root
        assert!(approx(line.width, 1.5));
    }

    #[test]
    fn test_shadow_without_fill() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "style": { "boxShadow": "rgba(0, 0, 0, 0.5) 2px 3px 4px" },
                "rect": { "x": 0, "y": 0, "width": 960, "height": 540 }
            } }"#,
        );
        let s = shape(&objects(&pres)[0]);
        assert!(s.fill.is_none());
        let shadow = s.shadow.as_ref().unwrap();
        assert!(approx(shadow.opacity, 0.5));
        assert!(approx(shadow.blur, 3.0));
    }

    #[test]
    fn test_gradient_background_becomes_image() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "style": { "backgroundImage": "linear-gradient(to right, rgb(255, 0, 0), rgb(0, 0, 255))",
                           "backgroundColor": "rgb(0, 255, 0)" },
                "rect": { "x": 0, "y": 0, "width": 960, "height": 540 }
            } }"#,
        );
        let objs = objects(&pres);
        assert_eq!(objs.len(), 1);
        match &objs[0] {
            SlideObject::Image(img) => assert!(img.data.starts_with("data:image/svg+xml;base64,")),
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_text_runs() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "rect": { "x": 0, "y": 0, "width": 960, "height": 540 },
                "children": [{
                    "tag": "p",
                    "style": { "textAlign": "end", "alignItems": "center", "fontSize": "20px" },
                    "rect": { "x": 0, "y": 0, "width": 400, "height": 40 },
                    "children": [
                        { "text": "\n   Hello\t\tthere  " },
                        { "tag": "strong",
                          "style": { "display": "inline", "fontWeight": "700", "textTransform": "uppercase" },
                          "rect": { "x": 0, "y": 0, "width": 40, "height": 20 },
                          "children": [ { "text": "world" } ] },
                        { "text": "  !  \n" }
                    ]
                }]
            } }"#,
        );
        let objs = objects(&pres);
        assert_eq!(objs.len(), 1);

        let SlideObject::Text(block) = &objs[0] else {
            panic!("expected text block");
        };
        let texts: Vec<&str> = block.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello there ", "WORLD", " !"]);
        assert!(block.runs[1].style.bold);
        assert!(!block.runs[0].style.bold);
        assert!(approx(block.runs[0].style.font_size, 15.0));
        assert_eq!(block.align, HAlign::Right);
        assert_eq!(block.valign, VAlign::Middle);
        assert!(block.wrap);
        assert!(!block.auto_fit);
        assert_eq!(block.margin, 0.0);
    }

    #[test]
    fn test_container_recurses_in_document_order() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "rect": { "x": 0, "y": 0, "width": 960, "height": 540 },
                "children": [
                    { "tag": "div", "style": { "backgroundColor": "rgb(1, 0, 0)" },
                      "rect": { "x": 0, "y": 0, "width": 10, "height": 10 } },
                    { "tag": "div", "rect": { "x": 0, "y": 0, "width": 10, "height": 10 },
                      "children": [{ "text": "a" }] },
                    { "tag": "div", "style": { "backgroundColor": "rgb(3, 0, 0)" },
                      "rect": { "x": 0, "y": 0, "width": 10, "height": 10 } }
                ]
            } }"#,
        );
        let objs = objects(&pres);
        assert_eq!(objs.len(), 3);
        assert_eq!(shape(&objs[0]).fill.as_ref().unwrap().as_str(), "010000");
        assert!(matches!(objs[1], SlideObject::Text(_)));
        assert_eq!(shape(&objs[2]).fill.as_ref().unwrap().as_str(), "030000");
    }

    fn png_data_uri() -> String {
        let mut pixmap = tiny_skia::Pixmap::new(4, 4).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(0, 128, 0, 255));
        encode_data_uri("image/png", &pixmap.encode_png().unwrap())
    }

    #[test]
    fn test_image_wrapper_suppresses_fill() {
        let json = format!(
            r#"{{ "root": {{
                "tag": "div",
                "style": {{ "backgroundColor": "rgb(255, 255, 255)", "borderRadius": "8px",
                            "overflow": "hidden" }},
                "rect": {{ "x": 0, "y": 0, "width": 160, "height": 90 }},
                "children": [{{
                    "tag": "img",
                    "attributes": {{ "src": "{}" }},
                    "rect": {{ "x": 0, "y": 0, "width": 159, "height": 89 }}
                }}]
            }} }}"#,
            png_data_uri()
        );
        let pres = build(&json);
        let objs = objects(&pres);

        // The wrapper has no border or shadow, so with its fill suppressed
        // only the image remains.
        assert_eq!(objs.len(), 1);
        assert!(matches!(&objs[0], SlideObject::Image(img) if img.data.starts_with("data:image/png")));
    }

    #[test]
    fn test_shadowed_image_wrapper_keeps_background() {
        let json = format!(
            r#"{{ "root": {{
                "tag": "div",
                "style": {{ "backgroundColor": "rgb(10, 20, 30)",
                            "boxShadow": "rgba(0, 0, 0, 0.3) 0px 4px 8px" }},
                "rect": {{ "x": 0, "y": 0, "width": 160, "height": 90 }},
                "children": [{{
                    "tag": "img",
                    "attributes": {{ "src": "{}" }},
                    "rect": {{ "x": 0, "y": 0, "width": 160, "height": 90 }}
                }}]
            }} }}"#,
            png_data_uri()
        );
        let pres = build(&json);
        let objs = objects(&pres);
        assert_eq!(objs.len(), 2);

        let wrapper = shape(&objs[0]);
        assert_eq!(wrapper.fill.as_ref().map(|c| c.as_str()), Some("0A141E"));
        assert!(wrapper.shadow.is_some());
        assert!(matches!(objs[1], SlideObject::Image(_)));
    }

    /// Corner alpha of the image emitted for an `<img>` inside a rounded parent.
    fn corner_alpha_under_parent(overflow: &str) -> u8 {
        let json = format!(
            r#"{{ "root": {{
                "tag": "div",
                "style": {{ "borderRadius": "20px", "overflow": "{}" }},
                "rect": {{ "x": 0, "y": 0, "width": 40, "height": 40 }},
                "children": [{{
                    "tag": "img",
                    "attributes": {{ "src": "{}" }},
                    "rect": {{ "x": 0, "y": 0, "width": 40, "height": 40 }}
                }}]
            }} }}"#,
            overflow,
            png_data_uri()
        );
        let pres = build(&json);
        let data = match objects(&pres) {
            [SlideObject::Image(img)] => img.data.clone(),
            other => panic!("expected one image, got {:?}", other),
        };
        let (_, png) = crate::image::decode_data_uri(&data).unwrap();
        let pixmap = tiny_skia::Pixmap::decode_png(&png).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (80, 80));
        pixmap.pixel(0, 0).unwrap().alpha()
    }

    #[test]
    fn test_image_inherits_parent_radius_when_clipped() {
        assert_eq!(corner_alpha_under_parent("hidden"), 0);
        assert!(corner_alpha_under_parent("visible") > 250);
    }

    #[test]
    fn test_broken_image_is_omitted() {
        let pres = build(
            r#"{ "root": {
                "tag": "div",
                "rect": { "x": 0, "y": 0, "width": 960, "height": 540 },
                "children": [
                    { "tag": "img", "attributes": { "src": "nowhere.png" },
                      "rect": { "x": 0, "y": 0, "width": 10, "height": 10 } },
                    { "tag": "div", "style": { "backgroundColor": "rgb(1, 0, 0)" },
                      "rect": { "x": 0, "y": 0, "width": 10, "height": 10 } }
                ]
            } }"#,
        );
        assert_eq!(objects(&pres).len(), 1);
    }

    #[test]
    fn test_resolve_root() {
        let dom = DomSnapshot::from_json(RED_BOX).unwrap();
        assert_eq!(resolve_root(&dom, ExportTarget::Selector("div")).unwrap(), dom.root());
        assert_eq!(
            resolve_root(&dom, ExportTarget::Element(dom.root())).unwrap(),
            dom.root()
        );
        assert!(matches!(
            resolve_root(&dom, ExportTarget::Selector("#nope")),
            Err(Error::RootNotFound(_))
        ));
    }
}
