//! `linear-gradient(...)` backgrounds rendered as standalone SVG documents.
//!
//! Presentation shapes cannot carry CSS gradients with rounded clipping and
//! alpha stops, so the background is drawn as a vector image instead.

use super::{format_number, split_top_level_commas};
use crate::types::HexColor;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use quick_xml::escape::escape;
use regex::Regex;
use std::fmt::Write as FmtWrite;
use std::sync::LazyLock;

static LINEAR_GRADIENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"linear-gradient\((.*)\)").unwrap());

/// A stop color followed by an explicit position.
static STOP_POSITION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s+(\d+(\.\d+)?%?)$").unwrap());

static ANGLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?[\d.]+)deg$").unwrap());

static NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d.]+").unwrap());

/// Outline drawn around the gradient rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStroke {
    pub color: HexColor,

    /// Stroke width in CSS pixels.
    pub width: f64,
}

/// Endpoints of the gradient vector, as percentages of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    TopToBottom,
    BottomToTop,
    LeftToRight,
    RightToLeft,
}

impl Axis {
    fn endpoints(self) -> [&'static str; 4] {
        match self {
            Axis::TopToBottom => ["0%", "0%", "0%", "100%"],
            Axis::BottomToTop => ["0%", "100%", "0%", "0%"],
            Axis::LeftToRight => ["0%", "0%", "100%", "0%"],
            Axis::RightToLeft => ["100%", "0%", "0%", "0%"],
        }
    }

    /// Read a direction argument. `None` means the segment is a color stop.
    fn from_segment(segment: &str) -> Option<Self> {
        let segment = segment.trim();
        if segment.contains("to right") {
            return Some(Axis::LeftToRight);
        }
        if segment.contains("to left") {
            return Some(Axis::RightToLeft);
        }
        if segment == "to top" {
            return Some(Axis::BottomToTop);
        }
        if segment.starts_with("to ") {
            return Some(Axis::TopToBottom);
        }

        let degrees: f64 = ANGLE_REGEX.captures(segment)?[1].parse().ok()?;
        Some(match degrees.rem_euclid(360.0) {
            d if d == 0.0 => Axis::BottomToTop,
            d if d == 90.0 => Axis::LeftToRight,
            d if d == 270.0 => Axis::RightToLeft,
            _ => Axis::TopToBottom,
        })
    }
}

/// One color stop of the gradient.
#[derive(Debug, Clone, PartialEq)]
struct Stop {
    offset: String,
    color: String,
    opacity: String,
}

impl Stop {
    fn parse(segment: &str, idx: usize, count: usize) -> Self {
        let mut color = segment.trim().to_string();
        let mut offset = if count > 1 {
            format!("{}%", (idx as f64 / (count - 1) as f64 * 100.0).round())
        } else {
            "0%".to_string()
        };

        if let Some(caps) = STOP_POSITION_REGEX.captures(segment.trim()) {
            offset = caps[2].to_string();
            color = caps[1].trim().to_string();
        }

        let mut opacity = "1".to_string();
        if color.contains("rgba") {
            let channels: Vec<&str> = NUMBER_REGEX.find_iter(&color).map(|m| m.as_str()).collect();
            if channels.len() > 3 {
                opacity = channels[3].to_string();
                color = format!("rgb({},{},{})", channels[0], channels[1], channels[2]);
            }
        }

        Self {
            offset,
            color,
            opacity,
        }
    }
}

/// A self-contained SVG image that paints a linear gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientDocument {
    markup: String,
}

impl GradientDocument {
    /// The SVG markup.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// The markup as a `data:image/svg+xml;base64,` URI.
    pub fn data_uri(&self) -> String {
        format!("data:image/svg+xml;base64,{}", BASE64.encode(self.markup.as_bytes()))
    }
}

/// Render a CSS `linear-gradient(...)` value into an SVG of `width` x `height`
/// pixels, with rounded corners of `radius` and an optional outline.
///
/// Returns `None` when the value is not a linear gradient.
pub fn gradient_svg(
    width: f64,
    height: f64,
    background_image: &str,
    radius: f64,
    stroke: Option<&GradientStroke>,
) -> Option<GradientDocument> {
    let caps = LINEAR_GRADIENT_REGEX.captures(background_image)?;
    let parts = split_top_level_commas(&caps[1]);
    let first = parts.first()?;

    let (axis, stops_start) = match Axis::from_segment(first) {
        Some(axis) => (axis, 1),
        None => (Axis::TopToBottom, 0),
    };

    let stop_parts: Vec<&str> = parts[stops_start..]
        .iter()
        .copied()
        .filter(|p| !p.is_empty())
        .collect();
    if stop_parts.is_empty() {
        log::debug!("Gradient without color stops: {}", background_image);
        return None;
    }

    let mut stops_xml = String::new();
    for (idx, part) in stop_parts.iter().enumerate() {
        let stop = Stop::parse(part, idx, stop_parts.len());
        write!(
            stops_xml,
            r#"<stop offset="{}" stop-color="{}" stop-opacity="{}"/>"#,
            escape(&stop.offset),
            escape(&stop.color),
            escape(&stop.opacity)
        )
        .ok()?;
    }

    let stroke_attr = stroke
        .map(|s| {
            format!(
                r##" stroke="#{}" stroke-width="{}""##,
                s.color,
                format_number(s.width)
            )
        })
        .unwrap_or_default();

    let [x1, y1, x2, y2] = axis.endpoints();
    let (w, h, r) = (format_number(width), format_number(height), format_number(radius));

    let mut markup = String::with_capacity(512 + stops_xml.len());
    write!(
        markup,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    )
    .ok()?;
    write!(
        markup,
        r#"<defs><linearGradient id="grad" x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}">{stops_xml}</linearGradient></defs>"#
    )
    .ok()?;
    write!(
        markup,
        r#"<rect x="0" y="0" width="{w}" height="{h}" rx="{r}" ry="{r}" fill="url(#grad)"{stroke_attr}/></svg>"#
    )
    .ok()?;

    Some(GradientDocument { markup })
}
