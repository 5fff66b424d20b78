//! Font and color properties to text-run styles.

use super::{leading_float, leading_int, parse_color};
use crate::dom::ComputedStyle;
use crate::types::{HexColor, TextStyle, PX_TO_PT};

/// Lowest numeric `font-weight` rendered as bold.
const BOLD_WEIGHT: i64 = 600;

/// Map the computed font and color of a node to a run style at `scale`.
pub fn text_style(style: &ComputedStyle, scale: f64) -> TextStyle {
    TextStyle {
        color: parse_color(&style.color).unwrap_or_else(HexColor::black),
        font_face: primary_font_family(&style.font_family),
        font_size: leading_float(&style.font_size).unwrap_or(0.0) * PX_TO_PT * scale,
        bold: leading_int(&style.font_weight).is_some_and(|w| w >= BOLD_WEIGHT),
    }
}

/// First family of a `font-family` list, without quotes.
fn primary_font_family(font_family: &str) -> String {
    font_family
        .split(',')
        .next()
        .unwrap_or("")
        .replace(['"', '\''], "")
        .trim()
        .to_string()
}

/// Apply `text-transform` to a run.
pub fn apply_text_transform(text: &str, text_transform: &str) -> String {
    match text_transform.trim() {
        "uppercase" => text.to_uppercase(),
        "lowercase" => text.to_lowercase(),
        _ => text.to_string(),
    }
}
