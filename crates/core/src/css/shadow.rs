//! `box-shadow` to a single outer drop shadow.

use super::{is_transparent_black, parse_color, split_top_level_commas};
use crate::types::{HexColor, ShadowDescriptor, PX_TO_PT};
use regex::Regex;
use std::sync::LazyLock;

/// `<color> <x>px <y>px <blur>px`, spread radius not supported.
static SHADOW_LAYER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(rgba?\([^)]+\)|#[0-9a-fA-F]+)\s+(-?[\d.]+)px\s+(-?[\d.]+)px\s+([\d.]+)px")
        .unwrap()
});

/// Alpha component at the end of an `rgba(...)` color.
static ALPHA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([0-9.]+)\s*\)").unwrap());

const DEFAULT_OPACITY: f64 = 0.4;

/// Pick the first visible layer of a `box-shadow` list.
///
/// Fully transparent layers and layers that do not match the supported
/// pattern are skipped. Blur and distance are converted to points at the
/// given layout scale.
pub fn visible_shadow(box_shadow: &str, scale: f64) -> Option<ShadowDescriptor> {
    let box_shadow = box_shadow.trim();
    if box_shadow.is_empty() || box_shadow == "none" {
        return None;
    }

    for layer in split_top_level_commas(box_shadow) {
        if is_transparent_black(layer) {
            continue;
        }

        let Some(caps) = SHADOW_LAYER_REGEX.captures(layer) else {
            log::debug!("Ignoring unsupported shadow layer: {}", layer);
            continue;
        };

        let color = &caps[1];
        let (Ok(x), Ok(y), Ok(blur)) = (
            caps[2].parse::<f64>(),
            caps[3].parse::<f64>(),
            caps[4].parse::<f64>(),
        ) else {
            continue;
        };

        let distance = x.hypot(y);
        let mut angle = y.atan2(x).to_degrees();
        if angle < 0.0 {
            angle += 360.0;
        }

        let opacity = if color.starts_with("rgba") {
            ALPHA_REGEX
                .captures(color)
                .and_then(|a| a[1].parse::<f64>().ok())
                .unwrap_or(DEFAULT_OPACITY)
        } else {
            DEFAULT_OPACITY
        };

        return Some(ShadowDescriptor {
            angle,
            offset: distance * PX_TO_PT * scale,
            blur: blur * PX_TO_PT * scale,
            color: parse_color(color).unwrap_or_else(HexColor::black),
            opacity,
        });
    }

    None
}
