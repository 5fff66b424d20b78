//! CSS color functions to hex color codes.

use super::is_transparent_black;
use crate::types::HexColor;
use regex::Regex;
use std::sync::LazyLock;

static DIGITS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Convert a computed color such as `rgb(255, 0, 0)` into `FF0000`.
///
/// Returns `None` for empty input, `transparent`, fully transparent black,
/// and anything without three numeric components. The alpha channel is
/// ignored otherwise.
pub fn parse_color(value: &str) -> Option<HexColor> {
    let value = value.trim();
    if value.is_empty() || value == "transparent" || is_transparent_black(value) {
        return None;
    }

    let mut channels = DIGITS_REGEX
        .find_iter(value)
        .map(|m| m.as_str().parse::<u32>().unwrap_or(u32::MAX));
    let (r, g, b) = (channels.next()?, channels.next()?, channels.next()?);

    let packed = 0x100_0000u64 + ((r as u64) << 16) + ((g as u64) << 8) + b as u64;
    let hex = format!("{:X}", packed);
    Some(HexColor::from_hex(hex[1..].to_string()))
}
