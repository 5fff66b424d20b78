//! Translation of computed CSS values into slide properties.
//!
//! Each parser recognises a narrow subset of CSS syntax and returns `None`
//! for anything else, leaving the caller to drop that visual feature.

pub mod color;
pub mod gradient;
pub mod shadow;
pub mod text;

pub use color::parse_color;
pub use gradient::{gradient_svg, GradientDocument, GradientStroke};
pub use shadow::visible_shadow;
pub use text::text_style;

use regex::Regex;
use std::sync::LazyLock;

/// Leading decimal number, the part of a value `parseFloat` would read.
static LEADING_FLOAT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?").unwrap());

/// Leading integer, the part of a value `parseInt` would read.
static LEADING_INT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-+]?\d+").unwrap());

/// Split a value list on commas that are not nested inside parentheses.
///
/// `rgba(0, 0, 0, 0.5) 1px 1px 2px, red 0 0 1px` yields two layers.
pub fn split_top_level_commas(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts
}

/// Read the leading number of a CSS length such as `12.5px`.
pub fn leading_float(value: &str) -> Option<f64> {
    LEADING_FLOAT_REGEX
        .find(value)
        .and_then(|m| m.as_str().trim().parse().ok())
}

/// Read the leading integer of a value such as `700`.
pub fn leading_int(value: &str) -> Option<i64> {
    LEADING_INT_REGEX
        .find(value)
        .and_then(|m| m.as_str().trim().parse().ok())
}

/// A pixel length that defaults to zero when unreadable.
pub fn px_or_zero(value: &str) -> f64 {
    leading_float(value).unwrap_or(0.0)
}

/// Whether a color value is fully transparent black, spacing ignored.
pub(crate) fn is_transparent_black(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    compact.starts_with("rgba(0,0,0,0)")
}

/// Format a number the way a script engine prints it: no trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_top_level_commas() {
        assert_eq!(
            split_top_level_commas("to right, rgba(0, 0, 0, 0.5) 10%, red"),
            vec!["to right", "rgba(0, 0, 0, 0.5) 10%", "red"]
        );
        assert_eq!(split_top_level_commas("none"), vec!["none"]);
    }

    #[test]
    fn test_leading_float() {
        assert_eq!(leading_float("12.5px"), Some(12.5));
        assert_eq!(leading_float("-3px 4px"), Some(-3.0));
        assert_eq!(leading_float(".5em"), Some(0.5));
        assert_eq!(leading_float("auto"), None);
        assert_eq!(px_or_zero(""), 0.0);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("700"), Some(700));
        assert_eq!(leading_int("600.5"), Some(600));
        assert_eq!(leading_int("bold"), None);
    }

    #[test]
    fn test_is_transparent_black() {
        assert!(is_transparent_black("rgba(0, 0, 0, 0)"));
        assert!(is_transparent_black("rgba(0,0,0,0) 0px 0px"));
        assert!(!is_transparent_black("rgba(0, 0, 0, 0.5)"));
        assert!(!is_transparent_black("rgb(0, 0, 0)"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-2.0), "-2");
    }
}
