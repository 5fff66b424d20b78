//! Image loading and rounded, cover-fitted rasterisation.
//!
//! `<img>` content is redrawn on an offscreen surface so rounded clipping
//! and `object-fit: cover` survive in the slide as a plain PNG.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint,
    Rect as SkRect, Transform,
};

/// Oversampling factor of the offscreen surface.
const SUPERSAMPLE: f32 = 2.0;

/// Bezier control distance approximating a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Source of encoded image bytes for an `<img>` `src`.
pub trait ImageLoader {
    fn load(&self, src: &str) -> Result<Vec<u8>>;
}

/// Loads only inline `data:` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriLoader;

impl ImageLoader for DataUriLoader {
    fn load(&self, src: &str) -> Result<Vec<u8>> {
        decode_data_uri(src).map(|(_, bytes)| bytes)
    }
}

/// Loads `data:` URIs, `file://` URLs, and paths relative to a base directory.
#[derive(Debug, Clone, Default)]
pub struct FsImageLoader {
    base_dir: PathBuf,
}

impl FsImageLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, src: &str) -> Result<PathBuf> {
        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(Error::ImageError(format!("Remote images are not fetched: {}", src)));
        }
        let path = Path::new(src.strip_prefix("file://").unwrap_or(src));
        Ok(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        })
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, src: &str) -> Result<Vec<u8>> {
        if src.starts_with("data:") {
            return decode_data_uri(src).map(|(_, bytes)| bytes);
        }
        let path = self.resolve(src)?;
        Ok(fs::read(&path)?)
    }
}

/// Split a base64 `data:` URI into its media type and decoded payload.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| Error::ImageError("Not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::ImageError("Data URI without payload".to_string()))?;

    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| Error::ImageError(format!("Data URI is not base64: {}", header)))?;

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| Error::ImageError(format!("Invalid base64 payload: {}", e)))?;

    Ok((media_type.to_string(), bytes))
}

/// Encode bytes as a base64 `data:` URI.
pub fn encode_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, BASE64.encode(bytes))
}

/// Redraw the image at `src` into a `target_w` x `target_h` pixel box with
/// rounded corners of `radius`, scaled to cover the box and center-cropped.
///
/// Returns a PNG data URI, or `None` when the image cannot be produced; the
/// caller then leaves the image out.
pub fn processed_image(
    loader: &dyn ImageLoader,
    src: &str,
    target_w: f64,
    target_h: f64,
    radius: f64,
) -> Option<String> {
    match render_cover(loader, src, target_w as f32, target_h as f32, radius as f32) {
        Ok(png) => Some(encode_data_uri("image/png", &png)),
        Err(e) => {
            log::warn!("Skipping image {}: {}", truncate_src(src), e);
            None
        }
    }
}

fn render_cover(
    loader: &dyn ImageLoader,
    src: &str,
    target_w: f32,
    target_h: f32,
    radius: f32,
) -> Result<Vec<u8>> {
    let bytes = loader.load(src)?;
    let source = if looks_like_svg(&bytes) {
        rasterize_svg(&bytes, target_w * SUPERSAMPLE, target_h * SUPERSAMPLE)?
    } else {
        decode_pixmap(&bytes)?
    };

    // Fractional sizes truncate, as canvas dimensions do.
    let surface_w = (target_w * SUPERSAMPLE).floor() as u32;
    let surface_h = (target_h * SUPERSAMPLE).floor() as u32;
    let mut surface = Pixmap::new(surface_w, surface_h).ok_or_else(|| {
        Error::ImageError(format!("Invalid surface size {}x{}", surface_w, surface_h))
    })?;
    let scale = Transform::from_scale(SUPERSAMPLE, SUPERSAMPLE);

    // Mask: opaque where the image may show.
    let mask = mask_path(target_w, target_h, radius)
        .ok_or_else(|| Error::ImageError("Degenerate mask".to_string()))?;
    let mut paint = Paint::default();
    paint.set_color(Color::BLACK);
    paint.anti_alias = true;
    surface.fill_path(&mask, &paint, FillRule::Winding, scale, None);

    // Object-fit: cover.
    let (img_w, img_h) = (source.width() as f32, source.height() as f32);
    let ratio = (target_w / img_w).max(target_h / img_h);
    let render_x = (target_w - img_w * ratio) / 2.0;
    let render_y = (target_h - img_h * ratio) / 2.0;
    let placement = Transform::from_row(ratio, 0.0, 0.0, ratio, render_x, render_y)
        .post_concat(scale);

    let image_paint = PixmapPaint {
        opacity: 1.0,
        blend_mode: BlendMode::SourceIn,
        quality: FilterQuality::Bicubic,
    };
    surface.draw_pixmap(0, 0, source.as_ref(), &image_paint, placement, None);

    surface
        .encode_png()
        .map_err(|e| Error::ImageError(format!("PNG encoding failed: {}", e)))
}

/// Rounded rectangle of the target box, or a plain one without rounding.
fn mask_path(w: f32, h: f32, radius: f32) -> Option<tiny_skia::Path> {
    let r = radius.min(w / 2.0).min(h / 2.0);
    if r <= 0.0 {
        return Some(PathBuilder::from_rect(SkRect::from_xywh(0.0, 0.0, w, h)?));
    }

    let k = r * KAPPA;
    let mut pb = PathBuilder::new();
    pb.move_to(r, 0.0);
    pb.line_to(w - r, 0.0);
    pb.cubic_to(w - r + k, 0.0, w, r - k, w, r);
    pb.line_to(w, h - r);
    pb.cubic_to(w, h - r + k, w - r + k, h, w - r, h);
    pb.line_to(r, h);
    pb.cubic_to(r - k, h, 0.0, h - r + k, 0.0, h - r);
    pb.line_to(0.0, r);
    pb.cubic_to(0.0, r - k, r - k, 0.0, r, 0.0);
    pb.close();
    pb.finish()
}

/// Decode any supported raster format into a premultiplied pixmap.
fn decode_pixmap(bytes: &[u8]) -> Result<Pixmap> {
    let rgba = ::image::load_from_memory(bytes)
        .map_err(|e| Error::ImageError(format!("Decode failed: {}", e)))?
        .to_rgba8();

    let mut pixmap = Pixmap::new(rgba.width(), rgba.height())
        .ok_or_else(|| Error::ImageError("Empty image".to_string()))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Whether `bytes` hold SVG markup rather than a raster format.
fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with('<') && text.contains("<svg")
}

/// Rasterise an SVG so it covers at least `min_w` x `min_h` pixels.
fn rasterize_svg(svg: &[u8], min_w: f32, min_h: f32) -> Result<Pixmap> {
    let tree = resvg::usvg::Tree::from_data(svg, &resvg::usvg::Options::default())
        .map_err(|e| Error::SvgError(format!("Failed to parse SVG: {}", e)))?;
    let size = tree.size();
    let scale = (min_w / size.width()).max(min_h / size.height()).max(1.0);

    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::SvgError(format!("Invalid SVG size {}x{}", width, height)))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    Ok(pixmap)
}

fn truncate_src(src: &str) -> &str {
    match src.char_indices().nth(64) {
        Some((i, _)) => &src[..i],
        None => src,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A solid-color PNG of the given size, encoded with tiny-skia.
    fn solid_png(w: u32, h: u32) -> Vec<u8> {
        let mut pixmap = Pixmap::new(w, h).unwrap();
        pixmap.fill(Color::from_rgba8(255, 0, 0, 255));
        pixmap.encode_png().unwrap()
    }

    fn decode(uri: &str) -> Pixmap {
        let (media_type, bytes) = decode_data_uri(uri).unwrap();
        assert_eq!(media_type, "image/png");
        Pixmap::decode_png(&bytes).unwrap()
    }

    #[test]
    fn test_decode_data_uri() {
        let (media_type, bytes) = decode_data_uri("data:text/plain;base64,aGk=").unwrap();
        assert_eq!(media_type, "text/plain");
        assert_eq!(bytes, b"hi");

        assert!(decode_data_uri("hello").is_err());
        assert!(decode_data_uri("data:text/plain,hi").is_err());
        assert!(decode_data_uri("data:image/png;base64,***").is_err());
    }

    #[test]
    fn test_processed_image_surface_is_oversampled() {
        let src = encode_data_uri("image/png", &solid_png(40, 20));
        let uri = processed_image(&DataUriLoader, &src, 30.0, 30.0, 0.0).unwrap();
        let pixmap = decode(&uri);

        assert_eq!((pixmap.width(), pixmap.height()), (60, 60));
        // Cover fit: the square box is fully painted.
        let center = pixmap.pixel(30, 30).unwrap();
        assert_eq!(center.alpha(), 255);
        assert_eq!(center.red(), 255);
        assert_eq!(pixmap.pixel(2, 2).unwrap().alpha(), 255);
    }

    #[test]
    fn test_processed_image_rounded_corners_are_clear() {
        let src = encode_data_uri("image/png", &solid_png(10, 10));
        let uri = processed_image(&DataUriLoader, &src, 20.0, 20.0, 10.0).unwrap();
        let pixmap = decode(&uri);

        assert_eq!(pixmap.pixel(0, 0).unwrap().alpha(), 0);
        assert_eq!(pixmap.pixel(20, 20).unwrap().alpha(), 255);
    }

    #[test]
    fn test_processed_image_from_svg_source() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="red"/></svg>"#;
        let src = encode_data_uri("image/svg+xml", svg);
        let uri = processed_image(&DataUriLoader, &src, 10.0, 10.0, 0.0).unwrap();
        let pixmap = decode(&uri);

        assert_eq!((pixmap.width(), pixmap.height()), (20, 20));
        let center = pixmap.pixel(10, 10).unwrap();
        assert_eq!((center.red(), center.alpha()), (255, 255));
    }

    #[test]
    fn test_processed_image_fractional_size_truncates() {
        let src = encode_data_uri("image/png", &solid_png(10, 10));
        let uri = processed_image(&DataUriLoader, &src, 10.75, 5.25, 0.0).unwrap();
        let pixmap = decode(&uri);

        assert_eq!((pixmap.width(), pixmap.height()), (21, 10));
    }

    #[test]
    fn test_looks_like_svg() {
        assert!(looks_like_svg(b"  <svg viewBox=\"0 0 1 1\"/>"));
        assert!(looks_like_svg(b"<?xml version=\"1.0\"?>\n<svg/>"));
        assert!(!looks_like_svg(&solid_png(2, 2)));
        assert!(!looks_like_svg(b"<html></html>"));
    }

    #[test]
    fn test_processed_image_load_failure() {
        assert!(processed_image(&DataUriLoader, "missing.png", 10.0, 10.0, 0.0).is_none());
        let garbage = encode_data_uri("image/png", b"not an image");
        assert!(processed_image(&DataUriLoader, &garbage, 10.0, 10.0, 0.0).is_none());
    }

    #[test]
    fn test_fs_loader_rejects_remote() {
        let loader = FsImageLoader::new(".");
        assert!(loader.load("https://example.com/a.png").is_err());
    }

    #[test]
    fn test_mask_path_plain_rect() {
        let path = mask_path(10.0, 5.0, 0.0).unwrap();
        let bounds = path.bounds();
        assert_eq!((bounds.width(), bounds.height()), (10.0, 5.0));
    }
}
