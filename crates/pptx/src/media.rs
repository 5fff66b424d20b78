//! Image payloads embedded under `ppt/media/`.

use dompptx_core::image::decode_data_uri;
use dompptx_core::{Error, Result};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;

/// Oversampling of the PNG fallback drawn for vector images.
const FALLBACK_SCALE: f32 = 2.0;

/// Image formats the package can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Png,
    Jpeg,
    Gif,
    Svg,
}

impl MediaKind {
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(MediaKind::Png),
            "image/jpeg" | "image/jpg" => Some(MediaKind::Jpeg),
            "image/gif" => Some(MediaKind::Gif),
            "image/svg+xml" => Some(MediaKind::Svg),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Png => "png",
            MediaKind::Jpeg => "jpeg",
            MediaKind::Gif => "gif",
            MediaKind::Svg => "svg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MediaKind::Png => "image/png",
            MediaKind::Jpeg => "image/jpeg",
            MediaKind::Gif => "image/gif",
            MediaKind::Svg => "image/svg+xml",
        }
    }

    /// Every kind, for the package's default content types.
    pub fn all() -> [MediaKind; 4] {
        [MediaKind::Png, MediaKind::Jpeg, MediaKind::Gif, MediaKind::Svg]
    }
}

/// A decoded image ready to be stored in the package.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub kind: MediaKind,
    pub bytes: Vec<u8>,

    /// PNG rendering shown by readers without SVG support.
    pub fallback: Option<Vec<u8>>,
}

impl EmbeddedImage {
    /// Decode an image data URI. SVG payloads get a rasterised fallback.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let (media_type, bytes) = decode_data_uri(uri)?;
        let kind = MediaKind::from_media_type(&media_type)
            .ok_or_else(|| Error::ImageError(format!("Unsupported image type: {}", media_type)))?;

        let fallback = match kind {
            MediaKind::Svg => Some(rasterize_svg(&bytes, FALLBACK_SCALE)?),
            _ => None,
        };

        Ok(Self {
            kind,
            bytes,
            fallback,
        })
    }
}

/// Render an SVG document to PNG at `scale` times its intrinsic size.
pub fn rasterize_svg(svg: &[u8], scale: f32) -> Result<Vec<u8>> {
    let tree = usvg::Tree::from_data(svg, &usvg::Options::default())
        .map_err(|e| Error::SvgError(format!("Failed to parse SVG: {}", e)))?;

    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::SvgError(format!("Invalid SVG size {}x{}", width, height)))?;

    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| Error::SvgError(format!("PNG encoding failed: {}", e)))
}
