//! PPTX (Office Open XML) writer backend for DOM-to-PPTX export.
//!
//! Serialises a [`dompptx_core::Presentation`] into a .pptx ZIP archive
//! and provides the top-level export entry points.

pub mod export;
pub mod media;
pub mod slide;
pub mod template;
pub mod writer;
mod xml;

pub use export::{export_to_bytes, export_to_pptx};
pub use writer::PptxWriter;
