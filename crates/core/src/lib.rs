//! Core slide types, CSS value translation, and the DOM tree walker
//! for exporting a rendered DOM subtree as a presentation slide.

pub mod classify;
pub mod css;
pub mod dom;
pub mod error;
pub mod image;
pub mod selector;
pub mod snapshot;
pub mod types;
pub mod walker;

pub use dom::{ComputedStyle, DomView, NodeKind, Rect};
pub use error::{Error, Result};
pub use image::{DataUriLoader, FsImageLoader, ImageLoader};
pub use snapshot::{DomSnapshot, SnapshotNodeId};
pub use types::{
    ExportOptions, ExportTarget, HAlign, HexColor, ImageObject, LayoutContext, LineStyle,
    Placement, Presentation, ShadowDescriptor, ShapeDescriptor, ShapeKind, Slide, SlideLayout,
    SlideObject, TextBlock, TextRun, TextStyle, VAlign,
};
pub use walker::{build_presentation, resolve_root, SlideEmitter};
