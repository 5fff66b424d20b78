//! WASM-compatible wrapper for DOM-to-PPTX export.
//!
//! A page serialises the subtree it wants exported as a DOM snapshot; this
//! crate turns that snapshot into .pptx bytes the page can download.
//! Only inline `data:` images are available here.

use dompptx_core::{
    build_presentation, resolve_root, DataUriLoader, DomSnapshot, ExportOptions, ExportTarget,
    Presentation, SlideObject, SnapshotNodeId,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Options object accepted from JavaScript.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportRequest {
    /// Selector of the element to export; the snapshot root when absent.
    pub selector: Option<String>,

    #[serde(flatten)]
    pub options: ExportOptions,
}

/// What an export would produce, without building the package.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    /// File name the page should save the package under.
    pub file_name: String,
    /// Nodes in the snapshot, text nodes included.
    pub node_count: usize,
    pub shape_count: usize,
    pub text_count: usize,
    pub image_count: usize,
}

/// Export a snapshot to .pptx bytes (a `Uint8Array` in JavaScript).
///
/// # Arguments
/// * `json` - The DOM snapshot JSON
/// * `options` - Optional `{ selector, fileName }` object
#[wasm_bindgen]
pub fn export_snapshot(json: &str, options: JsValue) -> Result<Vec<u8>, JsValue> {
    let request = parse_request(options)?;
    export_snapshot_impl(json, &request).map_err(|e| JsValue::from_str(&e))
}

/// Summarise the slide an export would produce.
#[wasm_bindgen]
pub fn describe_snapshot(json: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let request = parse_request(options)?;
    let summary = describe_snapshot_impl(json, &request).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&summary)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn parse_request(options: JsValue) -> Result<ExportRequest, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(ExportRequest::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| JsValue::from_str(&format!("Invalid export options: {}", e)))
}

fn load(json: &str) -> Result<DomSnapshot, String> {
    DomSnapshot::from_json(json).map_err(|e| e.to_string())
}

fn target<'a>(dom: &DomSnapshot, request: &'a ExportRequest) -> ExportTarget<'a, SnapshotNodeId> {
    match request.selector.as_deref() {
        Some(selector) => ExportTarget::Selector(selector),
        None => ExportTarget::Element(dom.root()),
    }
}

fn export_snapshot_impl(json: &str, request: &ExportRequest) -> Result<Vec<u8>, String> {
    let dom = load(json)?;
    dompptx_pptx::export_to_bytes(&dom, target(&dom, request), &DataUriLoader)
        .map_err(|e| format!("Export error: {}", e))
}

fn describe_snapshot_impl(json: &str, request: &ExportRequest) -> Result<SnapshotSummary, String> {
    let dom = load(json)?;
    let root = resolve_root(&dom, target(&dom, request)).map_err(|e| e.to_string())?;
    let presentation = build_presentation(&dom, root, &DataUriLoader);

    Ok(summarize(&dom, &presentation, &request.options))
}

fn summarize(dom: &DomSnapshot, presentation: &Presentation, options: &ExportOptions) -> SnapshotSummary {
    let mut summary = SnapshotSummary {
        file_name: options.file_name.clone(),
        node_count: dom.len(),
        shape_count: 0,
        text_count: 0,
        image_count: 0,
    };
    for object in presentation.slides.iter().flat_map(|s| s.objects.iter()) {
        match object {
            SlideObject::Shape(_) => summary.shape_count += 1,
            SlideObject::Text(_) => summary.text_count += 1,
            SlideObject::Image(_) => summary.image_count += 1,
        }
    }
    summary
}
