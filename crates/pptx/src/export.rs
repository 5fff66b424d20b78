//! One-call export of a DOM subtree to a .pptx file.

use crate::writer::PptxWriter;
use dompptx_core::{
    build_presentation, resolve_root, DomView, ExportOptions, ExportTarget, ImageLoader, Result,
};
use std::path::PathBuf;

/// Export the subtree at `target` as a one-slide deck written to
/// `options.file_name`. Returns the path written.
pub fn export_to_pptx<D: DomView>(
    dom: &D,
    target: ExportTarget<'_, D::NodeId>,
    options: &ExportOptions,
    images: &dyn ImageLoader,
) -> Result<PathBuf> {
    let root = resolve_root(dom, target)?;
    let presentation = build_presentation(dom, root, images);

    let path = PathBuf::from(&options.file_name);
    PptxWriter::new(&presentation).write_file(&path)?;
    Ok(path)
}

/// Export the subtree at `target` into an in-memory .pptx package.
pub fn export_to_bytes<D: DomView>(
    dom: &D,
    target: ExportTarget<'_, D::NodeId>,
    images: &dyn ImageLoader,
) -> Result<Vec<u8>> {
    let root = resolve_root(dom, target)?;
    let presentation = build_presentation(dom, root, images);
    PptxWriter::new(&presentation).to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dompptx_core::{DataUriLoader, DomSnapshot, Error};
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    const CARD: &str = r#"{
        "root": {
            "tag": "section",
            "attributes": { "id": "card" },
            "style": { "backgroundColor": "rgb(255, 255, 255)" },
            "rect": { "x": 0, "y": 0, "width": 960, "height": 540 },
            "children": [
                {
                    "tag": "div",
                    "attributes": { "class": "badge" },
                    "style": { "backgroundColor": "rgb(0, 0, 255)", "borderRadius": "50px" },
                    "rect": { "x": 20, "y": 20, "width": 100, "height": 100 }
                },
                {
                    "tag": "h1",
                    "style": { "color": "rgb(17, 17, 17)", "fontSize": "32px", "fontWeight": "700" },
                    "rect": { "x": 140, "y": 20, "width": 600, "height": 40 },
                    "children": [{ "text": "Quarterly report" }]
                },
                {
                    "tag": "div",
                    "style": { "backgroundImage": "linear-gradient(90deg, rgb(255, 0, 0), rgb(0, 0, 255))" },
                    "rect": { "x": 20, "y": 200, "width": 300, "height": 100 }
                }
            ]
        }
    }"#;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_export_to_bytes_end_to_end() {
        let dom = DomSnapshot::from_json(CARD).unwrap();
        let bytes = export_to_bytes(&dom, ExportTarget::Selector("#card"), &DataUriLoader).unwrap();

        let content_types = read_part(&bytes, "[Content_Types].xml");
        assert!(content_types.contains("/ppt/slides/slide1.xml"));

        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        let background = slide.find(r#"<a:srgbClr val="FFFFFF"/>"#).unwrap();
        let badge = slide.find(r#"prst="ellipse""#).unwrap();
        let title = slide.find("<a:t>Quarterly report</a:t>").unwrap();
        let gradient = slide.find("asvg:svgBlip").unwrap();
        assert!(background < badge && badge < title && title < gradient);
        assert!(slide.contains(r#"b="1""#));

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("ppt/media/image1.png").is_ok());
        assert!(archive.by_name("ppt/media/image2.svg").is_ok());
    }

    #[test]
    fn test_export_by_element_matches_selector() {
        let dom = DomSnapshot::from_json(CARD).unwrap();
        let by_node = export_to_bytes(&dom, ExportTarget::Element(dom.root()), &DataUriLoader).unwrap();
        let by_selector =
            export_to_bytes(&dom, ExportTarget::Selector("section"), &DataUriLoader).unwrap();

        assert_eq!(
            read_part(&by_node, "ppt/slides/slide1.xml"),
            read_part(&by_selector, "ppt/slides/slide1.xml")
        );
    }

    #[test]
    fn test_unknown_selector_is_fatal() {
        let dom = DomSnapshot::from_json(CARD).unwrap();
        let err = export_to_bytes(&dom, ExportTarget::Selector("#missing"), &DataUriLoader)
            .unwrap_err();
        assert!(matches!(err, Error::RootNotFound(ref s) if s == "#missing"));
    }

    #[test]
    fn test_export_to_pptx_writes_file_name() {
        let dom = DomSnapshot::from_json(CARD).unwrap();
        let path = std::env::temp_dir().join(format!("dompptx-export-{}.pptx", std::process::id()));
        let options = ExportOptions::new().with_file_name(path.to_string_lossy());

        let written =
            export_to_pptx(&dom, ExportTarget::Selector(".badge"), &options, &DataUriLoader).unwrap();
        assert_eq!(written, path);

        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        // The badge alone fills the slide height.
        assert!(slide.contains(r#"<a:ext cx="5143500" cy="5143500"/>"#));
    }
}
