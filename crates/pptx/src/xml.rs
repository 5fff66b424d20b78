//! Small event-based XML builder over quick-xml.

use crate::template::NS_PACKAGE_RELS;
use dompptx_core::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;

/// Start tag with attributes, built fluently.
pub(crate) struct Element {
    start: BytesStart<'static>,
}

/// Begin an element named `name`.
pub(crate) fn el(name: &'static str) -> Element {
    Element {
        start: BytesStart::new(name),
    }
}

impl Element {
    /// Add an attribute; the value is escaped on write.
    pub(crate) fn attr(mut self, key: &str, value: impl Display) -> Self {
        let value = value.to_string();
        self.start.push_attribute((key, value.as_str()));
        self
    }

    /// Add an attribute only when `value` is present.
    pub(crate) fn attr_opt(self, key: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(v) => self.attr(key, v),
            None => self,
        }
    }
}

/// Writes one XML part into memory.
pub(crate) struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Start a standalone UTF-8 document.
    pub(crate) fn new() -> Result<Self> {
        let mut writer = Writer::new(Vec::with_capacity(4096));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    pub(crate) fn start(&mut self, element: Element) -> Result<()> {
        self.writer
            .write_event(Event::Start(element.start))
            .map_err(xml_error)
    }

    pub(crate) fn empty(&mut self, element: Element) -> Result<()> {
        self.writer
            .write_event(Event::Empty(element.start))
            .map_err(xml_error)
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    pub(crate) fn text(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)
    }

    /// `<name attrs>text</name>`.
    pub(crate) fn text_element(&mut self, element: Element, text: &str) -> Result<()> {
        let name = String::from_utf8_lossy(element.start.name().as_ref()).into_owned();
        self.start(element)?;
        self.text(text)?;
        self.end(&name)
    }

    pub(crate) fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| Error::XmlError(format!("Generated XML is not UTF-8: {}", e)))
    }
}

/// A `.rels` part from `(id, type, target)` entries.
pub(crate) fn relationships_xml(entries: &[(String, &str, String)]) -> Result<String> {
    let mut w = XmlWriter::new()?;
    w.start(el("Relationships").attr("xmlns", NS_PACKAGE_RELS))?;
    for (id, rel_type, target) in entries {
        w.empty(
            el("Relationship")
                .attr("Id", id)
                .attr("Type", rel_type)
                .attr("Target", target),
        )?;
    }
    w.end("Relationships")?;
    w.finish()
}

fn xml_error(e: impl Display) -> Error {
    Error::XmlError(e.to_string())
}
