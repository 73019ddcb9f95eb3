use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use crate::domain::direct_debit::DebitError;

fn xml_io(e: std::io::Error) -> DebitError {
  DebitError::Rendering(format!("XML write error: {e}"))
}

/// Thin element-oriented wrapper over the quick-xml writer.
pub struct XmlWriter {
  writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
  pub fn new() -> Result<Self, DebitError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
      .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
      .map_err(xml_io)?;
    Ok(Self { writer })
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.writer.into_inner().into_inner()
  }

  pub fn start(&mut self, name: &str) -> Result<&mut Self, DebitError> {
    self
      .writer
      .write_event(Event::Start(BytesStart::new(name)))
      .map_err(xml_io)?;
    Ok(self)
  }

  pub fn start_with_attrs(
    &mut self,
    name: &str,
    attrs: &[(&str, &str)],
  ) -> Result<&mut Self, DebitError> {
    let mut elem = BytesStart::new(name);
    for (k, v) in attrs {
      elem.push_attribute((*k, *v));
    }
    self.writer.write_event(Event::Start(elem)).map_err(xml_io)?;
    Ok(self)
  }

  pub fn end(&mut self, name: &str) -> Result<&mut Self, DebitError> {
    self
      .writer
      .write_event(Event::End(BytesEnd::new(name)))
      .map_err(xml_io)?;
    Ok(self)
  }

  pub fn text(&mut self, name: &str, text: &str) -> Result<&mut Self, DebitError> {
    self.start(name)?;
    self
      .writer
      .write_event(Event::Text(BytesText::new(text)))
      .map_err(xml_io)?;
    self.end(name)
  }

  pub fn text_with_attrs(
    &mut self,
    name: &str,
    text: &str,
    attrs: &[(&str, &str)],
  ) -> Result<&mut Self, DebitError> {
    self.start_with_attrs(name, attrs)?;
    self
      .writer
      .write_event(Event::Text(BytesText::new(text)))
      .map_err(xml_io)?;
    self.end(name)
  }

  /// `<outer><inner>text</inner></outer>`, a shape PAIN.008 uses everywhere.
  pub fn nested_text(&mut self, outer: &str, inner: &str, text: &str) -> Result<&mut Self, DebitError> {
    self.start(outer)?;
    self.text(inner, text)?;
    self.end(outer)
  }
}
