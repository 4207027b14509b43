//! Style catalog from `word/styles.xml`.
//!
//! The reading stage only needs style names for AST nodes and the numbering
//! style associations used by the numbering catalog's style-link hop; the
//! full property cascade is out of scope.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// A style definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    /// Style ID (e.g., "Heading1")
    pub style_id: String,
    /// Human-readable style name (e.g., "Heading 1")
    pub name: Option<String>,
}

/// Styles looked up by type and ID, built once per document.
#[derive(Debug, Clone, Default)]
pub struct Styles {
    paragraph: HashMap<String, Style>,
    character: HashMap<String, Style>,
    table: HashMap<String, Style>,
    /// Numbering styles' concrete `numId`, for the numbering style-link hop
    numbering_num_ids: HashMap<String, String>,
}

impl Styles {
    /// Parse the catalog from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut styles = Styles::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current: Option<(String, Style)> = None;
        let mut current_num_id: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) if e.name().as_ref() == b"w:style" => {
                    let mut style_type = String::new();
                    let mut style = Style::default();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"w:type" => {
                                style_type = String::from_utf8_lossy(&attr.value).to_string()
                            }
                            b"w:styleId" => {
                                style.style_id = String::from_utf8_lossy(&attr.value).to_string()
                            }
                            _ => {}
                        }
                    }
                    current = Some((style_type, style));
                    current_num_id = None;
                }
                Ok(quick_xml::events::Event::Empty(e)) => match e.name().as_ref() {
                    b"w:name" => {
                        if let Some((_, ref mut style)) = current {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"w:val" {
                                    style.name =
                                        Some(String::from_utf8_lossy(&attr.value).to_string());
                                }
                            }
                        }
                    }
                    b"w:numId" => {
                        if current.is_some() {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"w:val" {
                                    current_num_id =
                                        Some(String::from_utf8_lossy(&attr.value).to_string());
                                }
                            }
                        }
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::End(e)) if e.name().as_ref() == b"w:style" => {
                    if let Some((style_type, style)) = current.take() {
                        if !style.style_id.is_empty() {
                            match style_type.as_str() {
                                "paragraph" => {
                                    styles.paragraph.insert(style.style_id.clone(), style);
                                }
                                "character" => {
                                    styles.character.insert(style.style_id.clone(), style);
                                }
                                "table" => {
                                    styles.table.insert(style.style_id.clone(), style);
                                }
                                "numbering" => {
                                    if let Some(num_id) = current_num_id.take() {
                                        styles.numbering_num_ids.insert(style.style_id, num_id);
                                    }
                                }
                                _ => {}
                            }
                        }
                    }
                    current_num_id = None;
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(styles)
    }

    /// Look up a paragraph style by ID.
    pub fn paragraph_style(&self, id: &str) -> Option<&Style> {
        self.paragraph.get(id)
    }

    /// Look up a character (run) style by ID.
    pub fn character_style(&self, id: &str) -> Option<&Style> {
        self.character.get(id)
    }

    /// Look up a table style by ID.
    pub fn table_style(&self, id: &str) -> Option<&Style> {
        self.table.get(id)
    }

    /// The concrete `numId` a numbering style points at, if any.
    pub fn numbering_style_num_id(&self, style_id: &str) -> Option<&str> {
        self.numbering_num_ids.get(style_id).map(String::as_str)
    }
}
