//! Content-type catalog from `[Content_Types].xml`.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Lookup from part path to MIME type, built once per document.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    /// Default MIME types by file extension (lowercase)
    defaults: HashMap<String, String>,
    /// Override MIME types by full part name (without leading slash)
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse the catalog from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut types = ContentTypes::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e)) => {
                    match e.name().as_ref() {
                        b"Default" => {
                            let mut extension = None;
                            let mut content_type = None;
                            for attr in e.attributes().flatten() {
                                match attr.key.as_ref() {
                                    b"Extension" => {
                                        extension = Some(
                                            String::from_utf8_lossy(&attr.value).to_lowercase(),
                                        )
                                    }
                                    b"ContentType" => {
                                        content_type = Some(
                                            String::from_utf8_lossy(&attr.value).to_string(),
                                        )
                                    }
                                    _ => {}
                                }
                            }
                            if let (Some(ext), Some(ct)) = (extension, content_type) {
                                types.defaults.insert(ext, ct);
                            }
                        }
                        b"Override" => {
                            let mut part_name = None;
                            let mut content_type = None;
                            for attr in e.attributes().flatten() {
                                match attr.key.as_ref() {
                                    b"PartName" => {
                                        part_name = Some(
                                            String::from_utf8_lossy(&attr.value)
                                                .trim_start_matches('/')
                                                .to_string(),
                                        )
                                    }
                                    b"ContentType" => {
                                        content_type = Some(
                                            String::from_utf8_lossy(&attr.value).to_string(),
                                        )
                                    }
                                    _ => {}
                                }
                            }
                            if let (Some(part), Some(ct)) = (part_name, content_type) {
                                types.overrides.insert(part, ct);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Look up the MIME type for a part path. Overrides win over defaults.
    pub fn content_type_of(&self, part_path: &str) -> Option<String> {
        let normalized = part_path.trim_start_matches('/');
        if let Some(ct) = self.overrides.get(normalized) {
            return Some(ct.clone());
        }
        let extension = std::path::Path::new(normalized)
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase();
        self.defaults.get(&extension).cloned()
    }
}
