//! Numbering catalog from `word/numbering.xml`.
//!
//! Resolves `numId` + level references into [`NumberingLevel`]s, including
//! the one-hop `numStyleLink` indirection through numbering styles and the
//! per-instance `startOverride` declarations.

use crate::docx::styles::Styles;
use crate::error::{Error, Result};
use crate::model::NumberingLevel;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct AbstractLevel {
    level_index: u8,
    is_ordered: bool,
    paragraph_style_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct AbstractNum {
    levels: HashMap<u8, AbstractLevel>,
    /// Numbering style this abstract list delegates to instead of defining
    /// its own levels
    num_style_link: Option<String>,
}

#[derive(Debug, Clone)]
struct NumInstance {
    abstract_num_id: String,
    start_overrides: HashMap<u8, u32>,
}

/// Outcome of a numbering lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberingLookup {
    /// Fully resolved level
    Level(NumberingLevel),
    /// No definition for this reference
    Missing,
    /// The definition chains through more than one style link; only a single
    /// hop is supported
    UnresolvedStyleLink,
}

/// Numbering definitions, built once per document.
#[derive(Debug, Clone, Default)]
pub struct Numbering {
    abstract_nums: HashMap<String, AbstractNum>,
    instances: HashMap<String, NumInstance>,
    /// numId of the instance a numbering style resolves to (from styles.xml)
    style_num_ids: HashMap<String, String>,
}

impl Numbering {
    /// Parse the catalog from XML content. The style catalog supplies the
    /// `numId` behind each numbering style for style-link resolution.
    pub fn parse(xml: &str, styles: &Styles) -> Result<Self> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut numbering = Numbering::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current_abstract: Option<(String, AbstractNum)> = None;
        let mut current_level: Option<AbstractLevel> = None;
        let mut current_instance: Option<(String, NumInstance)> = None;
        let mut current_override_level: Option<u8> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                    b"w:abstractNum" => {
                        let id = attr_value(&e, b"w:abstractNumId").unwrap_or_default();
                        current_abstract = Some((id, AbstractNum::default()));
                    }
                    b"w:lvl" if current_abstract.is_some() => {
                        let level_index = attr_value(&e, b"w:ilvl")
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0);
                        current_level = Some(AbstractLevel {
                            level_index,
                            is_ordered: false,
                            paragraph_style_id: None,
                        });
                    }
                    b"w:num" => {
                        let id = attr_value(&e, b"w:numId").unwrap_or_default();
                        current_instance = Some((
                            id,
                            NumInstance {
                                abstract_num_id: String::new(),
                                start_overrides: HashMap::new(),
                            },
                        ));
                    }
                    b"w:lvlOverride" if current_instance.is_some() => {
                        current_override_level = attr_value(&e, b"w:ilvl").and_then(|v| v.parse().ok());
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(e)) => match e.name().as_ref() {
                    b"w:numFmt" => {
                        if let Some(ref mut level) = current_level {
                            if let Some(fmt) = attr_value(&e, b"w:val") {
                                level.is_ordered = fmt != "bullet" && fmt != "none";
                            }
                        }
                    }
                    b"w:pStyle" => {
                        if let Some(ref mut level) = current_level {
                            level.paragraph_style_id = attr_value(&e, b"w:val");
                        }
                    }
                    b"w:numStyleLink" => {
                        if let Some((_, ref mut abstract_num)) = current_abstract {
                            abstract_num.num_style_link = attr_value(&e, b"w:val");
                        }
                    }
                    b"w:abstractNumId" => {
                        if let Some((_, ref mut instance)) = current_instance {
                            instance.abstract_num_id =
                                attr_value(&e, b"w:val").unwrap_or_default();
                        }
                    }
                    b"w:startOverride" => {
                        if let (Some(level), Some((_, ref mut instance))) =
                            (current_override_level, current_instance.as_mut())
                        {
                            if let Some(start) = attr_value(&e, b"w:val").and_then(|v| v.parse().ok())
                            {
                                instance.start_overrides.insert(level, start);
                            }
                        }
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                    b"w:abstractNum" => {
                        if let Some((id, abstract_num)) = current_abstract.take() {
                            numbering.abstract_nums.insert(id, abstract_num);
                        }
                    }
                    b"w:lvl" => {
                        if let (Some(level), Some((_, ref mut abstract_num))) =
                            (current_level.take(), current_abstract.as_mut())
                        {
                            abstract_num.levels.insert(level.level_index, level);
                        }
                    }
                    b"w:num" => {
                        if let Some((id, instance)) = current_instance.take() {
                            numbering.instances.insert(id, instance);
                        }
                    }
                    b"w:lvlOverride" => current_override_level = None,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        // Snapshot the numbering-style targets needed for style links
        for (_, abstract_num) in numbering.abstract_nums.iter() {
            if let Some(ref style_id) = abstract_num.num_style_link {
                if let Some(num_id) = styles.numbering_style_num_id(style_id) {
                    numbering
                        .style_num_ids
                        .insert(style_id.clone(), num_id.to_string());
                }
            }
        }

        Ok(numbering)
    }

    /// Resolve a `numId` + level-index reference.
    pub fn level_for(&self, num_id: &str, level_index: u8) -> NumberingLookup {
        self.level_for_inner(num_id, level_index, true)
    }

    fn level_for_inner(&self, num_id: &str, level_index: u8, allow_hop: bool) -> NumberingLookup {
        let Some(instance) = self.instances.get(num_id) else {
            return NumberingLookup::Missing;
        };
        let Some(abstract_num) = self.abstract_nums.get(&instance.abstract_num_id) else {
            return NumberingLookup::Missing;
        };

        if let Some(level) = abstract_num.levels.get(&level_index) {
            return NumberingLookup::Level(NumberingLevel {
                num_id: num_id.to_string(),
                level_index,
                is_ordered: level.is_ordered,
                start_override: instance.start_overrides.get(&level_index).copied(),
                paragraph_style_id: level.paragraph_style_id.clone(),
            });
        }

        // One indirection hop through a numbering style; deeper chains are
        // reported so callers can warn instead of guessing.
        if let Some(ref style_id) = abstract_num.num_style_link {
            if !allow_hop {
                return NumberingLookup::UnresolvedStyleLink;
            }
            if let Some(linked_num_id) = self.style_num_ids.get(style_id) {
                return match self.level_for_inner(linked_num_id, level_index, false) {
                    // The list identity stays with the referencing instance
                    NumberingLookup::Level(level) => NumberingLookup::Level(NumberingLevel {
                        num_id: num_id.to_string(),
                        start_override: instance
                            .start_overrides
                            .get(&level_index)
                            .copied()
                            .or(level.start_override),
                        ..level
                    }),
                    other => other,
                };
            }
        }

        NumberingLookup::Missing
    }

    /// Resolve the numbering level directly associated with a paragraph
    /// style, if any.
    pub fn level_for_paragraph_style(&self, style_id: &str) -> Option<NumberingLevel> {
        for (abstract_id, abstract_num) in &self.abstract_nums {
            for level in abstract_num.levels.values() {
                if level.paragraph_style_id.as_deref() == Some(style_id) {
                    // Identify the list by the first instance that uses this
                    // abstract definition
                    let num_id = self
                        .instances
                        .iter()
                        .find(|(_, inst)| inst.abstract_num_id == *abstract_id)
                        .map(|(id, _)| id.clone())
                        .unwrap_or_else(|| format!("style:{}", style_id));
                    return Some(NumberingLevel {
                        num_id,
                        level_index: level.level_index,
                        is_ordered: level.is_ordered,
                        start_override: None,
                        paragraph_style_id: Some(style_id.to_string()),
                    });
                }
            }
        }
        None
    }
}

fn attr_value(e: &quick_xml::events::BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:abstractNum w:abstractNumId="0">
        <w:lvl w:ilvl="0">
            <w:numFmt w:val="decimal"/>
        </w:lvl>
        <w:lvl w:ilvl="1">
            <w:numFmt w:val="bullet"/>
        </w:lvl>
    </w:abstractNum>
    <w:num w:numId="1">
        <w:abstractNumId w:val="0"/>
        <w:lvlOverride w:ilvl="0">
            <w:startOverride w:val="5"/>
        </w:lvlOverride>
    </w:num>
</w:numbering>"#;

    #[test]
    fn test_basic_resolution() {
        let numbering = Numbering::parse(BASIC, &Styles::default()).unwrap();

        match numbering.level_for("1", 0) {
            NumberingLookup::Level(level) => {
                assert!(level.is_ordered);
                assert_eq!(level.num_id, "1");
                assert_eq!(level.level_index, 0);
                assert_eq!(level.start_override, Some(5));
            }
            other => panic!("expected level, got {:?}", other),
        }

        match numbering.level_for("1", 1) {
            NumberingLookup::Level(level) => assert!(!level.is_ordered),
            other => panic!("expected level, got {:?}", other),
        }

        assert_eq!(numbering.level_for("1", 4), NumberingLookup::Missing);
        assert_eq!(numbering.level_for("9", 0), NumberingLookup::Missing);
    }

    #[test]
    fn test_style_link_one_hop() {
        let styles_xml = r#"<w:styles xmlns:w="http://x">
            <w:style w:type="numbering" w:styleId="ListStyle1">
                <w:pPr><w:numPr><w:numId w:val="2"/></w:numPr></w:pPr>
            </w:style>
        </w:styles>"#;
        let numbering_xml = r#"<w:numbering xmlns:w="http://x">
            <w:abstractNum w:abstractNumId="0">
                <w:numStyleLink w:val="ListStyle1"/>
            </w:abstractNum>
            <w:abstractNum w:abstractNumId="1">
                <w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl>
            </w:abstractNum>
            <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
            <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
        </w:numbering>"#;

        let styles = Styles::parse(styles_xml).unwrap();
        let numbering = Numbering::parse(numbering_xml, &styles).unwrap();

        match numbering.level_for("1", 0) {
            NumberingLookup::Level(level) => {
                assert!(level.is_ordered);
                // Identity stays with the referencing instance
                assert_eq!(level.num_id, "1");
            }
            other => panic!("expected level, got {:?}", other),
        }
    }

    #[test]
    fn test_style_link_deeper_chain_unresolved() {
        let styles_xml = r#"<w:styles xmlns:w="http://x">
            <w:style w:type="numbering" w:styleId="A">
                <w:pPr><w:numPr><w:numId w:val="2"/></w:numPr></w:pPr>
            </w:style>
            <w:style w:type="numbering" w:styleId="B">
                <w:pPr><w:numPr><w:numId w:val="3"/></w:numPr></w:pPr>
            </w:style>
        </w:styles>"#;
        // numId 1 -> style A -> numId 2 -> style B: two hops, unsupported
        let numbering_xml = r#"<w:numbering xmlns:w="http://x">
            <w:abstractNum w:abstractNumId="0"><w:numStyleLink w:val="A"/></w:abstractNum>
            <w:abstractNum w:abstractNumId="1"><w:numStyleLink w:val="B"/></w:abstractNum>
            <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
            <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
        </w:numbering>"#;

        let styles = Styles::parse(styles_xml).unwrap();
        let numbering = Numbering::parse(numbering_xml, &styles).unwrap();
        assert_eq!(
            numbering.level_for("1", 0),
            NumberingLookup::UnresolvedStyleLink
        );
    }

    #[test]
    fn test_level_for_paragraph_style() {
        let numbering_xml = r#"<w:numbering xmlns:w="http://x">
            <w:abstractNum w:abstractNumId="0">
                <w:lvl w:ilvl="0">
                    <w:numFmt w:val="decimal"/>
                    <w:pStyle w:val="ListNumber"/>
                </w:lvl>
            </w:abstractNum>
            <w:num w:numId="7"><w:abstractNumId w:val="0"/></w:num>
        </w:numbering>"#;

        let numbering = Numbering::parse(numbering_xml, &Styles::default()).unwrap();
        let level = numbering.level_for_paragraph_style("ListNumber").unwrap();
        assert!(level.is_ordered);
        assert_eq!(level.num_id, "7");
        assert_eq!(level.paragraph_style_id.as_deref(), Some("ListNumber"));
        assert!(numbering.level_for_paragraph_style("Body").is_none());
    }
}
