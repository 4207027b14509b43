//! A small navigable XML element tree.
//!
//! The body reader wants random access to an element's children (paragraph
//! properties are inspected before paragraph content, table rows are scanned
//! twice for merge resolution), so document parts are materialised into a
//! tree instead of being processed as a flat event stream. Names keep their
//! namespace prefix exactly as written (`w:p`, `a:blip`, ...), matching how
//! WordprocessingML parts are produced in practice.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// A node in the XML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlNode {
    /// The element inside this node, if it is one.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        }
    }
}

/// An XML element with its attributes and ordered children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Prefixed element name (e.g. `w:p`)
    pub name: String,
    /// Attributes by prefixed name
    pub attributes: HashMap<String, String>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Get the first child element with the given name.
    pub fn first(&self, name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .filter_map(XmlNode::as_element)
            .find(|child| child.name == name)
    }

    /// Iterate over child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children
            .iter()
            .filter_map(XmlNode::as_element)
            .filter(move |child| child.name == name)
    }

    /// Collect all descendant elements with the given name, depth-first.
    pub fn descendants_named(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in self.children.iter().filter_map(XmlNode::as_element) {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.append_text(&mut out);
        out
    }

    fn append_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.append_text(out),
            }
        }
    }
}

/// Parse an XML string into its root element.
pub fn parse_xml(xml: &str) -> Result<XmlElement> {
    let mut reader = quick_xml::Reader::from_str(xml);
    // Whitespace inside w:t is significant (xml:space="preserve")
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(ref e)) => {
                stack.push(element_from_start(e)?);
            }
            Ok(quick_xml::events::Event::Empty(ref e)) => {
                let element = element_from_start(e)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(quick_xml::events::Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| Error::XmlParse(err.to_string()))?
                    .to_string();
                if let Some(parent) = stack.last_mut() {
                    if !text.is_empty() {
                        parent.children.push(XmlNode::Text(text));
                    }
                }
            }
            Ok(quick_xml::events::Event::CData(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Ok(quick_xml::events::Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::XmlParse("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| Error::XmlParse("document has no root element".to_string()))
}

fn element_from_start(e: &quick_xml::events::BytesStart) -> Result<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()).to_string());
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::XmlParse(err.to_string()))?
            .to_string();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
    } else if root.is_none() {
        *root = Some(element);
    }
}
