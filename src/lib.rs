//! # docweb
//!
//! Convert DOCX documents to clean, semantic HTML.
//!
//! The conversion runs in two stages: the reading stage turns the
//! WordprocessingML body into a neutral document AST, and the rendering
//! stage maps that AST to HTML through an ordered list of style rules.
//! Recoverable problems (unknown elements, undefined styles, odd images)
//! never abort a conversion; they come back as warning messages next to the
//! generated HTML.
//!
//! ## Quick start
//!
//! ```no_run
//! let converted = docweb::convert_to_html("report.docx")?;
//! println!("{}", converted.html);
//! for message in &converted.messages {
//!     eprintln!("{}", message);
//! }
//! # Ok::<(), docweb::Error>(())
//! ```
//!
//! ## Custom style mappings
//!
//! ```no_run
//! use docweb::{ElementMatcher, HtmlPath, PathSegment, RenderOptions, StyleNameMatcher, StyleRule};
//!
//! let rules = vec![StyleRule::new(
//!     ElementMatcher::paragraph_named(StyleNameMatcher::Exact("Quote".to_string())),
//!     HtmlPath::single(PathSegment::fresh("blockquote")),
//! )];
//! let options = RenderOptions::new().style_rules(rules);
//! let converted = docweb::convert_to_html_with_options("report.docx", &options)?;
//! # Ok::<(), docweb::Error>(())
//! ```

pub mod container;
pub mod docx;
pub mod error;
pub mod messages;
pub mod model;
pub mod render;
pub mod stylemap;
pub mod xml;

pub use container::{DocxContainer, Relationship, Relationships};
pub use docx::DocxParser;
pub use error::{Error, Result};
pub use messages::{Message, ReadResult, Severity};
pub use model::{Document, Node};
pub use render::{RenderOptions, to_html};
pub use stylemap::{
    ElementMatcher, HtmlPath, ListMatcher, PathSegment, StyleMap, StyleNameMatcher, StyleRule,
};

use std::path::Path;

/// The outcome of a conversion: generated HTML plus the messages collected
/// along the way.
#[derive(Debug, Clone)]
pub struct Converted {
    pub html: String,
    pub messages: Vec<Message>,
}

/// Convert a DOCX file to HTML with default options.
pub fn convert_to_html(path: impl AsRef<Path>) -> Result<Converted> {
    convert_to_html_with_options(path, &RenderOptions::default())
}

/// Convert a DOCX file to HTML.
pub fn convert_to_html_with_options(
    path: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<Converted> {
    convert(DocxParser::open(path)?, options)
}

/// Convert in-memory DOCX bytes to HTML with default options.
pub fn convert_bytes(data: Vec<u8>) -> Result<Converted> {
    convert_bytes_with_options(data, &RenderOptions::default())
}

/// Convert in-memory DOCX bytes to HTML.
pub fn convert_bytes_with_options(data: Vec<u8>, options: &RenderOptions) -> Result<Converted> {
    convert(DocxParser::from_bytes(data)?, options)
}

/// Extract the raw text of a DOCX file, paragraphs separated by blank lines.
pub fn extract_raw_text(path: impl AsRef<Path>) -> Result<String> {
    let result = DocxParser::open(path)?.parse()?;
    Ok(result.value.raw_text())
}

/// Extract the raw text of in-memory DOCX bytes.
pub fn extract_raw_text_bytes(data: Vec<u8>) -> Result<String> {
    let result = DocxParser::from_bytes(data)?.parse()?;
    Ok(result.value.raw_text())
}

fn convert(parser: DocxParser, options: &RenderOptions) -> Result<Converted> {
    let read = parser.parse()?;
    let style_map = StyleMap::with_rules(options.style_rules.clone());
    let rendered = to_html(&read.value, &style_map, options);

    let mut messages = read.messages;
    messages.extend(rendered.messages);
    Ok(Converted {
        html: rendered.value,
        messages,
    })
}
