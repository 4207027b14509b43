//! HTML output writer with escaping.

use std::collections::BTreeMap;

/// Sink for generated markup.
pub trait Writer {
    fn open(&mut self, tag: &str, attributes: &BTreeMap<String, String>);
    fn close(&mut self, tag: &str);
    fn self_close(&mut self, tag: &str, attributes: &BTreeMap<String, String>);
    fn text(&mut self, text: &str);
    /// Append pre-escaped markup verbatim.
    fn append(&mut self, html: &str);
}

/// Writer producing an HTML string.
#[derive(Debug, Default)]
pub struct HtmlWriter {
    out: String,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn write_attributes(&mut self, attributes: &BTreeMap<String, String>) {
        for (name, value) in attributes {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            self.out.push_str(&escape_attribute(value));
            self.out.push('"');
        }
    }
}

impl Writer for HtmlWriter {
    fn open(&mut self, tag: &str, attributes: &BTreeMap<String, String>) {
        self.out.push('<');
        self.out.push_str(tag);
        self.write_attributes(attributes);
        self.out.push('>');
    }

    fn close(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn self_close(&mut self, tag: &str, attributes: &BTreeMap<String, String>) {
        self.out.push('<');
        self.out.push_str(tag);
        self.write_attributes(attributes);
        self.out.push_str(" />");
    }

    fn text(&mut self, text: &str) {
        self.out.push_str(&escape_text(text));
    }

    fn append(&mut self, html: &str) {
        self.out.push_str(html);
    }
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
