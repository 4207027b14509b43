//! AST node definitions.

use serde::{Deserialize, Serialize};

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Paragraph(Paragraph),
    Run(Run),
    Text { value: String },
    Tab,
    Break { kind: BreakKind },
    Hyperlink(Hyperlink),
    Image(Image),
    Table(Table),
    TableRow(TableRow),
    TableCell(TableCell),
    NoteReference {
        note_type: super::NoteType,
        note_id: String,
    },
    CommentReference {
        comment_id: String,
    },
    BookmarkStart {
        name: String,
    },
}

impl Node {
    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        self.append_raw_text(&mut out);
        out
    }

    fn append_raw_text(&self, out: &mut String) {
        match self {
            Node::Text { value } => out.push_str(value),
            Node::Tab => out.push('\t'),
            Node::Paragraph(p) => append_children(&p.children, out),
            Node::Run(r) => append_children(&r.children, out),
            Node::Hyperlink(h) => append_children(&h.children, out),
            Node::Table(t) => append_children(&t.children, out),
            Node::TableRow(r) => append_children(&r.children, out),
            Node::TableCell(c) => append_children(&c.children, out),
            _ => {}
        }
    }
}

fn append_children(children: &[Node], out: &mut String) {
    for child in children {
        child.append_raw_text(out);
    }
}

/// Kind of an explicit break within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Line,
    Page,
    Column,
}

/// Vertical positioning of run text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

/// A resolved numbering level attached to a paragraph.
///
/// Always fully resolved through the numbering catalog; paragraphs never
/// carry raw `numId`/`ilvl` references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingLevel {
    /// Concrete list instance ID the paragraph belongs to
    pub num_id: String,
    /// Level index (0 = top level)
    pub level_index: u8,
    /// Whether the list is ordered (numbered) rather than bulleted
    pub is_ordered: bool,
    /// Start override declared on the list instance for this level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_override: Option<u32>,
    /// Paragraph style the level was inherited from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_style_id: Option<String>,
}

/// Paragraph indentation, raw twip values as written in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hanging: Option<String>,
}

impl Indent {
    /// Whether no indentation was specified.
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.first_line.is_none()
            && self.hanging.is_none()
    }
}

/// A paragraph with its resolved properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
    /// Raw justification value (`center`, `both`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(default, skip_serializing_if = "Indent::is_empty")]
    pub indent: Indent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering: Option<NumberingLevel>,
}

/// A run of text with consistent formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all_caps: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub small_caps: bool,
    #[serde(default)]
    pub vertical_alignment: VerticalAlignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Font size in points (source value is half-points)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

/// A hyperlink wrapping its child content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hyperlink {
    #[serde(default)]
    pub children: Vec<Node>,
    /// External target URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// In-document anchor (bookmark name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_frame: Option<String>,
}

impl Hyperlink {
    /// The href the rendered anchor should carry.
    pub fn target(&self, id_prefix: &str) -> Option<String> {
        match (&self.href, &self.anchor) {
            (Some(href), _) => Some(href.clone()),
            (None, Some(anchor)) => Some(format!("#{}{}", id_prefix, anchor)),
            (None, None) => None,
        }
    }
}

/// An embedded image with its resolved bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Image bytes, resolved from the package at read time
    #[serde(skip)]
    pub bytes: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// A table. After merge resolution every row child is a `TableRow` whose
/// children are all `TableCell`s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_header: bool,
}

/// Vertical-merge flag carried by a freshly read cell. Consumed by merge
/// resolution and reset before the AST is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum CellMerge {
    #[default]
    None,
    Restart,
    Continue,
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub col_span: u32,
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub row_span: u32,
    #[serde(skip, default)]
    pub(crate) merge: CellMerge,
}

fn default_span() -> u32 {
    1
}

fn is_default_span(n: &u32) -> bool {
    *n == 1
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            col_span: 1,
            row_span: 1,
            merge: CellMerge::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_text_walks_structure() {
        let paragraph = Node::Paragraph(Paragraph {
            children: vec![
                Node::Run(Run {
                    children: vec![Node::text("Hello"), Node::Tab, Node::text("world")],
                    ..Default::default()
                }),
                Node::Hyperlink(Hyperlink {
                    children: vec![Node::Run(Run {
                        children: vec![Node::text("!")],
                        ..Default::default()
                    })],
                    href: Some("https://example.com".to_string()),
                    ..Default::default()
                }),
            ],
            ..Default::default()
        });
        assert_eq!(paragraph.raw_text(), "Hello\tworld!");
    }

    #[test]
    fn test_hyperlink_target() {
        let external = Hyperlink {
            href: Some("https://example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(external.target(""), Some("https://example.com".to_string()));

        let internal = Hyperlink {
            anchor: Some("section-1".to_string()),
            ..Default::default()
        };
        assert_eq!(internal.target("doc-"), Some("#doc-section-1".to_string()));
        assert_eq!(Hyperlink::default().target(""), None);
    }

    #[test]
    fn test_cell_defaults() {
        let cell = TableCell::default();
        assert_eq!(cell.col_span, 1);
        assert_eq!(cell.row_span, 1);
    }

    #[test]
    fn test_node_serialization_tags_variants() {
        let node = Node::text("hi");
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"type\":\"text\""));
    }
}
