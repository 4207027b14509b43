//! Document, notes and comments.

use super::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of a note part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Footnote,
    Endnote,
}

impl NoteType {
    /// Lowercase name used in generated element IDs.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Footnote => "footnote",
            NoteType::Endnote => "endnote",
        }
    }
}

/// A footnote or endnote body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub note_type: NoteType,
    pub note_id: String,
    pub body: Vec<Node>,
}

/// Notes keyed by `(note_type, note_id)`. Immutable once the document is
/// built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notes {
    by_key: HashMap<(NoteType, String), Note>,
}

impl Notes {
    /// Build the catalog from a list of notes.
    pub fn new(notes: Vec<Note>) -> Self {
        let by_key = notes
            .into_iter()
            .map(|note| ((note.note_type, note.note_id.clone()), note))
            .collect();
        Self { by_key }
    }

    /// Look up a note by type and ID.
    pub fn get(&self, note_type: NoteType, note_id: &str) -> Option<&Note> {
        self.by_key.get(&(note_type, note_id.to_string()))
    }

    /// Number of notes.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether there are no notes.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl Serialize for Notes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut notes: Vec<&Note> = self.by_key.values().collect();
        notes.sort_by(|a, b| (a.note_type, &a.note_id).cmp(&(b.note_type, &b.note_id)));
        notes.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Notes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Notes::new(Vec::<Note>::deserialize(deserializer)?))
    }
}

impl PartialOrd for NoteType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NoteType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

/// A reviewer comment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub body: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_initials: Option<String>,
}

/// A fully read document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub notes: Notes,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the raw text of the document body, paragraphs separated by
    /// blank lines.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        collect_raw_text(&self.children, &mut out);
        out
    }

    /// Convert the document tree to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn collect_raw_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Paragraph(p) => {
                collect_raw_text(&p.children, out);
                out.push_str("\n\n");
            }
            Node::Run(r) => collect_raw_text(&r.children, out),
            Node::Hyperlink(h) => collect_raw_text(&h.children, out),
            Node::Table(t) => collect_raw_text(&t.children, out),
            Node::TableRow(r) => collect_raw_text(&r.children, out),
            Node::TableCell(c) => collect_raw_text(&c.children, out),
            Node::Text { value } => out.push_str(value),
            Node::Tab => out.push('\t'),
            _ => {}
        }
    }
}
