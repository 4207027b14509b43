//! Readers for the footnotes, endnotes and comments parts.

use crate::container::{DocxContainer, Relationships};
use crate::docx::body::BodyReader;
use crate::docx::content_types::ContentTypes;
use crate::docx::numbering::Numbering;
use crate::docx::styles::Styles;
use crate::error::Result;
use crate::messages::ReadResult;
use crate::model::{Comment, Note, NoteType};
use crate::xml::parse_xml;

pub struct NotesReader<'a> {
    pub container: &'a DocxContainer,
    pub relationships: &'a Relationships,
    pub content_types: &'a ContentTypes,
    pub styles: &'a Styles,
    pub numbering: &'a Numbering,
    pub base_path: &'a str,
}

impl<'a> NotesReader<'a> {
    /// Read a footnotes or endnotes part.
    ///
    /// Separator pseudo-notes describe the rule between body text and notes
    /// and carry no content worth keeping.
    pub fn read_notes(&self, xml: &str, note_type: NoteType) -> Result<ReadResult<Vec<Note>>> {
        let root = parse_xml(xml)?;
        let element_name = match note_type {
            NoteType::Footnote => "w:footnote",
            NoteType::Endnote => "w:endnote",
        };

        let mut results = Vec::new();
        for note_element in root.children_named(element_name) {
            match note_element.attr("w:type") {
                Some("separator") | Some("continuationSeparator") => continue,
                _ => {}
            }
            let Some(note_id) = note_element.attr("w:id") else {
                continue;
            };

            let mut reader = self.body_reader();
            results.push(reader.read_children(note_element).map(|body| {
                vec![Note {
                    note_type,
                    note_id: note_id.to_string(),
                    body,
                }]
            }));
        }
        Ok(ReadResult::combine(results))
    }

    /// Read the comments part.
    pub fn read_comments(&self, xml: &str) -> Result<ReadResult<Vec<Comment>>> {
        let root = parse_xml(xml)?;

        let mut results = Vec::new();
        for comment_element in root.children_named("w:comment") {
            let Some(comment_id) = comment_element.attr("w:id") else {
                continue;
            };
            let author_name = comment_element
                .attr("w:author")
                .filter(|a| !a.is_empty())
                .map(str::to_string);
            let author_initials = comment_element
                .attr("w:initials")
                .filter(|i| !i.is_empty())
                .map(str::to_string);

            let mut reader = self.body_reader();
            let comment_id = comment_id.to_string();
            results.push(reader.read_children(comment_element).map(|body| {
                vec![Comment {
                    comment_id,
                    body,
                    author_name,
                    author_initials,
                }]
            }));
        }
        Ok(ReadResult::combine(results))
    }

    fn body_reader(&self) -> BodyReader<'a> {
        BodyReader::new(
            self.container,
            self.relationships,
            self.content_types,
            self.styles,
            self.numbering,
            self.base_path,
        )
    }
}
