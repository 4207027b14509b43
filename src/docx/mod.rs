//! DOCX package reading: catalogs, body content, notes and comments.

pub mod body;
pub mod content_types;
pub mod notes;
pub mod numbering;
pub mod styles;

use crate::container::DocxContainer;
use crate::error::{Error, Result};
use crate::messages::ReadResult;
use crate::model::{Document, NoteType, Notes};
use crate::xml::parse_xml;
use body::BodyReader;
use content_types::ContentTypes;
use notes::NotesReader;
use numbering::Numbering;
use std::path::Path;
use styles::Styles;

const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const NUMBERING_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
const FOOTNOTES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footnotes";
const ENDNOTES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/endnotes";
const COMMENTS_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";

/// Parser for a single DOCX package.
pub struct DocxParser {
    container: DocxContainer,
}

impl DocxParser {
    /// Open a document from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            container: DocxContainer::open(path)?,
        })
    }

    /// Open a document from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Ok(Self {
            container: DocxContainer::from_bytes(data)?,
        })
    }

    /// Read the whole document into an AST, collecting warnings along the
    /// way.
    pub fn parse(&self) -> Result<ReadResult<Document>> {
        let content_types = match self.container.read_xml("[Content_Types].xml") {
            Ok(xml) => ContentTypes::parse(&xml)?,
            Err(_) => ContentTypes::default(),
        };

        let main_path = self.main_document_path()?;
        let main_rels = self.container.read_relationships(&main_path)?;

        let styles_xml = self.read_related_part(&main_path, &main_rels, STYLES_REL, "styles.xml");
        let styles = match styles_xml {
            Some(xml) => Styles::parse(&xml)?,
            None => Styles::default(),
        };

        let numbering_xml =
            self.read_related_part(&main_path, &main_rels, NUMBERING_REL, "numbering.xml");
        let numbering = match numbering_xml {
            Some(xml) => Numbering::parse(&xml, &styles)?,
            None => Numbering::default(),
        };

        let document_xml = self.container.read_xml(&main_path)?;
        let root = parse_xml(&document_xml)?;
        let body = root
            .first("w:body")
            .ok_or_else(|| Error::InvalidData("document has no body element".to_string()))?;

        let mut reader = BodyReader::new(
            &self.container,
            &main_rels,
            &content_types,
            &styles,
            &numbering,
            &main_path,
        );
        let mut messages = Vec::new();
        let children = reader.read_children(body);
        let mut document = Document::new();
        document.children = children.value;
        messages.extend(children.messages);

        let mut notes = Vec::new();
        for (rel_type, fallback, note_type) in [
            (FOOTNOTES_REL, "footnotes.xml", NoteType::Footnote),
            (ENDNOTES_REL, "endnotes.xml", NoteType::Endnote),
        ] {
            let Some((part_path, xml)) =
                self.locate_related_part(&main_path, &main_rels, rel_type, fallback)
            else {
                continue;
            };
            let part_rels = self.container.read_relationships(&part_path)?;
            let notes_reader = NotesReader {
                container: &self.container,
                relationships: &part_rels,
                content_types: &content_types,
                styles: &styles,
                numbering: &numbering,
                base_path: &part_path,
            };
            let mut result = notes_reader.read_notes(&xml, note_type)?;
            notes.append(&mut result.value);
            messages.extend(result.messages);
        }
        document.notes = Notes::new(notes);

        if let Some((part_path, xml)) =
            self.locate_related_part(&main_path, &main_rels, COMMENTS_REL, "comments.xml")
        {
            let part_rels = self.container.read_relationships(&part_path)?;
            let comments_reader = NotesReader {
                container: &self.container,
                relationships: &part_rels,
                content_types: &content_types,
                styles: &styles,
                numbering: &numbering,
                base_path: &part_path,
            };
            let mut result = comments_reader.read_comments(&xml)?;
            document.comments.append(&mut result.value);
            messages.extend(result.messages);
        }

        Ok(ReadResult::with_messages(document, messages))
    }

    /// Locate the main document part via the package relationships, falling
    /// back to the conventional path.
    fn main_document_path(&self) -> Result<String> {
        let package_rels = self.container.read_package_relationships()?;
        let path = package_rels
            .first_of_type(OFFICE_DOCUMENT_REL)
            .map(|rel| rel.target.trim_start_matches('/').to_string())
            .filter(|path| self.container.exists(path))
            .unwrap_or_else(|| "word/document.xml".to_string());

        if !self.container.exists(&path) {
            return Err(Error::MissingPart(path));
        }
        Ok(path)
    }

    fn read_related_part(
        &self,
        main_path: &str,
        rels: &crate::container::Relationships,
        rel_type: &str,
        fallback: &str,
    ) -> Option<String> {
        self.locate_related_part(main_path, rels, rel_type, fallback)
            .map(|(_, xml)| xml)
    }

    fn locate_related_part(
        &self,
        main_path: &str,
        rels: &crate::container::Relationships,
        rel_type: &str,
        fallback: &str,
    ) -> Option<(String, String)> {
        let path = rels
            .first_of_type(rel_type)
            .filter(|rel| !rel.external)
            .map(|rel| DocxContainer::resolve_path(main_path, &rel.target))
            .unwrap_or_else(|| DocxContainer::resolve_path(main_path, fallback));
        let xml = self.container.read_xml(&path).ok()?;
        Some((path, xml))
    }
}
