//! Body content reader shared by the main document, notes and comments.
//!
//! Walks a materialised XML tree and produces AST nodes plus warnings.
//! Recoverable problems (unknown elements, undefined styles, unreadable
//! images) never abort the read; they surface as messages on the result.

use crate::container::{DocxContainer, Relationships};
use crate::docx::content_types::ContentTypes;
use crate::docx::numbering::{Numbering, NumberingLookup};
use crate::docx::styles::Styles;
use crate::messages::{Message, ReadResult};
use crate::model::{
    BreakKind, CellMerge, Hyperlink, Image, Indent, Node, NoteType, Paragraph, Run, Table,
    TableCell, TableRow, VerticalAlignment,
};
use crate::xml::{XmlElement, XmlNode};
use std::collections::HashMap;

/// Elements that carry no content of interest and are skipped silently.
const IGNORED_ELEMENTS: &[&str] = &[
    "w:bookmarkEnd",
    "w:sectPr",
    "w:proofErr",
    "w:lastRenderedPageBreak",
    "w:commentRangeStart",
    "w:commentRangeEnd",
    "w:del",
    "w:footnoteRef",
    "w:endnoteRef",
    "w:annotationRef",
    "w:pPr",
    "w:rPr",
    "w:tblPr",
    "w:tblGrid",
    "w:trPr",
    "w:tcPr",
];

/// MIME types browsers are known to display inline.
const WEB_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/gif",
    "image/jpeg",
    "image/svg+xml",
    "image/tiff",
];

/// What a complex field turned out to be once its instruction was read.
#[derive(Debug, Clone)]
enum FieldContext {
    Unknown,
    Hyperlink { href: Option<String>, anchor: Option<String> },
}

#[derive(Debug)]
struct FieldState {
    context: FieldContext,
    /// Instruction text accumulated between the begin and separate markers
    instruction: String,
    separated: bool,
}

/// Reads body-level content from a document part.
pub struct BodyReader<'a> {
    container: &'a DocxContainer,
    relationships: &'a Relationships,
    content_types: &'a ContentTypes,
    styles: &'a Styles,
    numbering: &'a Numbering,
    /// Path of the part being read, for resolving relative targets
    base_path: &'a str,
    /// Content of paragraphs whose paragraph mark was deleted, waiting to be
    /// spliced into the next paragraph
    deferred: Vec<Node>,
    fields: Vec<FieldState>,
}

impl<'a> BodyReader<'a> {
    pub fn new(
        container: &'a DocxContainer,
        relationships: &'a Relationships,
        content_types: &'a ContentTypes,
        styles: &'a Styles,
        numbering: &'a Numbering,
        base_path: &'a str,
    ) -> Self {
        Self {
            container,
            relationships,
            content_types,
            styles,
            numbering,
            base_path,
            deferred: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Read all children of an element as body content.
    pub fn read_children(&mut self, parent: &XmlElement) -> ReadResult<Vec<Node>> {
        ReadResult::combine(
            parent
                .children
                .iter()
                .filter_map(XmlNode::as_element)
                .map(|child| self.read_element(child))
                .collect::<Vec<_>>(),
        )
    }

    fn read_element(&mut self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        match element.name.as_str() {
            "w:p" => self.read_paragraph(element),
            "w:r" => self.read_run(element),
            "w:t" => ReadResult::new(vec![Node::text(element.text())]),
            "w:tab" => ReadResult::new(vec![Node::Tab]),
            "w:noBreakHyphen" => ReadResult::new(vec![Node::text("\u{2011}")]),
            "w:softHyphen" => ReadResult::new(vec![Node::text("\u{00AD}")]),
            "w:br" => self.read_break(element),
            "w:hyperlink" => self.read_hyperlink(element),
            "w:tbl" => self.read_table(element),
            "w:tr" => self.read_row(element),
            "w:tc" => self.read_cell(element),
            "w:fldChar" => self.read_field_char(element),
            "w:instrText" => {
                if let Some(field) = self.fields.last_mut() {
                    if !field.separated {
                        field.instruction.push_str(&element.text());
                    }
                }
                ReadResult::empty()
            }
            "w:drawing" | "wp:inline" | "wp:anchor" => self.read_drawing(element),
            "w:footnoteReference" => self.read_note_reference(element, NoteType::Footnote),
            "w:endnoteReference" => self.read_note_reference(element, NoteType::Endnote),
            "w:commentReference" => match element.attr("w:id") {
                Some(id) => ReadResult::new(vec![Node::CommentReference {
                    comment_id: id.to_string(),
                }]),
                None => ReadResult::empty(),
            },
            "w:bookmarkStart" => match element.attr("w:name") {
                // _GoBack marks the cursor position, not an author bookmark
                Some(name) if name != "_GoBack" => ReadResult::new(vec![Node::BookmarkStart {
                    name: name.to_string(),
                }]),
                _ => ReadResult::empty(),
            },
            "w:ins" => self.read_children(element),
            "w:sdt" => match element.first("w:sdtContent") {
                Some(content) => self.read_children(content),
                None => ReadResult::empty(),
            },
            "mc:AlternateContent" => match element.first("mc:Fallback") {
                Some(fallback) => self.read_children(fallback),
                None => ReadResult::empty(),
            },
            name if IGNORED_ELEMENTS.contains(&name) => ReadResult::empty(),
            name => ReadResult::warning(
                Vec::new(),
                format!("An unrecognised element was ignored: {}", name),
            ),
        }
    }

    fn read_paragraph(&mut self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        let properties = element.first("w:pPr");

        // A deleted paragraph mark merges this paragraph into the next one
        if properties
            .and_then(|p| p.first("w:rPr"))
            .and_then(|r| r.first("w:del"))
            .is_some()
        {
            let mut content = self.read_children(element);
            self.deferred.append(&mut content.value);
            return ReadResult::with_messages(Vec::new(), content.messages);
        }

        let mut messages = Vec::new();
        let mut paragraph = Paragraph::default();

        if let Some(props) = properties {
            if let Some(style_id) = props.first("w:pStyle").and_then(|s| s.attr("w:val")) {
                paragraph.style_id = Some(style_id.to_string());
                match self.styles.paragraph_style(style_id) {
                    Some(style) => paragraph.style_name = style.name.clone(),
                    None => messages.push(Message::warning(format!(
                        "Paragraph style with ID {} was referenced but not defined in the document",
                        style_id
                    ))),
                }
            }
            paragraph.alignment = props
                .first("w:jc")
                .and_then(|jc| jc.attr("w:val"))
                .map(str::to_string);
            if let Some(indent) = props.first("w:ind") {
                paragraph.indent = Indent {
                    start: attr_string(indent, "w:start").or_else(|| attr_string(indent, "w:left")),
                    end: attr_string(indent, "w:end").or_else(|| attr_string(indent, "w:right")),
                    first_line: attr_string(indent, "w:firstLine"),
                    hanging: attr_string(indent, "w:hanging"),
                };
            }
            paragraph.numbering =
                self.read_numbering(props, paragraph.style_id.as_deref(), &mut messages);
        }

        let content = self.read_children(element);
        let mut children = std::mem::take(&mut self.deferred);
        children.extend(content.value);
        paragraph.children = children;

        messages.extend(content.messages);
        ReadResult::with_messages(vec![Node::Paragraph(paragraph)], messages)
    }

    fn read_numbering(
        &self,
        properties: &XmlElement,
        style_id: Option<&str>,
        messages: &mut Vec<Message>,
    ) -> Option<crate::model::NumberingLevel> {
        // A numbering level attached to the paragraph style wins over a
        // direct numPr reference
        if let Some(style_id) = style_id {
            if let Some(level) = self.numbering.level_for_paragraph_style(style_id) {
                return Some(level);
            }
        }

        let num_pr = properties.first("w:numPr")?;
        let num_id = num_pr.first("w:numId")?.attr("w:val")?;
        let level_index: u8 = num_pr
            .first("w:ilvl")
            .and_then(|l| l.attr("w:val"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        match self.numbering.level_for(num_id, level_index) {
            NumberingLookup::Level(level) => Some(level),
            NumberingLookup::Missing => None,
            NumberingLookup::UnresolvedStyleLink => {
                messages.push(Message::warning(format!(
                    "Numbering definition for numId {} chains through more than one \
                     numbering style and was ignored",
                    num_id
                )));
                None
            }
        }
    }

    fn read_run(&mut self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        let mut messages = Vec::new();
        let mut run = Run::default();

        if let Some(props) = element.first("w:rPr") {
            if let Some(style_id) = props.first("w:rStyle").and_then(|s| s.attr("w:val")) {
                run.style_id = Some(style_id.to_string());
                match self.styles.character_style(style_id) {
                    Some(style) => run.style_name = style.name.clone(),
                    None => messages.push(Message::warning(format!(
                        "Run style with ID {} was referenced but not defined in the document",
                        style_id
                    ))),
                }
            }
            run.bold = read_boolean(props.first("w:b"));
            run.italic = read_boolean(props.first("w:i"));
            run.underline = read_underline(props.first("w:u"));
            run.strikethrough = read_boolean(props.first("w:strike"));
            run.all_caps = read_boolean(props.first("w:caps"));
            run.small_caps = read_boolean(props.first("w:smallCaps"));
            run.vertical_alignment = match props.first("w:vertAlign").and_then(|v| v.attr("w:val"))
            {
                Some("superscript") => VerticalAlignment::Superscript,
                Some("subscript") => VerticalAlignment::Subscript,
                _ => VerticalAlignment::Baseline,
            };
            run.font = props
                .first("w:rFonts")
                .and_then(|f| f.attr("w:ascii"))
                .map(str::to_string);
            run.font_size = props
                .first("w:sz")
                .and_then(|s| s.attr("w:val"))
                .and_then(|v| v.parse::<f64>().ok())
                .map(|half_points| half_points / 2.0);
            run.highlight = props
                .first("w:highlight")
                .and_then(|h| h.attr("w:val"))
                .filter(|v| *v != "none")
                .map(str::to_string);
        }

        let content = self.read_children(element);
        run.children = content.value;
        messages.extend(content.messages);

        // Content inside an active HYPERLINK field renders as a link
        if !run.children.is_empty() {
            if let Some((href, anchor)) = self.current_field_hyperlink() {
                run.children = vec![Node::Hyperlink(Hyperlink {
                    children: run.children,
                    href,
                    anchor,
                    target_frame: None,
                })];
            }
        }
        ReadResult::with_messages(vec![Node::Run(run)], messages)
    }

    fn current_field_hyperlink(&self) -> Option<(Option<String>, Option<String>)> {
        self.fields.iter().rev().find_map(|field| match &field.context {
            FieldContext::Hyperlink { href, anchor } => Some((href.clone(), anchor.clone())),
            FieldContext::Unknown => None,
        })
    }

    fn read_field_char(&mut self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        match element.attr("w:fldCharType") {
            Some("begin") => {
                self.fields.push(FieldState {
                    context: FieldContext::Unknown,
                    instruction: String::new(),
                    separated: false,
                });
            }
            Some("separate") => {
                if let Some(field) = self.fields.last_mut() {
                    field.separated = true;
                    field.context = parse_field_instruction(&field.instruction);
                }
            }
            Some("end") => {
                self.fields.pop();
            }
            _ => {}
        }
        ReadResult::empty()
    }

    fn read_break(&self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        match element.attr("w:type") {
            None | Some("textWrapping") => ReadResult::new(vec![Node::Break {
                kind: BreakKind::Line,
            }]),
            Some("page") => ReadResult::new(vec![Node::Break {
                kind: BreakKind::Page,
            }]),
            Some("column") => ReadResult::new(vec![Node::Break {
                kind: BreakKind::Column,
            }]),
            Some(other) => {
                ReadResult::warning(Vec::new(), format!("Unsupported break type: {}", other))
            }
        }
    }

    fn read_hyperlink(&mut self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        let content = self.read_children(element);
        let anchor = element.attr("w:anchor").map(str::to_string);
        let target_frame = element
            .attr("w:tgtFrame")
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        let href = match element.attr("r:id") {
            Some(rel_id) => match self.relationships.target_of(rel_id) {
                Some(target) => Some(match &anchor {
                    // An anchor alongside an external target replaces the
                    // target's own fragment
                    Some(anchor) => replace_fragment(target, anchor),
                    None => target.to_string(),
                }),
                None => {
                    return content.add_message(Message::warning(format!(
                        "Hyperlink relationship {} was not found; the link was ignored",
                        rel_id
                    )));
                }
            },
            None => None,
        };

        let anchor = if href.is_some() { None } else { anchor };
        if href.is_none() && anchor.is_none() {
            return content;
        }

        content.map(|children| {
            vec![Node::Hyperlink(Hyperlink {
                children,
                href,
                anchor,
                target_frame,
            })]
        })
    }

    fn read_table(&mut self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        let mut messages = Vec::new();
        let mut table = Table::default();

        if let Some(style_id) = element
            .first("w:tblPr")
            .and_then(|p| p.first("w:tblStyle"))
            .and_then(|s| s.attr("w:val"))
        {
            table.style_id = Some(style_id.to_string());
            match self.styles.table_style(style_id) {
                Some(style) => table.style_name = style.name.clone(),
                None => messages.push(Message::warning(format!(
                    "Table style with ID {} was referenced but not defined in the document",
                    style_id
                ))),
            }
        }

        let content = self.read_children(element);
        table.children = content.value;
        messages.extend(content.messages);

        messages.extend(resolve_vertical_merges(&mut table.children));

        ReadResult::with_messages(vec![Node::Table(table)], messages)
    }

    fn read_row(&mut self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        let is_header = read_boolean(
            element
                .first("w:trPr")
                .and_then(|p| p.first("w:tblHeader")),
        );
        self.read_children(element).map(|children| {
            vec![Node::TableRow(TableRow {
                children,
                is_header,
            })]
        })
    }

    fn read_cell(&mut self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        let properties = element.first("w:tcPr");
        let col_span = properties
            .and_then(|p| p.first("w:gridSpan"))
            .and_then(|s| s.attr("w:val"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let merge = match properties.and_then(|p| p.first("w:vMerge")) {
            Some(v_merge) => match v_merge.attr("w:val") {
                Some("restart") => CellMerge::Restart,
                // A vMerge without a value continues the merge above
                _ => CellMerge::Continue,
            },
            None => CellMerge::None,
        };

        self.read_children(element).map(|children| {
            vec![Node::TableCell(TableCell {
                children,
                col_span,
                row_span: 1,
                merge,
            })]
        })
    }

    fn read_drawing(&mut self, element: &XmlElement) -> ReadResult<Vec<Node>> {
        let alt_text = element
            .descendants_named("wp:docPr")
            .first()
            .and_then(|props| {
                props
                    .attr("descr")
                    .filter(|d| !d.is_empty())
                    .or_else(|| props.attr("title"))
            })
            .map(str::to_string);

        let mut results = Vec::new();
        for blip in element.descendants_named("a:blip") {
            results.push(self.read_blip(blip, alt_text.clone()));
        }
        ReadResult::combine(results)
    }

    fn read_blip(&self, blip: &XmlElement, alt_text: Option<String>) -> ReadResult<Vec<Node>> {
        if blip.attr("r:link").is_some() {
            return ReadResult::warning(
                Vec::new(),
                "A linked image was ignored: only images embedded in the document are supported",
            );
        }
        let Some(rel_id) = blip.attr("r:embed") else {
            return ReadResult::empty();
        };
        let Some(target) = self.relationships.target_of(rel_id) else {
            return ReadResult::warning(
                Vec::new(),
                format!("Image relationship {} was not found; the image was ignored", rel_id),
            );
        };

        let path = DocxContainer::resolve_path(self.base_path, target);
        let bytes = match self.container.read_binary(&path) {
            Ok(bytes) => bytes,
            Err(_) => {
                return ReadResult::warning(
                    Vec::new(),
                    format!("Could not read image at {}; the image was ignored", path),
                );
            }
        };

        let content_type = self.content_types.content_type_of(&path);
        let mut messages = Vec::new();
        match &content_type {
            Some(ct) if WEB_IMAGE_TYPES.contains(&ct.as_str()) => {}
            Some(ct) => messages.push(Message::warning(format!(
                "Image of type {} is unlikely to display in web browsers",
                ct
            ))),
            None => messages.push(Message::warning(format!(
                "Image at {} has no content type and may not display",
                path
            ))),
        }

        ReadResult::with_messages(
            vec![Node::Image(Image {
                bytes,
                alt_text,
                content_type,
            })],
            messages,
        )
    }

    fn read_note_reference(
        &self,
        element: &XmlElement,
        note_type: NoteType,
    ) -> ReadResult<Vec<Node>> {
        match element.attr("w:id") {
            Some(id) => ReadResult::new(vec![Node::NoteReference {
                note_type,
                note_id: id.to_string(),
            }]),
            None => ReadResult::empty(),
        }
    }
}

/// Collapse `vMerge` continuation cells into `row_span` on the opening cell.
///
/// If the table shape is unexpected (a non-row child, or a non-cell inside a
/// row) the children are left untouched and a warning is returned. A
/// continuation cell whose column does not line up with an open merge (e.g.
/// because `gridSpan` differs between the rows) stays a normal cell and is
/// reported once per table.
fn resolve_vertical_merges(children: &mut [Node]) -> Vec<Message> {
    let well_formed = children.iter().all(|child| match child {
        Node::TableRow(row) => row
            .children
            .iter()
            .all(|cell| matches!(cell, Node::TableCell(_))),
        _ => false,
    });
    if !well_formed {
        return vec![Message::warning(
            "A table contained unexpected content; vertical cell merging was not applied",
        )];
    }

    let mut misaligned = false;
    // column index -> (row index, cell index) of the open merge
    let mut open: HashMap<u32, (usize, usize)> = HashMap::new();
    for row_index in 0..children.len() {
        let Node::TableRow(row) = &mut children[row_index] else {
            unreachable!()
        };
        let cells = std::mem::take(&mut row.children);
        let mut kept = Vec::with_capacity(cells.len());
        let mut column = 0u32;

        for node in cells {
            let Node::TableCell(mut cell) = node else {
                unreachable!()
            };
            let span = cell.col_span;

            if cell.merge == CellMerge::Continue {
                if let Some(&(open_row, open_cell)) = open.get(&column) {
                    bump_row_span(children, open_row, open_cell);
                    column += span;
                    continue;
                }
                misaligned = true;
            }

            cell.merge = CellMerge::None;
            open.insert(column, (row_index, kept.len()));
            kept.push(Node::TableCell(cell));
            column += span;
        }

        let Node::TableRow(row) = &mut children[row_index] else {
            unreachable!()
        };
        row.children = kept;
    }

    if misaligned {
        return vec![Message::warning(
            "A merged table cell did not line up with the cell above; it was kept as a normal cell",
        )];
    }
    Vec::new()
}

fn bump_row_span(children: &mut [Node], row_index: usize, cell_index: usize) {
    if let Node::TableRow(row) = &mut children[row_index] {
        if let Some(Node::TableCell(cell)) = row.children.get_mut(cell_index) {
            cell.row_span += 1;
        }
    }
}

fn attr_string(element: &XmlElement, name: &str) -> Option<String> {
    element.attr(name).map(str::to_string)
}

/// Boolean run property: present means true unless explicitly disabled.
fn read_boolean(element: Option<&XmlElement>) -> bool {
    match element {
        Some(el) => match el.attr("w:val") {
            Some(val) => val != "false" && val != "0",
            None => true,
        },
        None => false,
    }
}

/// Underline additionally treats `none` as disabled.
fn read_underline(element: Option<&XmlElement>) -> bool {
    match element {
        Some(el) => match el.attr("w:val") {
            Some(val) => val != "false" && val != "0" && val != "none",
            None => true,
        },
        None => false,
    }
}

/// Parse a complex-field instruction, recognising HYPERLINK fields.
fn parse_field_instruction(instruction: &str) -> FieldContext {
    let trimmed = instruction.trim();
    let Some(rest) = trimmed.strip_prefix("HYPERLINK") else {
        return FieldContext::Unknown;
    };
    let rest = rest.trim_start();

    if let Some(after_switch) = rest.strip_prefix("\\l") {
        if let Some(anchor) = parse_quoted(after_switch.trim_start()) {
            return FieldContext::Hyperlink {
                href: None,
                anchor: Some(anchor),
            };
        }
    } else if let Some(href) = parse_quoted(rest) {
        return FieldContext::Hyperlink {
            href: Some(href),
            anchor: None,
        };
    }
    FieldContext::Unknown
}

fn parse_quoted(text: &str) -> Option<String> {
    let rest = text.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Replace the fragment of a URI with the given anchor.
fn replace_fragment(uri: &str, fragment: &str) -> String {
    let base = match uri.find('#') {
        Some(index) => &uri[..index],
        None => uri,
    };
    format!("{}#{}", base, fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Relationship;
    use crate::xml::parse_xml;
    use std::io::Write;

    fn empty_container() -> DocxContainer {
        let mut buffer = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buffer));
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("word/media/image1.png", options).unwrap();
            writer.write_all(b"\x89PNG fake bytes").unwrap();
            writer.finish().unwrap();
        }
        DocxContainer::from_bytes(buffer).unwrap()
    }

    struct Fixture {
        container: DocxContainer,
        relationships: Relationships,
        content_types: ContentTypes,
        styles: Styles,
        numbering: Numbering,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                container: empty_container(),
                relationships: Relationships::new(),
                content_types: ContentTypes::default(),
                styles: Styles::default(),
                numbering: Numbering::default(),
            }
        }

        fn read(&self, xml: &str) -> ReadResult<Vec<Node>> {
            let root = parse_xml(xml).unwrap();
            let mut reader = BodyReader::new(
                &self.container,
                &self.relationships,
                &self.content_types,
                &self.styles,
                &self.numbering,
                "word/document.xml",
            );
            reader.read_children(&root)
        }
    }

    fn single_paragraph(nodes: &[Node]) -> &Paragraph {
        match nodes {
            [Node::Paragraph(p)] => p,
            other => panic!("expected one paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_paragraph_with_formatted_run() {
        let result = Fixture::new().read(
            r#"<w:body><w:p><w:r>
                <w:rPr><w:b/><w:i w:val="0"/><w:u w:val="single"/><w:sz w:val="28"/></w:rPr>
                <w:t>Hello</w:t>
            </w:r></w:p></w:body>"#,
        );

        let paragraph = single_paragraph(&result.value);
        let Node::Run(run) = &paragraph.children[0] else {
            panic!("expected run");
        };
        assert!(run.bold);
        assert!(!run.italic);
        assert!(run.underline);
        assert_eq!(run.font_size, Some(14.0));
        assert_eq!(run.children, vec![Node::text("Hello")]);
        assert_eq!(result.messages.len(), 0);
    }

    #[test]
    fn test_underline_none_is_disabled() {
        let result = Fixture::new().read(
            r#"<w:body><w:p><w:r>
                <w:rPr><w:u w:val="none"/></w:rPr><w:t>x</w:t>
            </w:r></w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        let Node::Run(run) = &paragraph.children[0] else {
            panic!("expected run");
        };
        assert!(!run.underline);
    }

    #[test]
    fn test_undefined_paragraph_style_warns() {
        let result = Fixture::new().read(
            r#"<w:body><w:p>
                <w:pPr><w:pStyle w:val="Missing"/></w:pPr>
                <w:r><w:t>x</w:t></w:r>
            </w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        assert_eq!(paragraph.style_id.as_deref(), Some("Missing"));
        assert!(paragraph.style_name.is_none());
        assert_eq!(result.messages.len(), 1);
        assert!(result.messages[0].text.contains("Missing"));
    }

    #[test]
    fn test_deleted_paragraph_splices_into_next() {
        let result = Fixture::new().read(
            r#"<w:body>
                <w:p>
                    <w:pPr><w:rPr><w:del/></w:rPr></w:pPr>
                    <w:r><w:t>first </w:t></w:r>
                </w:p>
                <w:p><w:r><w:t>second</w:t></w:r></w:p>
            </w:body>"#,
        );

        assert_eq!(result.value.len(), 1);
        let paragraph = single_paragraph(&result.value);
        assert_eq!(paragraph.children.len(), 2);
        let text: String = paragraph
            .children
            .iter()
            .map(|n| n.raw_text())
            .collect();
        assert_eq!(text, "first second");
    }

    #[test]
    fn test_unrecognised_element_warns() {
        let result = Fixture::new().read(r#"<w:body><w:madeUp/></w:body>"#);
        assert!(result.value.is_empty());
        assert_eq!(
            result.messages[0].text,
            "An unrecognised element was ignored: w:madeUp"
        );
    }

    #[test]
    fn test_ignored_elements_are_silent() {
        let result = Fixture::new()
            .read(r#"<w:body><w:sectPr/><w:bookmarkEnd w:id="0"/><w:proofErr/></w:body>"#);
        assert!(result.value.is_empty());
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_break_kinds() {
        let fixture = Fixture::new();
        let result = fixture.read(
            r#"<w:body><w:p><w:r>
                <w:br/><w:br w:type="page"/><w:br w:type="column"/><w:br w:type="odd"/>
            </w:r></w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        let Node::Run(run) = &paragraph.children[0] else {
            panic!("expected run");
        };
        assert_eq!(
            run.children,
            vec![
                Node::Break { kind: BreakKind::Line },
                Node::Break { kind: BreakKind::Page },
                Node::Break { kind: BreakKind::Column },
            ]
        );
        assert_eq!(result.messages[0].text, "Unsupported break type: odd");
    }

    #[test]
    fn test_hyperlink_element_external() {
        let mut fixture = Fixture::new();
        fixture.relationships.add(Relationship {
            id: "rId5".to_string(),
            rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink"
                .to_string(),
            target: "https://example.com/page#top".to_string(),
            external: true,
        });

        let result = fixture.read(
            r#"<w:body><w:p>
                <w:hyperlink r:id="rId5" w:anchor="section">
                    <w:r><w:t>link</w:t></w:r>
                </w:hyperlink>
            </w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        let Node::Hyperlink(link) = &paragraph.children[0] else {
            panic!("expected hyperlink");
        };
        // The explicit anchor replaces the target's own fragment
        assert_eq!(link.href.as_deref(), Some("https://example.com/page#section"));
        assert!(link.anchor.is_none());
    }

    #[test]
    fn test_hyperlink_element_anchor_only() {
        let result = Fixture::new().read(
            r#"<w:body><w:p>
                <w:hyperlink w:anchor="top"><w:r><w:t>up</w:t></w:r></w:hyperlink>
            </w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        let Node::Hyperlink(link) = &paragraph.children[0] else {
            panic!("expected hyperlink");
        };
        assert!(link.href.is_none());
        assert_eq!(link.anchor.as_deref(), Some("top"));
    }

    #[test]
    fn test_complex_field_hyperlink_wraps_runs() {
        let result = Fixture::new().read(
            r#"<w:body><w:p>
                <w:r><w:fldChar w:fldCharType="begin"/></w:r>
                <w:r><w:instrText> HYPERLINK "https://example.com" </w:instrText></w:r>
                <w:r><w:fldChar w:fldCharType="separate"/></w:r>
                <w:r><w:t>click</w:t></w:r>
                <w:r><w:fldChar w:fldCharType="end"/></w:r>
                <w:r><w:t>after</w:t></w:r>
            </w:p></w:body>"#,
        );

        let paragraph = single_paragraph(&result.value);
        let links = collect_links(&paragraph.children);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href.as_deref(), Some("https://example.com"));
        assert_eq!(links[0].children[0].raw_text(), "click");

        let last = paragraph.children.last().unwrap();
        assert!(matches!(last, Node::Run(_)));
        assert_eq!(last.raw_text(), "after");
    }

    fn collect_links(nodes: &[Node]) -> Vec<&Hyperlink> {
        let mut links = Vec::new();
        for node in nodes {
            if let Node::Hyperlink(link) = node {
                links.push(link);
            }
            if let Node::Run(run) = node {
                links.extend(collect_links(&run.children));
            }
        }
        links
    }

    #[test]
    fn test_complex_field_anchor_hyperlink() {
        let result = Fixture::new().read(
            r#"<w:body><w:p>
                <w:r><w:fldChar w:fldCharType="begin"/></w:r>
                <w:r><w:instrText> HYPERLINK \l "bookmark1" </w:instrText></w:r>
                <w:r><w:fldChar w:fldCharType="separate"/></w:r>
                <w:r><w:t>go</w:t></w:r>
                <w:r><w:fldChar w:fldCharType="end"/></w:r>
            </w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        let links = collect_links(&paragraph.children);
        assert_eq!(links.len(), 1);
        assert!(links[0].href.is_none());
        assert_eq!(links[0].anchor.as_deref(), Some("bookmark1"));
    }

    #[test]
    fn test_nested_field_does_not_terminate_outer_hyperlink() {
        let result = Fixture::new().read(
            r#"<w:body><w:p>
                <w:r><w:fldChar w:fldCharType="begin"/></w:r>
                <w:r><w:instrText>HYPERLINK "https://outer.example"</w:instrText></w:r>
                <w:r><w:fldChar w:fldCharType="separate"/></w:r>
                <w:r><w:fldChar w:fldCharType="begin"/></w:r>
                <w:r><w:instrText>PAGEREF _Toc1 \h</w:instrText></w:r>
                <w:r><w:fldChar w:fldCharType="separate"/></w:r>
                <w:r><w:t>still linked</w:t></w:r>
                <w:r><w:fldChar w:fldCharType="end"/></w:r>
                <w:r><w:t>also linked</w:t></w:r>
                <w:r><w:fldChar w:fldCharType="end"/></w:r>
            </w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        let links = collect_links(&paragraph.children);
        assert_eq!(links.len(), 2);
        for link in links {
            assert_eq!(link.href.as_deref(), Some("https://outer.example"));
        }
    }

    #[test]
    fn test_table_vertical_merge() {
        let result = Fixture::new().read(
            r#"<w:body><w:tbl>
                <w:tr>
                    <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>tall</w:t></w:r></w:p></w:tc>
                    <w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
                    <w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
                    <w:tc><w:p><w:r><w:t>c</w:t></w:r></w:p></w:tc>
                </w:tr>
            </w:tbl></w:body>"#,
        );

        let Node::Table(table) = &result.value[0] else {
            panic!("expected table");
        };
        let Node::TableRow(first_row) = &table.children[0] else {
            panic!("expected row");
        };
        let Node::TableCell(tall) = &first_row.children[0] else {
            panic!("expected cell");
        };
        assert_eq!(tall.row_span, 3);

        // Continuation cells are dropped from later rows
        for row in &table.children[1..] {
            let Node::TableRow(row) = row else { panic!("expected row") };
            assert_eq!(row.children.len(), 1);
        }
    }

    #[test]
    fn test_merge_with_grid_span_tracks_columns() {
        let result = Fixture::new().read(
            r#"<w:body><w:tbl>
                <w:tr>
                    <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p/></w:tc>
                    <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p/></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p/></w:tc>
                    <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
                </w:tr>
            </w:tbl></w:body>"#,
        );

        let Node::Table(table) = &result.value[0] else {
            panic!("expected table");
        };
        let Node::TableRow(first_row) = &table.children[0] else {
            panic!("expected row");
        };
        let Node::TableCell(merged) = &first_row.children[1] else {
            panic!("expected cell");
        };
        assert_eq!(merged.col_span, 1);
        assert_eq!(merged.row_span, 2);
    }

    #[test]
    fn test_misaligned_merge_keeps_cell_and_warns() {
        // The restart spans two grid columns but the continuation below sits
        // in column 1, so the merge cannot be applied
        let result = Fixture::new().read(
            r#"<w:body><w:tbl>
                <w:tr>
                    <w:tc><w:tcPr><w:gridSpan w:val="2"/><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc>
                    <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
                </w:tr>
            </w:tbl></w:body>"#,
        );

        let Node::Table(table) = &result.value[0] else {
            panic!("expected table");
        };
        let Node::TableRow(first_row) = &table.children[0] else {
            panic!("expected row");
        };
        let Node::TableCell(wide) = &first_row.children[0] else {
            panic!("expected cell");
        };
        assert_eq!(wide.row_span, 1);

        // The continuation stays in place as a normal cell
        let Node::TableRow(second_row) = &table.children[1] else {
            panic!("expected row");
        };
        assert_eq!(second_row.children.len(), 2);
        assert_eq!(
            result.messages[0].text,
            "A merged table cell did not line up with the cell above; it was kept as a normal cell"
        );
    }

    #[test]
    fn test_table_with_stray_content_passes_through_with_warning() {
        let result = Fixture::new().read(
            r#"<w:body><w:tbl>
                <w:tr>
                    <w:p><w:r><w:t>loose</w:t></w:r></w:p>
                    <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p/></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
                </w:tr>
            </w:tbl></w:body>"#,
        );

        let Node::Table(table) = &result.value[0] else {
            panic!("expected table");
        };
        // Rows are untouched: the stray paragraph stays and no merging ran
        let Node::TableRow(first_row) = &table.children[0] else {
            panic!("expected row");
        };
        assert_eq!(first_row.children.len(), 2);
        assert!(matches!(first_row.children[0], Node::Paragraph(_)));
        let Node::TableRow(second_row) = &table.children[1] else {
            panic!("expected row");
        };
        assert_eq!(second_row.children.len(), 1);
        assert_eq!(
            result.messages[0].text,
            "A table contained unexpected content; vertical cell merging was not applied"
        );
    }

    #[test]
    fn test_header_row_flag() {
        let result = Fixture::new().read(
            r#"<w:body><w:tbl>
                <w:tr><w:trPr><w:tblHeader/></w:trPr><w:tc><w:p/></w:tc></w:tr>
                <w:tr><w:tc><w:p/></w:tc></w:tr>
            </w:tbl></w:body>"#,
        );
        let Node::Table(table) = &result.value[0] else {
            panic!("expected table");
        };
        let Node::TableRow(first) = &table.children[0] else { panic!() };
        let Node::TableRow(second) = &table.children[1] else { panic!() };
        assert!(first.is_header);
        assert!(!second.is_header);
    }

    #[test]
    fn test_image_read_from_container() {
        let mut fixture = Fixture::new();
        fixture.relationships.add(Relationship {
            id: "rId7".to_string(),
            rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"
                .to_string(),
            target: "media/image1.png".to_string(),
            external: false,
        });
        fixture.content_types = ContentTypes::parse(
            r#"<Types><Default Extension="png" ContentType="image/png"/></Types>"#,
        )
        .unwrap();

        let result = fixture.read(
            r#"<w:body><w:p><w:r><w:drawing>
                <wp:inline>
                    <wp:docPr id="1" name="Picture" descr="A diagram"/>
                    <a:graphic><a:graphicData><pic:pic><pic:blipFill>
                        <a:blip r:embed="rId7"/>
                    </pic:blipFill></pic:pic></a:graphicData></a:graphic>
                </wp:inline>
            </w:drawing></w:r></w:p></w:body>"#,
        );

        let paragraph = single_paragraph(&result.value);
        let Node::Run(run) = &paragraph.children[0] else { panic!() };
        let Node::Image(image) = &run.children[0] else {
            panic!("expected image, got {:?}", run.children);
        };
        assert_eq!(image.alt_text.as_deref(), Some("A diagram"));
        assert_eq!(image.content_type.as_deref(), Some("image/png"));
        assert!(!image.bytes.is_empty());
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_anchor_without_drawing_wrapper_reads_image() {
        let mut fixture = Fixture::new();
        fixture.relationships.add(Relationship {
            id: "rId7".to_string(),
            rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"
                .to_string(),
            target: "media/image1.png".to_string(),
            external: false,
        });
        fixture.content_types = ContentTypes::parse(
            r#"<Types><Default Extension="png" ContentType="image/png"/></Types>"#,
        )
        .unwrap();

        let result = fixture.read(
            r#"<w:body><w:p><w:r><wp:anchor>
                <wp:docPr id="1" name="Picture"/>
                <a:graphic><a:graphicData><pic:pic><pic:blipFill>
                    <a:blip r:embed="rId7"/>
                </pic:blipFill></pic:pic></a:graphicData></a:graphic>
            </wp:anchor></w:r></w:p></w:body>"#,
        );

        let paragraph = single_paragraph(&result.value);
        let Node::Run(run) = &paragraph.children[0] else { panic!() };
        let Node::Image(image) = &run.children[0] else {
            panic!("expected image, got {:?}", run.children);
        };
        assert_eq!(image.content_type.as_deref(), Some("image/png"));
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_unusual_image_type_warns() {
        let mut fixture = Fixture::new();
        fixture.relationships.add(Relationship {
            id: "rId7".to_string(),
            rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"
                .to_string(),
            target: "media/image1.png".to_string(),
            external: false,
        });
        fixture.content_types = ContentTypes::parse(
            r#"<Types><Default Extension="png" ContentType="image/x-emf"/></Types>"#,
        )
        .unwrap();

        let result = fixture.read(
            r#"<w:body><w:p><w:r><w:drawing><wp:inline>
                <a:blip r:embed="rId7"/>
            </wp:inline></w:drawing></w:r></w:p></w:body>"#,
        );
        assert!(result.messages[0]
            .text
            .contains("Image of type image/x-emf is unlikely to display"));
    }

    #[test]
    fn test_note_and_comment_references() {
        let result = Fixture::new().read(
            r#"<w:body><w:p><w:r>
                <w:footnoteReference w:id="2"/>
                <w:endnoteReference w:id="3"/>
                <w:commentReference w:id="4"/>
            </w:r></w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        let Node::Run(run) = &paragraph.children[0] else { panic!() };
        assert_eq!(
            run.children,
            vec![
                Node::NoteReference {
                    note_type: NoteType::Footnote,
                    note_id: "2".to_string()
                },
                Node::NoteReference {
                    note_type: NoteType::Endnote,
                    note_id: "3".to_string()
                },
                Node::CommentReference {
                    comment_id: "4".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_bookmark_go_back_is_skipped() {
        let result = Fixture::new().read(
            r#"<w:body><w:p>
                <w:bookmarkStart w:id="0" w:name="_GoBack"/>
                <w:bookmarkStart w:id="1" w:name="chapter-1"/>
                <w:bookmarkEnd w:id="1"/>
            </w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        assert_eq!(
            paragraph.children,
            vec![Node::BookmarkStart {
                name: "chapter-1".to_string()
            }]
        );
    }

    #[test]
    fn test_sdt_and_alternate_content() {
        let result = Fixture::new().read(
            r#"<w:body>
                <w:sdt><w:sdtContent><w:p><w:r><w:t>inside sdt</w:t></w:r></w:p></w:sdtContent></w:sdt>
                <w:p><w:r><mc:AlternateContent>
                    <mc:Choice Requires="wps"><w:t>fancy</w:t></mc:Choice>
                    <mc:Fallback><w:t>plain</w:t></mc:Fallback>
                </mc:AlternateContent></w:r></w:p>
            </w:body>"#,
        );
        assert_eq!(result.value.len(), 2);
        assert_eq!(result.value[0].raw_text(), "inside sdt");
        assert_eq!(result.value[1].raw_text(), "plain");
    }

    #[test]
    fn test_numbering_from_num_pr() {
        let mut fixture = Fixture::new();
        fixture.numbering = Numbering::parse(
            r#"<w:numbering xmlns:w="http://x">
                <w:abstractNum w:abstractNumId="0">
                    <w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl>
                </w:abstractNum>
                <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
            </w:numbering>"#,
            &Styles::default(),
        )
        .unwrap();

        let result = fixture.read(
            r#"<w:body><w:p>
                <w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr>
                <w:r><w:t>item</w:t></w:r>
            </w:p></w:body>"#,
        );
        let paragraph = single_paragraph(&result.value);
        let numbering = paragraph.numbering.as_ref().unwrap();
        assert!(numbering.is_ordered);
        assert_eq!(numbering.num_id, "1");
    }
}
