//! AST → HTML generation through the style map.

use crate::messages::{Message, ReadResult};
use crate::model::{
    BreakKind, Document, Hyperlink, Node, NoteType, Paragraph, Run, Table, TableCell, TableRow,
    VerticalAlignment,
};
use crate::render::options::RenderOptions;
use crate::render::path_stack::PathStack;
use crate::render::writer::{HtmlWriter, Writer};
use crate::stylemap::{ElementMatcher, HtmlPath, PathSegment, StyleMap};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Render a document to HTML under the given style map and options.
pub fn to_html(
    document: &Document,
    style_map: &StyleMap,
    options: &RenderOptions,
) -> ReadResult<String> {
    DocumentRenderer::new(document, style_map, options).render()
}

struct DocumentRenderer<'a> {
    document: &'a Document,
    style_map: &'a StyleMap,
    options: &'a RenderOptions,
    stack: PathStack,
    messages: Vec<Message>,
    emitted_warnings: HashSet<String>,
    /// Next unused count per (list id, level); survives list close/reopen
    list_counters: HashMap<(String, u8), u32>,
    /// List id and level of the last rendered list paragraph
    current_list: Option<(String, u8)>,
    /// Attributes carried by open list elements of the current list, by level
    open_list_attrs: HashMap<u8, BTreeMap<String, String>>,
    /// Notes in order of first reference
    note_references: Vec<(NoteType, String)>,
    /// Referenced comments: (comment id, label)
    comment_references: Vec<(String, String)>,
}

impl<'a> DocumentRenderer<'a> {
    fn new(document: &'a Document, style_map: &'a StyleMap, options: &'a RenderOptions) -> Self {
        Self {
            document,
            style_map,
            options,
            stack: PathStack::new(),
            messages: Vec::new(),
            emitted_warnings: HashSet::new(),
            list_counters: HashMap::new(),
            current_list: None,
            open_list_attrs: HashMap::new(),
            note_references: Vec::new(),
            comment_references: Vec::new(),
        }
    }

    fn render(mut self) -> ReadResult<String> {
        let document = self.document;
        let mut writer = HtmlWriter::new();
        self.render_nodes(&document.children, &mut writer);
        self.stack.close_all(&mut writer);
        self.render_note_appendix(&mut writer);
        self.render_comment_appendix(&mut writer);
        ReadResult::with_messages(writer.finish(), self.messages)
    }

    fn render_nodes(&mut self, nodes: &[Node], writer: &mut HtmlWriter) {
        for node in nodes {
            self.render_node(node, writer);
        }
    }

    fn render_node(&mut self, node: &Node, writer: &mut HtmlWriter) {
        match node {
            Node::Paragraph(paragraph) => self.render_paragraph(paragraph, writer),
            Node::Run(run) => self.render_run(run, writer),
            Node::Text { value } => {
                if !value.is_empty() {
                    self.stack.write_pending(writer);
                    writer.text(value);
                }
            }
            Node::Tab => {
                self.stack.write_pending(writer);
                writer.text("\t");
            }
            Node::Break { kind } => {
                if let Some(path) = self.style_map.break_path(*kind) {
                    let path = path.clone();
                    self.render_leaf_path(&path, writer);
                }
            }
            Node::Hyperlink(link) => self.render_hyperlink(link, writer),
            Node::Image(image) => {
                self.stack.write_pending(writer);
                let mut attributes = BTreeMap::new();
                let mime = image.content_type.as_deref().unwrap_or("application/octet-stream");
                attributes.insert(
                    "src".to_string(),
                    format!("data:{};base64,{}", mime, BASE64.encode(&image.bytes)),
                );
                if let Some(alt) = &image.alt_text {
                    attributes.insert("alt".to_string(), alt.clone());
                }
                writer.self_close("img", &attributes);
            }
            Node::Table(table) => self.render_table(table, writer),
            Node::TableRow(row) => self.render_nodes(&row.children, writer),
            Node::TableCell(cell) => self.render_nodes(&cell.children, writer),
            Node::NoteReference { note_type, note_id } => {
                self.render_note_reference(*note_type, note_id, writer)
            }
            Node::CommentReference { comment_id } => {
                self.render_comment_reference(comment_id, writer)
            }
            Node::BookmarkStart { name } => {
                self.stack.write_pending(writer);
                let mut attributes = BTreeMap::new();
                attributes.insert(
                    "id".to_string(),
                    format!("{}{}", self.options.id_prefix, name),
                );
                writer.open("a", &attributes);
                writer.close("a");
            }
        }
    }

    fn render_paragraph(&mut self, paragraph: &Paragraph, writer: &mut HtmlWriter) {
        let style_map = self.style_map;
        let Some(rule) = style_map.paragraph_rule(paragraph) else {
            // No rule at all: content still flows, unwrapped
            self.current_list = None;
            self.open_list_attrs.clear();
            self.stack.satisfy(&[], writer);
            self.render_nodes(&paragraph.children, writer);
            return;
        };

        if paragraph.style_id.is_some() && !rule.matcher.constrains_style() {
            self.warn_unrecognised_style("paragraph", &paragraph.style_id, &paragraph.style_name);
        }

        let mut path = rule.path.clone();
        let has_list_constraint = matches!(
            rule.matcher,
            ElementMatcher::Paragraph { list: Some(_), .. }
        );

        match (&paragraph.numbering, has_list_constraint) {
            (Some(level), true) if path.segments.len() >= 2 => {
                let num_changed = !matches!(
                    &self.current_list,
                    Some((id, _)) if *id == level.num_id
                );
                if num_changed {
                    self.open_list_attrs.clear();
                }
                let newly_opened = match &self.current_list {
                    None => true,
                    Some((id, open_level)) => {
                        *id != level.num_id || *open_level < level.level_index
                    }
                };
                // A different list at the same depth must not merge into the
                // previous list's element
                if num_changed && self.current_list.is_some() {
                    let index = path.segments.len() - 2;
                    path.segments[index].fresh = true;
                }

                let key = (level.num_id.clone(), level.level_index);
                let counter = self
                    .list_counters
                    .entry(key)
                    .or_insert_with(|| level.start_override.unwrap_or(1));
                if newly_opened {
                    if level.is_ordered && *counter != 1 {
                        self.open_list_attrs.insert(
                            level.level_index,
                            BTreeMap::from([("start".to_string(), counter.to_string())]),
                        );
                    } else {
                        self.open_list_attrs.remove(&level.level_index);
                    }
                }
                if level.is_ordered {
                    *counter += 1;
                }

                // Open list elements keep their attributes for as long as
                // they stay open, so collapsing still matches
                let list_index = path.segments.len() - 2;
                for (open_level, attributes) in &self.open_list_attrs {
                    let index = (*open_level as usize) * 2;
                    if index <= list_index && index < path.segments.len() {
                        path.segments[index]
                            .attributes
                            .extend(attributes.clone());
                    }
                }

                self.current_list = Some((level.num_id.clone(), level.level_index));
            }
            _ => {
                self.current_list = None;
                self.open_list_attrs.clear();
            }
        }

        self.stack.satisfy(&path.segments, writer);
        if !self.options.ignore_empty_paragraphs {
            self.stack.write_pending(writer);
        }
        self.render_nodes(&paragraph.children, writer);
    }

    fn render_run(&mut self, run: &Run, writer: &mut HtmlWriter) {
        let style_map = self.style_map;
        let rule = style_map.run_rule(run);

        if run.style_id.is_some()
            && !rule.map(|r| r.matcher.constrains_style()).unwrap_or(false)
        {
            self.warn_unrecognised_style("run", &run.style_id, &run.style_name);
        }

        if !has_renderable_content(&run.children) {
            return;
        }

        // Outermost to innermost
        let mut wrappers: Vec<HtmlPath> = Vec::new();
        if let Some(rule) = rule {
            if !rule.path.is_empty() {
                wrappers.push(rule.path.clone());
            }
        }
        if run.bold {
            if let Some(path) = style_map.bold_path() {
                wrappers.push(path.clone());
            }
        }
        if run.italic {
            if let Some(path) = style_map.italic_path() {
                wrappers.push(path.clone());
            }
        }
        match run.vertical_alignment {
            VerticalAlignment::Superscript => {
                wrappers.push(HtmlPath::single(PathSegment::new("sup")))
            }
            VerticalAlignment::Subscript => {
                wrappers.push(HtmlPath::single(PathSegment::new("sub")))
            }
            VerticalAlignment::Baseline => {}
        }
        if run.underline {
            if let Some(path) = style_map.underline_path() {
                wrappers.push(path.clone());
            }
        }
        if run.strikethrough {
            if let Some(path) = style_map.strikethrough_path() {
                wrappers.push(path.clone());
            }
        }
        if run.all_caps {
            if let Some(path) = style_map.all_caps_path() {
                wrappers.push(path.clone());
            }
        }
        if run.small_caps {
            if let Some(path) = style_map.small_caps_path() {
                wrappers.push(path.clone());
            }
        }
        if let Some(color) = &run.highlight {
            if let Some(path) = style_map.highlight_path(color) {
                wrappers.push(path.clone());
            }
        }

        let mut opened: Vec<&str> = Vec::new();
        if !wrappers.is_empty() {
            self.stack.write_pending(writer);
            for path in &wrappers {
                for segment in &path.segments {
                    writer.open(segment.tag(), &segment.attributes);
                    opened.push(segment.tag());
                }
            }
        }

        self.render_nodes(&run.children, writer);

        for tag in opened.iter().rev() {
            writer.close(tag);
        }
    }

    fn render_hyperlink(&mut self, link: &Hyperlink, writer: &mut HtmlWriter) {
        self.stack.write_pending(writer);
        let mut attributes = BTreeMap::new();
        if let Some(href) = link.target(&self.options.id_prefix) {
            attributes.insert("href".to_string(), href);
        }
        if let Some(frame) = &link.target_frame {
            attributes.insert("target".to_string(), frame.clone());
        }
        writer.open("a", &attributes);
        self.render_nodes(&link.children, writer);
        writer.close("a");
    }

    fn render_table(&mut self, table: &Table, writer: &mut HtmlWriter) {
        let style_map = self.style_map;
        let rule = style_map.table_rule(table);

        if table.style_id.is_some()
            && !rule.map(|r| r.matcher.constrains_style()).unwrap_or(false)
        {
            self.warn_unrecognised_style("table", &table.style_id, &table.style_name);
        }

        let path = match rule {
            Some(rule) => rule.path.clone(),
            None => HtmlPath::single(PathSegment::fresh("table")),
        };
        self.stack.satisfy(&path.segments, writer);

        let rows: Vec<&TableRow> = table
            .children
            .iter()
            .filter_map(|child| match child {
                Node::TableRow(row) => Some(row),
                _ => None,
            })
            .collect();
        if rows.is_empty() {
            return;
        }

        self.stack.write_pending(writer);
        let header_count = rows.iter().take_while(|row| row.is_header).count();
        if header_count > 0 {
            writer.open("thead", &BTreeMap::new());
            for row in &rows[..header_count] {
                self.render_row(row, true, writer);
            }
            writer.close("thead");
            writer.open("tbody", &BTreeMap::new());
            for row in &rows[header_count..] {
                self.render_row(row, false, writer);
            }
            writer.close("tbody");
        } else {
            for row in &rows {
                self.render_row(row, false, writer);
            }
        }
    }

    fn render_row(&mut self, row: &TableRow, header: bool, writer: &mut HtmlWriter) {
        writer.open("tr", &BTreeMap::new());
        for child in &row.children {
            if let Node::TableCell(cell) = child {
                self.render_cell(cell, header, writer);
            }
        }
        writer.close("tr");
    }

    fn render_cell(&mut self, cell: &TableCell, header: bool, writer: &mut HtmlWriter) {
        let tag = if header { "th" } else { "td" };
        let mut attributes = BTreeMap::new();
        if cell.col_span > 1 {
            attributes.insert("colspan".to_string(), cell.col_span.to_string());
        }
        if cell.row_span > 1 {
            attributes.insert("rowspan".to_string(), cell.row_span.to_string());
        }
        writer.open(tag, &attributes);
        self.render_block(&cell.children, writer);
        writer.close(tag);
    }

    /// Render nodes in an isolated output context (table cell, note body).
    fn render_block(&mut self, nodes: &[Node], writer: &mut HtmlWriter) {
        let saved_stack = std::mem::take(&mut self.stack);
        let saved_list = self.current_list.take();
        let saved_attrs = std::mem::take(&mut self.open_list_attrs);

        self.render_nodes(nodes, writer);
        self.stack.close_all(writer);

        self.stack = saved_stack;
        self.current_list = saved_list;
        self.open_list_attrs = saved_attrs;
    }

    fn render_leaf_path(&mut self, path: &HtmlPath, writer: &mut HtmlWriter) {
        if path.is_empty() {
            return;
        }
        self.stack.write_pending(writer);
        let last = path.segments.len() - 1;
        for segment in &path.segments[..last] {
            writer.open(segment.tag(), &segment.attributes);
        }
        let segment = &path.segments[last];
        if is_void_tag(segment.tag()) {
            writer.self_close(segment.tag(), &segment.attributes);
        } else {
            writer.open(segment.tag(), &segment.attributes);
            writer.close(segment.tag());
        }
        for segment in path.segments[..last].iter().rev() {
            writer.close(segment.tag());
        }
    }

    fn render_note_reference(
        &mut self,
        note_type: NoteType,
        note_id: &str,
        writer: &mut HtmlWriter,
    ) {
        if self.document.notes.get(note_type, note_id).is_none() {
            self.push_warning(format!(
                "Could not find {} with ID {}",
                note_type.as_str(),
                note_id
            ));
            return;
        }
        self.note_references
            .push((note_type, note_id.to_string()));
        let number = self.note_references.len();
        let prefix = &self.options.id_prefix;

        self.stack.write_pending(writer);
        writer.open("sup", &BTreeMap::new());
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "href".to_string(),
            format!("#{}{}-{}", prefix, note_type.as_str(), note_id),
        );
        attributes.insert(
            "id".to_string(),
            format!("{}{}-ref-{}", prefix, note_type.as_str(), note_id),
        );
        writer.open("a", &attributes);
        writer.text(&format!("[{}]", number));
        writer.close("a");
        writer.close("sup");
    }

    fn render_comment_reference(&mut self, comment_id: &str, writer: &mut HtmlWriter) {
        // The default map strips comment references entirely
        let Some(path) = self.style_map.comment_reference_path() else {
            return;
        };
        if path.is_empty() {
            return;
        }
        let path = path.clone();
        let Some(comment) = self
            .document
            .comments
            .iter()
            .find(|comment| comment.comment_id == comment_id)
        else {
            self.push_warning(format!("Could not find comment with ID {}", comment_id));
            return;
        };

        let label = format!(
            "[{}{}]",
            comment.author_initials.as_deref().unwrap_or(""),
            self.comment_references.len() + 1
        );
        self.comment_references
            .push((comment_id.to_string(), label.clone()));
        let prefix = &self.options.id_prefix;

        self.stack.write_pending(writer);
        for segment in &path.segments {
            writer.open(segment.tag(), &segment.attributes);
        }
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "href".to_string(),
            format!("#{}comment-{}", prefix, comment_id),
        );
        attributes.insert(
            "id".to_string(),
            format!("{}comment-ref-{}", prefix, comment_id),
        );
        writer.open("a", &attributes);
        writer.text(&label);
        writer.close("a");
        for segment in path.segments.iter().rev() {
            writer.close(segment.tag());
        }
    }

    fn render_note_appendix(&mut self, writer: &mut HtmlWriter) {
        let references = std::mem::take(&mut self.note_references);
        if references.is_empty() {
            return;
        }
        let document = self.document;
        let prefix = self.options.id_prefix.clone();

        writer.open("ol", &BTreeMap::new());
        for (note_type, note_id) in &references {
            let Some(note) = document.notes.get(*note_type, note_id) else {
                continue;
            };
            let mut attributes = BTreeMap::new();
            attributes.insert(
                "id".to_string(),
                format!("{}{}-{}", prefix, note_type.as_str(), note_id),
            );
            writer.open("li", &attributes);
            let body = with_back_link(
                &note.body,
                format!("{}-ref-{}", note_type.as_str(), note_id),
            );
            self.render_block(&body, writer);
            writer.close("li");
        }
        writer.close("ol");
    }

    fn render_comment_appendix(&mut self, writer: &mut HtmlWriter) {
        let references = std::mem::take(&mut self.comment_references);
        if references.is_empty() {
            return;
        }
        let document = self.document;
        let prefix = self.options.id_prefix.clone();

        writer.open("dl", &BTreeMap::new());
        for (comment_id, label) in &references {
            let Some(comment) = document
                .comments
                .iter()
                .find(|comment| comment.comment_id == *comment_id)
            else {
                continue;
            };

            let mut attributes = BTreeMap::new();
            attributes.insert(
                "id".to_string(),
                format!("{}comment-{}", prefix, comment_id),
            );
            writer.open("dt", &attributes);
            writer.text(&format!("Comment {}", label));
            writer.close("dt");

            writer.open("dd", &BTreeMap::new());
            let body = with_back_link(&comment.body, format!("comment-ref-{}", comment_id));
            self.render_block(&body, writer);
            writer.close("dd");
        }
        writer.close("dl");
    }

    fn warn_unrecognised_style(
        &mut self,
        kind: &str,
        style_id: &Option<String>,
        style_name: &Option<String>,
    ) {
        let id = style_id.as_deref().unwrap_or("");
        let text = match style_name {
            Some(name) => format!(
                "Unrecognised {} style: '{}' (Style ID: {})",
                kind, name, id
            ),
            None => format!("Unrecognised {} style (Style ID: {})", kind, id),
        };
        self.push_warning(text);
    }

    fn push_warning(&mut self, text: String) {
        if self.emitted_warnings.insert(text.clone()) {
            self.messages.push(Message::warning(text));
        }
    }
}

/// Whether any descendant produces output, so formatting wrappers are not
/// emitted around nothing.
fn has_renderable_content(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Text { value } => !value.is_empty(),
        Node::Run(run) => has_renderable_content(&run.children),
        Node::Paragraph(paragraph) => has_renderable_content(&paragraph.children),
        Node::Hyperlink(_) => true,
        Node::Tab
        | Node::Break { .. }
        | Node::Image(_)
        | Node::Table(_)
        | Node::TableRow(_)
        | Node::TableCell(_)
        | Node::NoteReference { .. }
        | Node::CommentReference { .. }
        | Node::BookmarkStart { .. } => true,
    })
}

/// Append a back-arrow link to the last paragraph of a note or comment body.
fn with_back_link(body: &[Node], anchor: String) -> Vec<Node> {
    let link = Node::Hyperlink(Hyperlink {
        children: vec![Node::Run(Run {
            children: vec![Node::text("↑")],
            ..Default::default()
        })],
        href: None,
        anchor: Some(anchor),
        target_frame: None,
    });

    let mut body = body.to_vec();
    match body
        .iter_mut()
        .rev()
        .find_map(|node| match node {
            Node::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }) {
        Some(paragraph) => {
            paragraph.children.push(Node::text(" "));
            paragraph.children.push(link);
        }
        None => {
            body.push(Node::Paragraph(Paragraph {
                children: vec![link],
                ..Default::default()
            }));
        }
    }
    body
}

fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img")
}
