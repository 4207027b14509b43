//! Document AST produced by the reading stage.
//!
//! The tree is built once per document and is read-only during rendering.

mod document;
mod node;

pub use document::{Comment, Document, Note, NoteType, Notes};
pub use node::{
    BreakKind, Hyperlink, Image, Indent, Node, NumberingLevel, Paragraph, Run, Table, TableCell,
    TableRow, VerticalAlignment,
};

pub(crate) use node::CellMerge;
