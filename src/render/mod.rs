//! HTML rendering stage.

pub mod html;
pub mod options;
pub mod path_stack;
pub mod writer;

pub use html::to_html;
pub use options::RenderOptions;
pub use path_stack::PathStack;
pub use writer::{HtmlWriter, Writer};
