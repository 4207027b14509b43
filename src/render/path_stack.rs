//! Output element stack with collapsing and lazy writing.
//!
//! Successive nodes that map to compatible paths share output elements
//! instead of reopening them (list items of one list share a single `ul`).
//! Frames are not written until actual content arrives, so an element that
//! maps to output but produces nothing vanishes entirely.

use crate::render::writer::Writer;
use crate::stylemap::PathSegment;
use std::collections::BTreeMap;

#[derive(Debug)]
struct Frame {
    tag: String,
    attributes: BTreeMap<String, String>,
    written: bool,
}

/// The stack of currently open (or pending) output elements.
#[derive(Debug, Default)]
pub struct PathStack {
    frames: Vec<Frame>,
}

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the open elements match the given path.
    ///
    /// The longest prefix of compatible non-fresh segments is kept; frames
    /// beyond it are closed and the remainder is pushed unwritten. A
    /// collapsed final segment with a separator emits the separator once
    /// content arrives again.
    pub fn satisfy(&mut self, path: &[PathSegment], writer: &mut dyn Writer) {
        let mut keep = 0;
        while keep < path.len() && keep < self.frames.len() {
            let segment = &path[keep];
            let frame = &self.frames[keep];
            if segment.fresh
                || !segment.tag_names.iter().any(|t| *t == frame.tag)
                || segment.attributes != frame.attributes
            {
                break;
            }
            keep += 1;
        }

        self.close_to(keep, writer);

        if keep == path.len() && keep > 0 {
            let segment = &path[keep - 1];
            if let Some(separator) = &segment.separator {
                if self.frames[keep - 1].written {
                    writer.append(separator);
                }
            }
        }

        for segment in &path[keep..] {
            self.frames.push(Frame {
                tag: segment.tag().to_string(),
                attributes: segment.attributes.clone(),
                written: false,
            });
        }
    }

    /// Write any frames that are still pending, outermost first.
    pub fn write_pending(&mut self, writer: &mut dyn Writer) {
        for frame in &mut self.frames {
            if !frame.written {
                writer.open(&frame.tag, &frame.attributes);
                frame.written = true;
            }
        }
    }

    /// Close frames above the given depth. Pending frames disappear without
    /// output.
    pub fn close_to(&mut self, depth: usize, writer: &mut dyn Writer) {
        while self.frames.len() > depth {
            let Some(frame) = self.frames.pop() else { break };
            if frame.written {
                writer.close(&frame.tag);
            }
        }
    }

    /// Close every open element.
    pub fn close_all(&mut self, writer: &mut dyn Writer) {
        self.close_to(0, writer);
    }
}
