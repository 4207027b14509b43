//! Rendering options.

use crate::stylemap::StyleRule;

/// Options for HTML generation, built with chained setters.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Prefix for generated element IDs (bookmarks, note anchors), so that
    /// several converted documents can share a page
    pub id_prefix: String,
    /// Drop paragraphs that produce no content
    pub ignore_empty_paragraphs: bool,
    /// Extra style rules, consulted before the defaults
    pub style_rules: Vec<StyleRule>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            id_prefix: String::new(),
            ignore_empty_paragraphs: true,
            style_rules: Vec::new(),
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    pub fn ignore_empty_paragraphs(mut self, ignore: bool) -> Self {
        self.ignore_empty_paragraphs = ignore;
        self
    }

    pub fn style_rules(mut self, rules: Vec<StyleRule>) -> Self {
        self.style_rules = rules;
        self
    }
}
