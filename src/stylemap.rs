//! Style-mapping rules: which HTML a document element turns into.
//!
//! A style map is an ordered list of rules; the first rule whose matcher
//! accepts an element decides its HTML path. User-supplied rules are
//! consulted before the built-in defaults, so callers override behaviour by
//! prepending rules rather than editing the defaults.

use crate::model::{BreakKind, Paragraph, Run, Table};
use std::collections::BTreeMap;

/// How a style name constraint is compared. Comparisons are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleNameMatcher {
    Exact(String),
    Prefix(String),
}

impl StyleNameMatcher {
    fn matches(&self, name: &str) -> bool {
        match self {
            StyleNameMatcher::Exact(expected) => name.eq_ignore_ascii_case(expected),
            StyleNameMatcher::Prefix(prefix) => {
                name.len() >= prefix.len() && name[..prefix.len()].eq_ignore_ascii_case(prefix)
            }
        }
    }
}

/// List constraint on a paragraph matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMatcher {
    pub is_ordered: bool,
    pub level_index: u8,
}

/// What a rule matches against.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementMatcher {
    Paragraph {
        style_id: Option<String>,
        style_name: Option<StyleNameMatcher>,
        list: Option<ListMatcher>,
    },
    Run {
        style_id: Option<String>,
        style_name: Option<StyleNameMatcher>,
    },
    Table {
        style_id: Option<String>,
        style_name: Option<StyleNameMatcher>,
    },
    Bold,
    Italic,
    Underline,
    Strikethrough,
    AllCaps,
    SmallCaps,
    /// `None` matches any highlight colour
    Highlight(Option<String>),
    Break(BreakKind),
    CommentReference,
}

impl ElementMatcher {
    /// Shorthand for an unconstrained paragraph matcher.
    pub fn any_paragraph() -> Self {
        ElementMatcher::Paragraph {
            style_id: None,
            style_name: None,
            list: None,
        }
    }

    /// Shorthand for an unconstrained run matcher.
    pub fn any_run() -> Self {
        ElementMatcher::Run {
            style_id: None,
            style_name: None,
        }
    }

    /// Paragraph matcher constrained by style name.
    pub fn paragraph_named(matcher: StyleNameMatcher) -> Self {
        ElementMatcher::Paragraph {
            style_id: None,
            style_name: Some(matcher),
            list: None,
        }
    }

    /// Paragraph matcher constrained by style ID.
    pub fn paragraph_with_id(style_id: impl Into<String>) -> Self {
        ElementMatcher::Paragraph {
            style_id: Some(style_id.into()),
            style_name: None,
            list: None,
        }
    }

    /// Paragraph matcher for a list level.
    pub fn list_paragraph(is_ordered: bool, level_index: u8) -> Self {
        ElementMatcher::Paragraph {
            style_id: None,
            style_name: None,
            list: Some(ListMatcher {
                is_ordered,
                level_index,
            }),
        }
    }

    /// Whether the matcher names a specific style. Used to decide when an
    /// element's style went unrecognised.
    pub fn constrains_style(&self) -> bool {
        match self {
            ElementMatcher::Paragraph {
                style_id,
                style_name,
                list,
            } => style_id.is_some() || style_name.is_some() || list.is_some(),
            ElementMatcher::Run {
                style_id,
                style_name,
            }
            | ElementMatcher::Table {
                style_id,
                style_name,
            } => style_id.is_some() || style_name.is_some(),
            _ => false,
        }
    }

    fn matches_paragraph(&self, paragraph: &Paragraph) -> bool {
        let ElementMatcher::Paragraph {
            style_id,
            style_name,
            list,
        } = self
        else {
            return false;
        };
        if let Some(expected) = style_id {
            if paragraph.style_id.as_deref() != Some(expected.as_str()) {
                return false;
            }
        }
        if let Some(matcher) = style_name {
            match &paragraph.style_name {
                Some(name) if matcher.matches(name) => {}
                _ => return false,
            }
        }
        if let Some(expected) = list {
            match &paragraph.numbering {
                Some(level)
                    if level.is_ordered == expected.is_ordered
                        && level.level_index == expected.level_index => {}
                _ => return false,
            }
        }
        true
    }

    fn matches_run(&self, run: &Run) -> bool {
        let ElementMatcher::Run {
            style_id,
            style_name,
        } = self
        else {
            return false;
        };
        if let Some(expected) = style_id {
            if run.style_id.as_deref() != Some(expected.as_str()) {
                return false;
            }
        }
        if let Some(matcher) = style_name {
            match &run.style_name {
                Some(name) if matcher.matches(name) => {}
                _ => return false,
            }
        }
        true
    }

    fn matches_table(&self, table: &Table) -> bool {
        let ElementMatcher::Table {
            style_id,
            style_name,
        } = self
        else {
            return false;
        };
        if let Some(expected) = style_id {
            if table.style_id.as_deref() != Some(expected.as_str()) {
                return false;
            }
        }
        if let Some(matcher) = style_name {
            match &table.style_name {
                Some(name) if matcher.matches(name) => {}
                _ => return false,
            }
        }
        true
    }
}

/// One output element in an HTML path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    /// Acceptable tag names; the first one is written. Extra names let a
    /// segment collapse with an already-open sibling list of either kind.
    pub tag_names: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    /// Fresh segments never collapse with an open element
    pub fresh: bool,
    /// Text written between successive collapses into this element
    pub separator: Option<String>,
}

impl PathSegment {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag_names: vec![tag.into()],
            attributes: BTreeMap::new(),
            fresh: false,
            separator: None,
        }
    }

    pub fn fresh(tag: impl Into<String>) -> Self {
        Self {
            fresh: true,
            ..Self::new(tag)
        }
    }

    /// Allow an additional tag name to collapse into.
    pub fn or_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_names.push(tag.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// The tag actually written for this segment.
    pub fn tag(&self) -> &str {
        &self.tag_names[0]
    }
}

/// The sequence of nested elements an AST node maps to. An empty path means
/// the node matched but produces no wrapper (its content still renders).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HtmlPath {
    pub segments: Vec<PathSegment>,
}

impl HtmlPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// A path that strips the element's own output.
    pub fn stripped() -> Self {
        Self::default()
    }

    /// A single-element path.
    pub fn single(segment: PathSegment) -> Self {
        Self {
            segments: vec![segment],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A matcher paired with the path it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub matcher: ElementMatcher,
    pub path: HtmlPath,
}

impl StyleRule {
    pub fn new(matcher: ElementMatcher, path: HtmlPath) -> Self {
        Self { matcher, path }
    }
}

/// Ordered rule list with built-in defaults.
#[derive(Debug, Clone)]
pub struct StyleMap {
    rules: Vec<StyleRule>,
}

impl Default for StyleMap {
    fn default() -> Self {
        Self::with_rules(Vec::new())
    }
}

impl StyleMap {
    /// Build a style map from user rules followed by the defaults.
    pub fn with_rules(user_rules: Vec<StyleRule>) -> Self {
        let mut rules = user_rules;
        rules.extend(default_rules());
        Self { rules }
    }

    /// First rule matching a paragraph.
    pub fn paragraph_rule(&self, paragraph: &Paragraph) -> Option<&StyleRule> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches_paragraph(paragraph))
    }

    /// First rule matching a run.
    pub fn run_rule(&self, run: &Run) -> Option<&StyleRule> {
        self.rules.iter().find(|rule| rule.matcher.matches_run(run))
    }

    /// First rule matching a table.
    pub fn table_rule(&self, table: &Table) -> Option<&StyleRule> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches_table(table))
    }

    pub fn bold_path(&self) -> Option<&HtmlPath> {
        self.flag_path(|m| matches!(m, ElementMatcher::Bold))
    }

    pub fn italic_path(&self) -> Option<&HtmlPath> {
        self.flag_path(|m| matches!(m, ElementMatcher::Italic))
    }

    pub fn underline_path(&self) -> Option<&HtmlPath> {
        self.flag_path(|m| matches!(m, ElementMatcher::Underline))
    }

    pub fn strikethrough_path(&self) -> Option<&HtmlPath> {
        self.flag_path(|m| matches!(m, ElementMatcher::Strikethrough))
    }

    pub fn all_caps_path(&self) -> Option<&HtmlPath> {
        self.flag_path(|m| matches!(m, ElementMatcher::AllCaps))
    }

    pub fn small_caps_path(&self) -> Option<&HtmlPath> {
        self.flag_path(|m| matches!(m, ElementMatcher::SmallCaps))
    }

    /// First rule matching a highlight of the given colour.
    pub fn highlight_path(&self, color: &str) -> Option<&HtmlPath> {
        self.flag_path(|m| match m {
            ElementMatcher::Highlight(None) => true,
            ElementMatcher::Highlight(Some(expected)) => expected.eq_ignore_ascii_case(color),
            _ => false,
        })
    }

    pub fn break_path(&self, kind: BreakKind) -> Option<&HtmlPath> {
        self.flag_path(|m| matches!(m, ElementMatcher::Break(k) if *k == kind))
    }

    pub fn comment_reference_path(&self) -> Option<&HtmlPath> {
        self.flag_path(|m| matches!(m, ElementMatcher::CommentReference))
    }

    fn flag_path(&self, predicate: impl Fn(&ElementMatcher) -> bool) -> Option<&HtmlPath> {
        self.rules
            .iter()
            .find(|rule| predicate(&rule.matcher))
            .map(|rule| &rule.path)
    }
}

/// The built-in rules, mirroring Word's common built-in styles.
fn default_rules() -> Vec<StyleRule> {
    let mut rules = Vec::new();

    for (name, tag) in [
        ("Heading 1", "h1"),
        ("Heading 2", "h2"),
        ("Heading 3", "h3"),
        ("Heading 4", "h4"),
        ("Heading 5", "h5"),
        ("Heading 6", "h6"),
        ("Title", "h1"),
        ("Subtitle", "h2"),
    ] {
        rules.push(StyleRule::new(
            ElementMatcher::paragraph_named(StyleNameMatcher::Exact(name.to_string())),
            HtmlPath::single(PathSegment::fresh(tag)),
        ));
    }

    for level in 0..=8u8 {
        for is_ordered in [false, true] {
            rules.push(StyleRule::new(
                ElementMatcher::list_paragraph(is_ordered, level),
                list_path(is_ordered, level),
            ));
        }
    }

    rules.push(StyleRule::new(
        ElementMatcher::any_paragraph(),
        HtmlPath::single(PathSegment::fresh("p")),
    ));
    rules.push(StyleRule::new(
        ElementMatcher::any_run(),
        HtmlPath::stripped(),
    ));
    rules.push(StyleRule::new(
        ElementMatcher::Bold,
        HtmlPath::single(PathSegment::new("strong")),
    ));
    rules.push(StyleRule::new(
        ElementMatcher::Italic,
        HtmlPath::single(PathSegment::new("em")),
    ));
    rules.push(StyleRule::new(
        ElementMatcher::Strikethrough,
        HtmlPath::single(PathSegment::new("s")),
    ));
    rules.push(StyleRule::new(
        ElementMatcher::Break(BreakKind::Line),
        HtmlPath::single(PathSegment::fresh("br")),
    ));
    rules.push(StyleRule::new(
        ElementMatcher::CommentReference,
        HtmlPath::stripped(),
    ));

    rules
}

/// Nested list path for a numbering level. Ancestor list elements accept
/// either list kind so mixed nesting collapses correctly.
fn list_path(is_ordered: bool, level_index: u8) -> HtmlPath {
    let mut segments = Vec::new();
    for _ in 0..level_index {
        segments.push(PathSegment::new("ul").or_tag("ol"));
        segments.push(PathSegment::new("li"));
    }
    segments.push(PathSegment::new(if is_ordered { "ol" } else { "ul" }));
    segments.push(PathSegment::fresh("li"));
    HtmlPath::new(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NumberingLevel;

    fn named_paragraph(name: &str) -> Paragraph {
        Paragraph {
            style_id: Some(name.replace(' ', "")),
            style_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_heading_maps_to_fresh_h1() {
        let map = StyleMap::default();
        let rule = map.paragraph_rule(&named_paragraph("Heading 1")).unwrap();
        assert_eq!(rule.path.segments.len(), 1);
        assert_eq!(rule.path.segments[0].tag(), "h1");
        assert!(rule.path.segments[0].fresh);
    }

    #[test]
    fn test_style_name_matching_is_case_insensitive() {
        let map = StyleMap::default();
        let rule = map.paragraph_rule(&named_paragraph("HEADING 2")).unwrap();
        assert_eq!(rule.path.segments[0].tag(), "h2");
    }

    #[test]
    fn test_prefix_matcher() {
        let matcher = StyleNameMatcher::Prefix("Heading".to_string());
        assert!(matcher.matches("Heading 3"));
        assert!(matcher.matches("heading 9"));
        assert!(!matcher.matches("Head"));
    }

    #[test]
    fn test_plain_paragraph_falls_through_to_p() {
        let map = StyleMap::default();
        let rule = map.paragraph_rule(&Paragraph::default()).unwrap();
        assert_eq!(rule.path.segments[0].tag(), "p");
        assert!(!rule.matcher.constrains_style());
    }

    #[test]
    fn test_user_rules_win_over_defaults() {
        let map = StyleMap::with_rules(vec![StyleRule::new(
            ElementMatcher::paragraph_named(StyleNameMatcher::Exact("Heading 1".to_string())),
            HtmlPath::single(PathSegment::fresh("h2").attribute("class", "main-title")),
        )]);
        let rule = map.paragraph_rule(&named_paragraph("Heading 1")).unwrap();
        assert_eq!(rule.path.segments[0].tag(), "h2");
        assert_eq!(
            rule.path.segments[0].attributes.get("class").map(String::as_str),
            Some("main-title")
        );
    }

    #[test]
    fn test_list_paragraph_path() {
        let map = StyleMap::default();
        let paragraph = Paragraph {
            numbering: Some(NumberingLevel {
                num_id: "1".to_string(),
                level_index: 1,
                is_ordered: true,
                start_override: None,
                paragraph_style_id: None,
            }),
            ..Default::default()
        };
        let rule = map.paragraph_rule(&paragraph).unwrap();
        let tags: Vec<_> = rule.path.segments.iter().map(|s| s.tag()).collect();
        assert_eq!(tags, vec!["ul", "li", "ol", "li"]);
        // Ancestor list elements accept both kinds
        assert_eq!(rule.path.segments[0].tag_names, vec!["ul", "ol"]);
        // Only the item itself is fresh
        let fresh: Vec<_> = rule.path.segments.iter().map(|s| s.fresh).collect();
        assert_eq!(fresh, vec![false, false, false, true]);
    }

    #[test]
    fn test_run_default_is_unwrapped() {
        let map = StyleMap::default();
        let rule = map.run_rule(&Run::default()).unwrap();
        assert!(rule.path.is_empty());
    }

    #[test]
    fn test_flag_defaults() {
        let map = StyleMap::default();
        assert_eq!(map.bold_path().unwrap().segments[0].tag(), "strong");
        assert_eq!(map.italic_path().unwrap().segments[0].tag(), "em");
        assert_eq!(map.strikethrough_path().unwrap().segments[0].tag(), "s");
        assert!(map.underline_path().is_none());
        assert!(map.break_path(BreakKind::Page).is_none());
        assert_eq!(
            map.break_path(BreakKind::Line).unwrap().segments[0].tag(),
            "br"
        );
        assert!(map.comment_reference_path().unwrap().is_empty());
    }

    #[test]
    fn test_highlight_color_match() {
        let map = StyleMap::with_rules(vec![
            StyleRule::new(
                ElementMatcher::Highlight(Some("yellow".to_string())),
                HtmlPath::single(PathSegment::new("mark")),
            ),
        ]);
        assert!(map.highlight_path("yellow").is_some());
        assert!(map.highlight_path("YELLOW").is_some());
        assert!(map.highlight_path("green").is_none());
    }

    #[test]
    fn test_style_id_match() {
        let map = StyleMap::with_rules(vec![StyleRule::new(
            ElementMatcher::paragraph_with_id("Quote"),
            HtmlPath::single(PathSegment::fresh("blockquote")),
        )]);
        let paragraph = Paragraph {
            style_id: Some("Quote".to_string()),
            ..Default::default()
        };
        let rule = map.paragraph_rule(&paragraph).unwrap();
        assert_eq!(rule.path.segments[0].tag(), "blockquote");
    }
}
