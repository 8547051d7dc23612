//! Tag scanner and tag tree for dashstache templates.
//!
//! A template is plain text with mustache-style tags:
//!
//! - `{{name}}` / `{{{name}}}` - escaped / raw variable
//! - `{{#name}}` ... `{{/name}}` - section
//! - `{{^name}}` ... `{{/name}}` - inverted section
//!
//! The tree built here only records where tags are and how they nest.
//! The text between tags stays in the source and is stitched back in by
//! the renderer.

use std::fmt;
use std::ops::{Index, Range};

use thiserror::Error;

mod builder;
mod diagnostics;
mod scanner;
mod token;

pub use builder::TreeBuilder;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use scanner::{scan, scan_line};
pub use token::{RawTag, Sigil, TagParts};

// ============================================================================
// Position
// ============================================================================

/// Position in source text (0-indexed line, byte column within the line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The position `width` bytes further along the same line.
    pub fn advance(self, width: usize) -> Self {
        Self {
            line: self.line,
            column: self.column + width,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line + 1, self.column + 1)
    }
}

// ============================================================================
// Tag Tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Root,
    Variable,
    SectionOpen,
    InvertedOpen,
    Close,
}

impl TagKind {
    /// Whether this tag opens a section of either flavour.
    pub fn is_open(self) -> bool {
        matches!(self, TagKind::SectionOpen | TagKind::InvertedOpen)
    }

    /// Name used for this kind on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            TagKind::Root => "root",
            TagKind::Variable => "name",
            TagKind::SectionOpen => "contains",
            TagKind::InvertedOpen => "not",
            TagKind::Close => "end",
        }
    }
}

/// Index of a node inside its [`TagTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(usize);

impl TagId {
    pub const ROOT: TagId = TagId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// One tag occurrence, or the synthetic root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    /// Dotted identifier with delimiters and sigil stripped.
    pub name: String,
    pub position: Position,
    /// Byte width of the literal tag text.
    pub width: usize,
    pub kind: TagKind,
    /// Triple-brace (unescaped) tag.
    pub raw: bool,
    children: Vec<TagId>,
}

impl TagNode {
    pub fn new(
        name: impl Into<String>,
        position: Position,
        width: usize,
        kind: TagKind,
        raw: bool,
    ) -> Self {
        Self {
            name: name.into(),
            position,
            width,
            kind,
            raw,
            children: Vec::new(),
        }
    }

    fn root() -> Self {
        Self::new("root", Position::default(), 0, TagKind::Root, false)
    }

    pub fn children(&self) -> &[TagId] {
        &self.children
    }

    /// Position just past the literal tag text.
    pub fn end(&self) -> Position {
        self.position.advance(self.width)
    }

    /// Non-empty dot-separated segments of the name. `.` has none.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('.').filter(|s| !s.is_empty())
    }
}

/// Arena of tag nodes, owned top-down through `children`.
///
/// Parents are kept in a separate index table so nodes carry no back
/// references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTree {
    nodes: Vec<TagNode>,
    parents: Vec<Option<TagId>>,
}

impl TagTree {
    fn new() -> Self {
        Self {
            nodes: vec![TagNode::root()],
            parents: vec![None],
        }
    }

    fn attach(&mut self, parent: TagId, node: TagNode) -> TagId {
        let id = TagId(self.nodes.len());
        self.nodes.push(node);
        self.parents.push(Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> &TagNode {
        &self.nodes[TagId::ROOT.0]
    }

    pub fn get(&self, id: TagId) -> Option<&TagNode> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: TagId) -> Option<TagId> {
        self.parents.get(id.0).copied().flatten()
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// All nodes in document order, root first.
    pub fn iter(&self) -> impl Iterator<Item = &TagNode> {
        self.nodes.iter()
    }

    /// Names of the enclosing sections of `id`, outermost first.
    pub fn ancestor_names(&self, id: TagId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(parent) = cursor {
            if parent != TagId::ROOT {
                names.push(self.nodes[parent.0].name.as_str());
            }
            cursor = self.parent(parent);
        }
        names.reverse();
        names
    }

    /// Problems with section nesting. Empty for a well-formed template.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        diagnostics::check(self)
    }
}

impl Index<TagId> for TagTree {
    type Output = TagNode;

    fn index(&self, id: TagId) -> &TagNode {
        &self.nodes[id.0]
    }
}

// ============================================================================
// Template
// ============================================================================

/// Options for turning source text into a [`Template`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Reject templates whose sections are unbalanced instead of
    /// rendering them best-effort.
    pub strict: bool,
}

/// Source text together with its tag tree.
///
/// Built once per source and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    lines: Vec<Range<usize>>,
    tree: TagTree,
}

impl Template {
    /// Parse leniently. Never fails.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let tree = TreeBuilder::build(scan(&source));
        let lines = line_ranges(&source);
        Self {
            source,
            lines,
            tree,
        }
    }

    pub fn parse_with_options(
        source: impl Into<String>,
        options: ParseOptions,
    ) -> Result<Self, ParseError> {
        let template = Self::parse(source);
        let diagnostics = template.diagnostics();
        if let Some(first) = diagnostics.first() {
            if options.strict {
                return Err(ParseError::Unbalanced {
                    diagnostic: first.clone(),
                    count: diagnostics.len(),
                });
            }
            for diagnostic in &diagnostics {
                tracing::warn!(%diagnostic, "unbalanced section tag");
            }
        }
        Ok(template)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &TagTree {
        &self.tree
    }

    /// Number of source lines. An empty source has one empty line.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// A source line without its trailing `\n`.
    pub fn line(&self, index: usize) -> &str {
        self.lines
            .get(index)
            .map(|range| &self.source[range.clone()])
            .unwrap_or("")
    }

    /// Position just past the last character of the source.
    pub fn end(&self) -> Position {
        let last = self.lines.len().saturating_sub(1);
        Position::new(last, self.line(last).len())
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.tree.diagnostics()
    }
}

fn line_ranges(source: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            ranges.push(start..i);
            start = i + 1;
        }
    }
    ranges.push(start..source.len());
    ranges
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unbalanced sections ({count} problem(s)), first: {diagnostic}")]
    Unbalanced { diagnostic: Diagnostic, count: usize },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Unbalanced { diagnostic, .. } => diagnostic.position,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_simple_text() {
        let template = Template::parse("Hello, World!");
        assert!(template.tree().is_empty());
        assert_eq!(template.line_count(), 1);
        assert_eq!(template.end(), Position::new(0, 13));
    }

    #[test]
    fn parse_variable_with_position() {
        let template = Template::parse("Hello,\n  {{ user }} {{user.name}}!");
        let tree = template.tree();
        assert_eq!(tree.root().children().len(), 1);
        let node = &tree[tree.root().children()[0]];
        assert_eq!(node.name, "user.name");
        assert_eq!(node.kind, TagKind::Variable);
        assert_eq!(node.position, Position::new(1, 13));
        assert_eq!(node.end(), Position::new(1, 26));
        assert_eq!(node.segments().collect::<Vec<_>>(), vec!["user", "name"]);
    }

    #[test]
    fn dot_has_no_segments() {
        let template = Template::parse("{{.}}");
        let node = &template.tree()[template.tree().root().children()[0]];
        assert_eq!(node.segments().count(), 0);
    }

    #[test]
    fn lines_and_end() {
        let template = Template::parse("a\nbc\n");
        assert_eq!(template.line_count(), 3);
        assert_eq!(template.line(1), "bc");
        assert_eq!(template.line(2), "");
        assert_eq!(template.end(), Position::new(2, 0));
        assert_eq!(template.line(9), "");
    }

    #[test]
    fn ancestor_names_outermost_first() {
        let template = Template::parse("{{#a}}{{#b.c}}{{x}}{{/b.c}}{{/a}}");
        let tree = template.tree();
        let a = tree.root().children()[0];
        let b = tree[a].children()[0];
        let x = tree[b].children()[0];
        assert_eq!(tree.ancestor_names(x), vec!["a", "b.c"]);
    }

    #[test]
    fn strict_rejects_unbalanced() {
        let result = Template::parse_with_options("{{#a}}\n{{/b}}", ParseOptions { strict: true });
        match result {
            Err(err @ ParseError::Unbalanced { .. }) => {
                assert_eq!(err.position(), Position::new(1, 0));
            }
            other => panic!("expected unbalanced error, got {other:?}"),
        }
    }

    #[test]
    fn lenient_accepts_unbalanced() {
        let template =
            Template::parse_with_options("{{#a}}", ParseOptions::default()).unwrap();
        assert_eq!(template.diagnostics().len(), 1);
    }

    #[test]
    fn position_display_is_one_indexed() {
        assert_eq!(Position::new(0, 4).to_string(), "line 1, column 5");
    }
}
