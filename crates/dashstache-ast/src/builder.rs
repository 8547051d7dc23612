//! Stack machine that turns the scanned tag sequence into a [`TagTree`].
//!
//! The builder owns its own stack of open sections, so every parse starts
//! from a clean state. Close tags are not matched by name: a close always
//! ends the innermost open section.

use crate::token::{RawTag, Sigil};
use crate::{TagId, TagKind, TagNode, TagTree};

/// Builds a tag tree from raw tags in document order.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: TagTree,
    open: Vec<TagId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            tree: TagTree::new(),
            open: Vec::new(),
        }
    }

    /// Build a tree from a complete tag sequence.
    pub fn build(tags: impl IntoIterator<Item = RawTag>) -> TagTree {
        let mut builder = Self::new();
        for tag in tags {
            builder.push(tag);
        }
        builder.finish()
    }

    /// The node new tags are currently attached to.
    fn current(&self) -> TagId {
        self.open.last().copied().unwrap_or(TagId::ROOT)
    }

    /// Consume one raw tag.
    pub fn push(&mut self, tag: RawTag) {
        let parts = tag.parts();
        let kind = match parts.sigil {
            Some(Sigil::Section) => TagKind::SectionOpen,
            Some(Sigil::Inverted) => TagKind::InvertedOpen,
            Some(Sigil::Close) => TagKind::Close,
            None => TagKind::Variable,
        };
        let node = TagNode::new(parts.name, tag.position, tag.width(), kind, parts.raw);

        match kind {
            TagKind::SectionOpen | TagKind::InvertedOpen => {
                let id = self.tree.attach(self.current(), node);
                self.open.push(id);
            }
            TagKind::Close => {
                if self.open.pop().is_none() {
                    tracing::debug!(name = %node.name, position = %node.position, "close tag with no open section");
                }
                self.tree.attach(self.current(), node);
            }
            TagKind::Variable | TagKind::Root => {
                self.tree.attach(self.current(), node);
            }
        }
    }

    /// Number of sections still open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn finish(self) -> TagTree {
        if !self.open.is_empty() {
            tracing::debug!(
                unclosed = self.open.len(),
                "sections left open at end of template"
            );
        }
        self.tree
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan;
    use pretty_assertions::assert_eq;

    fn shape(tree: &TagTree, id: TagId) -> String {
        let node = &tree[id];
        let children: Vec<String> = node.children().iter().map(|&c| shape(tree, c)).collect();
        let label = match node.kind {
            TagKind::Root => "root".to_string(),
            TagKind::Variable => node.name.clone(),
            TagKind::SectionOpen => format!("#{}", node.name),
            TagKind::InvertedOpen => format!("^{}", node.name),
            TagKind::Close => format!("/{}", node.name),
        };
        if children.is_empty() {
            label
        } else {
            format!("{label}[{}]", children.join(" "))
        }
    }

    fn build(source: &str) -> TagTree {
        TreeBuilder::build(scan(source))
    }

    #[test]
    fn test_flat_variables() {
        let tree = build("{{a}} and {{b}}");
        assert_eq!(shape(&tree, TagId::ROOT), "root[a b]");
    }

    #[test]
    fn test_close_is_sibling_of_open() {
        let tree = build("{{#items}}{{name}}{{/items}}{{after}}");
        assert_eq!(shape(&tree, TagId::ROOT), "root[#items[name] /items after]");
    }

    #[test]
    fn test_nested_sections() {
        let tree = build("{{#a}}{{^b}}{{x}}{{/b}}{{y}}{{/a}}");
        assert_eq!(shape(&tree, TagId::ROOT), "root[#a[^b[x] /b y] /a]");
    }

    #[test]
    fn test_mismatched_close_closes_innermost() {
        let tree = build("{{#a}}{{#b}}{{/a}}{{x}}{{/b}}");
        assert_eq!(shape(&tree, TagId::ROOT), "root[#a[#b /a x] /b]");
    }

    #[test]
    fn test_unclosed_section_stays_open() {
        let mut builder = TreeBuilder::new();
        for tag in scan("{{#a}}{{x}}") {
            builder.push(tag);
        }
        assert_eq!(builder.depth(), 1);
        let tree = builder.finish();
        assert_eq!(shape(&tree, TagId::ROOT), "root[#a[x]]");
    }

    #[test]
    fn test_stray_close_attaches_to_root() {
        let tree = build("{{/a}}{{x}}");
        assert_eq!(shape(&tree, TagId::ROOT), "root[/a x]");
    }

    #[test]
    fn test_raw_flag_and_parents() {
        let tree = build("{{#s}}{{{html}}}{{/s}}");
        let section = tree.root().children()[0];
        let html = tree[section].children()[0];
        assert!(tree[html].raw);
        assert_eq!(tree.parent(html), Some(section));
        assert_eq!(tree.parent(section), Some(TagId::ROOT));
        assert_eq!(tree.parent(TagId::ROOT), None);
    }
}
