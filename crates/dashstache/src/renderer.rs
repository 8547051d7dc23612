//! Content-chunk renderer.
//!
//! The tag tree only records where tags sit in the source. Rendering walks
//! the tree in document order with a cursor into the source, copying the
//! text between tags verbatim and replacing each tag with its content.
//! A section body is the source text between the opening tag and its
//! paired close; it is walked once per iteration.

use dashstache_ast::{Position, TagId, TagKind, TagNode, Template};

use crate::html_escape;
use crate::options::RenderOptions;
use crate::resolver::{resolve, Resolution, ResolveError};
use crate::store::{DataStore, ResolvedPath};
use crate::value::Value;

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendered {
    lines: Vec<OutputLine>,
    line_numbers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OutputLine {
    source_line: usize,
    text: String,
}

impl Rendered {
    fn new(line_numbers: bool) -> Self {
        Self {
            lines: vec![OutputLine {
                source_line: 0,
                text: String::new(),
            }],
            line_numbers,
        }
    }

    fn push_str(&mut self, s: &str) {
        if let Some(line) = self.lines.last_mut() {
            line.text.push_str(s);
        }
    }

    fn new_line(&mut self, source_line: usize) {
        self.lines.push(OutputLine {
            source_line,
            text: String::new(),
        });
    }

    /// Output lines, each prefixed with its source line number when that
    /// option is on.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| {
                if self.line_numbers {
                    format!("{} | {}", line.source_line, line.text)
                } else {
                    line.text.clone()
                }
            })
            .collect()
    }

    /// All output lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

/// Renders one template against one store snapshot.
pub struct Renderer<'a> {
    template: &'a Template,
    store: &'a DataStore,
    options: &'a RenderOptions,
    output: Rendered,
}

impl<'a> Renderer<'a> {
    pub fn new(template: &'a Template, store: &'a DataStore, options: &'a RenderOptions) -> Self {
        Self {
            template,
            store,
            options,
            output: Rendered::new(options.line_numbers),
        }
    }

    /// Render the whole template.
    pub fn render(mut self) -> Rendered {
        let tree = self.template.tree();
        let end = self.template.end();
        let consumed = self.render_chunk(
            tree.root().children(),
            Position::default(),
            end,
            &ResolvedPath::root(),
        );
        debug_assert_eq!(consumed, end);
        self.output
    }

    /// Render `children` starting at `cursor` and copy source text up to
    /// `boundary`. Returns the position consumed to, which is `boundary`.
    fn render_chunk(
        &mut self,
        children: &[TagId],
        mut cursor: Position,
        boundary: Position,
        scope: &ResolvedPath,
    ) -> Position {
        let tree = self.template.tree();

        for (i, &id) in children.iter().enumerate() {
            let node = &tree[id];
            if node.position >= boundary {
                break;
            }
            self.copy_source(cursor, node.position);

            cursor = match node.kind {
                TagKind::Variable => {
                    let text = self.variable_text(node, scope);
                    self.output.push_str(&text);
                    node.end()
                }
                TagKind::SectionOpen | TagKind::InvertedOpen => {
                    let body_end = children
                        .get(i + 1)
                        .map(|&next| &tree[next])
                        .filter(|next| next.kind == TagKind::Close)
                        .map_or(boundary, |close| close.position);
                    self.render_section(id, scope, body_end);
                    body_end
                }
                TagKind::Close => node.end(),
                TagKind::Root => cursor,
            };
        }

        self.copy_source(cursor, boundary);
        boundary
    }

    fn render_section(&mut self, id: TagId, scope: &ResolvedPath, body_end: Position) {
        let tree = self.template.tree();
        let node = &tree[id];
        let resolution = resolve(self.store, scope, &node.name);
        let count = match &resolution {
            Ok(resolution) => resolution.iteration_count(),
            Err(_) => 0,
        };

        match node.kind {
            TagKind::SectionOpen => {
                let Ok(resolution) = resolution else {
                    tracing::debug!(name = %node.name, %scope, "section path not found");
                    return;
                };
                let is_list = matches!(&resolution, Resolution::Found { value, .. } if value.is_list());
                let base = resolution.path();
                tracing::trace!(name = %node.name, path = %base, count, "expanding section");
                for c in 0..count {
                    let inner = if is_list { base.with_index(c) } else { base.clone() };
                    self.render_chunk(node.children(), node.end(), body_end, &inner);
                }
            }
            TagKind::InvertedOpen => {
                if count == 0 {
                    let inner = match &resolution {
                        Ok(resolution) => resolution.path().clone(),
                        Err(_) => scope.clone(),
                    };
                    self.render_chunk(node.children(), node.end(), body_end, &inner);
                }
            }
            TagKind::Root | TagKind::Variable | TagKind::Close => {}
        }
    }

    fn variable_text(&self, node: &TagNode, scope: &ResolvedPath) -> String {
        match resolve(self.store, scope, &node.name) {
            Ok(Resolution::Found {
                value: Value::Scalar(s),
                ..
            }) => {
                if self.options.escape_html && !node.raw {
                    html_escape::escape(s).into_owned()
                } else {
                    s.clone()
                }
            }
            Ok(Resolution::Found { path, value }) => {
                tracing::debug!(name = %node.name, %path, kind = value.type_name(), "variable is not a scalar");
                self.options.placeholder.clone()
            }
            Ok(Resolution::PathLiteral(path)) => path.to_string(),
            Err(ResolveError::NotFound { name, scope }) => {
                tracing::debug!(%name, %scope, position = %node.position, "variable not found");
                self.options.placeholder.clone()
            }
        }
    }

    /// Copy source text in `[from, to)` to the output.
    fn copy_source(&mut self, from: Position, to: Position) {
        if to <= from {
            return;
        }
        for line_no in from.line..=to.line {
            let line = self.template.line(line_no);
            if line_no != from.line {
                self.output.new_line(line_no);
            }
            let start = if line_no == from.line { from.column } else { 0 };
            let end = if line_no == to.line { to.column } else { line.len() };
            self.output.push_str(line.get(start..end).unwrap_or(""));
        }
    }
}

/// Render `template` against `store`.
pub fn render(template: &Template, store: &DataStore, options: &RenderOptions) -> Rendered {
    Renderer::new(template, store, options).render()
}
