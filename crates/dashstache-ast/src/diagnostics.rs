//! Structural checks on a built tag tree.
//!
//! The builder is lenient, so these checks never change the tree. They only
//! report what a strict reader of the template would object to.

use std::fmt;

use thiserror::Error;

use crate::{Position, TagKind, TagTree};

/// What is wrong with a section tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    #[error("'{{{{/{close}}}}}' closes section '{open}'")]
    MismatchedClose { open: String, close: String },

    #[error("section '{name}' is never closed")]
    Unclosed { name: String },

    #[error("'{{{{/{name}}}}}' has no open section")]
    StrayClose { name: String },
}

/// A structural problem found in a tag tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub position: Position,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)
    }
}

pub(crate) fn check(tree: &TagTree) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for node in tree.iter() {
        let siblings = node.children();
        for (i, &id) in siblings.iter().enumerate() {
            let child = &tree[id];
            match child.kind {
                TagKind::SectionOpen | TagKind::InvertedOpen => {
                    match siblings.get(i + 1).map(|&next| &tree[next]) {
                        Some(close) if close.kind == TagKind::Close => {
                            if close.name != child.name {
                                diagnostics.push(Diagnostic {
                                    kind: DiagnosticKind::MismatchedClose {
                                        open: child.name.clone(),
                                        close: close.name.clone(),
                                    },
                                    position: close.position,
                                });
                            }
                        }
                        _ => diagnostics.push(Diagnostic {
                            kind: DiagnosticKind::Unclosed {
                                name: child.name.clone(),
                            },
                            position: child.position,
                        }),
                    }
                }
                TagKind::Close => {
                    let opened = i
                        .checked_sub(1)
                        .map(|prev| tree[siblings[prev]].kind.is_open())
                        .unwrap_or(false);
                    if !opened {
                        diagnostics.push(Diagnostic {
                            kind: DiagnosticKind::StrayClose {
                                name: child.name.clone(),
                            },
                            position: child.position,
                        });
                    }
                }
                TagKind::Variable | TagKind::Root => {}
            }
        }
    }

    diagnostics.sort_by_key(|d| d.position);
    diagnostics
}
