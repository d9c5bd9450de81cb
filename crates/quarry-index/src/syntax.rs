//! Shared tree-sitter plumbing: checked parsing and pre-order traversal.

use tree_sitter::{Node, Parser, Tree};

use crate::error::{IndexError, Result};
use crate::languages::Lang;

const SNIPPET_CHARS: usize = 24;

/// Parse `source` and reject any tree containing ERROR or MISSING nodes or a
/// node kind the language no longer accepts.
pub(crate) fn parse(source: &str, lang: Lang) -> Result<Tree> {
    let grammar = lang.grammar().ok_or(IndexError::UnsupportedLanguage)?;

    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| IndexError::Other(format!("set_language failed: {e}")))?;

    let tree = parser.parse(source, None).ok_or_else(|| IndexError::Parse {
        line: 1,
        column: 1,
        message: "parser produced no tree".into(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(first_error(source, root));
    }
    if let Some(node) = first_invalid(root, lang.invalid_kinds()) {
        let pos = node.start_position();
        return Err(IndexError::Parse {
            line: pos.row + 1,
            column: pos.column + 1,
            message: format!("invalid syntax near `{}`", snippet(&node, source)),
        });
    }
    Ok(tree)
}

/// Visit every node under `root` (inclusive) in pre-order.
pub(crate) fn preorder<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

pub(crate) fn text<'s>(node: &Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

fn first_error(source: &str, root: Node<'_>) -> IndexError {
    let mut found: Option<Node<'_>> = None;
    preorder(root, |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            found = Some(node);
        }
    });

    let Some(node) = found else {
        return IndexError::Parse {
            line: 1,
            column: 1,
            message: "invalid syntax".into(),
        };
    };

    let pos = node.start_position();
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        format!("invalid syntax near `{}`", snippet(&node, source))
    };

    IndexError::Parse {
        line: pos.row + 1,
        column: pos.column + 1,
        message,
    }
}

fn first_invalid<'t>(root: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    if kinds.is_empty() {
        return None;
    }
    let mut found = None;
    preorder(root, |node| {
        if found.is_none() && kinds.contains(&node.kind()) {
            found = Some(node);
        }
    });
    found
}

fn snippet(node: &Node<'_>, source: &str) -> String {
    text(node, source)
        .chars()
        .take(SNIPPET_CHARS)
        .collect::<String>()
        .replace('\n', "\\n")
}
