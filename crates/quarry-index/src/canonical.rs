//! Comment and docstring removal producing the canonical source form.
//!
//! Canonical text is what every later stage sees: artifacts are sliced out of
//! it and the whole text is embedded as the `cleaned_code` record.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::error::Result;
use crate::languages::Lang;
use crate::syntax;

static LINE_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#[^\n]*").unwrap());

/// How line comments are located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentMode {
    /// Remove `comment` tokens found by the tokenizer. Comment markers inside
    /// string literals are preserved.
    #[default]
    Syntax,
    /// Remove every `#` to end of line with a regex before parsing, string
    /// literals included. Kept for byte-compatibility with older indexes.
    Pattern,
}

impl CommentMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Pattern => "pattern",
        }
    }
}

impl fmt::Display for CommentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source text with comments and function docstrings removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CanonicalText(String);

impl CanonicalText {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for CanonicalText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer {
    lang: Lang,
    comment_mode: CommentMode,
}

struct Edit {
    range: Range<usize>,
    replacement: &'static str,
}

impl Canonicalizer {
    #[must_use]
    pub fn new(lang: Lang, comment_mode: CommentMode) -> Self {
        Self { lang, comment_mode }
    }

    #[must_use]
    pub fn lang(&self) -> Lang {
        self.lang
    }

    #[must_use]
    pub fn comment_mode(&self) -> CommentMode {
        self.comment_mode
    }

    /// Strip comments and function docstrings, then normalize layout.
    ///
    /// Canonicalizing canonical text returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Parse` if `raw` (or, in pattern mode, `raw` after
    /// the regex pass) is not valid source.
    pub fn canonicalize(&self, raw: &str) -> Result<CanonicalText> {
        let source: Cow<'_, str> = match self.comment_mode {
            CommentMode::Pattern => LINE_COMMENT_RE.replace_all(raw, ""),
            CommentMode::Syntax => Cow::Borrowed(raw),
        };

        let tree = syntax::parse(&source, self.lang)?;
        let mut edits = Vec::new();
        syntax::preorder(tree.root_node(), |node| {
            if node.kind() == self.lang.comment_kind() {
                edits.push(Edit {
                    range: node.byte_range(),
                    replacement: "",
                });
            } else if self.lang.function_kinds().contains(&node.kind())
                && let Some(edit) = docstring_edit(node, &source, self.lang)
            {
                edits.push(edit);
            }
        });

        let edited = apply_edits(&source, edits);
        let tree = syntax::parse(&edited, self.lang)?;
        let protected = multiline_strings(tree.root_node(), self.lang);
        let rendered = render(&edited, &protected);

        syntax::parse(&rendered, self.lang)?;
        Ok(CanonicalText(rendered))
    }
}

/// Edit removing the leading run of docstrings from a function body.
///
/// The run is cut up to the start of the next statement so the following
/// statement inherits the docstring's indentation. A body that held only
/// docstrings becomes `pass`.
fn docstring_edit(function: Node<'_>, source: &str, lang: Lang) -> Option<Edit> {
    let body = function.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let statements: Vec<Node<'_>> = body
        .named_children(&mut cursor)
        .filter(|n| n.kind() != lang.comment_kind())
        .collect();

    let run = statements
        .iter()
        .take_while(|s| is_docstring(s, source, lang))
        .count();
    if run == 0 {
        return None;
    }

    let start = statements[0].start_byte();
    Some(match statements.get(run) {
        Some(next) => Edit {
            range: start..next.start_byte(),
            replacement: "",
        },
        None => Edit {
            range: start..statements[run - 1].end_byte(),
            replacement: lang.empty_body(),
        },
    })
}

fn is_docstring(statement: &Node<'_>, source: &str, lang: Lang) -> bool {
    if statement.kind() != lang.expression_statement_kind() || statement.named_child_count() != 1 {
        return false;
    }
    statement
        .named_child(0)
        .is_some_and(|expr| is_text_literal(&expr, source, lang))
}

fn is_text_literal(node: &Node<'_>, source: &str, lang: Lang) -> bool {
    if node.kind() == lang.string_kind() {
        let mut prefix = syntax::text(node, source)
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase());
        return !prefix.any(|c| lang.non_text_string_prefixes().contains(&c));
    }
    if node.kind() == lang.concatenated_string_kind() {
        let mut cursor = node.walk();
        return node
            .named_children(&mut cursor)
            .all(|part| is_text_literal(&part, source, lang));
    }
    false
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    // Outer edits sort before edits nested inside them.
    edits.sort_by_key(|e| (e.range.start, std::cmp::Reverse(e.range.end)));

    let mut out = String::with_capacity(source.len());
    let mut pos = 0;
    for edit in edits {
        if edit.range.start < pos {
            continue;
        }
        out.push_str(&source[pos..edit.range.start]);
        out.push_str(edit.replacement);
        pos = edit.range.end;
    }
    out.push_str(&source[pos..]);
    out
}

fn multiline_strings(root: Node<'_>, lang: Lang) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    syntax::preorder(root, |node| {
        if node.kind() == lang.string_kind() && node.start_position().row != node.end_position().row
        {
            ranges.push(node.byte_range());
        }
    });
    ranges
}

/// Trim trailing whitespace and drop blank lines, leaving the interior of
/// multi-line string literals untouched. No trailing newline.
fn render(text: &str, protected: &[Range<usize>]) -> String {
    let inside = |pos: usize| protected.iter().any(|r| r.start < pos && pos < r.end);

    let mut lines: Vec<&str> = Vec::new();
    let mut offset = 0;
    for line in text.split('\n') {
        let start = offset;
        let end = start + line.len();
        offset = end + 1;

        let kept = if inside(end) { line } else { line.trim_end() };
        if inside(start) || !kept.is_empty() {
            lines.push(kept);
        }
    }
    lines.join("\n")
}
