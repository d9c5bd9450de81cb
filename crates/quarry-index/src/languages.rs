//! Language detection and tree-sitter grammar registry.
//!
//! Only Python is wired up. Another grammar plugs in by adding a variant and
//! filling in its node kinds; canonicalization and extraction are driven
//! entirely by these tables.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Supported language with its tree-sitter grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Python,
}

impl Lang {
    /// Identifier used in config and logs.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Python => "python",
        }
    }

    /// Get the tree-sitter grammar. Returns `None` if the
    /// corresponding feature is not enabled.
    #[must_use]
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            #[cfg(feature = "lang-python")]
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Node kinds that declare a named function.
    #[must_use]
    pub fn function_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["function_definition"],
        }
    }

    /// Node kind of a call expression; its `function` field holds the callee.
    #[must_use]
    pub fn call_kind(self) -> &'static str {
        match self {
            Self::Python => "call",
        }
    }

    /// Node kind of a bare, unqualified name.
    #[must_use]
    pub fn identifier_kind(self) -> &'static str {
        match self {
            Self::Python => "identifier",
        }
    }

    #[must_use]
    pub fn import_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Python => &[
                "import_statement",
                "import_from_statement",
                "future_import_statement",
            ],
        }
    }

    /// Node kinds the grammar still recognizes but the language rejects
    /// (Python 2 `print` and `exec` statements).
    #[must_use]
    pub fn invalid_kinds(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["print_statement", "exec_statement"],
        }
    }

    #[must_use]
    pub fn comment_kind(self) -> &'static str {
        match self {
            Self::Python => "comment",
        }
    }

    #[must_use]
    pub fn string_kind(self) -> &'static str {
        match self {
            Self::Python => "string",
        }
    }

    /// Adjacent string literals joined implicitly (`"a" "b"`).
    #[must_use]
    pub fn concatenated_string_kind(self) -> &'static str {
        match self {
            Self::Python => "concatenated_string",
        }
    }

    /// Literal prefixes that make a string something other than plain text
    /// (bytes, f-strings, t-strings). Such literals are never docstrings.
    #[must_use]
    pub fn non_text_string_prefixes(self) -> &'static [char] {
        match self {
            Self::Python => &['b', 'f', 't'],
        }
    }

    /// Statement that wraps a bare expression.
    #[must_use]
    pub fn expression_statement_kind(self) -> &'static str {
        match self {
            Self::Python => "expression_statement",
        }
    }

    /// No-op statement used to keep a body non-empty.
    #[must_use]
    pub fn empty_body(self) -> &'static str {
        match self {
            Self::Python => "pass",
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Detect language from file extension.
#[must_use]
pub fn detect_language(path: &Path) -> Option<Lang> {
    let ext = path.extension()?.to_str()?;
    match ext {
        "py" | "pyi" | "pyw" => Some(Lang::Python),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_language_py_variants() {
        for ext in &["py", "pyi", "pyw"] {
            let path = format!("module.{ext}");
            assert_eq!(
                detect_language(Path::new(&path)),
                Some(Lang::Python),
                "failed for .{ext}"
            );
        }
    }

    #[test]
    fn detect_language_unknown_ext_returns_none() {
        assert_eq!(detect_language(Path::new("file.rs")), None);
        assert_eq!(detect_language(Path::new("Makefile")), None);
    }

    #[test]
    fn python_kinds() {
        let lang = Lang::Python;
        assert!(lang.function_kinds().contains(&"function_definition"));
        assert!(lang.import_kinds().contains(&"import_from_statement"));
        assert_eq!(lang.call_kind(), "call");
        assert_eq!(lang.comment_kind(), "comment");
        assert!(lang.invalid_kinds().contains(&"print_statement"));
    }

    #[test]
    fn grammar_returns_some_for_enabled_features() {
        #[cfg(feature = "lang-python")]
        assert!(Lang::Python.grammar().is_some());
    }

    #[test]
    fn lang_id_and_display() {
        assert_eq!(Lang::Python.id(), "python");
        assert_eq!(Lang::Python.to_string(), "python");
        assert_eq!(Lang::default(), Lang::Python);
    }
}
