//! Decomposition of canonical source into function definitions, call sites
//! and imports.

use serde::Serialize;
use tree_sitter::Node;

use crate::error::Result;
use crate::languages::Lang;
use crate::syntax;

/// A named function, with its full text (signature and body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub source_text: String,
}

/// A call through a bare name, e.g. `add(1, 2)` but not `obj.add(1, 2)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCall {
    pub callee_name: String,
    pub source_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDeclaration {
    pub source_text: String,
}

/// Artifacts of one source, each class in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Artifacts {
    pub function_definitions: Vec<FunctionDefinition>,
    pub function_calls: Vec<FunctionCall>,
    pub imports: Vec<ImportDeclaration>,
}

impl Artifacts {
    /// Total number of artifacts across all classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.function_definitions.len() + self.function_calls.len() + self.imports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walk `canonical` once in pre-order and collect every artifact.
///
/// Nested definitions are reported on their own as well as inside the text of
/// the enclosing definition.
///
/// # Errors
///
/// Returns `IndexError::Parse` if `canonical` does not parse.
pub fn extract(canonical: &str, lang: Lang) -> Result<Artifacts> {
    let tree = syntax::parse(canonical, lang)?;
    let mut artifacts = Artifacts::default();

    syntax::preorder(tree.root_node(), |node| {
        let kind = node.kind();
        if lang.function_kinds().contains(&kind) {
            if let Some(def) = definition(node, canonical) {
                artifacts.function_definitions.push(def);
            }
        } else if kind == lang.call_kind() {
            if let Some(call) = call(node, canonical, lang) {
                artifacts.function_calls.push(call);
            }
        } else if lang.import_kinds().contains(&kind) {
            match span(node, canonical) {
                Some(text) => artifacts.imports.push(ImportDeclaration {
                    source_text: text.to_owned(),
                }),
                None => tracing::debug!(kind, "skipping import with empty span"),
            }
        }
    });

    tracing::debug!(
        definitions = artifacts.function_definitions.len(),
        calls = artifacts.function_calls.len(),
        imports = artifacts.imports.len(),
        "extracted artifacts"
    );
    Ok(artifacts)
}

fn definition(node: Node<'_>, source: &str) -> Option<FunctionDefinition> {
    let Some(name) = node
        .child_by_field_name("name")
        .map(|n| syntax::text(&n, source))
        .filter(|n| !n.is_empty())
    else {
        tracing::debug!(line = node.start_position().row + 1, "skipping unnamed definition");
        return None;
    };
    let Some(text) = span(node, source) else {
        tracing::debug!(name, "skipping definition with empty span");
        return None;
    };
    Some(FunctionDefinition {
        name: name.to_owned(),
        source_text: text.to_owned(),
    })
}

fn call(node: Node<'_>, source: &str, lang: Lang) -> Option<FunctionCall> {
    let callee = node.child_by_field_name("function")?;
    if callee.kind() != lang.identifier_kind() {
        return None;
    }
    let name = syntax::text(&callee, source);
    if name.is_empty() {
        tracing::debug!(line = node.start_position().row + 1, "skipping call without callee name");
        return None;
    }
    let Some(text) = span(node, source) else {
        tracing::debug!(callee = name, "skipping call with empty span");
        return None;
    };
    Some(FunctionCall {
        callee_name: name.to_owned(),
        source_text: text.to_owned(),
    })
}

fn span<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    let text = syntax::text(&node, source);
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn py(source: &str) -> Artifacts {
        extract(source, Lang::Python).unwrap()
    }

    #[test]
    fn function_with_two_calls_and_one_import() {
        let source = "import os\ndef f(x):\n    print(x)\n    return len(x)";
        let artifacts = py(source);

        assert_eq!(artifacts.function_definitions.len(), 1);
        assert_eq!(artifacts.function_definitions[0].name, "f");
        assert_eq!(
            artifacts.function_definitions[0].source_text,
            "def f(x):\n    print(x)\n    return len(x)"
        );

        let callees: Vec<&str> = artifacts
            .function_calls
            .iter()
            .map(|c| c.callee_name.as_str())
            .collect();
        assert_eq!(callees, ["print", "len"]);
        assert_eq!(artifacts.function_calls[1].source_text, "len(x)");

        assert_eq!(artifacts.imports.len(), 1);
        assert_eq!(artifacts.imports[0].source_text, "import os");
        assert_eq!(artifacts.len(), 4);
    }

    #[test]
    fn add_example() {
        let artifacts = py("def add(a, b):\n    return a + b\nadd(5, 3)");
        assert_eq!(artifacts.function_definitions[0].name, "add");
        assert_eq!(artifacts.function_calls.len(), 1);
        assert_eq!(artifacts.function_calls[0].callee_name, "add");
        assert_eq!(artifacts.function_calls[0].source_text, "add(5, 3)");
        assert!(artifacts.imports.is_empty());
    }

    #[test]
    fn nested_definitions_reported_separately() {
        let source = "def outer():\n    def inner():\n        return 1\n    return inner()";
        let artifacts = py(source);
        let names: Vec<&str> = artifacts
            .function_definitions
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, ["outer", "inner"]);
        assert!(artifacts.function_definitions[0].source_text.contains("def inner()"));
        assert_eq!(
            artifacts.function_definitions[1].source_text,
            "def inner():\n        return 1"
        );
    }

    #[test]
    fn attribute_and_computed_calls_excluded() {
        let source = "obj.method(1)\nhandlers[0]()\nmake()()\nrun()";
        let artifacts = py(source);
        let callees: Vec<&str> = artifacts
            .function_calls
            .iter()
            .map(|c| c.callee_name.as_str())
            .collect();
        assert_eq!(callees, ["make", "run"]);
    }

    #[test]
    fn nested_calls_in_preorder() {
        let artifacts = py("outer(inner(1))");
        let callees: Vec<&str> = artifacts
            .function_calls
            .iter()
            .map(|c| c.callee_name.as_str())
            .collect();
        assert_eq!(callees, ["outer", "inner"]);
    }

    #[test]
    fn all_import_forms() {
        let source = "from __future__ import annotations\nimport os, sys\nfrom pathlib import Path";
        let artifacts = py(source);
        let imports: Vec<&str> = artifacts
            .imports
            .iter()
            .map(|i| i.source_text.as_str())
            .collect();
        assert_eq!(
            imports,
            [
                "from __future__ import annotations",
                "import os, sys",
                "from pathlib import Path"
            ]
        );
    }

    #[test]
    fn async_and_method_definitions() {
        let source = "class C:\n    def m(self):\n        pass\nasync def fetch():\n    pass";
        let artifacts = py(source);
        let names: Vec<&str> = artifacts
            .function_definitions
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, ["m", "fetch"]);
        assert!(artifacts.function_definitions[1].source_text.starts_with("async def"));
    }

    #[test]
    fn empty_source_yields_nothing() {
        let artifacts = py("");
        assert!(artifacts.is_empty());
    }

    #[test]
    fn invalid_source_errors() {
        assert!(extract("def broken(:\n", Lang::Python).is_err());
    }
}
