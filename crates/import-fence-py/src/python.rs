//! Python import extractor using tree-sitter.

use tree_sitter::{Language, Node, Parser, Tree};
use tracing::debug;

use import_fence_core::{ImportEvent, Location, QualifiedName};

use crate::extractor::{ExtractError, LanguageExtractor, ModuleAnalysis};
use crate::module_path::ModulePath;

pub(crate) const LANGUAGE_ID: &str = "python";

const FUTURE: &str = "__future__";
const STAR: &str = "*";

/// Parses Python source into a syntax tree.
pub(crate) fn parse(language: &Language, source: &str) -> Result<Tree, ExtractError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|source| ExtractError::Grammar {
            language: LANGUAGE_ID,
            source,
        })?;
    parser.parse(source, None).ok_or(ExtractError::NoTree {
        language: LANGUAGE_ID,
    })
}

pub(crate) fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

/// Extracts `import` and `from ... import` statements from Python source.
///
/// The whole tree is walked, so imports inside functions, classes and
/// `try` blocks are found too.
pub struct PythonExtractor {
    language: Language,
}

impl PythonExtractor {
    /// Creates a new Python extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Join identifier children of a `dotted_name` node with dots.
    fn dotted_name(node: &Node<'_>, src: &[u8]) -> Option<QualifiedName> {
        let mut cursor = node.walk();
        let parts: Vec<&str> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "identifier")
            .map(|child| text(&child, src))
            .collect();
        QualifiedName::from_segments(parts).ok()
    }

    /// The imported name of a `dotted_name` or `aliased_import` node.
    fn imported_name(node: &Node<'_>, src: &[u8]) -> Option<QualifiedName> {
        match node.kind() {
            "dotted_name" => Self::dotted_name(node, src),
            "aliased_import" => Self::dotted_name(&node.child_by_field_name("name")?, src),
            _ => None,
        }
    }

    fn location(node: &Node<'_>, module: &ModulePath) -> Location {
        let start = node.start_position();
        Location::new(module.file.clone(), start.row + 1, start.column + 1)
    }

    /// `import a.b, c as d`: one plain import per name.
    fn extract_import(node: &Node<'_>, src: &[u8], module: &ModulePath) -> Vec<ImportEvent> {
        let location = Self::location(node, module);
        let mut cursor = node.walk();
        node.children_by_field_name("name", &mut cursor)
            .filter_map(|name| Self::imported_name(&name, src))
            .map(|name| ImportEvent::plain(name).at(location.clone()))
            .collect()
    }

    /// `from m import x, y` and `from m import *`.
    fn extract_import_from(
        node: &Node<'_>,
        src: &[u8],
        module: &ModulePath,
    ) -> Option<ImportEvent> {
        let source_node = node.child_by_field_name("module_name")?;
        let source = match source_node.kind() {
            "relative_import" => Self::resolve_relative(&source_node, src, module)?,
            _ => Self::dotted_name(&source_node, src)?,
        };
        if source.as_str() == FUTURE {
            return None;
        }

        let mut names: Vec<String> = Vec::new();
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            if let Some(name) = Self::imported_name(&name, src) {
                names.push(name.to_string());
            }
        }
        let mut cursor = node.walk();
        if node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import")
        {
            names.push(STAR.to_string());
        }

        Some(ImportEvent::from_import(source, names).at(Self::location(node, module)))
    }

    /// Resolves `.`, `..pkg` and friends against the importing module.
    fn resolve_relative(
        node: &Node<'_>,
        src: &[u8],
        module: &ModulePath,
    ) -> Option<QualifiedName> {
        let mut level = 0;
        let mut tail = None;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_prefix" => level = text(&child, src).matches('.').count(),
                "dotted_name" => tail = Self::dotted_name(&child, src),
                _ => {}
            }
        }

        let mut base = module.anchor();
        for _ in 1..level {
            base = base.and_then(|b| b.parent());
        }

        let resolved = match (base, tail) {
            (Some(base), Some(tail)) => base.join(tail.as_str()).ok(),
            (Some(base), None) => Some(base),
            (None, _) => None,
        };
        if resolved.is_none() {
            debug!(
                "{}: relative import `{}` goes beyond the top-level package",
                module.file.display(),
                text(node, src)
            );
        }
        resolved
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for PythonExtractor {
    fn language_id(&self) -> &'static str {
        LANGUAGE_ID
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".py"]
    }

    fn analyze(&self, module: &ModulePath, source: &str) -> Result<ModuleAnalysis, ExtractError> {
        let tree = parse(&self.language, source)?;
        let src = source.as_bytes();
        let root = tree.root_node();
        if root.has_error() {
            debug!("{}: syntax errors, extracting what parses", module.file.display());
        }

        let mut imports = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "import_statement" => imports.extend(Self::extract_import(&node, src, module)),
                "import_from_statement" => {
                    imports.extend(Self::extract_import_from(&node, src, module));
                }
                "future_import_statement" => {}
                _ => {
                    let mut cursor = node.walk();
                    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
                    stack.extend(children.into_iter().rev());
                }
            }
        }

        Ok(ModuleAnalysis {
            module: module.name.clone(),
            file_path: module.file.clone(),
            imports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use import_fence_core::ImportKind;
    use std::path::Path;

    fn module(path: &str) -> ModulePath {
        crate::module_name_for(Path::new("src"), &Path::new("src").join(path)).unwrap()
    }

    fn analyze(path: &str, src: &str) -> Vec<ImportKind> {
        PythonExtractor::new()
            .analyze(&module(path), src)
            .unwrap()
            .imports
            .into_iter()
            .map(|i| i.kind)
            .collect()
    }

    fn plain(name: &str) -> ImportKind {
        ImportKind::Plain {
            name: QualifiedName::new(name).unwrap(),
        }
    }

    fn from(module: &str, names: &[&str]) -> ImportKind {
        ImportKind::From {
            module: QualifiedName::new(module).unwrap(),
            names: names.iter().map(|n| (*n).to_string()).collect(),
        }
    }

    #[test]
    fn extracts_plain_imports() {
        let imports = analyze("shop/views.py", "import os\nimport catalog.models as m, billing\n");
        assert_eq!(
            imports,
            vec![plain("os"), plain("catalog.models"), plain("billing")]
        );
    }

    #[test]
    fn extracts_from_imports() {
        let imports = analyze(
            "shop/views.py",
            "from auctions.domain import Bid, Lot as L\nfrom common import *\n",
        );
        assert_eq!(
            imports,
            vec![from("auctions.domain", &["Bid", "Lot"]), from("common", &["*"])]
        );
    }

    #[test]
    fn ignores_future_imports() {
        let imports = analyze("shop/views.py", "from __future__ import annotations\nimport catalog\n");
        assert_eq!(imports, vec![plain("catalog")]);
    }

    #[test]
    fn finds_nested_imports_in_order() {
        let src = "\
import a
def f():
    import b
try:
    from c import x
except ImportError:
    from d import x
class K:
    import e
";
        let imports = analyze("shop/views.py", src);
        assert_eq!(
            imports,
            vec![
                plain("a"),
                plain("b"),
                from("c", &["x"]),
                from("d", &["x"]),
                plain("e"),
            ]
        );
    }

    #[test]
    fn resolves_relative_imports() {
        let src = "from . import forms\nfrom .models import Cart\nfrom ..catalog import Product\n";
        assert_eq!(
            analyze("shop/web/views.py", src),
            vec![
                from("shop.web", &["forms"]),
                from("shop.web.models", &["Cart"]),
                from("shop.catalog", &["Product"]),
            ]
        );
    }

    #[test]
    fn relative_imports_in_package_init() {
        assert_eq!(
            analyze("shop/__init__.py", "from .views import index\n"),
            vec![from("shop.views", &["index"])]
        );
    }

    #[test]
    fn drops_relative_imports_beyond_top_level() {
        assert!(analyze("shop/views.py", "from ... import x\n").is_empty());
        assert!(analyze("setup.py", "from . import x\n").is_empty());
    }

    #[test]
    fn records_locations() {
        let analysis = PythonExtractor::new()
            .analyze(&module("shop/views.py"), "\n\nimport catalog\n")
            .unwrap();
        let location = analysis.imports[0].location.clone().unwrap();
        assert_eq!(location.line, 3);
        assert_eq!(location.column, 1);
        assert_eq!(location.file, Path::new("src/shop/views.py"));
    }

    #[test]
    fn tolerates_syntax_errors() {
        let imports = analyze("shop/views.py", "import catalog\ndef broken(:\n");
        assert_eq!(imports.first(), Some(&plain("catalog")));
    }

    #[test]
    fn empty_source() {
        assert!(analyze("shop/views.py", "").is_empty());
    }
}
