//! `__all__` extraction and a filesystem-backed [`ExportResolver`].

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tree_sitter::{Language, Node};
use tracing::{debug, warn};

use import_fence_core::{ExportList, ExportResolver, QualifiedName};

use crate::extractor::ExtractError;
use crate::python::{parse, text};

const DUNDER_ALL: &str = "__all__";

/// What the module-level statements say about `__all__` so far.
enum DunderAll {
    Undefined,
    Literal(BTreeSet<String>),
    Dynamic,
}

/// Extracts the static `__all__` of a Python module.
///
/// Recognized at module level, in order:
///
/// ```python
/// __all__ = ["a", "b"]            # list or tuple of string literals
/// __all__: list[str] = ("a",)     # annotated
/// __all__ += ["c"]                # extends a literal list
/// ```
///
/// Anything else assigned to `__all__` makes it dynamic, which resolves to
/// [`ExportList::NotFound`] just like a module without `__all__`.
///
/// # Errors
///
/// Returns an error if the Python grammar cannot be loaded.
pub fn extract_dunder_all(source: &str) -> Result<ExportList, ExtractError> {
    let language: Language = tree_sitter_python::LANGUAGE.into();
    let tree = parse(&language, source)?;
    let src = source.as_bytes();
    let root = tree.root_node();

    let mut state = DunderAll::Undefined;
    let mut cursor = root.walk();
    for stmt in root.named_children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let Some(expr) = stmt.named_child(0) else {
            continue;
        };
        let Some(left) = expr.child_by_field_name("left") else {
            continue;
        };
        if left.kind() != "identifier" || text(&left, src) != DUNDER_ALL {
            continue;
        }

        state = match (expr.kind(), state) {
            ("assignment", previous) => match expr.child_by_field_name("right") {
                Some(right) => literal_names(&right, src).map_or(DunderAll::Dynamic, DunderAll::Literal),
                // `__all__: list[str]` declares without assigning
                None => previous,
            },
            ("augmented_assignment", DunderAll::Literal(mut names)) => {
                let operator = expr.child_by_field_name("operator");
                match (operator.map(|op| text(&op, src)), expr.child_by_field_name("right")) {
                    (Some("+="), Some(right)) => match literal_names(&right, src) {
                        Some(more) => {
                            names.extend(more);
                            DunderAll::Literal(names)
                        }
                        None => DunderAll::Dynamic,
                    },
                    _ => DunderAll::Dynamic,
                }
            }
            ("augmented_assignment", _) => DunderAll::Dynamic,
            (_, previous) => previous,
        };
    }

    Ok(match state {
        DunderAll::Literal(names) => ExportList::Resolved(names),
        DunderAll::Undefined | DunderAll::Dynamic => ExportList::NotFound,
    })
}

/// Names of a list or tuple made only of plain string literals.
fn literal_names(node: &Node<'_>, src: &[u8]) -> Option<BTreeSet<String>> {
    if !matches!(node.kind(), "list" | "tuple") {
        return None;
    }
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|item| item.kind() != "comment")
        .map(|item| string_literal(&item, src))
        .collect()
}

fn string_literal(node: &Node<'_>, src: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "interpolation")
    {
        return None;
    }

    let raw = text(node, src).trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    ["\"\"\"", "'''", "\"", "'"].iter().find_map(|quote| {
        raw.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
            .map(str::to_string)
    })
}

/// Resolves export lists by reading `__all__` from a source tree.
///
/// `a.b` is looked up as `root/a/b/__init__.py`, then `root/a/b.py`.
/// Results are cached per name for the lifetime of the resolver.
#[derive(Debug)]
pub struct SourceTreeResolver {
    root: PathBuf,
    cache: Mutex<HashMap<QualifiedName, ExportList>>,
}

impl SourceTreeResolver {
    /// Creates a resolver rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The file defining `package`, if any.
    #[must_use]
    pub fn module_file(&self, package: &QualifiedName) -> Option<PathBuf> {
        let dir = package
            .segments()
            .fold(self.root.clone(), |path, segment| path.join(segment));
        let init = dir.join("__init__.py");
        if init.is_file() {
            return Some(init);
        }
        let file = dir.with_extension("py");
        file.is_file().then_some(file)
    }

    fn load(&self, package: &QualifiedName) -> ExportList {
        let Some(file) = self.module_file(package) else {
            debug!("no source file for `{package}` under {}", self.root.display());
            return ExportList::NotFound;
        };
        let source = match std::fs::read_to_string(&file) {
            Ok(source) => source,
            Err(e) => {
                warn!("failed to read {}: {e}", file.display());
                return ExportList::NotFound;
            }
        };
        match extract_dunder_all(&source) {
            Ok(exports) => exports,
            Err(e) => {
                warn!("failed to parse {}: {e}", file.display());
                ExportList::NotFound
            }
        }
    }
}

impl ExportResolver for SourceTreeResolver {
    fn resolve(&self, package: &QualifiedName) -> ExportList {
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(package)
        {
            return hit.clone();
        }

        let exports = self.load(package);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(package.clone(), exports.clone());
        exports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(list: &ExportList) -> Vec<&str> {
        match list {
            ExportList::Resolved(names) => names.iter().map(String::as_str).collect(),
            ExportList::NotFound => panic!("expected a resolved export list"),
        }
    }

    #[test]
    fn literal_list() {
        let exports = extract_dunder_all("__all__ = ['Bid', \"Lot\"]\n").unwrap();
        assert_eq!(names(&exports), vec!["Bid", "Lot"]);
    }

    #[test]
    fn tuple_and_annotation() {
        let exports = extract_dunder_all("__all__: tuple[str, ...] = ('Bid',)\n").unwrap();
        assert_eq!(names(&exports), vec!["Bid"]);
    }

    #[test]
    fn augmented_assignment_extends() {
        let src = "__all__ = ['Bid']\n__all__ += ['Lot']\n";
        assert_eq!(names(&extract_dunder_all(src).unwrap()), vec!["Bid", "Lot"]);
    }

    #[test]
    fn empty_list_is_not_missing() {
        let exports = extract_dunder_all("__all__ = []\n").unwrap();
        assert_eq!(exports, ExportList::Resolved(BTreeSet::new()));
    }

    #[test]
    fn missing_is_not_found() {
        let exports = extract_dunder_all("from .models import Bid\n").unwrap();
        assert_eq!(exports, ExportList::NotFound);
    }

    #[test]
    fn dynamic_is_not_found() {
        for src in [
            "__all__ = [name for name in dir()]\n",
            "__all__ = models.__all__ + ['Bid']\n",
            "__all__ = ['Bid', NAME]\n",
            "__all__ = [f'{x}']\n",
            "__all__ += ['Bid']\n",
            "__all__ = ['Bid']\n__all__ += other\n",
        ] {
            assert_eq!(extract_dunder_all(src).unwrap(), ExportList::NotFound, "{src}");
        }
    }

    #[test]
    fn nested_assignments_are_ignored() {
        let src = "__all__ = ['Bid']\nif True:\n    __all__ = ['Other']\n";
        assert_eq!(names(&extract_dunder_all(src).unwrap()), vec!["Bid"]);
    }

    #[test]
    fn resolver_prefers_package_init() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("auctions/domain")).unwrap();
        fs::write(
            dir.path().join("auctions/__init__.py"),
            "__all__ = ['AuctionService']\n",
        )
        .unwrap();
        fs::write(dir.path().join("auctions/domain/__init__.py"), "__all__ = ['Bid']\n").unwrap();
        fs::write(dir.path().join("auctions/domain.py"), "__all__ = ['Shadowed']\n").unwrap();

        let resolver = SourceTreeResolver::new(dir.path());
        let domain = QualifiedName::new("auctions.domain").unwrap();
        assert_eq!(names(&resolver.resolve(&domain)), vec!["Bid"]);
        let auctions = QualifiedName::new("auctions").unwrap();
        assert_eq!(names(&resolver.resolve(&auctions)), vec!["AuctionService"]);
    }

    #[test]
    fn resolver_falls_back_to_module_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("billing")).unwrap();
        fs::write(dir.path().join("billing/api.py"), "__all__ = ('charge',)\n").unwrap();

        let resolver = SourceTreeResolver::new(dir.path());
        let api = QualifiedName::new("billing.api").unwrap();
        assert_eq!(names(&resolver.resolve(&api)), vec!["charge"]);
    }

    #[test]
    fn resolver_reports_missing_package() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SourceTreeResolver::new(dir.path());
        let ghost = QualifiedName::new("ghost").unwrap();
        assert_eq!(resolver.resolve(&ghost), ExportList::NotFound);
    }

    #[test]
    fn resolver_caches_first_answer() {
        let dir = tempfile::tempdir().unwrap();
        let init = dir.path().join("auctions/__init__.py");
        fs::create_dir_all(dir.path().join("auctions")).unwrap();
        fs::write(&init, "__all__ = ['Bid']\n").unwrap();

        let resolver = SourceTreeResolver::new(dir.path());
        let auctions = QualifiedName::new("auctions").unwrap();
        assert_eq!(names(&resolver.resolve(&auctions)), vec!["Bid"]);

        fs::write(&init, "__all__ = ['Changed']\n").unwrap();
        assert_eq!(names(&resolver.resolve(&auctions)), vec!["Bid"]);
    }
}
