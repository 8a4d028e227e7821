//! Maps source files to dotted module names.

use std::path::{Component, Path, PathBuf};

use import_fence_core::QualifiedName;

const PACKAGE_INIT: &str = "__init__";

/// A Python source file and the module it defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePath {
    /// Dotted module name.
    pub name: QualifiedName,
    /// Source file.
    pub file: PathBuf,
    /// True for `__init__.py`, i.e. the module is a package.
    pub is_package: bool,
}

impl ModulePath {
    /// The package relative imports are resolved against.
    ///
    /// A package resolves against itself, a plain module against its parent.
    #[must_use]
    pub fn anchor(&self) -> Option<QualifiedName> {
        if self.is_package {
            Some(self.name.clone())
        } else {
            self.name.parent()
        }
    }
}

/// Computes the module name of `path` relative to `root`.
///
/// `root/a/b.py` is `a.b`, `root/a/__init__.py` is package `a`. Returns
/// `None` for files outside `root`, non-Python files and `root/__init__.py`.
#[must_use]
pub fn module_name_for(root: &Path, path: &Path) -> Option<ModulePath> {
    let relative = path.strip_prefix(root).ok()?;
    if relative.extension()? != "py" {
        return None;
    }

    let mut segments = relative
        .parent()?
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_str()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    let stem = relative.file_stem()?.to_str()?;
    let is_package = stem == PACKAGE_INIT;
    if !is_package {
        segments.push(stem);
    }

    let name = QualifiedName::from_segments(segments).ok()?;
    Some(ModulePath {
        name,
        file: path.to_path_buf(),
        is_package,
    })
}
