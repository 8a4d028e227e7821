//! Events produced by a module traversal feed.

use crate::name::QualifiedName;
use crate::types::Location;
use std::path::PathBuf;

/// The two import shapes, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// `import a.b.c`
    Plain {
        /// The imported module.
        name: QualifiedName,
    },
    /// `from a.b import x, y`
    From {
        /// The module imported from.
        module: QualifiedName,
        /// Names imported from it; `*` for a star import.
        names: Vec<String>,
    },
}

impl ImportKind {
    /// The imported module name (`a.b.c` or `a.b` above).
    #[must_use]
    pub fn target(&self) -> &QualifiedName {
        match self {
            Self::Plain { name } => name,
            Self::From { module, .. } => module,
        }
    }

    /// Top-level package the import pulls in.
    #[must_use]
    pub fn top_level(&self) -> &str {
        self.target().top_level()
    }
}

/// One import statement seen inside the current module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEvent {
    /// What is imported.
    pub kind: ImportKind,
    /// Where, if known.
    pub location: Option<Location>,
}

impl ImportEvent {
    /// `import name`
    #[must_use]
    pub fn plain(name: QualifiedName) -> Self {
        Self {
            kind: ImportKind::Plain { name },
            location: None,
        }
    }

    /// `from module import names`
    #[must_use]
    pub fn from_import<I, S>(module: QualifiedName, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ImportKind::From {
                module,
                names: names.into_iter().map(Into::into).collect(),
            },
            location: None,
        }
    }

    /// Attaches a location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// A step of the traversal feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleEvent {
    /// A module is entered.
    Enter {
        /// Qualified name of the module.
        module: QualifiedName,
        /// Source file, used for locations of module-level findings.
        file: Option<PathBuf>,
    },
    /// An import inside the current module.
    Import(ImportEvent),
    /// The current module is left.
    Exit,
}
