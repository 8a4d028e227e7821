//! Export-list lookup.
//!
//! The engine never reads source code. It asks an [`ExportResolver`] for the
//! public names of a protected package and branches on the answer.

use std::collections::{BTreeSet, HashMap};

use crate::name::QualifiedName;

/// Outcome of an export-list lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportList {
    /// The package declares these public names.
    Resolved(BTreeSet<String>),
    /// The package declares no (static) export list.
    NotFound,
}

impl ExportList {
    /// Convenience constructor from any list of names.
    #[must_use]
    pub fn resolved<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Resolved(names.into_iter().map(Into::into).collect())
    }
}

/// Resolves the export list of a package.
///
/// Implementations must be idempotent; any caching is their own business.
pub trait ExportResolver: Send + Sync {
    /// Looks up the declared public names of `package`.
    fn resolve(&self, package: &QualifiedName) -> ExportList;
}

impl<F> ExportResolver for F
where
    F: Fn(&QualifiedName) -> ExportList + Send + Sync,
{
    fn resolve(&self, package: &QualifiedName) -> ExportList {
        self(package)
    }
}

/// In-memory export lists keyed by package name.
#[derive(Debug, Clone, Default)]
pub struct StaticExports {
    exports: HashMap<String, BTreeSet<String>>,
}

impl StaticExports {
    /// Creates an empty table; every lookup is [`ExportList::NotFound`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the export list of `package`.
    #[must_use]
    pub fn with<I, S>(mut self, package: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(package, names);
        self
    }

    /// Declares the export list of `package`, replacing any previous one.
    pub fn insert<I, S>(&mut self, package: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports.insert(
            package.to_string(),
            names.into_iter().map(Into::into).collect(),
        );
    }
}

impl ExportResolver for StaticExports {
    fn resolve(&self, package: &QualifiedName) -> ExportList {
        self.exports
            .get(package.as_str())
            .map_or(ExportList::NotFound, |names| {
                ExportList::Resolved(names.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_exports_resolve_declared_packages() {
        let exports = StaticExports::new().with("auctions", ["Auction", "Bid"]);
        let name = QualifiedName::new("auctions").unwrap();
        assert_eq!(
            exports.resolve(&name),
            ExportList::resolved(["Auction", "Bid"])
        );
    }

    #[test]
    fn static_exports_report_missing_packages() {
        let exports = StaticExports::new();
        let name = QualifiedName::new("auctions").unwrap();
        assert_eq!(exports.resolve(&name), ExportList::NotFound);
    }

    #[test]
    fn empty_export_list_is_not_not_found() {
        let exports = StaticExports::new().with("auctions", Vec::<String>::new());
        let name = QualifiedName::new("auctions").unwrap();
        assert_eq!(
            exports.resolve(&name),
            ExportList::Resolved(BTreeSet::new())
        );
    }

    #[test]
    fn closures_are_resolvers() {
        let resolver = |name: &QualifiedName| {
            if name.as_str() == "a" {
                ExportList::resolved(["x"])
            } else {
                ExportList::NotFound
            }
        };
        assert_eq!(
            resolver.resolve(&QualifiedName::new("a").unwrap()),
            ExportList::resolved(["x"])
        );
        assert_eq!(
            resolver.resolve(&QualifiedName::new("b").unwrap()),
            ExportList::NotFound
        );
    }
}
