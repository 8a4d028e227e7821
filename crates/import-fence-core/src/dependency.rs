//! Permission graph over top-level packages.
//!
//! Rules are `dependent->dependency` edges:
//!
//! ```text
//! shop->catalog   shop may import catalog
//! *->common       anyone may import common
//! assembly->*     assembly may import every restricted package
//! ```
//!
//! A package that appears in any plain edge is *restricted*: importing it
//! needs permission. Packages never mentioned (stdlib, third party) are
//! unrestricted and never reported.

use std::collections::{BTreeMap, BTreeSet};

use crate::rule::{Edge, RuleError};

const CONTEXT: &str = "dependencies.allowed";

/// A dependency that is not permitted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ForbiddenDependency {
    /// The restricted package that was imported.
    pub offending_package: String,
    /// The importing top-level package.
    pub importing_package: String,
}

/// Compiled, read-only permission graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionGraph {
    permitted: BTreeMap<String, BTreeSet<String>>,
    restricted: BTreeSet<String>,
    always_allowed: BTreeSet<String>,
}

impl PermissionGraph {
    /// Compiles rule strings into a graph.
    ///
    /// Wildcard dependents are expanded after every rule has been read, so
    /// `assembly->*` sees restricted packages declared after it too.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Malformed`] for the first entry that is not a
    /// well-formed `a->b` edge. No partial graph is produced.
    pub fn compile<I, S>(rules: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = Self::default();
        let mut wildcard_dependents: BTreeSet<String> = BTreeSet::new();

        for (i, raw) in rules.into_iter().enumerate() {
            let edge = Edge::parse(raw.as_ref(), &format!("{CONTEXT}[{i}]"))?;
            warn_if_dotted(&edge);

            if edge.to_is_wildcard() {
                wildcard_dependents.insert(edge.from);
                continue;
            }

            if edge.from_is_wildcard() {
                graph.always_allowed.insert(edge.to);
                continue;
            }

            graph.restricted.insert(edge.from.clone());
            graph.restricted.insert(edge.to.clone());
            graph.permitted.entry(edge.from).or_default().insert(edge.to);
        }

        for dependent in wildcard_dependents {
            let universe = graph.restricted.clone();
            graph.permitted.entry(dependent).or_default().extend(universe);
        }

        tracing::debug!(
            restricted = graph.restricted.len(),
            always_allowed = graph.always_allowed.len(),
            "compiled permission graph"
        );

        Ok(graph)
    }

    /// Returns the imports of `module` that break the rules.
    ///
    /// `module` and `imported` are top-level package names. Importing the
    /// own package is never a violation. The result is sorted.
    #[must_use]
    pub fn evaluate<'a, I>(&self, module: &str, imported: I) -> Vec<ForbiddenDependency>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let offending: BTreeSet<&str> = imported
            .into_iter()
            .filter(|package| *package != module)
            .filter(|package| !self.allows(module, package))
            .collect();

        offending
            .into_iter()
            .map(|package| ForbiddenDependency {
                offending_package: package.to_string(),
                importing_package: module.to_string(),
            })
            .collect()
    }

    /// Tests whether `dependent` may import `dependency`.
    #[must_use]
    pub fn allows(&self, dependent: &str, dependency: &str) -> bool {
        dependent == dependency
            || !self.restricted.contains(dependency)
            || self.always_allowed.contains(dependency)
            || self
                .permitted
                .get(dependent)
                .is_some_and(|set| set.contains(dependency))
    }

    /// True if `package` appears in any plain rule.
    #[must_use]
    pub fn is_restricted(&self, package: &str) -> bool {
        self.restricted.contains(package)
    }

    /// True if anyone may import `package`.
    #[must_use]
    pub fn is_always_allowed(&self, package: &str) -> bool {
        self.always_allowed.contains(package)
    }

    /// Packages `dependent` has explicit (or wildcard-expanded) permission for.
    #[must_use]
    pub fn permitted(&self, dependent: &str) -> Option<&BTreeSet<String>> {
        self.permitted.get(dependent)
    }

    /// True if no rule restricts anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.restricted.is_empty()
    }
}

fn warn_if_dotted(edge: &Edge) {
    for token in [&edge.from, &edge.to] {
        if token.contains('.') {
            tracing::warn!(
                "dependency rule token `{token}` is not a top-level package and will never match"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(rules: &[&str]) -> PermissionGraph {
        PermissionGraph::compile(rules).unwrap()
    }

    fn offending(graph: &PermissionGraph, module: &str, imported: &[&str]) -> Vec<String> {
        graph
            .evaluate(module, imported.iter().copied())
            .into_iter()
            .map(|f| f.offending_package)
            .collect()
    }

    #[test]
    fn explicit_edge_allows_import() {
        let graph = compile(&["shop->catalog"]);
        assert!(offending(&graph, "shop", &["catalog"]).is_empty());
    }

    #[test]
    fn missing_edge_forbids_restricted_import() {
        let graph = compile(&["shop->catalog", "billing->catalog"]);
        assert_eq!(offending(&graph, "catalog", &["shop"]), vec!["shop"]);
        assert_eq!(offending(&graph, "shop", &["billing"]), vec!["billing"]);
    }

    #[test]
    fn unrestricted_packages_are_ignored() {
        let graph = compile(&["shop->catalog"]);
        assert!(offending(&graph, "shop", &["os", "requests", "json"]).is_empty());
    }

    #[test]
    fn self_import_is_never_a_violation() {
        let graph = compile(&["shop->catalog"]);
        assert!(offending(&graph, "shop", &["shop"]).is_empty());
        assert!(offending(&graph, "catalog", &["catalog"]).is_empty());
        assert!(offending(&PermissionGraph::default(), "x", &["x"]).is_empty());
    }

    #[test]
    fn wildcard_dependent_reaches_every_restricted_package() {
        let graph = compile(&["assembly->*", "a->b"]);
        assert!(offending(&graph, "assembly", &["a", "b"]).is_empty());
        assert_eq!(
            graph.permitted("assembly").unwrap(),
            &BTreeSet::from(["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn wildcard_dependent_alone_is_not_restricted() {
        let graph = compile(&["assembly->*", "a->b"]);
        assert!(!graph.is_restricted("assembly"));
        assert!(offending(&graph, "a", &["assembly"]).is_empty());
    }

    #[test]
    fn wildcard_dependency_is_always_allowed() {
        let graph = compile(&["*->common", "shop->catalog", "common->catalog"]);
        assert!(graph.is_always_allowed("common"));
        assert!(offending(&graph, "shop", &["common"]).is_empty());
        assert!(offending(&graph, "catalog", &["common"]).is_empty());
        assert!(offending(&graph, "unrelated", &["common"]).is_empty());
    }

    #[test]
    fn always_allowed_does_not_join_universe_by_itself() {
        let graph = compile(&["*->common"]);
        assert!(!graph.is_restricted("common"));
        assert!(graph.is_empty());
    }

    #[test]
    fn result_is_sorted_and_deduplicated() {
        let graph = compile(&["a->b", "c->d", "e->f"]);
        let found = graph.evaluate("a", ["f", "d", "f", "c"]);
        let names: Vec<_> = found.iter().map(|f| f.offending_package.as_str()).collect();
        assert_eq!(names, vec!["c", "d", "f"]);
        assert!(found.iter().all(|f| f.importing_package == "a"));
    }

    #[test]
    fn adding_an_edge_never_adds_violations() {
        let base = ["a->b", "c->d", "e->a"];
        let imported = ["a", "b", "c", "d", "e"];
        let before = compile(&base);

        for extra in ["a->c", "a->d", "c->a", "e->b"] {
            let mut rules = base.to_vec();
            rules.push(extra);
            let after = compile(&rules);
            for module in ["a", "c", "e", "zz"] {
                let old = before.evaluate(module, imported);
                let new = after.evaluate(module, imported);
                assert!(new.iter().all(|v| old.contains(v)), "{extra} grew {module}");
                let dependent = extra.split("->").next().unwrap();
                if module != dependent {
                    assert_eq!(old, new, "{extra} changed unrelated module {module}");
                }
            }
        }
    }

    #[test]
    fn malformed_rule_is_fatal() {
        let err = PermissionGraph::compile(["shop->catalog", "broken"]).unwrap_err();
        assert!(matches!(
            err,
            RuleError::Malformed { ref context, .. } if context == "dependencies.allowed[1]"
        ));
    }
}
