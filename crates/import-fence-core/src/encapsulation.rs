//! Encapsulated packages and their export lists.
//!
//! A protected package may only be used through the names it exports
//! (`__all__`). Protection nests: with `auctions` and `auctions.domain`
//! both protected, imports below `auctions.domain` are judged by the
//! export list of `auctions.domain` alone.
//!
//! Friendships (`checkout->auctions`) let a top-level package bypass the
//! export list of a protected package entirely.

use std::collections::{BTreeSet, HashMap};

use crate::event::ImportKind;
use crate::name::QualifiedName;
use crate::resolver::{ExportList, ExportResolver};
use crate::rule::{Edge, RuleError};

const STAR: &str = "*";

/// Outcome of checking one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing to report.
    Allowed,
    /// The protected package has no export list; the import is let through.
    Degraded {
        /// Protected package that could not be checked.
        protected: QualifiedName,
    },
    /// Some imported names are not exported.
    Violations {
        /// The closest protected ancestor of the import.
        protected: QualifiedName,
        /// Offending names, sorted.
        symbols: Vec<String>,
    },
}

/// Compiled encapsulation rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncapsulationPolicy {
    /// Protected packages in declaration order, without duplicates.
    protected: Vec<QualifiedName>,
    /// friend package -> protected packages it may access.
    friendships: HashMap<String, BTreeSet<QualifiedName>>,
}

impl EncapsulationPolicy {
    /// Compiles protected package names and `friend->protected` strings.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid package name, a malformed friendship,
    /// or a wildcard in a friendship.
    pub fn compile<P, PS, F, FS>(packages: P, friendships: F) -> Result<Self, RuleError>
    where
        P: IntoIterator<Item = PS>,
        PS: AsRef<str>,
        F: IntoIterator<Item = FS>,
        FS: AsRef<str>,
    {
        let mut policy = Self::default();

        for (i, raw) in packages.into_iter().enumerate() {
            let raw = raw.as_ref().trim();
            let name = parse_name(raw, &format!("encapsulation.packages[{i}]"))?;
            if !policy.protected.contains(&name) {
                policy.protected.push(name);
            }
        }

        for (i, raw) in friendships.into_iter().enumerate() {
            let context = format!("encapsulation.friendships[{i}]");
            let edge = Edge::parse(raw.as_ref(), &context)?;
            if edge.from_is_wildcard() || edge.to_is_wildcard() {
                return Err(RuleError::WildcardFriendship {
                    context,
                    rule: raw.as_ref().to_string(),
                });
            }
            let friend = parse_name(&edge.from, &context)?;
            let protected = parse_name(&edge.to, &context)?;
            if friend.segment_count() > 1 {
                tracing::warn!(
                    "friend `{friend}` is not a top-level package and will never match"
                );
            }
            if !policy.protected.contains(&protected) {
                tracing::warn!(
                    "friendship `{}` names `{protected}`, which is not an encapsulated package",
                    raw.as_ref()
                );
            }
            policy
                .friendships
                .entry(friend.as_str().to_string())
                .or_default()
                .insert(protected);
        }

        tracing::debug!(
            protected = policy.protected.len(),
            friends = policy.friendships.len(),
            "compiled encapsulation policy"
        );

        Ok(policy)
    }

    /// Protected packages in declaration order.
    #[must_use]
    pub fn protected(&self) -> &[QualifiedName] {
        &self.protected
    }

    /// True if nothing is protected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.protected.is_empty()
    }

    /// The most specific protected package `name` lies in (or is).
    ///
    /// Ties on segment count go to the earliest declaration.
    #[must_use]
    pub fn closest_protected_ancestor(&self, name: &QualifiedName) -> Option<&QualifiedName> {
        self.closest_matching(|p| name.is_descendant_of(p))
    }

    /// Like [`closest_protected_ancestor`](Self::closest_protected_ancestor)
    /// but ignores `name` itself.
    #[must_use]
    pub fn closest_strict_ancestor(&self, name: &QualifiedName) -> Option<&QualifiedName> {
        self.closest_matching(|p| name.is_strict_descendant_of(p))
    }

    fn closest_matching(
        &self,
        matches: impl Fn(&QualifiedName) -> bool,
    ) -> Option<&QualifiedName> {
        let mut best: Option<&QualifiedName> = None;
        for candidate in self.protected.iter().filter(|p| matches(*p)) {
            if best.map_or(true, |b| candidate.segment_count() > b.segment_count()) {
                best = Some(candidate);
            }
        }
        best
    }

    /// True if `package` may bypass the export list of `protected`.
    #[must_use]
    pub fn is_friend(&self, package: &str, protected: &QualifiedName) -> bool {
        self.friendships
            .get(package)
            .is_some_and(|allowed| allowed.contains(protected))
    }

    /// Checks one import made by a module of top-level package
    /// `current_package`.
    #[must_use]
    pub fn evaluate(
        &self,
        current_package: &str,
        import: &ImportKind,
        resolver: &dyn ExportResolver,
    ) -> Verdict {
        if import.target().is_within_package(current_package) {
            return Verdict::Allowed;
        }

        let Some((protected, symbols)) = self.subject(import) else {
            return Verdict::Allowed;
        };

        if self.is_friend(current_package, protected) {
            tracing::trace!("{current_package} is a friend of {protected}");
            return Verdict::Allowed;
        }

        let exported = match resolver.resolve(protected) {
            ExportList::Resolved(names) => names,
            ExportList::NotFound => {
                return Verdict::Degraded {
                    protected: protected.clone(),
                }
            }
        };

        let offending: Vec<String> = symbols
            .into_iter()
            .filter(|s| s != STAR && !exported.contains(s))
            .collect();

        if offending.is_empty() {
            Verdict::Allowed
        } else {
            Verdict::Violations {
                protected: protected.clone(),
                symbols: offending,
            }
        }
    }

    /// Picks the protected package an import is judged against, and the
    /// names it pulls out of it.
    fn subject(&self, import: &ImportKind) -> Option<(&QualifiedName, BTreeSet<String>)> {
        match import {
            ImportKind::From { module, names } => {
                let protected = self.closest_protected_ancestor(module)?;
                Some((protected, names.iter().cloned().collect()))
            }
            ImportKind::Plain { name } => {
                let protected = self.closest_strict_ancestor(name)?;
                let remainder = name.remainder_after(protected)?;
                Some((protected, BTreeSet::from([remainder.to_string()])))
            }
        }
    }
}

fn parse_name(raw: &str, context: &str) -> Result<QualifiedName, RuleError> {
    QualifiedName::new(raw).map_err(|source| RuleError::InvalidName {
        context: context.to_string(),
        name: raw.to_string(),
        source,
    })
}
