//! Dotted module names.
//!
//! Everything the rule engine reasons about (modules, packages, protected
//! packages) is a [`QualifiedName`]. Ancestry is decided on whole segments,
//! so `shop` is an ancestor of `shop.views` but not of `shopping`.

use std::fmt;

/// Errors from constructing a [`QualifiedName`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// The name was empty.
    #[error("module name must not be empty")]
    Empty,

    /// A segment between dots was empty (e.g. `a..b`, `.a`, `a.`).
    #[error("module name `{name}` has an empty segment")]
    EmptySegment {
        /// The offending name.
        name: String,
    },

    /// A segment contained whitespace.
    #[error("module name `{name}` contains whitespace")]
    Whitespace {
        /// The offending name.
        name: String,
    },
}

/// A validated, immutable dotted module name such as `auctions.domain.models`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Creates a new qualified name.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or has an empty segment.
    pub fn new(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.split('.').any(str::is_empty) {
            return Err(NameError::EmptySegment {
                name: name.to_string(),
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(NameError::Whitespace {
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    /// Builds a name from already-validated segments.
    ///
    /// # Errors
    ///
    /// Returns error if `segments` is empty or any segment is invalid.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self::new(&joined)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First dotted segment: the top-level package.
    #[must_use]
    pub fn top_level(&self) -> &str {
        top_package(&self.0)
    }

    /// Iterates over the dotted segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Number of dotted segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.0.split('.').count()
    }

    /// The dotted part below `ancestor` (`b.c` for `a.b.c` under `a`), or
    /// `None` unless this is a strict descendant of it.
    #[must_use]
    pub fn remainder_after(&self, ancestor: &QualifiedName) -> Option<&str> {
        self.0.strip_prefix(ancestor.as_str())?.strip_prefix('.')
    }

    /// Returns the enclosing package (`a.b` for `a.b.c`), or `None` for a
    /// top-level name.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// Returns a new name with `child` appended.
    ///
    /// # Errors
    ///
    /// Returns error if `child` is not a valid name.
    pub fn join(&self, child: &str) -> Result<Self, NameError> {
        Self::new(&format!("{}.{child}", self.0))
    }

    /// Tests whether `self` equals `ancestor` or lives below it.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &QualifiedName) -> bool {
        is_submodule(&self.0, &ancestor.0)
    }

    /// Tests whether `self` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_strict_descendant_of(&self, ancestor: &QualifiedName) -> bool {
        self.0.len() > ancestor.0.len() && self.is_descendant_of(ancestor)
    }

    /// Tests whether `self` belongs to the given top-level package.
    #[must_use]
    pub fn is_within_package(&self, package: &str) -> bool {
        is_submodule(&self.0, package)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for QualifiedName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for QualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extracts the top-level package from a dotted name.
///
/// ```
/// use import_fence_core::name::top_package;
///
/// assert_eq!(top_package("shop.views.cart"), "shop");
/// assert_eq!(top_package("shop"), "shop");
/// ```
#[must_use]
pub fn top_package(name: &str) -> &str {
    name.split_once('.').map_or(name, |(top, _)| top)
}

/// Checks whether `candidate` is `package` itself or one of its submodules.
///
/// Matches whole segments only: `shopping` is not a submodule of `shop`.
#[must_use]
pub fn is_submodule(candidate: &str, package: &str) -> bool {
    candidate == package
        || (candidate.starts_with(package)
            && candidate.as_bytes().get(package.len()) == Some(&b'.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qn(s: &str) -> QualifiedName {
        QualifiedName::new(s).unwrap()
    }

    #[test]
    fn rejects_empty_and_broken_names() {
        assert_eq!(QualifiedName::new(""), Err(NameError::Empty));
        assert!(matches!(
            QualifiedName::new("a..b"),
            Err(NameError::EmptySegment { .. })
        ));
        assert!(matches!(
            QualifiedName::new(".a"),
            Err(NameError::EmptySegment { .. })
        ));
        assert!(matches!(
            QualifiedName::new("a."),
            Err(NameError::EmptySegment { .. })
        ));
        assert!(matches!(
            QualifiedName::new("a. b"),
            Err(NameError::Whitespace { .. })
        ));
    }

    #[test]
    fn top_level_is_first_segment() {
        assert_eq!(qn("auctions.domain.bid").top_level(), "auctions");
        assert_eq!(qn("auctions").top_level(), "auctions");
    }

    #[test]
    fn segments_and_counts() {
        let name = qn("a.b.c");
        assert_eq!(name.segment_count(), 3);
        assert_eq!(name.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(name.remainder_after(&qn("a")), Some("b.c"));
        assert_eq!(name.remainder_after(&qn("a.b")), Some("c"));
        assert_eq!(name.remainder_after(&qn("a.b.c")), None);
        assert_eq!(qn("ab.c").remainder_after(&qn("a")), None);
    }

    #[test]
    fn parent_and_join() {
        assert_eq!(qn("a.b.c").parent(), Some(qn("a.b")));
        assert_eq!(qn("a").parent(), None);
        assert_eq!(qn("a.b").join("c").unwrap(), qn("a.b.c"));
        assert!(qn("a").join("").is_err());
    }

    #[test]
    fn from_segments_joins_with_dots() {
        assert_eq!(
            QualifiedName::from_segments(["shop", "views"]).unwrap(),
            qn("shop.views")
        );
        assert!(QualifiedName::from_segments(Vec::<&str>::new()).is_err());
    }

    #[test]
    fn descendant_matches_whole_segments() {
        assert!(qn("auctions.domain").is_descendant_of(&qn("auctions")));
        assert!(qn("auctions").is_descendant_of(&qn("auctions")));
        assert!(!qn("auctionsx.domain").is_descendant_of(&qn("auctions")));
        assert!(!qn("auctions").is_descendant_of(&qn("auctions.domain")));
    }

    #[test]
    fn strict_descendant_excludes_self() {
        assert!(qn("a.b").is_strict_descendant_of(&qn("a")));
        assert!(!qn("a").is_strict_descendant_of(&qn("a")));
    }

    #[test]
    fn within_package() {
        assert!(qn("shop.views").is_within_package("shop"));
        assert!(!qn("shopping.views").is_within_package("shop"));
    }

    #[test]
    fn free_functions() {
        assert_eq!(top_package("x.y"), "x");
        assert!(is_submodule("x.y.z", "x.y"));
        assert!(!is_submodule("x.yz", "x.y"));
    }
}
