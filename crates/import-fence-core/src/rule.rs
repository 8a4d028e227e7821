//! Rule string parsing and the rule catalogue.
//!
//! Both dependency rules and friendships are written as
//! `"left->right"` edges. Parsing is shared; interpretation of each side
//! lives with the engine that compiles them.

use miette::Diagnostic;

use crate::name::NameError;

/// Marker accepted on either side of a dependency rule.
pub const WILDCARD: &str = "*";

const SEPARATOR: &str = "->";

/// Configuration errors raised while compiling rules.
///
/// These are fatal: a session is never built from partially compiled rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum RuleError {
    /// Rule string is not exactly `left->right` with both sides present.
    #[error("{context}: malformed rule `{rule}`, expected `dependent->dependency`")]
    #[diagnostic(
        code(import_fence::rule::malformed),
        help("write each rule as `a->b`; use `*` on one side for wildcards")
    )]
    Malformed {
        /// Which rule list the entry came from.
        context: String,
        /// The raw rule text.
        rule: String,
    },

    /// A protected package name is not a valid dotted name.
    #[error("{context}: invalid package name `{name}`: {source}")]
    #[diagnostic(code(import_fence::rule::invalid_name))]
    InvalidName {
        /// Which rule list the entry came from.
        context: String,
        /// The raw name.
        name: String,
        /// Underlying validation error.
        source: NameError,
    },

    /// Friendships name concrete packages; `*` has no meaning there.
    #[error("{context}: wildcard is not allowed in friendship `{rule}`")]
    #[diagnostic(
        code(import_fence::rule::wildcard_friendship),
        help("list every friend package explicitly")
    )]
    WildcardFriendship {
        /// Which rule list the entry came from.
        context: String,
        /// The raw rule text.
        rule: String,
    },
}

/// One parsed `left->right` edge, sides trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Left-hand side (dependent, or friend).
    pub from: String,
    /// Right-hand side (dependency, or protected package).
    pub to: String,
}

impl Edge {
    /// Parses `raw` as an edge.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Malformed`] unless `raw` holds exactly one `->`
    /// with a non-empty token on each side.
    pub fn parse(raw: &str, context: &str) -> Result<Self, RuleError> {
        let malformed = || RuleError::Malformed {
            context: context.to_string(),
            rule: raw.to_string(),
        };

        let parts: Vec<&str> = raw.split(SEPARATOR).map(str::trim).collect();
        let [from, to] = parts.as_slice() else {
            return Err(malformed());
        };
        if from.is_empty() || to.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            from: (*from).to_string(),
            to: (*to).to_string(),
        })
    }

    /// True if the left-hand side is the wildcard marker.
    #[must_use]
    pub fn from_is_wildcard(&self) -> bool {
        self.from == WILDCARD
    }

    /// True if the right-hand side is the wildcard marker.
    #[must_use]
    pub fn to_is_wildcard(&self) -> bool {
        self.to == WILDCARD
    }
}

/// Static description of a built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInfo {
    /// Rule code (e.g., "IF001").
    pub code: &'static str,
    /// Kebab-case rule name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
}

/// Imports of restricted packages without a permitting edge.
pub const FORBIDDEN_DEPENDENCY: RuleInfo = RuleInfo {
    code: "IF001",
    name: "forbidden-dependency",
    description: "Package imports a restricted package it has no permission for",
};

/// Imports of names missing from a protected package's export list.
pub const ENCAPSULATION_VIOLATED: RuleInfo = RuleInfo {
    code: "IF002",
    name: "encapsulation-violated",
    description: "Import reaches a name a protected package does not export",
};

/// All built-in rules.
pub const RULES: &[RuleInfo] = &[FORBIDDEN_DEPENDENCY, ENCAPSULATION_VIOLATED];
