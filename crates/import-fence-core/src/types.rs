//! Core types for violations and results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::rule::{RuleInfo, ENCAPSULATION_VIOLATED, FORBIDDEN_DEPENDENCY};

/// Severity level for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to project root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// What a violation is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ViolationKind {
    /// A package imported a restricted package it has no permission for.
    ForbiddenDependency {
        /// The restricted package that was imported.
        offending_package: String,
        /// Top-level package of the importing module.
        importing_package: String,
    },
    /// An import reached a name a protected package does not export.
    EncapsulationViolated {
        /// The imported name missing from the export list.
        offending_symbol: String,
        /// The closest protected ancestor of the import.
        protected_package: String,
    },
}

impl ViolationKind {
    /// The rule this kind belongs to.
    #[must_use]
    pub fn rule(&self) -> RuleInfo {
        match self {
            Self::ForbiddenDependency { .. } => FORBIDDEN_DEPENDENCY,
            Self::EncapsulationViolated { .. } => ENCAPSULATION_VIOLATED,
        }
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::ForbiddenDependency {
                offending_package,
                importing_package,
            } => format!("\"{offending_package}\" must not be imported by \"{importing_package}\""),
            Self::EncapsulationViolated {
                offending_symbol,
                protected_package,
            } => format!(
                "\"{offending_symbol}\" is a private detail of \"{protected_package}\" and must not be imported"
            ),
        }
    }
}

/// A violation found during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code (e.g., "IF001").
    pub code: String,
    /// Rule name (e.g., "forbidden-dependency").
    pub rule: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Structured payload.
    #[serde(flatten)]
    pub kind: ViolationKind,
    /// Module being analyzed when the violation was found.
    pub module: String,
    /// Where the offending import sits, when the feed knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Human-readable message.
    pub message: String,
}

impl Violation {
    /// Creates a new violation; code, rule and message derive from `kind`.
    #[must_use]
    pub fn new(kind: ViolationKind, severity: Severity, module: impl Into<String>) -> Self {
        let rule = kind.rule();
        Self {
            code: rule.code.to_string(),
            rule: rule.name.to_string(),
            severity,
            message: kind.message(),
            kind,
            module: module.into(),
            location: None,
        }
    }

    /// Attaches a location.
    #[must_use]
    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// `file:line:col` when located, otherwise the module name.
    #[must_use]
    pub fn position(&self) -> String {
        match &self.location {
            Some(loc) => format!("{}:{}:{}", loc.file.display(), loc.line, loc.column),
            None => self.module.clone(),
        }
    }

    /// Formats the violation for terminal output, printing `severity` as the
    /// severity label so callers can style it.
    #[must_use]
    pub fn format(&self, severity: &str) -> String {
        use std::fmt::Write;
        let mut output = format!("{} {} at {}\n", self.code, self.rule, self.position());
        let _ = writeln!(output, "  {severity}: {}", self.message);
        if let Some(help) = self.help() {
            let _ = writeln!(output, "  = help: {help}");
        }
        output
    }

    /// Suggested fix, if one can be phrased.
    #[must_use]
    pub fn help(&self) -> Option<String> {
        match &self.kind {
            ViolationKind::ForbiddenDependency {
                offending_package,
                importing_package,
            } => Some(format!(
                "add \"{importing_package}->{offending_package}\" to [dependencies].allowed if this edge is intended"
            )),
            ViolationKind::EncapsulationViolated {
                protected_package, ..
            } => Some(format!(
                "import only names listed in `{protected_package}.__all__`"
            )),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.position(),
            self.severity,
            self.code,
            self.message
        )
    }
}

/// A protected package was imported but no export list could be resolved.
///
/// Analysis continues fail-open; this record only tells the user that the
/// package cannot be checked yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedResolution {
    /// Module being analyzed.
    pub module: String,
    /// Protected package without a resolvable export list.
    pub protected_package: String,
    /// First import that triggered the lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl std::fmt::Display for DegradedResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "protected package \"{}\" does not define __all__ (imported by \"{}\")",
            self.protected_package, self.module
        )
    }
}

/// Result of running an analysis.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All violations found.
    pub violations: Vec<Violation>,
    /// Protected packages that could not be checked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<DegradedResolution>,
    /// Number of modules checked.
    pub modules_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Counts violations by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |s: Severity| self.violations.iter().filter(|v| v.severity == s).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Sorts violations by file, line, column, then message, and degraded
    /// signals by module.
    pub fn sort(&mut self) {
        self.degraded.sort_by(|a, b| {
            a.module
                .cmp(&b.module)
                .then_with(|| a.protected_package.cmp(&b.protected_package))
        });
        self.violations.sort_by(|a, b| {
            a.location
                .cmp(&b.location)
                .then_with(|| a.module.cmp(&b.module))
                .then_with(|| a.message.cmp(&b.message))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forbidden(severity: Severity) -> Violation {
        Violation::new(
            ViolationKind::ForbiddenDependency {
                offending_package: "billing".into(),
                importing_package: "shop".into(),
            },
            severity,
            "shop.views",
        )
    }

    #[test]
    fn new_fills_code_rule_and_message() {
        let v = forbidden(Severity::Error);
        assert_eq!(v.code, "IF001");
        assert_eq!(v.rule, "forbidden-dependency");
        assert!(v.message.contains("\"billing\""));
        assert!(v.location.is_none());
    }

    #[test]
    fn display_with_location() {
        let v = forbidden(Severity::Error)
            .with_location(Some(Location::new("shop/views.py", 3, 1)));
        insta::assert_snapshot!(
            v.to_string(),
            @r#"shop/views.py:3:1: error [IF001] "billing" must not be imported by "shop""#
        );
    }

    #[test]
    fn display_without_location_uses_module() {
        let v = Violation::new(
            ViolationKind::EncapsulationViolated {
                offending_symbol: "Internal".into(),
                protected_package: "auctions.domain".into(),
            },
            Severity::Warning,
            "shop.views",
        );
        insta::assert_snapshot!(
            v.to_string(),
            @r#"shop.views: warning [IF002] "Internal" is a private detail of "auctions.domain" and must not be imported"#
        );
    }

    #[test]
    fn format_includes_help() {
        let formatted = forbidden(Severity::Error).format("error");
        assert!(formatted.starts_with("IF001 forbidden-dependency at shop.views\n  error: "));
        assert!(formatted.contains("= help: add \"shop->billing\""));
    }

    #[test]
    fn serializes_kind_tag() {
        let json = serde_json::to_value(forbidden(Severity::Error)).unwrap();
        assert_eq!(json["kind"], "forbidden-dependency");
        assert_eq!(json["offending_package"], "billing");
        assert_eq!(json["importing_package"], "shop");
        assert!(json.get("location").is_none());
    }

    #[test]
    fn has_violations_at_threshold() {
        let mut result = LintResult::new();
        result.violations.push(forbidden(Severity::Warning));
        assert!(!result.has_violations_at(Severity::Error));
        assert!(result.has_violations_at(Severity::Warning));
        assert!(result.has_violations_at(Severity::Info));
    }

    #[test]
    fn count_by_severity_buckets() {
        let mut result = LintResult::new();
        result.violations.push(forbidden(Severity::Error));
        result.violations.push(forbidden(Severity::Error));
        result.violations.push(forbidden(Severity::Info));
        assert_eq!(result.count_by_severity(), (2, 0, 1));
    }

    #[test]
    fn sort_orders_by_location() {
        let mut result = LintResult::new();
        result.violations.push(
            forbidden(Severity::Error).with_location(Some(Location::new("b.py", 1, 1))),
        );
        result.violations.push(
            forbidden(Severity::Error).with_location(Some(Location::new("a.py", 9, 1))),
        );
        result.sort();
        let files: Vec<_> = result
            .violations
            .iter()
            .map(|v| v.location.as_ref().unwrap().file.clone())
            .collect();
        assert_eq!(files, vec![PathBuf::from("a.py"), PathBuf::from("b.py")]);
    }
}
