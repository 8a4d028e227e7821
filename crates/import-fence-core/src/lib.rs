//! # import-fence-core
//!
//! Rule engine for import boundaries between top-level Python packages.
//!
//! Two rules are evaluated per module:
//!
//! - **Dependencies** ([`PermissionGraph`]): a package that appears in any
//!   `dependent->dependency` rule may only be imported by packages the
//!   rules allow.
//! - **Encapsulation** ([`EncapsulationPolicy`]): only names listed in a
//!   protected package's `__all__` may be imported from outside it, unless
//!   the importer is a declared friend.
//!
//! The engine knows nothing about parsing. A front end feeds module
//! enter/import/exit events into an [`AnalysisSession`], supplies an
//! [`ExportResolver`] for `__all__` lookups and collects findings through a
//! [`ViolationSink`].
//!
//! ## Example
//!
//! ```
//! use import_fence_core::{AnalysisSession, ImportEvent, LintResult, QualifiedName, StaticExports};
//!
//! let session = AnalysisSession::builder()
//!     .allowed_dependencies(["shop->catalog"])
//!     .encapsulated_packages(["catalog"])
//!     .build()?;
//!
//! let exports = StaticExports::new().with("catalog", ["Product"]);
//!
//! let mut scope = session.begin_module(QualifiedName::new("shop.views")?, None);
//! scope.record(ImportEvent::from_import(QualifiedName::new("catalog")?, ["Product", "_cache"]));
//!
//! let mut result = LintResult::new();
//! scope.finish(&exports, &mut result);
//!
//! assert_eq!(result.violations.len(), 1);
//! assert_eq!(result.violations[0].code, "IF002");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dependency;
mod encapsulation;
mod event;
mod resolver;
mod rule;
mod session;
mod sink;
mod types;

/// Dotted module names.
pub mod name;

pub use config::{
    AnalyzerConfig, Config, ConfigError, DependenciesConfig, EncapsulationConfig, PYPROJECT_TABLE,
};
pub use dependency::{ForbiddenDependency, PermissionGraph};
pub use encapsulation::{EncapsulationPolicy, Verdict};
pub use event::{ImportEvent, ImportKind, ModuleEvent};
pub use name::{NameError, QualifiedName};
pub use resolver::{ExportList, ExportResolver, StaticExports};
pub use rule::{
    Edge, RuleError, RuleInfo, ENCAPSULATION_VIOLATED, FORBIDDEN_DEPENDENCY, RULES, WILDCARD,
};
pub use session::{AnalysisSession, AnalysisSessionBuilder, ModuleScope, SessionError};
pub use sink::ViolationSink;
pub use types::{DegradedResolution, LintResult, Location, Severity, Violation, ViolationKind};
