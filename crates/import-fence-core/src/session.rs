//! Analysis session: frozen rules plus per-module evaluation.
//!
//! ```text
//! AnalysisSession::builder() ... build()     rules compiled once
//!   begin_module("shop.views")   -> ModuleScope   (InModule)
//!     record(import) *
//!   finish(resolver, sink)                        (Idle again)
//! ```
//!
//! The session is never mutated after `build()`, so one session can serve
//! any number of modules, also from several threads.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::dependency::PermissionGraph;
use crate::encapsulation::{EncapsulationPolicy, Verdict};
use crate::event::{ImportEvent, ModuleEvent};
use crate::name::QualifiedName;
use crate::resolver::ExportResolver;
use crate::rule::RuleError;
use crate::sink::ViolationSink;
use crate::types::{DegradedResolution, Location, Severity, Violation, ViolationKind};

/// Errors from driving a session with an out-of-order event stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// An import arrived while no module was open.
    #[error("import of `{import}` outside of any module")]
    ImportOutsideModule {
        /// The imported name.
        import: String,
    },

    /// A module was entered while another one was still open.
    #[error("module `{entered}` entered while `{open}` is still open")]
    NestedModule {
        /// The module still open.
        open: String,
        /// The module that was entered.
        entered: String,
    },

    /// `Exit` arrived while no module was open.
    #[error("module exit without a matching enter")]
    UnmatchedExit,

    /// The stream ended inside a module.
    #[error("event stream ended inside module `{module}`")]
    Unterminated {
        /// The module left open.
        module: String,
    },
}

/// Builder for an [`AnalysisSession`].
#[derive(Debug, Clone)]
pub struct AnalysisSessionBuilder {
    allowed_dependencies: Vec<String>,
    encapsulated_packages: Vec<String>,
    encapsulated_friendships: Vec<String>,
    dependency_severity: Severity,
    encapsulation_severity: Severity,
}

impl Default for AnalysisSessionBuilder {
    fn default() -> Self {
        Self {
            allowed_dependencies: Vec::new(),
            encapsulated_packages: Vec::new(),
            encapsulated_friendships: Vec::new(),
            dependency_severity: Severity::Error,
            encapsulation_severity: Severity::Error,
        }
    }
}

impl AnalysisSessionBuilder {
    /// Creates a builder with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `dependent->dependency` rules.
    #[must_use]
    pub fn allowed_dependencies<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_dependencies
            .extend(rules.into_iter().map(Into::into));
        self
    }

    /// Adds protected package names.
    #[must_use]
    pub fn encapsulated_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encapsulated_packages
            .extend(packages.into_iter().map(Into::into));
        self
    }

    /// Adds `friend->protected` friendships.
    #[must_use]
    pub fn encapsulated_friendships<I, S>(mut self, friendships: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encapsulated_friendships
            .extend(friendships.into_iter().map(Into::into));
        self
    }

    /// Severity of forbidden-dependency violations (default: error).
    #[must_use]
    pub fn dependency_severity(mut self, severity: Severity) -> Self {
        self.dependency_severity = severity;
        self
    }

    /// Severity of encapsulation violations (default: error).
    #[must_use]
    pub fn encapsulation_severity(mut self, severity: Severity) -> Self {
        self.encapsulation_severity = severity;
        self
    }

    /// Compiles all rules.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error; no session is built from
    /// partially compiled rules.
    pub fn build(self) -> Result<AnalysisSession, RuleError> {
        let graph = PermissionGraph::compile(&self.allowed_dependencies)?;
        let policy = EncapsulationPolicy::compile(
            &self.encapsulated_packages,
            &self.encapsulated_friendships,
        )?;
        Ok(AnalysisSession {
            graph,
            policy,
            dependency_severity: self.dependency_severity,
            encapsulation_severity: self.encapsulation_severity,
        })
    }
}

/// Compiled rules shared by every module of a run.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    graph: PermissionGraph,
    policy: EncapsulationPolicy,
    dependency_severity: Severity,
    encapsulation_severity: Severity,
}

impl AnalysisSession {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> AnalysisSessionBuilder {
        AnalysisSessionBuilder::new()
    }

    /// The compiled permission graph.
    #[must_use]
    pub fn graph(&self) -> &PermissionGraph {
        &self.graph
    }

    /// The compiled encapsulation policy.
    #[must_use]
    pub fn policy(&self) -> &EncapsulationPolicy {
        &self.policy
    }

    /// Opens a module. Imports are recorded on the returned scope and
    /// evaluated by [`ModuleScope::finish`].
    #[must_use]
    pub fn begin_module(&self, module: QualifiedName, file: Option<PathBuf>) -> ModuleScope<'_> {
        debug!("entering module {module}");
        ModuleScope {
            session: self,
            package: module.top_level().to_string(),
            module,
            file,
            imported_packages: BTreeMap::new(),
            imports: Vec::new(),
        }
    }

    /// Drives the session with a raw event stream.
    ///
    /// Returns the number of modules evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the stream is out of order. Modules
    /// finished before the error have already reported to `sink`.
    pub fn run<I>(
        &self,
        events: I,
        resolver: &dyn ExportResolver,
        sink: &mut dyn ViolationSink,
    ) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = ModuleEvent>,
    {
        let mut current: Option<ModuleScope<'_>> = None;
        let mut finished = 0;

        for event in events {
            match event {
                ModuleEvent::Enter { module, file } => {
                    if let Some(open) = &current {
                        return Err(SessionError::NestedModule {
                            open: open.module.to_string(),
                            entered: module.to_string(),
                        });
                    }
                    current = Some(self.begin_module(module, file));
                }
                ModuleEvent::Import(import) => match current.as_mut() {
                    Some(open) => open.record(import),
                    None => {
                        return Err(SessionError::ImportOutsideModule {
                            import: import.kind.target().to_string(),
                        })
                    }
                },
                ModuleEvent::Exit => {
                    let scope = current.take().ok_or(SessionError::UnmatchedExit)?;
                    scope.finish(resolver, sink);
                    finished += 1;
                }
            }
        }

        match current {
            Some(open) => Err(SessionError::Unterminated {
                module: open.module.to_string(),
            }),
            None => Ok(finished),
        }
    }
}

/// Accumulated imports of the module currently being visited.
#[derive(Debug)]
pub struct ModuleScope<'s> {
    session: &'s AnalysisSession,
    module: QualifiedName,
    package: String,
    file: Option<PathBuf>,
    /// top-level package -> location of its first import
    imported_packages: BTreeMap<String, Option<Location>>,
    imports: Vec<ImportEvent>,
}

impl ModuleScope<'_> {
    /// The module being visited.
    #[must_use]
    pub fn module(&self) -> &QualifiedName {
        &self.module
    }

    /// Records one import.
    pub fn record(&mut self, import: ImportEvent) {
        self.imported_packages
            .entry(import.kind.top_level().to_string())
            .or_insert_with(|| import.location.clone());
        self.imports.push(import);
    }

    /// Evaluates everything recorded and reports to `sink`.
    pub fn finish(self, resolver: &dyn ExportResolver, sink: &mut dyn ViolationSink) {
        self.check_dependencies(sink);
        self.check_encapsulation(resolver, sink);
        debug!("leaving module {}", self.module);
    }

    fn check_dependencies(&self, sink: &mut dyn ViolationSink) {
        let imported = self.imported_packages.keys().map(String::as_str);
        for forbidden in self.session.graph.evaluate(&self.package, imported) {
            let location = self
                .imported_packages
                .get(&forbidden.offending_package)
                .cloned()
                .flatten()
                .or_else(|| self.module_location());
            let kind = ViolationKind::ForbiddenDependency {
                offending_package: forbidden.offending_package,
                importing_package: forbidden.importing_package,
            };
            sink.report(
                Violation::new(kind, self.session.dependency_severity, self.module.as_str())
                    .with_location(location),
            );
        }
    }

    fn check_encapsulation(&self, resolver: &dyn ExportResolver, sink: &mut dyn ViolationSink) {
        if self.session.policy.is_empty() {
            return;
        }

        let mut degraded: BTreeSet<QualifiedName> = BTreeSet::new();

        for import in &self.imports {
            match self
                .session
                .policy
                .evaluate(&self.package, &import.kind, resolver)
            {
                Verdict::Allowed => {}
                Verdict::Degraded { protected } => {
                    if degraded.insert(protected.clone()) {
                        warn!("protected package `{protected}` does not define __all__; imports from it are not checked");
                        sink.degraded(DegradedResolution {
                            module: self.module.to_string(),
                            protected_package: protected.to_string(),
                            location: import.location.clone(),
                        });
                    }
                }
                Verdict::Violations { protected, symbols } => {
                    for symbol in symbols {
                        let kind = ViolationKind::EncapsulationViolated {
                            offending_symbol: symbol,
                            protected_package: protected.to_string(),
                        };
                        sink.report(
                            Violation::new(
                                kind,
                                self.session.encapsulation_severity,
                                self.module.as_str(),
                            )
                            .with_location(
                                import.location.clone().or_else(|| self.module_location()),
                            ),
                        );
                    }
                }
            }
        }
    }

    fn module_location(&self) -> Option<Location> {
        self.file.as_ref().map(|f| Location::new(f.clone(), 1, 1))
    }
}
