//! Where violations go.

use crate::types::{DegradedResolution, LintResult, Violation};

/// Receives violations and degraded-resolution signals.
///
/// The engine does not care how they are rendered or aggregated.
pub trait ViolationSink {
    /// Accepts a violation.
    fn report(&mut self, violation: Violation);

    /// Accepts a degraded-resolution signal. Ignored by default.
    fn degraded(&mut self, signal: DegradedResolution) {
        let _ = signal;
    }
}

impl ViolationSink for LintResult {
    fn report(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    fn degraded(&mut self, signal: DegradedResolution) {
        self.degraded.push(signal);
    }
}

impl ViolationSink for Vec<Violation> {
    fn report(&mut self, violation: Violation) {
        self.push(violation);
    }
}
