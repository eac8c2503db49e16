//! Error sinks
//!
//! Verifiers never fail on invalid content. They report through an
//! [`ErrorSink`] and carry on with a best-effort result.

use crate::error::{Severity, ValidationError};

/// Receiver of validation diagnostics
pub trait ErrorSink {
    /// Report something that does not affect validity
    fn warning(&mut self, error: ValidationError);

    /// Report a recoverable validation mismatch
    fn error(&mut self, error: ValidationError);

    /// Report a condition after which namespace resolution is unreliable
    fn fatal_error(&mut self, error: ValidationError);

    /// Dispatch on the severity carried by `error`
    fn report(&mut self, error: ValidationError) {
        match error.severity {
            Severity::Warning => self.warning(error),
            Severity::Error => self.error(error),
            Severity::Fatal => self.fatal_error(error),
        }
    }
}

impl<S: ErrorSink + ?Sized> ErrorSink for &mut S {
    fn warning(&mut self, error: ValidationError) {
        (**self).warning(error)
    }

    fn error(&mut self, error: ValidationError) {
        (**self).error(error)
    }

    fn fatal_error(&mut self, error: ValidationError) {
        (**self).fatal_error(error)
    }
}

/// Sink that drops every diagnostic
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn warning(&mut self, _error: ValidationError) {}
    fn error(&mut self, _error: ValidationError) {}
    fn fatal_error(&mut self, _error: ValidationError) {}
}

/// Sink that keeps every diagnostic in report order
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    diagnostics: Vec<ValidationError>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far
    pub fn diagnostics(&self) -> &[ValidationError] {
        &self.diagnostics
    }

    /// Take the diagnostics out of the sink
    pub fn into_diagnostics(self) -> Vec<ValidationError> {
        self.diagnostics
    }

    /// Number of diagnostics of error severity or worse
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Whether nothing worse than a warning was reported
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    fn push(&mut self, error: ValidationError, severity: Severity) {
        self.diagnostics.push(error.with_severity(severity));
    }
}

impl ErrorSink for CollectingSink {
    fn warning(&mut self, error: ValidationError) {
        self.push(error, Severity::Warning);
    }

    fn error(&mut self, error: ValidationError) {
        self.push(error, Severity::Error);
    }

    fn fatal_error(&mut self, error: ValidationError) {
        self.push(error, Severity::Fatal);
    }
}
