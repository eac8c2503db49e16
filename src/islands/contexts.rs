//! Borrowed handles the dispatcher lends to verifiers
//!
//! A verifier never owns a reference back to the dispatcher. Each call gets a
//! [`VerifierContext`] for the duration of the call; `start_element` gets an
//! [`OpenContext`], the only place a verifier switch can be requested.

use super::providers::SchemaProvider;
use super::sinks::ErrorSink;
use super::verifiers::IslandVerifier;
use crate::error::{Severity, ValidationError};
use crate::events::Locator;
use std::ops::{Deref, DerefMut};

/// Per-call access to the schema provider, the error sink and the position
pub struct VerifierContext<'a> {
    provider: &'a SchemaProvider,
    sink: &'a mut dyn ErrorSink,
    locator: Option<&'a Locator>,
}

impl<'a> VerifierContext<'a> {
    /// Create a context
    pub fn new(
        provider: &'a SchemaProvider,
        sink: &'a mut dyn ErrorSink,
        locator: Option<&'a Locator>,
    ) -> Self {
        Self {
            provider,
            sink,
            locator,
        }
    }

    /// Registry of island schemas
    pub fn schema_provider(&self) -> &'a SchemaProvider {
        self.provider
    }

    /// Raw error sink; prefer the reporting helpers, which add the position
    pub fn error_sink(&mut self) -> &mut dyn ErrorSink {
        &mut *self.sink
    }

    /// Position of the event being delivered
    pub fn locator(&self) -> Option<&'a Locator> {
        self.locator
    }

    /// Report a warning at the current position
    pub fn warning(&mut self, error: ValidationError) {
        self.report(error.with_severity(Severity::Warning));
    }

    /// Report a recoverable error at the current position
    pub fn error(&mut self, error: ValidationError) {
        self.report(error.with_severity(Severity::Error));
    }

    /// Report a fatal error at the current position
    pub fn fatal_error(&mut self, error: ValidationError) {
        self.report(error.with_severity(Severity::Fatal));
    }

    fn report(&mut self, mut error: ValidationError) {
        if error.line.is_none() {
            if let Some(locator) = self.locator {
                error = error.with_position(
                    locator.system_id.as_deref(),
                    locator.line,
                    locator.column,
                );
            }
        }
        log::debug!(target: "xmlislands::verify", "{}", error);
        self.sink.report(error);
    }
}

/// Context of a `start_element` call.
///
/// Dereferences to [`VerifierContext`] and adds
/// [`switch_verifier`](Self::switch_verifier).
pub struct OpenContext<'a> {
    inner: VerifierContext<'a>,
    switch: Option<IslandVerifier>,
}

impl<'a> OpenContext<'a> {
    /// Wrap a context for one `start_element` call
    pub fn new(inner: VerifierContext<'a>) -> Self {
        Self {
            inner,
            switch: None,
        }
    }

    /// Hand the element being opened, and its subtree, to `verifier`.
    ///
    /// The dispatcher applies the switch when the current call returns and
    /// then replays the same `start_element` into `verifier`. A second call
    /// within the same `start_element` replaces the first.
    pub fn switch_verifier(&mut self, verifier: IslandVerifier) {
        if let Some(previous) = self.switch.replace(verifier) {
            log::warn!(
                target: "xmlislands::dispatch",
                "switch to {} replaced by a later request",
                previous.kind()
            );
        }
    }

    /// Whether a switch was requested during this call
    pub fn has_switch(&self) -> bool {
        self.switch.is_some()
    }

    /// Consume the context, yielding the requested switch
    pub fn into_switch(self) -> Option<IslandVerifier> {
        self.switch
    }
}

impl<'a> Deref for OpenContext<'a> {
    type Target = VerifierContext<'a>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<'a> DerefMut for OpenContext<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
