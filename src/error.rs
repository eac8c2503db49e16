//! Error types for xmlislands
//!
//! This module defines the crate-wide [`Error`] enum and the
//! [`ValidationError`] diagnostic that verifiers report through an
//! [`ErrorSink`](crate::islands::ErrorSink).

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias using xmlislands Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xmlislands operations
#[derive(Error, Debug)]
pub enum Error {
    /// A validation diagnostic escalated to a hard error
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Schema compilation or binding error
    #[error("schema error: {0}")]
    Schema(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// The event stream broke element nesting
    #[error("structure error: {0}")]
    Structure(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// A feature or property key that a declaration does not know
    #[error("not recognized: {0}")]
    NotRecognized(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// How serious a reported diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, does not affect validity
    Warning,
    /// Recoverable validation mismatch
    Error,
    /// Namespace resolution can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Validation diagnostic with context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Severity the diagnostic was reported with
    pub severity: Severity,
    /// Namespace of the island that reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Qualified name of the offending element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    /// Longer explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Document the position refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    /// 1-based line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    /// 1-based column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u64>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            namespace: None,
            element: None,
            reason: None,
            system_id: None,
            line: None,
            column: None,
        }
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the island namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the element
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the document position
    pub fn with_position(mut self, system_id: Option<&str>, line: u64, column: u64) -> Self {
        self.system_id = system_id.map(str::to_owned);
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Whether this diagnostic makes a document invalid
    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(line), Some(column)) = (self.line, self.column) {
            if let Some(ref system_id) = self.system_id {
                write!(f, "{}:", system_id)?;
            }
            write!(f, "{}:{}: ", line, column)?;
        }
        write!(f, "{}: {}", self.severity, self.message)?;

        if let Some(ref reason) = self.reason {
            write!(f, "\nReason: {}", reason)?;
        }

        if let Some(ref namespace) = self.namespace {
            write!(f, "\nNamespace: {}", namespace)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}
