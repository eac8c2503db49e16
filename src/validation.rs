//! Validation facade
//!
//! [`Validator`] wires a shared [`SchemaProvider`] to a fresh [`Dispatcher`]
//! per document and condenses the outcome into a [`ValidationReport`].
//!
//! ```rust,ignore
//! use xmlislands::rules::RuleSchema;
//! use xmlislands::validation::Validator;
//! use xmlislands::islands::TopLevel;
//!
//! let book = RuleSchema::from_file("book.json")?;
//! let validator = Validator::from_rule_schemas(
//!     vec![book],
//!     TopLevel::Island { namespace: "urn:book".into(), decls: vec![] },
//! )?;
//! let report = validator.validate_file("book.xml")?;
//! assert!(report.valid);
//! ```

use crate::error::{Error, Result, ValidationError};
use crate::events::{EventProducer, NotationDecl, UnparsedEntityDecl};
use crate::islands::{CollectingSink, DispatchOutcome, Dispatcher, SchemaProvider, TopLevel};
use crate::limits::Limits;
use crate::producers::{TreeProducer, XmlReaderProducer};
use crate::rules::RuleSchema;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Result of validating one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// No errors were reported and the document element matched
    pub valid: bool,
    /// Declarations the document element satisfied
    pub root_matches: Vec<String>,
    /// Everything reported, in report order
    pub diagnostics: Vec<ValidationError>,
    /// Notation declarations of the document
    pub notations: Vec<NotationDecl>,
    /// Unparsed entity declarations of the document
    pub unparsed_entities: Vec<UnparsedEntityDecl>,
}

impl ValidationReport {
    fn from_outcome(outcome: DispatchOutcome<CollectingSink>) -> Self {
        let valid = outcome.sink.is_valid() && !outcome.root_matches.is_empty();
        Self {
            valid,
            root_matches: outcome.root_matches.iter().map(|d| d.to_string()).collect(),
            diagnostics: outcome.sink.into_diagnostics(),
            notations: outcome.notations,
            unparsed_entities: outcome.unparsed_entities,
        }
    }

    /// Diagnostics of error severity or worse
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Number of diagnostics of error severity or worse
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

/// Validates documents against a fixed set of island schemas.
///
/// Cloning is cheap and every clone shares the schemas, so one validator can
/// serve many threads.
#[derive(Debug, Clone)]
pub struct Validator {
    provider: Arc<SchemaProvider>,
    limits: Limits,
}

impl Validator {
    /// Create a validator over an assembled provider
    pub fn new(provider: Arc<SchemaProvider>) -> Self {
        Self {
            provider,
            limits: Limits::default(),
        }
    }

    /// Register rule schemas under their namespaces and build a validator.
    ///
    /// Binding problems fail the whole call; the first one is returned.
    pub fn from_rule_schemas(schemas: Vec<RuleSchema>, top_level: TopLevel) -> Result<Self> {
        let mut builder = SchemaProvider::builder().top_level(top_level);
        for schema in schemas {
            let namespace = schema.namespace().to_string();
            builder = builder.add_schema(namespace, Arc::new(schema))?;
        }

        let mut sink = CollectingSink::new();
        let provider = builder.build(&mut sink)?;
        for warning in sink.diagnostics() {
            log::warn!(target: "xmlislands::schema", "{}", warning);
        }
        Ok(Self::new(Arc::new(provider)))
    }

    /// Replace the default limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Registry shared by every validation
    pub fn schema_provider(&self) -> &Arc<SchemaProvider> {
        &self.provider
    }

    /// Limits applied to every document
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Fresh dispatcher for one document
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.provider.clone(), CollectingSink::new()).with_limits(self.limits.clone())
    }

    /// Validate the events of any producer
    pub fn validate_producer<P: EventProducer + ?Sized>(
        &self,
        producer: &mut P,
    ) -> Result<ValidationReport> {
        let mut dispatcher = self.dispatcher();
        dispatcher.attach(producer)?;
        let report = ValidationReport::from_outcome(dispatcher.finish()?);
        log::debug!(
            target: "xmlislands::validate",
            "document {} with {} error(s)",
            if report.valid { "valid" } else { "invalid" },
            report.error_count()
        );
        Ok(report)
    }

    /// Validate a document held in a string
    pub fn validate_str(&self, xml: &str) -> Result<ValidationReport> {
        self.validate_producer(&mut XmlReaderProducer::new(xml))
    }

    /// Validate a UTF-8 encoded document
    pub fn validate_bytes(&self, xml: &[u8]) -> Result<ValidationReport> {
        let xml = std::str::from_utf8(xml)
            .map_err(|e| Error::Xml(format!("document is not UTF-8: {}", e)))?;
        self.validate_str(xml)
    }

    /// Validate a document file; diagnostics carry its path
    pub fn validate_file(&self, path: impl AsRef<Path>) -> Result<ValidationReport> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)?;
        let mut producer =
            XmlReaderProducer::new(&xml).with_system_id(path.display().to_string());
        self.validate_producer(&mut producer)
    }

    /// Validate an already parsed document
    pub fn validate_tree(&self, document: &roxmltree::Document<'_>) -> Result<ValidationReport> {
        self.validate_producer(&mut TreeProducer::new(document))
    }

    /// Whether `xml` validates without errors; parse failures count as invalid
    pub fn is_valid(&self, xml: &str) -> bool {
        self.validate_str(xml).map(|r| r.valid).unwrap_or(false)
    }
}
