//! # xmlislands
//!
//! Validation of XML documents that mix several namespaces, each with its
//! own grammar.
//!
//! A document is cut into *islands*: subtrees whose elements belong to one
//! namespace. Every island is checked by a verifier created from the schema
//! registered for its namespace, and reports back which declarations it
//! satisfied so that the enclosing island can check it as a child.
//!
//! ## Features
//!
//! - Event-driven [`Dispatcher`](islands::Dispatcher) with explicit island
//!   and namespace stacks
//! - Pluggable schema languages through [`IslandSchema`](islands::IslandSchema)
//!   and [`IslandHandler`](islands::IslandHandler)
//! - A built-in JSON [rule schema](rules) language
//! - Streaming input through `quick-xml`, tree input through `roxmltree`
//! - Resource [`Limits`](limits::Limits) for untrusted documents
//!
//! ## Example
//!
//! ```rust,ignore
//! use xmlislands::islands::TopLevel;
//! use xmlislands::rules::RuleSchema;
//! use xmlislands::validation::Validator;
//!
//! let validator = Validator::from_rule_schemas(
//!     vec![RuleSchema::from_file("book.json")?, RuleSchema::from_file("figure.json")?],
//!     TopLevel::Island { namespace: "urn:example:book".into(), decls: vec![] },
//! )?;
//!
//! let report = validator.validate_file("book.xml")?;
//! for diagnostic in &report.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and scopes
pub mod names;
pub mod namespaces;

// Event model
pub mod events;
pub mod producers;

// Dispatching
pub mod islands;
pub mod rules;

// Facade
pub mod validation;

// Re-exports for convenience
pub use error::{Error, Result, Severity, ValidationError};
pub use events::{EventProducer, EventSink};
pub use islands::{Dispatcher, SchemaProvider};
pub use validation::{ValidationReport, Validator};

/// Version of the xmlislands library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
