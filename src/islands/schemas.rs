//! Island schema contract

use super::decls::{AttributesDecl, ElementDecl};
use super::providers::SchemaProvider;
use super::sinks::ErrorSink;
use super::verifiers::{AttributesVerifier, IslandVerifier};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Compiled grammar for one namespace.
///
/// A schema is built once, bound once, and then shared read-only between
/// any number of concurrently validated documents.
pub trait IslandSchema: fmt::Debug + Send + Sync {
    /// Create a verifier for one island occurrence that shall try `decls`
    fn create_new_verifier(&self, namespace: &str, decls: &[Arc<ElementDecl>]) -> IslandVerifier;

    /// Exported element declaration called `name`
    fn element_decl(&self, name: &str) -> Option<Arc<ElementDecl>>;

    /// All exported element declarations
    fn element_decls(&self) -> &[Arc<ElementDecl>];

    /// Exported attributes declaration called `name`
    fn attributes_decl(&self, name: &str) -> Option<Arc<AttributesDecl>>;

    /// All exported attributes declarations
    fn attributes_decls(&self) -> &[Arc<AttributesDecl>];

    /// Create a verifier for the attributes of `namespace` on one element
    fn create_new_attributes_verifier(
        &self,
        namespace: &str,
        decls: &[Arc<AttributesDecl>],
    ) -> Box<dyn AttributesVerifier>;

    /// Resolve references to other namespaces' declarations.
    ///
    /// Called exactly once, before the first document. Problems are reported
    /// to `sink` first and then returned as an error.
    fn bind(&self, provider: &SchemaProvider, sink: &mut dyn ErrorSink) -> Result<()>;
}
