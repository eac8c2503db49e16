//! Pass-through handling for namespaces without a grammar
//!
//! [`IgnoredSchema`] exports whatever an importer asks for and accepts
//! anything. [`IgnoreVerifier`] skips its own namespace and every
//! unregistered one, but hands off to a real verifier as soon as it meets an
//! element whose namespace has a schema.

use super::contexts::{OpenContext, VerifierContext};
use super::decls::{AttributesDecl, ElementDecl, ANY_ATTRIBUTES, ANY_ELEMENT};
use super::providers::SchemaProvider;
use super::schemas::IslandSchema;
use super::sinks::ErrorSink;
use super::verifiers::{AttributesVerifier, IslandHandler, IslandVerifier};
use crate::error::Result;
use crate::events::{Attribute, Attributes};
use once_cell::sync::Lazy;
use std::sync::Arc;

static ANY_ELEMENTS: Lazy<[Arc<ElementDecl>; 1]> = Lazy::new(|| [ANY_ELEMENT.clone()]);
static ANY_ATTRIBUTE_SETS: Lazy<[Arc<AttributesDecl>; 1]> =
    Lazy::new(|| [ANY_ATTRIBUTES.clone()]);

/// Verifier that validates nothing and reports its rules as satisfied
#[derive(Debug, Clone)]
pub struct IgnoreVerifier {
    namespace: String,
    rules: Vec<Arc<ElementDecl>>,
}

impl IgnoreVerifier {
    /// Ignore `namespace`; `rules` are reported as satisfied on close
    pub fn new(namespace: impl Into<String>, rules: Vec<Arc<ElementDecl>>) -> Self {
        Self {
            namespace: namespace.into(),
            rules,
        }
    }

    /// Namespace being ignored
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl IslandHandler for IgnoreVerifier {
    fn start_element(
        &mut self,
        cx: &mut OpenContext<'_>,
        namespace: &str,
        _local_name: &str,
        qualified_name: &str,
        _attributes: &Attributes,
    ) {
        if namespace == self.namespace {
            return;
        }
        let Some(schema) = cx.schema_provider().schema(namespace) else {
            return;
        };
        log::trace!(
            target: "xmlislands::dispatch",
            "adopting <{}> in '{}' from ignored '{}'",
            qualified_name,
            namespace,
            self.namespace
        );
        let verifier = schema.create_new_verifier(namespace, schema.element_decls());
        cx.switch_verifier(verifier);
    }

    fn end_element(
        &mut self,
        _cx: &mut VerifierContext<'_>,
        _namespace: &str,
        _local_name: &str,
        _qualified_name: &str,
    ) {
    }

    fn end_island(&mut self, _cx: &mut VerifierContext<'_>) -> Vec<Arc<ElementDecl>> {
        self.rules.clone()
    }

    fn end_child_island(
        &mut self,
        _cx: &mut VerifierContext<'_>,
        _namespace: &str,
        _assigned: &[Arc<ElementDecl>],
    ) {
    }
}

/// Attributes verifier that accepts everything
#[derive(Debug, Clone)]
pub struct IgnoreAttributesVerifier {
    decls: Vec<Arc<AttributesDecl>>,
}

impl AttributesVerifier for IgnoreAttributesVerifier {
    fn verify(
        self: Box<Self>,
        _cx: &mut VerifierContext<'_>,
        _attributes: &[&Attribute],
    ) -> Vec<Arc<AttributesDecl>> {
        self.decls
    }
}

/// Schema of an ignored namespace
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoredSchema;

impl IslandSchema for IgnoredSchema {
    fn create_new_verifier(&self, namespace: &str, decls: &[Arc<ElementDecl>]) -> IslandVerifier {
        IslandVerifier::Ignore(IgnoreVerifier::new(namespace, decls.to_vec()))
    }

    fn element_decl(&self, _name: &str) -> Option<Arc<ElementDecl>> {
        Some(ANY_ELEMENT.clone())
    }

    fn element_decls(&self) -> &[Arc<ElementDecl>] {
        &*ANY_ELEMENTS
    }

    fn attributes_decl(&self, _name: &str) -> Option<Arc<AttributesDecl>> {
        Some(ANY_ATTRIBUTES.clone())
    }

    fn attributes_decls(&self) -> &[Arc<AttributesDecl>] {
        &*ANY_ATTRIBUTE_SETS
    }

    fn create_new_attributes_verifier(
        &self,
        _namespace: &str,
        decls: &[Arc<AttributesDecl>],
    ) -> Box<dyn AttributesVerifier> {
        Box::new(IgnoreAttributesVerifier {
            decls: decls.to_vec(),
        })
    }

    fn bind(&self, _provider: &SchemaProvider, _sink: &mut dyn ErrorSink) -> Result<()> {
        Ok(())
    }
}
