//! Island verifiers
//!
//! [`IslandHandler`] is the capability every verifier provides.
//! [`IslandVerifier`] is the closed set of verifier kinds the dispatcher
//! switches between; [`IslandVerifier::Extension`] carries handlers for
//! schema languages this crate does not build in.

use super::contexts::{OpenContext, VerifierContext};
use super::decls::{AttributesDecl, ElementDecl};
use super::ignored::IgnoreVerifier;
use crate::events::{Attribute, Attributes};
use crate::rules::RuleVerifier;
use std::fmt;
use std::sync::Arc;

/// Event contract of a verifier for one island occurrence
pub trait IslandHandler: fmt::Debug {
    /// Start tag inside the island. The first call is the island's own root.
    fn start_element(
        &mut self,
        cx: &mut OpenContext<'_>,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    );

    /// End tag inside the island, including the island's own root
    fn end_element(
        &mut self,
        cx: &mut VerifierContext<'_>,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
    );

    /// Character data
    fn characters(&mut self, _cx: &mut VerifierContext<'_>, _text: &str) {}

    /// Insignificant whitespace
    fn ignorable_whitespace(&mut self, _cx: &mut VerifierContext<'_>, _text: &str) {}

    /// Processing instruction
    fn processing_instruction(&mut self, _cx: &mut VerifierContext<'_>, _target: &str, _data: &str) {
    }

    /// Entity reference the producer did not expand
    fn skipped_entity(&mut self, _cx: &mut VerifierContext<'_>, _name: &str) {}

    /// Prefix comes into scope
    fn start_prefix_mapping(&mut self, _cx: &mut VerifierContext<'_>, _prefix: &str, _uri: &str) {}

    /// Prefix goes out of scope
    fn end_prefix_mapping(&mut self, _cx: &mut VerifierContext<'_>, _prefix: &str) {}

    /// The island's root element closed. Returns the candidate declarations
    /// the island satisfied, empty if none. Mismatches are reported through
    /// `cx` before returning.
    fn end_island(&mut self, cx: &mut VerifierContext<'_>) -> Vec<Arc<ElementDecl>>;

    /// A child island opened inside this island finished with `assigned`
    fn end_child_island(
        &mut self,
        cx: &mut VerifierContext<'_>,
        namespace: &str,
        assigned: &[Arc<ElementDecl>],
    );
}

/// A verifier for one island occurrence
#[derive(Debug)]
pub enum IslandVerifier {
    /// Pass-through for namespaces without a schema
    Ignore(IgnoreVerifier),
    /// Verifier of the built-in rule schema language
    Rules(RuleVerifier),
    /// Embedder-supplied verifier
    Extension(Box<dyn IslandHandler>),
}

impl IslandVerifier {
    /// Short label used in log messages
    pub fn kind(&self) -> &'static str {
        match self {
            IslandVerifier::Ignore(_) => "ignore",
            IslandVerifier::Rules(_) => "rules",
            IslandVerifier::Extension(_) => "extension",
        }
    }

    fn handler(&mut self) -> &mut dyn IslandHandler {
        match self {
            IslandVerifier::Ignore(v) => v,
            IslandVerifier::Rules(v) => v,
            IslandVerifier::Extension(v) => v.as_mut(),
        }
    }

    /// Forward a start tag
    pub fn start_element(
        &mut self,
        cx: &mut OpenContext<'_>,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) {
        self.handler()
            .start_element(cx, namespace, local_name, qualified_name, attributes)
    }

    /// Forward an end tag
    pub fn end_element(
        &mut self,
        cx: &mut VerifierContext<'_>,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
    ) {
        self.handler()
            .end_element(cx, namespace, local_name, qualified_name)
    }

    /// Forward character data
    pub fn characters(&mut self, cx: &mut VerifierContext<'_>, text: &str) {
        self.handler().characters(cx, text)
    }

    /// Forward insignificant whitespace
    pub fn ignorable_whitespace(&mut self, cx: &mut VerifierContext<'_>, text: &str) {
        self.handler().ignorable_whitespace(cx, text)
    }

    /// Forward a processing instruction
    pub fn processing_instruction(&mut self, cx: &mut VerifierContext<'_>, target: &str, data: &str) {
        self.handler().processing_instruction(cx, target, data)
    }

    /// Forward a skipped entity
    pub fn skipped_entity(&mut self, cx: &mut VerifierContext<'_>, name: &str) {
        self.handler().skipped_entity(cx, name)
    }

    /// Forward a prefix declaration
    pub fn start_prefix_mapping(&mut self, cx: &mut VerifierContext<'_>, prefix: &str, uri: &str) {
        self.handler().start_prefix_mapping(cx, prefix, uri)
    }

    /// Forward the end of a prefix declaration
    pub fn end_prefix_mapping(&mut self, cx: &mut VerifierContext<'_>, prefix: &str) {
        self.handler().end_prefix_mapping(cx, prefix)
    }

    /// Close the island. Consumes the verifier so it cannot see more events.
    pub fn end_island(mut self, cx: &mut VerifierContext<'_>) -> Vec<Arc<ElementDecl>> {
        self.handler().end_island(cx)
    }

    /// Deliver the result of a child island
    pub fn end_child_island(
        &mut self,
        cx: &mut VerifierContext<'_>,
        namespace: &str,
        assigned: &[Arc<ElementDecl>],
    ) {
        self.handler().end_child_island(cx, namespace, assigned)
    }
}

/// One-shot verifier for the attributes of one namespace on one element
pub trait AttributesVerifier: fmt::Debug {
    /// Check `attributes` against the candidate declarations and return the
    /// ones they satisfy. Mismatches are reported by the caller, which knows
    /// the element.
    fn verify(
        self: Box<Self>,
        cx: &mut VerifierContext<'_>,
        attributes: &[&Attribute],
    ) -> Vec<Arc<AttributesDecl>>;
}
