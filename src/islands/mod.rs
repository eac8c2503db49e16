//! Namespace islands
//!
//! An island is a maximal subtree whose elements share a namespace, or a
//! subtree a verifier chose to hand off. This module holds the contracts
//! between the [`Dispatcher`] and the schemas and verifiers it drives:
//!
//! - [`IslandSchema`] compiles a grammar for one namespace
//! - [`IslandVerifier`] checks one island occurrence
//! - [`SchemaProvider`] maps namespaces to schemas
//! - [`ErrorSink`] receives diagnostics

pub mod contexts;
pub mod decls;
pub mod dispatcher;
pub mod ignored;
pub mod providers;
pub mod schemas;
pub mod sinks;
pub mod verifiers;

pub use contexts::{OpenContext, VerifierContext};
pub use decls::{
    names, AttributesDecl, ElementDecl, Features, PropertyValue, ANY_ATTRIBUTES, ANY_ELEMENT,
    ANY_NAME,
};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use ignored::{IgnoreAttributesVerifier, IgnoreVerifier, IgnoredSchema};
pub use providers::{SchemaProvider, SchemaProviderBuilder, TopLevel};
pub use schemas::IslandSchema;
pub use sinks::{CollectingSink, ErrorSink, NullSink};
pub use verifiers::{AttributesVerifier, IslandHandler, IslandVerifier};
