//! Built-in rule schema language
//!
//! Rule schemas describe one namespace with named element rules and
//! attribute sets, loaded from JSON. They are the island schemas the
//! command line and the [`Validator`](crate::validation::Validator) build
//! from files.

pub mod model;
pub mod schemas;
pub mod verifiers;

pub use model::{
    AttributesRuleDef, ElementRuleDef, ForeignAttributesDef, Occurs, ParticleDef, RuleSchemaDef,
};
pub use schemas::{RuleSchema, TAG_PROPERTY, TEXT_FEATURE};
pub use verifiers::{RuleAttributesVerifier, RuleVerifier};
