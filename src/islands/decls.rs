//! Element and attribute declaration handles
//!
//! A declaration names one validation rule exported by an island schema.
//! Parents hand candidate declarations to child verifiers and get back the
//! subset that matched, so identity is `(namespace, name)`.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name of the declarations exported by ignored namespaces
pub const ANY_NAME: &str = "$$any$$";

/// Opaque property value attached to a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    Text(String),
    /// List of strings
    List(Vec<String>),
}

/// Feature and property tables of a declaration.
///
/// Keys are URIs. Looking up a key the table does not hold is an error, so
/// two implementations never silently disagree on a default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features {
    flags: IndexMap<String, bool>,
    properties: IndexMap<String, PropertyValue>,
}

impl Features {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a feature
    pub fn set_feature(&mut self, key: impl Into<String>, value: bool) {
        self.flags.insert(key.into(), value);
    }

    /// Set a property
    pub fn set_property(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.properties.insert(key.into(), value);
    }

    /// Look up a feature
    pub fn feature(&self, key: &str) -> Result<bool> {
        self.flags
            .get(key)
            .copied()
            .ok_or_else(|| Error::NotRecognized(format!("feature '{}'", key)))
    }

    /// Look up a property
    pub fn property(&self, key: &str) -> Result<&PropertyValue> {
        self.properties
            .get(key)
            .ok_or_else(|| Error::NotRecognized(format!("property '{}'", key)))
    }
}

macro_rules! declaration {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            namespace: String,
            name: String,
            features: Features,
        }

        impl $name {
            /// Create a declaration without features
            pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
                Self::with_features(namespace, name, Features::new())
            }

            /// Create a declaration with feature and property tables
            pub fn with_features(
                namespace: impl Into<String>,
                name: impl Into<String>,
                features: Features,
            ) -> Self {
                Self {
                    namespace: namespace.into(),
                    name: name.into(),
                    features,
                }
            }

            /// Namespace of the schema that exports this declaration
            pub fn namespace(&self) -> &str {
                &self.namespace
            }

            /// Name, unique within the exporting schema
            pub fn name(&self) -> &str {
                &self.name
            }

            /// Look up a feature by URI
            pub fn feature(&self, key: &str) -> Result<bool> {
                self.features.feature(key)
            }

            /// Look up a property by URI
            pub fn property(&self, key: &str) -> Result<&PropertyValue> {
                self.features.property(key)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.namespace == other.namespace && self.name == other.name
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.namespace.hash(state);
                self.name.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.namespace.is_empty() {
                    f.write_str(&self.name)
                } else {
                    write!(f, "{{{}}}{}", self.namespace, self.name)
                }
            }
        }
    };
}

declaration!(
    /// Named rule for an element and its content
    ElementDecl
);

declaration!(
    /// Named rule for a set of attributes
    AttributesDecl
);

/// The element declaration every ignored namespace exports
pub static ANY_ELEMENT: Lazy<Arc<ElementDecl>> =
    Lazy::new(|| Arc::new(ElementDecl::new("", ANY_NAME)));

/// The attributes declaration every ignored namespace exports
pub static ANY_ATTRIBUTES: Lazy<Arc<AttributesDecl>> =
    Lazy::new(|| Arc::new(AttributesDecl::new("", ANY_NAME)));

/// Render declaration names for diagnostics
pub fn names<T: fmt::Display>(decls: &[Arc<T>]) -> String {
    if decls.is_empty() {
        return "nothing".to_string();
    }
    decls
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
