//! Serialized form of rule schemas
//!
//! A rule schema is a JSON document:
//!
//! ```json
//! {
//!   "namespace": "urn:example:book",
//!   "elements": {
//!     "book": {
//!       "tag": "book",
//!       "attributes": { "required": ["id"] },
//!       "children": [
//!         { "ref": "title" },
//!         { "ref": "para", "min": 0, "max": "unbounded" },
//!         { "ref": "figure", "namespace": "urn:example:fig", "min": 0 }
//!       ]
//!     },
//!     "title": { "tag": "title", "text": true, "export": false },
//!     "para": { "tag": "para", "text": true, "export": false }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Occurrence bounds for a child particle.
///
/// `None` for `max` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences
    pub min: u32,
    /// Maximum number of occurrences
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Exactly once
    pub fn once() -> Self {
        Self::new(1, Some(1))
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// A whole rule schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSchemaDef {
    /// Namespace the schema validates
    pub namespace: String,

    /// Element rules by name
    #[serde(default)]
    pub elements: IndexMap<String, ElementRuleDef>,

    /// Exported attribute sets by name
    #[serde(default)]
    pub attributes: IndexMap<String, AttributesRuleDef>,
}

/// Rule for one element and its content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ElementRuleDef {
    /// Local name the element must have
    pub tag: String,

    /// Unqualified attributes
    #[serde(default)]
    pub attributes: AttributesRuleDef,

    /// Whether non-whitespace text may appear directly inside
    #[serde(default)]
    pub text: bool,

    /// Allowed children, in any order
    #[serde(default)]
    pub children: Vec<ParticleDef>,

    /// Attribute sets other namespaces may contribute
    #[serde(default)]
    pub foreign_attributes: Vec<ForeignAttributesDef>,

    /// Whether other schemas and the document root may use this rule
    #[serde(default = "default_export")]
    pub export: bool,
}

fn default_export() -> bool {
    true
}

/// Set of attributes, matched by local name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttributesRuleDef {
    /// Attributes that must be present
    #[serde(default)]
    pub required: Vec<String>,

    /// Attributes that may be present
    #[serde(default)]
    pub optional: Vec<String>,

    /// Accept attributes not listed above, and foreign attributes from
    /// namespaces the rule does not mention
    #[serde(default)]
    pub allow_other: bool,
}

/// Reference to a child rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParticleDef {
    /// Name of the referenced element rule
    #[serde(rename = "ref")]
    pub reference: String,

    /// Namespace exporting the rule; the schema's own if absent
    #[serde(default)]
    pub namespace: Option<String>,

    /// Minimum occurrences
    #[serde(default = "default_min")]
    pub min: u32,

    /// Maximum occurrences; `"unbounded"` or `null` for no limit
    #[serde(
        default = "default_max",
        deserialize_with = "deserialize_max",
        serialize_with = "serialize_max"
    )]
    pub max: Option<u32>,
}

impl ParticleDef {
    /// Occurrence bounds of this particle
    pub fn occurs(&self) -> Occurs {
        Occurs::new(self.min, self.max)
    }
}

fn default_min() -> u32 {
    1
}

fn default_max() -> Option<u32> {
    Some(1)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaxOccurs {
    Bounded(u32),
    Keyword(String),
}

fn deserialize_max<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<MaxOccurs>::deserialize(deserializer)? {
        None => Ok(None),
        Some(MaxOccurs::Bounded(max)) => Ok(Some(max)),
        Some(MaxOccurs::Keyword(word)) if word == "unbounded" => Ok(None),
        Some(MaxOccurs::Keyword(word)) => Err(serde::de::Error::custom(format!(
            "invalid max '{}', expected a number or \"unbounded\"",
            word
        ))),
    }
}

fn serialize_max<S>(max: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match max {
        Some(max) => serializer.serialize_u32(*max),
        None => serializer.serialize_str("unbounded"),
    }
}

/// Reference to an attribute set exported by another namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForeignAttributesDef {
    /// Namespace exporting the attribute set
    pub namespace: String,

    /// Name of the attribute set
    #[serde(rename = "ref")]
    pub reference: String,
}
