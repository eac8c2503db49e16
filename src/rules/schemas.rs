//! Compiled rule schemas

use super::model::{AttributesRuleDef, Occurs, RuleSchemaDef};
use super::verifiers::{RuleAttributesVerifier, RuleVerifier};
use crate::error::{Error, Result, ValidationError};
use crate::islands::{
    AttributesDecl, AttributesVerifier, ElementDecl, ErrorSink, Features, IslandSchema,
    IslandVerifier, PropertyValue, SchemaProvider, ANY_ATTRIBUTES, ANY_ELEMENT,
};
use crate::names::is_valid_ncname;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Feature telling whether an element rule accepts text
pub const TEXT_FEATURE: &str = "urn:xmlislands:feature:text";

/// Property holding the tag an element rule matches
pub const TAG_PROPERTY: &str = "urn:xmlislands:property:tag";

/// What a child particle points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Index of a rule of the same schema
    Local(usize),
    /// Declaration exported by another namespace, resolved on bind
    Foreign { namespace: String, name: String },
}

#[derive(Debug, Clone)]
pub(crate) struct Particle {
    pub(crate) target: Target,
    pub(crate) occurs: Occurs,
}

#[derive(Debug, Clone)]
pub(crate) struct AttributeRule {
    pub(crate) required: Vec<String>,
    pub(crate) optional: Vec<String>,
    pub(crate) allow_other: bool,
}

impl AttributeRule {
    fn compile(owner: &str, def: &AttributesRuleDef) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for name in def.required.iter().chain(&def.optional) {
            if !is_valid_ncname(name) {
                return Err(Error::Schema(format!(
                    "'{}' lists invalid attribute name '{}'",
                    owner, name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::Schema(format!(
                    "'{}' lists attribute '{}' twice",
                    owner, name
                )));
            }
        }
        Ok(Self {
            required: def.required.clone(),
            optional: def.optional.clone(),
            allow_other: def.allow_other,
        })
    }

    /// Check attribute local names; returns what is wrong
    pub(crate) fn check<'a>(&self, names: impl Iterator<Item = &'a str> + Clone) -> std::result::Result<(), String> {
        for required in &self.required {
            if !names.clone().any(|name| name == required) {
                return Err(format!("missing attribute '{}'", required));
            }
        }
        if !self.allow_other {
            for name in names {
                if !self.required.iter().chain(&self.optional).any(|n| n == name) {
                    return Err(format!("unexpected attribute '{}'", name));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct ElementRule {
    pub(crate) tag: String,
    pub(crate) attributes: AttributeRule,
    pub(crate) text: bool,
    pub(crate) children: Vec<Particle>,
    /// Foreign attribute set names by namespace
    pub(crate) foreign_attributes: IndexMap<String, Vec<String>>,
    pub(crate) decl: Arc<ElementDecl>,
}

#[derive(Debug, Default)]
pub(crate) struct Imports {
    pub(crate) elements: HashMap<(String, String), Arc<ElementDecl>>,
    pub(crate) attributes: HashMap<(String, String), Arc<AttributesDecl>>,
}

#[derive(Debug)]
pub(crate) struct Compiled {
    pub(crate) namespace: String,
    pub(crate) rules: IndexMap<String, ElementRule>,
    pub(crate) exported: Vec<Arc<ElementDecl>>,
    pub(crate) attribute_sets: IndexMap<String, (AttributeRule, Arc<AttributesDecl>)>,
    pub(crate) attribute_decls: Vec<Arc<AttributesDecl>>,
    pub(crate) imports: OnceCell<Imports>,
}

impl Compiled {
    /// Resolved declaration of a foreign particle
    pub(crate) fn imported_element(&self, namespace: &str, name: &str) -> Option<Arc<ElementDecl>> {
        self.imports
            .get()?
            .elements
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Resolved declaration of a foreign attribute set
    pub(crate) fn imported_attributes(
        &self,
        namespace: &str,
        name: &str,
    ) -> Option<Arc<AttributesDecl>> {
        self.imports
            .get()?
            .attributes
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Whether `decl` is satisfied by a match of `target`
    pub(crate) fn target_accepts(&self, target: &Target, decl: &ElementDecl) -> bool {
        match target {
            Target::Local(index) => self
                .rules
                .get_index(*index)
                .is_some_and(|(_, rule)| *rule.decl == *decl),
            Target::Foreign { namespace, name } => self
                .imported_element(namespace, name)
                .is_some_and(|imported| *imported == *decl),
        }
    }
}

/// Island schema compiled from a [`RuleSchemaDef`]
#[derive(Debug, Clone)]
pub struct RuleSchema {
    inner: Arc<Compiled>,
}

impl RuleSchema {
    /// Compile a schema definition
    pub fn from_def(def: &RuleSchemaDef) -> Result<Self> {
        let namespace = def.namespace.clone();

        let mut rules = IndexMap::with_capacity(def.elements.len());
        for (name, element) in &def.elements {
            if !is_valid_ncname(&element.tag) {
                return Err(Error::Schema(format!(
                    "rule '{}' has invalid tag '{}'",
                    name, element.tag
                )));
            }
            let mut features = Features::new();
            features.set_feature(TEXT_FEATURE, element.text);
            features.set_property(TAG_PROPERTY, PropertyValue::Text(element.tag.clone()));

            let mut foreign_attributes: IndexMap<String, Vec<String>> = IndexMap::new();
            for foreign in &element.foreign_attributes {
                foreign_attributes
                    .entry(foreign.namespace.clone())
                    .or_default()
                    .push(foreign.reference.clone());
            }

            rules.insert(
                name.clone(),
                ElementRule {
                    tag: element.tag.clone(),
                    attributes: AttributeRule::compile(name, &element.attributes)?,
                    text: element.text,
                    children: Vec::new(),
                    foreign_attributes,
                    decl: Arc::new(ElementDecl::with_features(
                        namespace.clone(),
                        name.clone(),
                        features,
                    )),
                },
            );
        }

        // Particles need every rule index, so they are resolved in a second pass.
        for (index, element) in def.elements.values().enumerate() {
            let mut children = Vec::with_capacity(element.children.len());
            for particle in &element.children {
                let occurs = particle.occurs();
                if occurs.max.is_some_and(|max| occurs.min > max) {
                    return Err(Error::Schema(format!(
                        "particle '{}' has min {} greater than max {}",
                        particle.reference,
                        occurs.min,
                        occurs.max.unwrap_or_default()
                    )));
                }
                let target = match particle.namespace.as_deref() {
                    Some(other) if other != namespace => Target::Foreign {
                        namespace: other.to_string(),
                        name: particle.reference.clone(),
                    },
                    _ => Target::Local(rules.get_index_of(&particle.reference).ok_or_else(
                        || {
                            Error::Schema(format!(
                                "unknown element rule '{}' in '{}'",
                                particle.reference, namespace
                            ))
                        },
                    )?),
                };
                children.push(Particle { target, occurs });
            }
            if let Some((_, rule)) = rules.get_index_mut(index) {
                rule.children = children;
            }
        }

        let exported = def
            .elements
            .iter()
            .filter(|(_, element)| element.export)
            .filter_map(|(name, _)| rules.get(name).map(|rule| rule.decl.clone()))
            .collect();

        let mut attribute_sets = IndexMap::with_capacity(def.attributes.len());
        for (name, set) in &def.attributes {
            let decl = Arc::new(AttributesDecl::new(namespace.clone(), name.clone()));
            attribute_sets.insert(name.clone(), (AttributeRule::compile(name, set)?, decl));
        }
        let attribute_decls = attribute_sets.values().map(|(_, decl)| decl.clone()).collect();

        log::debug!(
            target: "xmlislands::schema",
            "compiled rule schema for '{}' with {} element rule(s)",
            namespace,
            rules.len()
        );

        Ok(Self {
            inner: Arc::new(Compiled {
                namespace,
                rules,
                exported,
                attribute_sets,
                attribute_decls,
                imports: OnceCell::new(),
            }),
        })
    }

    /// Parse and compile a JSON schema document
    pub fn from_json(json: &str) -> Result<Self> {
        let def: RuleSchemaDef = serde_json::from_str(json)?;
        Self::from_def(&def)
    }

    /// Read, parse and compile a JSON schema file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Namespace this schema validates
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Whether [`bind`](IslandSchema::bind) has run
    pub fn is_bound(&self) -> bool {
        self.inner.imports.get().is_some()
    }
}

impl IslandSchema for RuleSchema {
    fn create_new_verifier(&self, namespace: &str, decls: &[Arc<ElementDecl>]) -> IslandVerifier {
        IslandVerifier::Rules(RuleVerifier::new(self.inner.clone(), namespace, decls))
    }

    fn element_decl(&self, name: &str) -> Option<Arc<ElementDecl>> {
        self.inner
            .exported
            .iter()
            .find(|decl| decl.name() == name)
            .cloned()
    }

    fn element_decls(&self) -> &[Arc<ElementDecl>] {
        &self.inner.exported
    }

    fn attributes_decl(&self, name: &str) -> Option<Arc<AttributesDecl>> {
        self.inner
            .attribute_sets
            .get(name)
            .map(|(_, decl)| decl.clone())
    }

    fn attributes_decls(&self) -> &[Arc<AttributesDecl>] {
        &self.inner.attribute_decls
    }

    fn create_new_attributes_verifier(
        &self,
        namespace: &str,
        decls: &[Arc<AttributesDecl>],
    ) -> Box<dyn AttributesVerifier> {
        Box::new(RuleAttributesVerifier::new(self.inner.clone(), namespace, decls))
    }

    fn bind(&self, provider: &SchemaProvider, sink: &mut dyn ErrorSink) -> Result<()> {
        let namespace = &self.inner.namespace;
        let mut imports = Imports::default();
        let mut problems = Vec::new();

        for (rule_name, rule) in &self.inner.rules {
            for particle in &rule.children {
                let Target::Foreign { namespace: other, name } = &particle.target else {
                    continue;
                };
                let decl = match provider.schema(other) {
                    None => Some(ANY_ELEMENT.clone()),
                    Some(schema) => schema.element_decl(name),
                };
                match decl {
                    Some(decl) => {
                        imports.elements.insert((other.clone(), name.clone()), decl);
                    }
                    None => problems.push(format!(
                        "'{}' refers to '{}' which '{}' does not export",
                        rule_name, name, other
                    )),
                }
            }

            for (other, names) in &rule.foreign_attributes {
                for name in names {
                    let decl = match provider.schema(other) {
                        None => Some(ANY_ATTRIBUTES.clone()),
                        Some(schema) => schema.attributes_decl(name),
                    };
                    match decl {
                        Some(decl) => {
                            imports.attributes.insert((other.clone(), name.clone()), decl);
                        }
                        None => problems.push(format!(
                            "'{}' refers to attribute set '{}' which '{}' does not export",
                            rule_name, name, other
                        )),
                    }
                }
            }
        }

        if let Some(first) = problems.first().cloned() {
            for problem in problems {
                sink.error(ValidationError::new(problem).with_namespace(namespace.clone()));
            }
            return Err(Error::Schema(first));
        }

        self.inner
            .imports
            .set(imports)
            .map_err(|_| Error::Schema(format!("schema for '{}' is already bound", namespace)))?;
        log::debug!(target: "xmlislands::schema", "bound rule schema for '{}'", namespace);
        Ok(())
    }
}
