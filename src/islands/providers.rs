//! Schema registry
//!
//! The [`SchemaProvider`] maps namespace URIs to island schemas and creates
//! the verifier for the document element. It is assembled by a
//! [`SchemaProviderBuilder`], which binds every schema before handing the
//! provider out, so an unbound schema is never reachable from a dispatcher.

use super::decls::{ElementDecl, ANY_ELEMENT};
use super::ignored::IgnoreVerifier;
use super::schemas::IslandSchema;
use super::sinks::ErrorSink;
use super::verifiers::IslandVerifier;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// What validates the document element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TopLevel {
    /// Ignore unregistered content and adopt any registered namespace
    #[default]
    Ignore,
    /// The document element must match one of the named declarations of the
    /// schema registered for `namespace`. An empty list means all exported
    /// declarations.
    Island {
        /// Namespace of the root schema
        namespace: String,
        /// Names of the acceptable root declarations
        decls: Vec<String>,
    },
}

struct RootIsland {
    namespace: String,
    schema: Arc<dyn IslandSchema>,
    decls: Vec<Arc<ElementDecl>>,
}

/// Registry of island schemas, read-only once built
pub struct SchemaProvider {
    schemata: IndexMap<String, Arc<dyn IslandSchema>>,
    root: Option<RootIsland>,
}

impl SchemaProvider {
    /// Start assembling a provider
    pub fn builder() -> SchemaProviderBuilder {
        SchemaProviderBuilder::new()
    }

    /// Schema whose primary namespace is `namespace`
    pub fn schema(&self, namespace: &str) -> Option<&Arc<dyn IslandSchema>> {
        self.schemata.get(namespace)
    }

    /// Registered namespaces, in registration order
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.schemata.keys().map(String::as_str)
    }

    /// Registered schemas, in registration order
    pub fn schemata(&self) -> impl Iterator<Item = &Arc<dyn IslandSchema>> {
        self.schemata.values()
    }

    /// Number of registered schemas
    pub fn len(&self) -> usize {
        self.schemata.len()
    }

    /// Whether no schema is registered
    pub fn is_empty(&self) -> bool {
        self.schemata.is_empty()
    }

    /// Declarations the document element is checked against
    pub fn root_decls(&self) -> &[Arc<ElementDecl>] {
        match &self.root {
            Some(root) => &root.decls,
            None => std::slice::from_ref(&*ANY_ELEMENT),
        }
    }

    /// Create the verifier that receives the document element
    pub fn create_top_level_verifier(&self) -> IslandVerifier {
        match &self.root {
            Some(root) => root.schema.create_new_verifier(&root.namespace, &root.decls),
            None => IslandVerifier::Ignore(IgnoreVerifier::new(
                String::new(),
                vec![ANY_ELEMENT.clone()],
            )),
        }
    }
}

impl fmt::Debug for SchemaProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaProvider")
            .field("namespaces", &self.schemata.keys().collect::<Vec<_>>())
            .field("root", &self.root.as_ref().map(|r| r.namespace.as_str()))
            .finish()
    }
}

/// Builder for [`SchemaProvider`]
#[derive(Default)]
pub struct SchemaProviderBuilder {
    schemata: IndexMap<String, Arc<dyn IslandSchema>>,
    top_level: TopLevel,
}

impl SchemaProviderBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` as the grammar of `namespace`
    pub fn add_schema(
        mut self,
        namespace: impl Into<String>,
        schema: Arc<dyn IslandSchema>,
    ) -> Result<Self> {
        let namespace = namespace.into();
        if self.schemata.contains_key(&namespace) {
            return Err(Error::Schema(format!(
                "a schema for namespace '{}' is already registered",
                namespace
            )));
        }
        self.schemata.insert(namespace, schema);
        Ok(self)
    }

    /// Choose what validates the document element
    pub fn top_level(mut self, top_level: TopLevel) -> Self {
        self.top_level = top_level;
        self
    }

    /// Bind every schema and freeze the registry.
    ///
    /// All schemas are bound even if one fails, so every problem reaches the
    /// sink; the first failure is returned.
    pub fn build(self, sink: &mut dyn ErrorSink) -> Result<SchemaProvider> {
        let mut provider = SchemaProvider {
            schemata: self.schemata,
            root: None,
        };

        let mut first_error = None;
        for (namespace, schema) in &provider.schemata {
            if let Err(err) = schema.bind(&provider, sink) {
                log::warn!(
                    target: "xmlislands::schema",
                    "binding schema for '{}' failed: {}",
                    namespace,
                    err
                );
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        if let TopLevel::Island { namespace, decls } = self.top_level {
            let schema = provider.schema(&namespace).cloned().ok_or_else(|| {
                Error::Schema(format!(
                    "no schema registered for top-level namespace '{}'",
                    namespace
                ))
            })?;
            let decls = if decls.is_empty() {
                schema.element_decls().to_vec()
            } else {
                decls
                    .iter()
                    .map(|name| {
                        schema.element_decl(name).ok_or_else(|| {
                            Error::Schema(format!(
                                "schema for '{}' does not export '{}'",
                                namespace, name
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
            };
            provider.root = Some(RootIsland {
                namespace,
                schema,
                decls,
            });
        }

        log::debug!(
            target: "xmlislands::schema",
            "schema provider ready with {} namespace(s)",
            provider.len()
        );
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::islands::ignored::IgnoredSchema;
    use crate::islands::sinks::CollectingSink;

    #[test]
    fn test_duplicate_namespace_is_rejected() {
        let result = SchemaProvider::builder()
            .add_schema("urn:a", Arc::new(IgnoredSchema))
            .unwrap()
            .add_schema("urn:a", Arc::new(IgnoredSchema));
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_lookup_and_iteration() {
        let provider = SchemaProvider::builder()
            .add_schema("urn:a", Arc::new(IgnoredSchema))
            .unwrap()
            .add_schema("", Arc::new(IgnoredSchema))
            .unwrap()
            .build(&mut CollectingSink::new())
            .unwrap();

        assert!(provider.schema("urn:a").is_some());
        assert!(provider.schema("").is_some());
        assert!(provider.schema("urn:b").is_none());
        assert_eq!(provider.namespaces().collect::<Vec<_>>(), ["urn:a", ""]);
        assert_eq!(provider.schemata().count(), 2);
    }

    #[test]
    fn test_default_top_level_is_ignore() {
        let provider = SchemaProvider::builder()
            .build(&mut CollectingSink::new())
            .unwrap();
        assert!(provider.is_empty());
        assert!(matches!(
            provider.create_top_level_verifier(),
            IslandVerifier::Ignore(_)
        ));
        assert_eq!(provider.root_decls(), &[ANY_ELEMENT.clone()]);
    }

    #[test]
    fn test_top_level_island_requires_registered_namespace() {
        let result = SchemaProvider::builder()
            .top_level(TopLevel::Island {
                namespace: "urn:missing".into(),
                decls: vec![],
            })
            .build(&mut CollectingSink::new());
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_top_level_island_resolves_decls() {
        let provider = SchemaProvider::builder()
            .add_schema("urn:a", Arc::new(IgnoredSchema))
            .unwrap()
            .top_level(TopLevel::Island {
                namespace: "urn:a".into(),
                decls: vec!["doc".into()],
            })
            .build(&mut CollectingSink::new())
            .unwrap();
        assert_eq!(provider.root_decls().len(), 1);
        assert_eq!(provider.create_top_level_verifier().kind(), "ignore");
    }
}
