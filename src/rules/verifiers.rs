//! Verifiers for rule schemas
//!
//! A [`RuleVerifier`] keeps, for every open element of its island, the rules
//! that still match it together with per-particle occurrence counts. A child
//! element of the same namespace and a child island report their result the
//! same way: the set of declarations they satisfied. A parent candidate
//! survives if one of its particles accepts that set.
//!
//! Every failure is reported once, where it happens. A frame that failed
//! yields an empty result, and an empty child result is never reported again
//! by the parent.

use super::schemas::{Compiled, Target};
use crate::error::ValidationError;
use crate::events::{Attribute, Attributes};
use crate::islands::{
    names, AttributesDecl, AttributesVerifier, ElementDecl, IgnoreVerifier, IslandHandler,
    IslandVerifier, OpenContext, VerifierContext,
};
use crate::{XMLNS_NAMESPACE, XML_NAMESPACE};
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Candidate {
    rule: usize,
    counts: Vec<u32>,
}

#[derive(Debug)]
struct Frame {
    qualified_name: String,
    candidates: Vec<Candidate>,
    failed: bool,
}

/// Verifier for one island of a rule schema
#[derive(Debug)]
pub struct RuleVerifier {
    schema: Arc<Compiled>,
    namespace: String,
    initial: Vec<usize>,
    frames: Vec<Frame>,
    child_island: Option<String>,
    result: Vec<Arc<ElementDecl>>,
}

impl RuleVerifier {
    pub(crate) fn new(schema: Arc<Compiled>, namespace: &str, decls: &[Arc<ElementDecl>]) -> Self {
        let initial = decls
            .iter()
            .filter(|decl| decl.namespace() == schema.namespace)
            .filter_map(|decl| schema.rules.get_index_of(decl.name()))
            .collect();
        Self {
            schema,
            namespace: namespace.to_string(),
            initial,
            frames: Vec::new(),
            child_island: None,
            result: Vec::new(),
        }
    }

    /// Namespace of the island
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of open elements of this island
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn candidate(&self, rule: usize) -> Candidate {
        Candidate {
            rule,
            counts: vec![0; self.schema.rules[rule].children.len()],
        }
    }

    fn describe(&self, target: &Target) -> String {
        match target {
            Target::Local(index) => self.schema.rules[*index].tag.clone(),
            Target::Foreign { namespace, name } => format!("{{{}}}{}", namespace, name),
        }
    }

    fn report(&self, cx: &mut VerifierContext<'_>, element: &str, error: ValidationError) {
        cx.error(
            error
                .with_namespace(self.namespace.clone())
                .with_element(element),
        );
    }

    /// Rules a same-namespace child called `local` may match
    fn local_children(&self, parent: &Frame, local: &str) -> Vec<usize> {
        let mut rules = Vec::new();
        for candidate in &parent.candidates {
            for particle in &self.schema.rules[candidate.rule].children {
                if let Target::Local(index) = particle.target {
                    if self.schema.rules[index].tag == local && !rules.contains(&index) {
                        rules.push(index);
                    }
                }
            }
        }
        rules
    }

    /// Declarations a child island in `namespace` may satisfy
    fn foreign_children(&self, parent: &Frame, namespace: &str) -> Vec<Arc<ElementDecl>> {
        let mut decls = Vec::new();
        for candidate in &parent.candidates {
            for particle in &self.schema.rules[candidate.rule].children {
                let Target::Foreign {
                    namespace: other,
                    name,
                } = &particle.target
                else {
                    continue;
                };
                if other != namespace {
                    continue;
                }
                if let Some(decl) = self.schema.imported_element(other, name) {
                    if !decls.contains(&decl) {
                        decls.push(decl);
                    }
                }
            }
        }
        decls
    }

    fn check_attributes(
        &self,
        cx: &mut VerifierContext<'_>,
        rule: usize,
        attributes: &Attributes,
    ) -> Result<(), String> {
        let rule = &self.schema.rules[rule];
        let own = attributes
            .iter()
            .filter(|a| a.namespace.is_empty() || a.namespace == self.namespace)
            .map(|a| a.local_name.as_str());
        rule.attributes.check(own)?;

        let mut foreign: IndexMap<&str, Vec<&Attribute>> = IndexMap::new();
        for attribute in attributes {
            let ns = attribute.namespace.as_str();
            if ns.is_empty() || ns == self.namespace || ns == XML_NAMESPACE || ns == XMLNS_NAMESPACE
            {
                continue;
            }
            foreign.entry(ns).or_default().push(attribute);
        }

        for (other, group) in foreign {
            let Some(refs) = rule.foreign_attributes.get(other) else {
                if rule.attributes.allow_other {
                    continue;
                }
                return Err(format!("attributes from '{}' are not allowed", other));
            };
            let Some(schema) = cx.schema_provider().schema(other) else {
                continue;
            };
            let decls: Vec<_> = refs
                .iter()
                .filter_map(|name| self.schema.imported_attributes(other, name))
                .collect();
            let verifier = schema.create_new_attributes_verifier(other, &decls);
            if verifier.verify(cx, &group).is_empty() {
                return Err(format!(
                    "attributes from '{}' match none of {}",
                    other,
                    names(&decls)
                ));
            }
        }
        Ok(())
    }

    fn enter_child_island(&mut self, cx: &mut OpenContext<'_>, namespace: &str, qualified_name: &str) {
        let Some(parent) = self.frames.last() else {
            return;
        };
        let schema = cx.schema_provider().schema(namespace);

        let verifier = if parent.failed {
            match schema {
                Some(schema) => schema.create_new_verifier(namespace, schema.element_decls()),
                None => IslandVerifier::Ignore(IgnoreVerifier::new(namespace, Vec::new())),
            }
        } else {
            let decls = self.foreign_children(parent, namespace);
            if decls.is_empty() {
                self.report(
                    cx,
                    &parent.qualified_name,
                    ValidationError::new(format!(
                        "<{}> is not allowed in <{}>",
                        qualified_name, parent.qualified_name
                    ))
                    .with_reason(format!("no child rule accepts namespace '{}'", namespace)),
                );
                IslandVerifier::Ignore(IgnoreVerifier::new(namespace, Vec::new()))
            } else {
                match schema {
                    Some(schema) => schema.create_new_verifier(namespace, &decls),
                    None => IslandVerifier::Ignore(IgnoreVerifier::new(namespace, decls)),
                }
            }
        };

        self.child_island = Some(qualified_name.to_string());
        cx.switch_verifier(verifier);
    }

    /// Count a finished child against the innermost frame
    fn apply_child_result(
        &mut self,
        cx: &mut VerifierContext<'_>,
        child: &str,
        result: &[Arc<ElementDecl>],
    ) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if frame.failed || result.is_empty() {
            return;
        }

        let schema = &self.schema;
        let mut over = false;
        frame.candidates.retain_mut(|candidate| {
            let children = &schema.rules[candidate.rule].children;
            let mut matched = false;
            for (particle, count) in children.iter().zip(candidate.counts.iter_mut()) {
                if !result.iter().any(|decl| schema.target_accepts(&particle.target, decl)) {
                    continue;
                }
                if particle.occurs.is_over(*count) {
                    over = true;
                    continue;
                }
                *count += 1;
                matched = true;
                break;
            }
            matched
        });

        if frame.candidates.is_empty() {
            frame.failed = true;
            let reason = if over {
                "occurs more often than allowed".to_string()
            } else {
                format!("it satisfied {}", names(result))
            };
            let error = ValidationError::new(format!(
                "<{}> is not expected in <{}>",
                child, frame.qualified_name
            ))
            .with_reason(reason)
            .with_namespace(self.namespace.clone())
            .with_element(frame.qualified_name.clone());
            cx.error(error);
        }
    }

    /// Declarations a closing frame satisfied
    fn close_frame(&self, cx: &mut VerifierContext<'_>, frame: Frame) -> Vec<Arc<ElementDecl>> {
        if frame.failed {
            return Vec::new();
        }

        let mut missing = None;
        let mut result: Vec<Arc<ElementDecl>> = Vec::new();
        for candidate in &frame.candidates {
            let rule = &self.schema.rules[candidate.rule];
            let short = rule
                .children
                .iter()
                .zip(&candidate.counts)
                .find(|(particle, count)| particle.occurs.is_missing(**count));
            match short {
                Some((particle, _)) => {
                    missing.get_or_insert_with(|| self.describe(&particle.target));
                }
                None if !result.contains(&rule.decl) => result.push(rule.decl.clone()),
                None => {}
            }
        }

        if result.is_empty() {
            let mut error = ValidationError::new(format!("<{}> is incomplete", frame.qualified_name));
            if let Some(missing) = missing {
                error = error.with_reason(format!("expected more <{}>", missing));
            }
            self.report(cx, &frame.qualified_name, error);
        }
        result
    }
}

impl IslandHandler for RuleVerifier {
    fn start_element(
        &mut self,
        cx: &mut OpenContext<'_>,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) {
        if namespace != self.namespace && !self.frames.is_empty() {
            self.enter_child_island(cx, namespace, qualified_name);
            return;
        }

        let (possible, parent_failed) = match self.frames.last() {
            None => (self.initial.clone(), false),
            Some(parent) if parent.failed => (Vec::new(), true),
            Some(parent) => (self.local_children(parent, local_name), false),
        };
        let possible: Vec<usize> = possible
            .into_iter()
            .filter(|&rule| namespace == self.namespace && self.schema.rules[rule].tag == local_name)
            .collect();

        let mut reason = None;
        let mut candidates = Vec::new();
        for &rule in &possible {
            match self.check_attributes(cx, rule, attributes) {
                Ok(()) => candidates.push(self.candidate(rule)),
                Err(why) => {
                    reason.get_or_insert(why);
                }
            }
        }

        let failed = candidates.is_empty();
        if parent_failed {
            log::trace!(target: "xmlislands::verify", "skipping <{}> inside failed parent", qualified_name);
        } else if possible.is_empty() {
            let message = match self.frames.last() {
                Some(parent) => format!(
                    "<{}> is not allowed in <{}>",
                    qualified_name, parent.qualified_name
                ),
                None => {
                    let expected: Vec<_> = self
                        .initial
                        .iter()
                        .map(|&rule| self.schema.rules[rule].decl.clone())
                        .collect();
                    format!("<{}> matches none of {}", qualified_name, names(&expected))
                }
            };
            self.report(cx, qualified_name, ValidationError::new(message));
        } else if failed {
            let mut error =
                ValidationError::new(format!("attributes of <{}> are invalid", qualified_name));
            if let Some(reason) = reason {
                error = error.with_reason(reason);
            }
            self.report(cx, qualified_name, error);
        }

        self.frames.push(Frame {
            qualified_name: qualified_name.to_string(),
            candidates,
            failed,
        });
    }

    fn end_element(
        &mut self,
        cx: &mut VerifierContext<'_>,
        _namespace: &str,
        _local_name: &str,
        qualified_name: &str,
    ) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let result = self.close_frame(cx, frame);
        if self.frames.is_empty() {
            self.result = result;
        } else {
            self.apply_child_result(cx, qualified_name, &result);
        }
    }

    fn characters(&mut self, cx: &mut VerifierContext<'_>, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if frame.failed {
            return;
        }

        let schema = &self.schema;
        frame.candidates.retain(|candidate| schema.rules[candidate.rule].text);
        if frame.candidates.is_empty() {
            frame.failed = true;
            let element = frame.qualified_name.clone();
            self.report(
                cx,
                &element,
                ValidationError::new(format!("text is not allowed in <{}>", element)),
            );
        }
    }

    fn end_island(&mut self, _cx: &mut VerifierContext<'_>) -> Vec<Arc<ElementDecl>> {
        std::mem::take(&mut self.result)
    }

    fn end_child_island(
        &mut self,
        cx: &mut VerifierContext<'_>,
        namespace: &str,
        assigned: &[Arc<ElementDecl>],
    ) {
        let child = self
            .child_island
            .take()
            .unwrap_or_else(|| format!("{{{}}}", namespace));
        self.apply_child_result(cx, &child, assigned);
    }
}

/// Verifier for the attribute sets of a rule schema
#[derive(Debug)]
pub struct RuleAttributesVerifier {
    schema: Arc<Compiled>,
    candidates: Vec<usize>,
}

impl RuleAttributesVerifier {
    pub(crate) fn new(schema: Arc<Compiled>, namespace: &str, decls: &[Arc<AttributesDecl>]) -> Self {
        let candidates = decls
            .iter()
            .filter(|decl| decl.namespace() == namespace && namespace == schema.namespace)
            .filter_map(|decl| schema.attribute_sets.get_index_of(decl.name()))
            .collect();
        Self { schema, candidates }
    }
}

impl AttributesVerifier for RuleAttributesVerifier {
    fn verify(
        self: Box<Self>,
        _cx: &mut VerifierContext<'_>,
        attributes: &[&Attribute],
    ) -> Vec<Arc<AttributesDecl>> {
        let local_names = attributes.iter().map(|a| a.local_name.as_str());
        self.candidates
            .iter()
            .filter_map(|&index| self.schema.attribute_sets.get_index(index))
            .filter(|(_, (rule, _))| rule.check(local_names.clone()).is_ok())
            .map(|(_, (_, decl))| decl.clone())
            .collect()
    }
}
