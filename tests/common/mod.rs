//! Shared helpers for the integration tests
//!
//! [`RecordingSchema`] is an extension schema whose verifiers write every
//! callback they receive into a shared log, one line per call.
//! [`RecordingIgnoredSchema`] does the same around the ignoring verifier.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use xmlislands::events::{Attribute, Attributes};
use xmlislands::islands::{
    AttributesDecl, AttributesVerifier, ElementDecl, ErrorSink, IgnoreVerifier, IgnoredSchema,
    IslandHandler, IslandSchema, IslandVerifier, OpenContext, SchemaProvider, VerifierContext,
};
use xmlislands::{Result, ValidationError};

/// Log shared by every verifier of a test
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

#[derive(Debug)]
pub struct RecordingSchema {
    label: String,
    log: Log,
    decls: Vec<Arc<ElementDecl>>,
    created: AtomicUsize,
    delegate: Option<String>,
    reject: bool,
}

impl RecordingSchema {
    /// Schema for `namespace` whose verifiers log as `label#n`
    pub fn new(label: &str, namespace: &str, log: &Log) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            decls: vec![Arc::new(ElementDecl::new(namespace, "root"))],
            created: AtomicUsize::new(0),
            delegate: None,
            reject: false,
        }
    }

    /// Hand every island straight on to the schema of `namespace`
    pub fn delegating_to(mut self, namespace: &str) -> Self {
        self.delegate = Some(namespace.to_string());
        self
    }

    /// Islands never match
    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    pub fn into_arc(self) -> Arc<dyn IslandSchema> {
        Arc::new(self)
    }
}

impl IslandSchema for RecordingSchema {
    fn create_new_verifier(&self, namespace: &str, decls: &[Arc<ElementDecl>]) -> IslandVerifier {
        let id = format!(
            "{}#{}",
            self.label,
            self.created.fetch_add(1, Ordering::SeqCst)
        );
        self.log.lock().unwrap().push(format!("{} created", id));
        IslandVerifier::Extension(Box::new(RecordingVerifier {
            id,
            namespace: namespace.to_string(),
            log: self.log.clone(),
            decls: if self.reject { Vec::new() } else { decls.to_vec() },
            delegate: self.delegate.clone(),
            depth: 0,
        }))
    }

    fn element_decl(&self, name: &str) -> Option<Arc<ElementDecl>> {
        self.decls.iter().find(|d| d.name() == name).cloned()
    }

    fn element_decls(&self) -> &[Arc<ElementDecl>] {
        &self.decls
    }

    fn attributes_decl(&self, _name: &str) -> Option<Arc<AttributesDecl>> {
        None
    }

    fn attributes_decls(&self) -> &[Arc<AttributesDecl>] {
        &[]
    }

    fn create_new_attributes_verifier(
        &self,
        _namespace: &str,
        decls: &[Arc<AttributesDecl>],
    ) -> Box<dyn AttributesVerifier> {
        Box::new(AcceptAttributes(decls.to_vec()))
    }

    fn bind(&self, _provider: &SchemaProvider, _sink: &mut dyn ErrorSink) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct AcceptAttributes(Vec<Arc<AttributesDecl>>);

impl AttributesVerifier for AcceptAttributes {
    fn verify(
        self: Box<Self>,
        _cx: &mut VerifierContext<'_>,
        _attributes: &[&Attribute],
    ) -> Vec<Arc<AttributesDecl>> {
        self.0
    }
}

/// Logs every callback; switches to any registered foreign namespace
#[derive(Debug)]
pub struct RecordingVerifier {
    id: String,
    namespace: String,
    log: Log,
    decls: Vec<Arc<ElementDecl>>,
    delegate: Option<String>,
    depth: usize,
}

impl RecordingVerifier {
    fn record(&self, line: String) {
        self.log.lock().unwrap().push(format!("{} {}", self.id, line));
    }
}

impl IslandHandler for RecordingVerifier {
    fn start_element(
        &mut self,
        cx: &mut OpenContext<'_>,
        namespace: &str,
        _local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) {
        let attrs: Vec<_> = attributes.iter().map(|a| a.qualified_name.as_str()).collect();
        self.record(format!("open {} [{}]", qualified_name, attrs.join(" ")));

        let provider = cx.schema_provider();
        let target = if self.depth == 0 {
            self.delegate.as_deref()
        } else if namespace != self.namespace {
            Some(namespace)
        } else {
            None
        };
        if let Some(schema) = target.and_then(|ns| provider.schema(ns).map(|s| (ns, s))) {
            let (ns, schema) = schema;
            self.record(format!("switch {}", ns));
            cx.switch_verifier(schema.create_new_verifier(ns, schema.element_decls()));
            return;
        }
        if self.depth > 0 && namespace != self.namespace {
            cx.error(
                ValidationError::new(format!("{} is not allowed here", qualified_name))
                    .with_namespace(namespace),
            );
        }
        self.depth += 1;
    }

    fn end_element(
        &mut self,
        _cx: &mut VerifierContext<'_>,
        _namespace: &str,
        _local_name: &str,
        qualified_name: &str,
    ) {
        self.depth = self.depth.saturating_sub(1);
        self.record(format!("close {}", qualified_name));
    }

    fn characters(&mut self, _cx: &mut VerifierContext<'_>, text: &str) {
        if !text.trim().is_empty() {
            self.record(format!("text {}", text.trim()));
        }
    }

    fn processing_instruction(&mut self, _cx: &mut VerifierContext<'_>, target: &str, _data: &str) {
        self.record(format!("pi {}", target));
    }

    fn start_prefix_mapping(&mut self, _cx: &mut VerifierContext<'_>, prefix: &str, uri: &str) {
        self.record(format!("+{}={}", prefix, uri));
    }

    fn end_prefix_mapping(&mut self, _cx: &mut VerifierContext<'_>, prefix: &str) {
        self.record(format!("-{}", prefix));
    }

    fn end_island(&mut self, _cx: &mut VerifierContext<'_>) -> Vec<Arc<ElementDecl>> {
        self.record(format!("end-island {}", self.decls.len()));
        self.decls.clone()
    }

    fn end_child_island(
        &mut self,
        _cx: &mut VerifierContext<'_>,
        namespace: &str,
        assigned: &[Arc<ElementDecl>],
    ) {
        self.record(format!("end-child-island {} {}", namespace, assigned.len()));
    }
}

impl Drop for RecordingVerifier {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.push(format!("{} dropped", self.id));
        }
    }
}

static IGNORED: IgnoredSchema = IgnoredSchema;

/// [`IgnoredSchema`] whose verifiers log the callbacks that reach them
#[derive(Debug)]
pub struct RecordingIgnoredSchema {
    label: String,
    log: Log,
    created: AtomicUsize,
}

impl RecordingIgnoredSchema {
    pub fn new(label: &str, log: &Log) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            created: AtomicUsize::new(0),
        }
    }

    pub fn into_arc(self) -> Arc<dyn IslandSchema> {
        Arc::new(self)
    }
}

impl IslandSchema for RecordingIgnoredSchema {
    fn create_new_verifier(&self, namespace: &str, decls: &[Arc<ElementDecl>]) -> IslandVerifier {
        let id = format!(
            "{}#{}",
            self.label,
            self.created.fetch_add(1, Ordering::SeqCst)
        );
        self.log.lock().unwrap().push(format!("{} created", id));
        IslandVerifier::Extension(Box::new(RecordingIgnoreVerifier {
            id,
            log: self.log.clone(),
            inner: IgnoreVerifier::new(namespace, decls.to_vec()),
        }))
    }

    fn element_decl(&self, name: &str) -> Option<Arc<ElementDecl>> {
        IGNORED.element_decl(name)
    }

    fn element_decls(&self) -> &[Arc<ElementDecl>] {
        IGNORED.element_decls()
    }

    fn attributes_decl(&self, name: &str) -> Option<Arc<AttributesDecl>> {
        IGNORED.attributes_decl(name)
    }

    fn attributes_decls(&self) -> &[Arc<AttributesDecl>] {
        IGNORED.attributes_decls()
    }

    fn create_new_attributes_verifier(
        &self,
        namespace: &str,
        decls: &[Arc<AttributesDecl>],
    ) -> Box<dyn AttributesVerifier> {
        IGNORED.create_new_attributes_verifier(namespace, decls)
    }

    fn bind(&self, provider: &SchemaProvider, sink: &mut dyn ErrorSink) -> Result<()> {
        IGNORED.bind(provider, sink)
    }
}

/// Logs the element and island callbacks, then lets [`IgnoreVerifier`] act
#[derive(Debug)]
struct RecordingIgnoreVerifier {
    id: String,
    log: Log,
    inner: IgnoreVerifier,
}

impl RecordingIgnoreVerifier {
    fn record(&self, line: String) {
        self.log.lock().unwrap().push(format!("{} {}", self.id, line));
    }
}

impl IslandHandler for RecordingIgnoreVerifier {
    fn start_element(
        &mut self,
        cx: &mut OpenContext<'_>,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) {
        self.record(format!("open {}", qualified_name));
        self.inner
            .start_element(cx, namespace, local_name, qualified_name, attributes);
    }

    fn end_element(
        &mut self,
        cx: &mut VerifierContext<'_>,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
    ) {
        self.record(format!("close {}", qualified_name));
        self.inner
            .end_element(cx, namespace, local_name, qualified_name);
    }

    fn end_island(&mut self, cx: &mut VerifierContext<'_>) -> Vec<Arc<ElementDecl>> {
        let assigned = self.inner.end_island(cx);
        self.record(format!("end-island {}", assigned.len()));
        assigned
    }

    fn end_child_island(
        &mut self,
        cx: &mut VerifierContext<'_>,
        namespace: &str,
        assigned: &[Arc<ElementDecl>],
    ) {
        self.record(format!("end-child-island {} {}", namespace, assigned.len()));
        self.inner.end_child_island(cx, namespace, assigned);
    }
}
