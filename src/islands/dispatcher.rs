//! The island dispatcher
//!
//! The dispatcher relays one event stream to whichever verifier owns the
//! current island. A verifier starts a child island by requesting a switch
//! from inside `start_element`; the dispatcher suspends the current verifier
//! on its context stack and resets `depth` to 0. The end tag that brings
//! `depth` back to 0 closes the child island, restores the parent and hands
//! it the child's result.
//!
//! `depth` starts at 1 for the root verifier, so the root island is never
//! closed by an end tag; [`Dispatcher::finish`] closes it instead.

use super::contexts::{OpenContext, VerifierContext};
use super::decls::ElementDecl;
use super::providers::SchemaProvider;
use super::sinks::{CollectingSink, ErrorSink};
use super::verifiers::IslandVerifier;
use crate::error::{Error, Result, ValidationError};
use crate::events::{
    Attributes, EventProducer, EventSink, Locator, NotationDecl, UnparsedEntityDecl,
};
use crate::limits::Limits;
use crate::names::check_prefix_declaration;
use crate::namespaces::{Declaration, NamespaceScope, ScopeFrame};
use std::sync::Arc;

/// Lend the verifier-facing parts of the dispatcher to a verifier call.
///
/// A macro rather than a method so the borrow stays split from `active`.
macro_rules! context {
    ($self:ident) => {
        VerifierContext::new(&$self.provider, &mut $self.sink, $self.locator.as_ref())
    };
}

/// Suspended parent island
struct Context {
    verifier: IslandVerifier,
    depth: usize,
}

/// Everything left once the document is done
#[derive(Debug)]
pub struct DispatchOutcome<S> {
    /// Declarations the document element satisfied
    pub root_matches: Vec<Arc<ElementDecl>>,
    /// The error sink, with whatever it collected
    pub sink: S,
    /// Notation declarations in document order
    pub notations: Vec<NotationDecl>,
    /// Unparsed entity declarations in document order
    pub unparsed_entities: Vec<UnparsedEntityDecl>,
}

/// Event relay for one document
pub struct Dispatcher<S: ErrorSink = CollectingSink> {
    provider: Arc<SchemaProvider>,
    sink: S,
    limits: Limits,
    locator: Option<Locator>,
    /// Element depth inside the active island
    depth: usize,
    active: IslandVerifier,
    scope: NamespaceScope,
    contexts: Vec<Context>,
    seen_element: bool,
    notations: Vec<NotationDecl>,
    unparsed_entities: Vec<UnparsedEntityDecl>,
}

impl<S: ErrorSink> Dispatcher<S> {
    /// Create a dispatcher whose root verifier comes from `provider`
    pub fn new(provider: Arc<SchemaProvider>, sink: S) -> Self {
        let active = provider.create_top_level_verifier();
        Self {
            provider,
            sink,
            limits: Limits::default(),
            locator: None,
            depth: 1,
            active,
            scope: NamespaceScope::new(),
            contexts: Vec::new(),
            seen_element: false,
            notations: Vec::new(),
            unparsed_entities: Vec::new(),
        }
    }

    /// Replace the default limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Feed every event of `producer` into this dispatcher
    pub fn attach<P: EventProducer + ?Sized>(&mut self, producer: &mut P) -> Result<()> {
        producer.produce(self)
    }

    /// Registry the verifiers consult
    pub fn schema_provider(&self) -> &Arc<SchemaProvider> {
        &self.provider
    }

    /// Sink receiving every diagnostic
    pub fn error_sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the sink
    pub fn error_sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Replace the sink, returning the previous one
    pub fn set_error_sink(&mut self, sink: S) -> S {
        std::mem::replace(&mut self.sink, sink)
    }

    /// Element depth inside the active island (1 more for the root island)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of suspended islands, i.e. island nesting minus one
    pub fn island_depth(&self) -> usize {
        self.contexts.len()
    }

    /// Kind of the verifier currently receiving events
    pub fn active_kind(&self) -> &'static str {
        self.active.kind()
    }

    /// Number of notation declarations seen so far
    pub fn count_notation_decls(&self) -> usize {
        self.notations.len()
    }

    /// The `index`th notation declaration
    pub fn notation(&self, index: usize) -> Option<&NotationDecl> {
        self.notations.get(index)
    }

    /// Number of unparsed entity declarations seen so far
    pub fn count_unparsed_entity_decls(&self) -> usize {
        self.unparsed_entities.len()
    }

    /// The `index`th unparsed entity declaration
    pub fn unparsed_entity(&self, index: usize) -> Option<&UnparsedEntityDecl> {
        self.unparsed_entities.get(index)
    }

    /// Close the root island and return the outcome.
    ///
    /// Fails if the document never opened an element or left elements open.
    pub fn finish(self) -> Result<DispatchOutcome<S>> {
        if !self.seen_element {
            return Err(Error::Structure("document has no element".to_string()));
        }
        if self.scope.depth() != 0 {
            return Err(Error::Structure(format!(
                "document ended with {} element(s) still open",
                self.scope.depth()
            )));
        }
        debug_assert!(self.contexts.is_empty() && self.depth == 1);

        let Dispatcher {
            provider,
            mut sink,
            locator,
            active,
            notations,
            unparsed_entities,
            ..
        } = self;
        let root_matches =
            active.end_island(&mut VerifierContext::new(&provider, &mut sink, locator.as_ref()));
        log::debug!(
            target: "xmlislands::dispatch",
            "root island closed with {} match(es)",
            root_matches.len()
        );

        Ok(DispatchOutcome {
            root_matches,
            sink,
            notations,
            unparsed_entities,
        })
    }

    fn enter_island(&mut self, verifier: IslandVerifier) -> Result<()> {
        self.limits.check_island_depth(self.contexts.len() + 1)?;
        log::trace!(
            target: "xmlislands::dispatch",
            "entering {} island at island depth {}",
            verifier.kind(),
            self.contexts.len() + 1
        );

        let parent = std::mem::replace(&mut self.active, verifier);
        self.contexts.push(Context {
            verifier: parent,
            depth: self.depth,
        });
        self.depth = 0;

        // The new verifier missed the declarations already in scope.
        for (prefix, uri) in self.scope.in_scope() {
            self.active
                .start_prefix_mapping(&mut context!(self), prefix, uri);
        }
        Ok(())
    }

    fn close_islands(&mut self, namespace: &str, frame: &ScopeFrame) -> Result<()> {
        while self.depth == 0 {
            if self.contexts.is_empty() {
                return Err(Error::Structure(
                    "island closed without a suspended parent".to_string(),
                ));
            }
            for prefix in frame.keys() {
                self.active.end_prefix_mapping(&mut context!(self), prefix);
            }

            let Some(parent) = self.contexts.pop() else {
                break;
            };
            let child = std::mem::replace(&mut self.active, parent.verifier);
            let kind = child.kind();
            let assigned = child.end_island(&mut context!(self));
            self.depth = parent.depth;
            log::trace!(
                target: "xmlislands::dispatch",
                "left {} island in '{}' with {} match(es)",
                kind,
                namespace,
                assigned.len()
            );

            self.active
                .end_child_island(&mut context!(self), namespace, &assigned);
        }
        Ok(())
    }
}

impl<S: ErrorSink> EventSink for Dispatcher<S> {
    fn set_document_locator(&mut self, locator: &Locator) {
        self.locator = Some(locator.clone());
    }

    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()> {
        if let Err(reason) = check_prefix_declaration(prefix, uri) {
            context!(self).fatal_error(
                ValidationError::new(format!(
                    "malformed declaration of prefix '{}'",
                    prefix
                ))
                .with_reason(reason),
            );
            self.scope.reject(prefix);
            return Ok(());
        }
        self.limits
            .check_prefix_declarations(self.scope.pending().len() + 1)?;
        match self.scope.declare(prefix, uri) {
            Declaration::Bound => {}
            Declaration::Repeated => return Ok(()),
            Declaration::Conflict(existing) => {
                context!(self).fatal_error(
                    ValidationError::new(format!(
                        "prefix '{}' declared twice on one element",
                        prefix
                    ))
                    .with_reason(format!("bound to '{}', then to '{}'", existing, uri)),
                );
                return Ok(());
            }
        }
        self.active
            .start_prefix_mapping(&mut context!(self), prefix, uri);
        Ok(())
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()> {
        // The verifier never saw the start of a rejected declaration.
        if self.scope.take_rejected_end(prefix) {
            return Ok(());
        }
        self.active.end_prefix_mapping(&mut context!(self), prefix);
        Ok(())
    }

    fn start_element(
        &mut self,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) -> Result<()> {
        self.limits.check_attributes(attributes.len())?;
        self.limits.check_element_depth(self.scope.depth() + 1)?;
        self.seen_element = true;

        let mut cx = OpenContext::new(context!(self));
        self.active
            .start_element(&mut cx, namespace, local_name, qualified_name, attributes);
        let mut switch = cx.into_switch();

        // The element that triggered a switch is the new island's root.
        while let Some(verifier) = switch.take() {
            self.enter_island(verifier)?;
            let mut cx = OpenContext::new(context!(self));
            self.active
                .start_element(&mut cx, namespace, local_name, qualified_name, attributes);
            switch = cx.into_switch();
        }

        self.depth += 1;
        self.scope.push_frame();
        Ok(())
    }

    fn end_element(
        &mut self,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
    ) -> Result<()> {
        if self.scope.depth() == 0 {
            return Err(Error::Structure(format!(
                "end tag '{}' without a matching start tag",
                qualified_name
            )));
        }

        let frame = self.scope.pop_frame();
        self.active
            .end_element(&mut context!(self), namespace, local_name, qualified_name);
        self.depth -= 1;
        if self.depth == 0 {
            self.close_islands(namespace, &frame)?;
        }
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.active.characters(&mut context!(self), text);
        Ok(())
    }

    fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        self.active.ignorable_whitespace(&mut context!(self), text);
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        self.active
            .processing_instruction(&mut context!(self), target, data);
        Ok(())
    }

    fn skipped_entity(&mut self, name: &str) -> Result<()> {
        self.active.skipped_entity(&mut context!(self), name);
        Ok(())
    }

    fn notation_decl(&mut self, decl: &NotationDecl) -> Result<()> {
        self.notations.push(decl.clone());
        Ok(())
    }

    fn unparsed_entity_decl(&mut self, decl: &UnparsedEntityDecl) -> Result<()> {
        self.unparsed_entities.push(decl.clone());
        Ok(())
    }
}
