//! XML namespace handling
//!
//! This module provides the stack-structured prefix table the dispatcher
//! keeps while relaying events.

use indexmap::IndexMap;

/// XML Namespace URI. The empty string means "no namespace".
pub type NamespaceUri = String;

/// Namespace prefix. The empty string is the default namespace.
pub type Prefix = String;

/// Prefix declarations made on one element, in declaration order
pub type ScopeFrame = IndexMap<Prefix, NamespaceUri>;

/// Outcome of declaring a prefix for the element that opens next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// The prefix is now bound
    Bound,
    /// The prefix was already bound to the same URI on this element
    Repeated,
    /// The prefix was already bound to the given, different URI
    Conflict(NamespaceUri),
}

/// Stack of prefix scopes, one frame per open element.
///
/// Declarations arrive before the element they belong to, so they collect
/// in a pending frame that [`push_frame`](Self::push_frame) attaches to the
/// element being opened.
///
/// Declarations that never entered a frame are counted per element, so the
/// matching ends can be recognized with
/// [`take_rejected_end`](Self::take_rejected_end) once the element closes.
#[derive(Debug, Clone, Default)]
pub struct NamespaceScope {
    frames: Vec<ScopeFrame>,
    pending: ScopeFrame,
    rejected: Vec<IndexMap<Prefix, usize>>,
    pending_rejected: IndexMap<Prefix, usize>,
    closed_rejected: IndexMap<Prefix, usize>,
}

impl NamespaceScope {
    /// Create a new empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a prefix for the element that opens next.
    ///
    /// A second declaration of the same prefix for that element is not
    /// bound; it is counted as rejected instead.
    pub fn declare(&mut self, prefix: &str, uri: &str) -> Declaration {
        let outcome = match self.pending.get(prefix) {
            Some(existing) if existing != uri => Declaration::Conflict(existing.clone()),
            Some(_) => Declaration::Repeated,
            None => {
                self.pending.insert(prefix.to_owned(), uri.to_owned());
                return Declaration::Bound;
            }
        };
        self.reject(prefix);
        outcome
    }

    /// Count a declaration of `prefix` for the next element that is not bound
    pub fn reject(&mut self, prefix: &str) {
        *self.pending_rejected.entry(prefix.to_owned()).or_insert(0) += 1;
    }

    /// Consume one rejected declaration of `prefix` on the element that
    /// closed last. Returns `false` once every rejected end was consumed.
    pub fn take_rejected_end(&mut self, prefix: &str) -> bool {
        match self.closed_rejected.get_mut(prefix) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Declarations waiting for the next element
    pub fn pending(&self) -> &ScopeFrame {
        &self.pending
    }

    /// Open a frame holding the pending declarations
    pub fn push_frame(&mut self) {
        let frame = std::mem::take(&mut self.pending);
        self.frames.push(frame);
        let rejected = std::mem::take(&mut self.pending_rejected);
        self.rejected.push(rejected);
    }

    /// Close the innermost frame and return its declarations
    pub fn pop_frame(&mut self) -> ScopeFrame {
        self.closed_rejected = self.rejected.pop().unwrap_or_default();
        self.frames.pop().unwrap_or_default()
    }

    /// Number of open frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Resolve a prefix against the pending and open frames
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        std::iter::once(&self.pending)
            .chain(self.frames.iter().rev())
            .find_map(|frame| frame.get(prefix))
            .map(String::as_str)
    }

    /// All effective bindings, outermost declaration first.
    ///
    /// A redeclared prefix appears once, at the position of the declaration
    /// that shadows the others.
    pub fn in_scope(&self) -> Vec<(&str, &str)> {
        let mut effective: IndexMap<&str, &str> = IndexMap::new();
        for frame in self.frames.iter().chain(std::iter::once(&self.pending)) {
            for (prefix, uri) in frame {
                effective.shift_remove(prefix.as_str());
                effective.insert(prefix.as_str(), uri.as_str());
            }
        }
        effective.into_iter().collect()
    }
}
