//! Push-style document events
//!
//! An event producer turns a document into calls on an [`EventSink`], in
//! document order. The [`Dispatcher`](crate::islands::Dispatcher) is the
//! main sink; [`Fork`] lets a second consumer observe the same stream.

use crate::error::Result;
use serde::Serialize;

/// One attribute of a start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, empty for unqualified attributes
    pub namespace: String,
    /// Local name
    pub local_name: String,
    /// Name as written in the document
    pub qualified_name: String,
    /// Normalized value
    pub value: String,
}

impl Attribute {
    /// Create a new attribute
    pub fn new(
        namespace: impl Into<String>,
        local_name: impl Into<String>,
        qualified_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
            qualified_name: qualified_name.into(),
            value: value.into(),
        }
    }

    /// Create an unqualified attribute
    pub fn local(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(String::new(), name.clone(), name, value)
    }
}

/// Ordered attribute list of a start tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    /// Create an empty attribute list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute
    pub fn push(&mut self, attribute: Attribute) {
        self.items.push(attribute);
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in document order
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.items.iter()
    }

    /// Look up a value by namespace and local name
    pub fn value(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|a| a.namespace == namespace && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Current position of the producer in its input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    /// Identifier of the document, usually a path or URL
    pub system_id: Option<String>,
    /// 1-based line
    pub line: u64,
    /// 1-based column
    pub column: u64,
}

impl Locator {
    /// Create a locator at the start of a document
    pub fn new(system_id: Option<String>) -> Self {
        Self {
            system_id,
            line: 1,
            column: 1,
        }
    }
}

/// `<!NOTATION>` declaration from the DTD
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotationDecl {
    /// Notation name
    pub name: String,
    /// Public identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    /// System identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
}

/// Unparsed `<!ENTITY ... NDATA>` declaration from the DTD
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnparsedEntityDecl {
    /// Entity name
    pub name: String,
    /// Public identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    /// System identifier
    pub system_id: String,
    /// Name of the notation of the entity data
    pub notation: String,
}

/// Receiver of document events.
///
/// Every event except the element, prefix and character events has a no-op
/// default, so sinks only implement what they care about.
pub trait EventSink {
    /// The producer moved; called before the event at that position
    fn set_document_locator(&mut self, _locator: &Locator) {}

    /// Start of the document
    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    /// End of the document
    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }

    /// A prefix comes into scope for the next element
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()>;

    /// A prefix goes out of scope after its element closed
    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()>;

    /// Start tag
    fn start_element(
        &mut self,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) -> Result<()>;

    /// End tag
    fn end_element(&mut self, namespace: &str, local_name: &str, qualified_name: &str)
        -> Result<()>;

    /// Character data
    fn characters(&mut self, text: &str) -> Result<()>;

    /// Whitespace the DTD marks as insignificant
    fn ignorable_whitespace(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    /// Processing instruction
    fn processing_instruction(&mut self, _target: &str, _data: &str) -> Result<()> {
        Ok(())
    }

    /// An entity reference the producer did not expand
    fn skipped_entity(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Notation declaration from the DTD
    fn notation_decl(&mut self, _decl: &NotationDecl) -> Result<()> {
        Ok(())
    }

    /// Unparsed entity declaration from the DTD
    fn unparsed_entity_decl(&mut self, _decl: &UnparsedEntityDecl) -> Result<()> {
        Ok(())
    }
}

/// Something that can push a whole document into a sink
pub trait EventProducer {
    /// Deliver every event of the document to `sink`
    fn produce(&mut self, sink: &mut dyn EventSink) -> Result<()>;
}

/// Tees every event to two sinks, `first` before `second`.
///
/// An error from `first` stops the event before it reaches `second`.
#[derive(Debug)]
pub struct Fork<A, B> {
    /// Sink that sees each event first
    pub first: A,
    /// Sink that sees each event second
    pub second: B,
}

impl<A, B> Fork<A, B> {
    /// Create a fork
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Split back into the two sinks
    pub fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: EventSink, B: EventSink> EventSink for Fork<A, B> {
    fn set_document_locator(&mut self, locator: &Locator) {
        self.first.set_document_locator(locator);
        self.second.set_document_locator(locator);
    }

    fn start_document(&mut self) -> Result<()> {
        self.first.start_document()?;
        self.second.start_document()
    }

    fn end_document(&mut self) -> Result<()> {
        self.first.end_document()?;
        self.second.end_document()
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.first.start_prefix_mapping(prefix, uri)?;
        self.second.start_prefix_mapping(prefix, uri)
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()> {
        self.first.end_prefix_mapping(prefix)?;
        self.second.end_prefix_mapping(prefix)
    }

    fn start_element(
        &mut self,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) -> Result<()> {
        self.first
            .start_element(namespace, local_name, qualified_name, attributes)?;
        self.second
            .start_element(namespace, local_name, qualified_name, attributes)
    }

    fn end_element(
        &mut self,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
    ) -> Result<()> {
        self.first.end_element(namespace, local_name, qualified_name)?;
        self.second.end_element(namespace, local_name, qualified_name)
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.first.characters(text)?;
        self.second.characters(text)
    }

    fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        self.first.ignorable_whitespace(text)?;
        self.second.ignorable_whitespace(text)
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        self.first.processing_instruction(target, data)?;
        self.second.processing_instruction(target, data)
    }

    fn skipped_entity(&mut self, name: &str) -> Result<()> {
        self.first.skipped_entity(name)?;
        self.second.skipped_entity(name)
    }

    fn notation_decl(&mut self, decl: &NotationDecl) -> Result<()> {
        self.first.notation_decl(decl)?;
        self.second.notation_decl(decl)
    }

    fn unparsed_entity_decl(&mut self, decl: &UnparsedEntityDecl) -> Result<()> {
        self.first.unparsed_entity_decl(decl)?;
        self.second.unparsed_entity_decl(decl)
    }
}
