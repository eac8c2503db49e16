//! Replay of a parsed `roxmltree` document

use super::dtd::{self, DtdDecl};
use crate::error::Result;
use crate::events::{Attribute, Attributes, EventProducer, EventSink, Locator};
use roxmltree::{Document, Node, NodeType};

/// Prefixes declared on `node` itself, default namespace as `""`
fn declared_prefixes(node: Node<'_, '_>) -> Vec<(String, String)> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| (ns.name().unwrap_or_default().to_string(), ns.uri().to_string()))
        .collect()
}

fn qualified(node: Node<'_, '_>, namespace: Option<&str>, local_name: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local_name),
        _ => local_name.to_string(),
    }
}

/// Produces the events of an already parsed document
#[derive(Debug, Clone)]
pub struct TreeProducer<'a, 'input> {
    document: &'a Document<'input>,
    system_id: Option<String>,
}

impl<'a, 'input> TreeProducer<'a, 'input> {
    /// Replay `document`
    pub fn new(document: &'a Document<'input>) -> Self {
        Self {
            document,
            system_id: None,
        }
    }

    /// Name the document in positions and diagnostics
    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }

    fn move_to(&self, locator: &mut Locator, node: Node<'_, '_>, sink: &mut dyn EventSink) {
        let position = self.document.text_pos_at(node.range().start);
        locator.line = u64::from(position.row);
        locator.column = u64::from(position.col);
        sink.set_document_locator(locator);
    }

    /// Emit the events of `node` and everything below it
    fn walk(
        &self,
        node: Node<'_, '_>,
        locator: &mut Locator,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        match node.node_type() {
            NodeType::Element => {}
            NodeType::Text => {
                self.move_to(locator, node, sink);
                return sink.characters(node.text().unwrap_or_default());
            }
            NodeType::PI => {
                if let Some(pi) = node.pi() {
                    self.move_to(locator, node, sink);
                    sink.processing_instruction(pi.target, pi.value.unwrap_or_default())?;
                }
                return Ok(());
            }
            NodeType::Root | NodeType::Comment => return Ok(()),
        }

        self.move_to(locator, node, sink);
        let declared = declared_prefixes(node);
        for (prefix, uri) in &declared {
            sink.start_prefix_mapping(prefix, uri)?;
        }

        let attributes: Attributes = node
            .attributes()
            .map(|attr| {
                Attribute::new(
                    attr.namespace().unwrap_or_default(),
                    attr.name(),
                    qualified(node, attr.namespace(), attr.name()),
                    attr.value(),
                )
            })
            .collect();
        let tag = node.tag_name();
        let qualified_name = qualified(node, tag.namespace(), tag.name());
        let namespace = tag.namespace().unwrap_or_default();
        sink.start_element(namespace, tag.name(), &qualified_name, &attributes)?;

        for child in node.children() {
            self.walk(child, locator, sink)?;
        }

        sink.end_element(namespace, tag.name(), &qualified_name)?;
        for (prefix, _) in &declared {
            sink.end_prefix_mapping(prefix)?;
        }
        Ok(())
    }
}

impl<'a, 'input> EventProducer for TreeProducer<'a, 'input> {
    fn produce(&mut self, sink: &mut dyn EventSink) -> Result<()> {
        let document = self.document;
        let mut locator = Locator::new(self.system_id.clone());
        sink.set_document_locator(&locator);
        sink.start_document()?;

        // The tree keeps no notations, so they are scanned from the prolog.
        let prolog = &document.input_text()[..document.root_element().range().start];
        for decl in dtd::scan(prolog) {
            match decl {
                DtdDecl::Notation(notation) => sink.notation_decl(&notation)?,
                DtdDecl::UnparsedEntity(entity) => sink.unparsed_entity_decl(&entity)?,
            }
        }

        for child in document.root().children() {
            self.walk(child, &mut locator, sink)?;
        }

        sink.end_document()
    }
}
