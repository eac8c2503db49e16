//! Recording sink shared by the producer tests

use crate::error::Result;
use crate::events::{Attributes, EventSink, Locator, NotationDecl, UnparsedEntityDecl};

/// Sink that renders every event as a line of text
#[derive(Debug, Default)]
pub(crate) struct Trace {
    pub(crate) events: Vec<String>,
    pub(crate) lines: Vec<u64>,
}

impl EventSink for Trace {
    fn set_document_locator(&mut self, locator: &Locator) {
        self.lines.push(locator.line);
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.events.push(format!("+{}={}", prefix, uri));
        Ok(())
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()> {
        self.events.push(format!("-{}", prefix));
        Ok(())
    }

    fn start_element(
        &mut self,
        namespace: &str,
        local_name: &str,
        qualified_name: &str,
        attributes: &Attributes,
    ) -> Result<()> {
        let attrs: Vec<_> = attributes
            .iter()
            .map(|a| format!("{{{}}}{}={}", a.namespace, a.local_name, a.value))
            .collect();
        self.events.push(format!(
            "<{{{}}}{} {} [{}]",
            namespace,
            local_name,
            qualified_name,
            attrs.join(" ")
        ));
        Ok(())
    }

    fn end_element(&mut self, _namespace: &str, _local_name: &str, qualified_name: &str) -> Result<()> {
        self.events.push(format!("</{}", qualified_name));
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        if !text.trim().is_empty() {
            self.events.push(format!("'{}'", text));
        }
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        self.events.push(format!("?{} {}", target, data));
        Ok(())
    }

    fn notation_decl(&mut self, decl: &NotationDecl) -> Result<()> {
        self.events.push(format!("!N {}", decl.name));
        Ok(())
    }

    fn unparsed_entity_decl(&mut self, decl: &UnparsedEntityDecl) -> Result<()> {
        self.events.push(format!("!E {}", decl.name));
        Ok(())
    }
}
