//! Streaming producer over `quick-xml`

use super::dtd::{self, DtdDecl};
use crate::error::{Error, Result};
use crate::events::{Attribute, Attributes, EventProducer, EventSink, Locator};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, PrefixDeclaration, ResolveResult};
use quick_xml::NsReader;

/// Converts byte offsets into 1-based line and column numbers
#[derive(Debug)]
struct PositionTracker<'i> {
    input: &'i [u8],
    offset: usize,
    line: u64,
    column: u64,
}

impl<'i> PositionTracker<'i> {
    fn new(input: &'i str) -> Self {
        Self {
            input: input.as_bytes(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Position of `offset`; offsets must not decrease between calls
    fn advance(&mut self, offset: usize) -> (u64, u64) {
        let end = offset.min(self.input.len());
        for &byte in &self.input[self.offset.min(end)..end] {
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if byte & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
        self.offset = self.offset.max(end);
        (self.line, self.column)
    }
}

#[derive(Debug)]
struct OpenElement {
    namespace: String,
    local_name: String,
    qualified_name: String,
    prefixes: Vec<String>,
}

fn decode(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::Xml(format!("invalid UTF-8: {}", e)))
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<String> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(decode(uri)?.to_string()),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) => Err(Error::Namespace(format!(
            "prefix '{}' is not declared",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

/// Produces the events of an XML document held in memory
#[derive(Debug, Clone)]
pub struct XmlReaderProducer<'i> {
    input: &'i str,
    system_id: Option<String>,
}

impl<'i> XmlReaderProducer<'i> {
    /// Read from `input`
    pub fn new(input: &'i str) -> Self {
        Self {
            input,
            system_id: None,
        }
    }

    /// Name the document in positions and diagnostics
    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }

    fn start_element(
        reader: &NsReader<&'i [u8]>,
        namespace: String,
        start: &BytesStart<'_>,
        sink: &mut dyn EventSink,
    ) -> Result<OpenElement> {
        let qualified_name = decode(start.name().as_ref())?.to_string();
        let local_name = decode(start.local_name().as_ref())?.to_string();

        let mut prefixes = Vec::new();
        let mut attributes = Attributes::new();
        for attribute in start.attributes() {
            let attribute =
                attribute.map_err(|e| Error::Xml(format!("bad attribute in <{}>: {}", qualified_name, e)))?;
            let value = attribute
                .unescape_value()
                .map_err(|e| Error::Xml(format!("bad attribute value in <{}>: {}", qualified_name, e)))?;

            if let Some(binding) = attribute.key.as_namespace_binding() {
                let prefix = match binding {
                    PrefixDeclaration::Default => "",
                    PrefixDeclaration::Named(prefix) => decode(prefix)?,
                };
                sink.start_prefix_mapping(prefix, &value)?;
                prefixes.push(prefix.to_string());
                continue;
            }

            let (resolved, local) = reader.resolve_attribute(attribute.key);
            attributes.push(Attribute::new(
                namespace_of(resolved)?,
                decode(local.as_ref())?,
                decode(attribute.key.as_ref())?,
                value.into_owned(),
            ));
        }

        sink.start_element(&namespace, &local_name, &qualified_name, &attributes)?;
        Ok(OpenElement {
            namespace,
            local_name,
            qualified_name,
            prefixes,
        })
    }
}

impl<'i> EventProducer for XmlReaderProducer<'i> {
    fn produce(&mut self, sink: &mut dyn EventSink) -> Result<()> {
        let mut reader = NsReader::from_str(self.input);
        reader.expand_empty_elements(true);

        let mut tracker = PositionTracker::new(self.input);
        let mut locator = Locator::new(self.system_id.clone());
        let mut open: Vec<OpenElement> = Vec::new();

        sink.set_document_locator(&locator);
        sink.start_document()?;

        loop {
            let (line, column) = tracker.advance(reader.buffer_position());
            locator.line = line;
            locator.column = column;
            sink.set_document_locator(&locator);

            let (resolved, event) = reader.read_resolved_event().map_err(|e| {
                Error::Xml(format!("{} at line {}, column {}", e, line, column))
            })?;
            let namespace = namespace_of(resolved)?;

            match event {
                Event::Start(start) => {
                    let element = Self::start_element(&reader, namespace, &start, sink)?;
                    open.push(element);
                }
                Event::End(end) => {
                    let element = open.pop().ok_or_else(|| {
                        Error::Structure(format!(
                            "unexpected end tag '{}'",
                            String::from_utf8_lossy(end.name().as_ref())
                        ))
                    })?;
                    sink.end_element(
                        &element.namespace,
                        &element.local_name,
                        &element.qualified_name,
                    )?;
                    for prefix in &element.prefixes {
                        sink.end_prefix_mapping(prefix)?;
                    }
                }
                Event::Text(text) if !open.is_empty() => {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::Xml(format!("failed to unescape text: {}", e)))?;
                    sink.characters(&text)?;
                }
                Event::CData(data) if !open.is_empty() => {
                    sink.characters(decode(&data)?)?;
                }
                Event::PI(content) => {
                    let content = decode(&content)?;
                    let (target, data) = match content.split_once(char::is_whitespace) {
                        Some((target, data)) => (target, data.trim_start()),
                        None => (content, ""),
                    };
                    sink.processing_instruction(target, data)?;
                }
                Event::DocType(doctype) => {
                    for decl in dtd::scan(decode(&doctype)?) {
                        match decl {
                            DtdDecl::Notation(notation) => sink.notation_decl(&notation)?,
                            DtdDecl::UnparsedEntity(entity) => sink.unparsed_entity_decl(&entity)?,
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(element) = open.last() {
            return Err(Error::Structure(format!(
                "document ended inside <{}>",
                element.qualified_name
            )));
        }
        log::trace!(target: "xmlislands::produce", "document read to line {}", locator.line);
        sink.end_document()
    }
}
