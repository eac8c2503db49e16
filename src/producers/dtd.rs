//! Declarations scanned from a document type declaration
//!
//! Only the declarations a validator needs to carry along are extracted:
//! `<!NOTATION>` and unparsed `<!ENTITY ... NDATA ...>`. Parameter entities,
//! element and attribute-list declarations are skipped.

use crate::events::{NotationDecl, UnparsedEntityDecl};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

const NAME: &str = r#"[\w:][\w.:\-]*"#;
const LITERAL: &str = r#""[^"]*"|'[^']*'"#;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static PROCESSING_INSTRUCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<\?.*?\?>").unwrap());

static NOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"<!NOTATION\s+(?P<name>{NAME})\s+(?:PUBLIC\s+(?P<pub>{LITERAL})(?:\s+(?P<pubsys>{LITERAL}))?|SYSTEM\s+(?P<sys>{LITERAL}))\s*>"
    ))
    .unwrap()
});

static UNPARSED_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"<!ENTITY\s+(?P<name>{NAME})\s+(?:PUBLIC\s+(?P<pub>{LITERAL})\s+(?P<pubsys>{LITERAL})|SYSTEM\s+(?P<sys>{LITERAL}))\s+NDATA\s+(?P<notation>{NAME})\s*>"
    ))
    .unwrap()
});

/// A declaration found in the document type declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DtdDecl {
    /// `<!NOTATION name ...>`
    Notation(NotationDecl),
    /// `<!ENTITY name ... NDATA notation>`
    UnparsedEntity(UnparsedEntityDecl),
}

fn unquote(literal: &str) -> String {
    literal[1..literal.len() - 1].to_string()
}

/// Byte ranges of the quoted literals in `text`, quotes included
fn literal_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut open: Option<(char, usize)> = None;
    for (i, c) in text.char_indices() {
        match open {
            Some((quote, start)) if c == quote => {
                spans.push(start..i + 1);
                open = None;
            }
            Some(_) => {}
            None if c == '"' || c == '\'' => open = Some((c, i)),
            None => {}
        }
    }
    if let Some((_, start)) = open {
        spans.push(start..text.len());
    }
    spans
}

/// Scan `text` for notation and unparsed entity declarations, in document
/// order. Declarations inside comments, processing instructions or quoted
/// literals are ignored.
pub fn scan(text: &str) -> Vec<DtdDecl> {
    let text = COMMENT.replace_all(text, "");
    let text = PROCESSING_INSTRUCTION.replace_all(&text, "");
    let literals = literal_spans(&text);
    let quoted = |start: usize| literals.iter().any(|span| span.contains(&start));
    let mut found: Vec<(usize, DtdDecl)> = Vec::new();

    for caps in NOTATION.captures_iter(&text) {
        let start = caps.get(0).map_or(0, |m| m.start());
        if quoted(start) {
            continue;
        }
        let public_id = caps.name("pub").map(|m| unquote(m.as_str()));
        let system_id = caps
            .name("pubsys")
            .or_else(|| caps.name("sys"))
            .map(|m| unquote(m.as_str()));
        found.push((
            start,
            DtdDecl::Notation(NotationDecl {
                name: caps["name"].to_string(),
                public_id,
                system_id,
            }),
        ));
    }

    for caps in UNPARSED_ENTITY.captures_iter(&text) {
        let start = caps.get(0).map_or(0, |m| m.start());
        if quoted(start) {
            continue;
        }
        let system_id = caps
            .name("pubsys")
            .or_else(|| caps.name("sys"))
            .map(|m| unquote(m.as_str()))
            .unwrap_or_default();
        found.push((
            start,
            DtdDecl::UnparsedEntity(UnparsedEntityDecl {
                name: caps["name"].to_string(),
                public_id: caps.name("pub").map(|m| unquote(m.as_str())),
                system_id,
                notation: caps["notation"].to_string(),
            }),
        ));
    }

    found.sort_by_key(|(position, _)| *position);
    log::trace!(target: "xmlislands::produce", "scanned {} DTD declaration(s)", found.len());
    found.into_iter().map(|(_, decl)| decl).collect()
}
