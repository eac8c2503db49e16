//! XML name validation and prefix declaration rules
//!
//! The dispatcher uses these checks to decide whether a prefix declaration
//! is well-formed before it enters the namespace scope.

use crate::{XMLNS_NAMESPACE, XML_NAMESPACE};
use once_cell::sync::Lazy;
use regex::Regex;

// Simplified NCName (ASCII plus Latin-1 letters).
static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\-\.0-9\u{B7}]*$")
        .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Check if a string is a valid QName (qualified name)
pub fn is_valid_qname(name: &str) -> bool {
    match split_qname(name) {
        (Some(prefix), local) => is_valid_ncname(prefix) && is_valid_ncname(local),
        (None, local) => is_valid_ncname(local),
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Check a single `xmlns[:prefix]="uri"` declaration.
///
/// The empty prefix is the default namespace. Returns a description of the
/// problem for malformed declarations.
pub fn check_prefix_declaration(prefix: &str, uri: &str) -> Result<(), String> {
    if prefix == "xmlns" {
        return Err("the 'xmlns' prefix must not be declared".to_string());
    }
    if prefix == "xml" {
        return if uri == XML_NAMESPACE {
            Ok(())
        } else {
            Err(format!(
                "the 'xml' prefix can only be bound to '{}'",
                XML_NAMESPACE
            ))
        };
    }
    if uri == XML_NAMESPACE {
        return Err(format!(
            "'{}' can only be bound to the 'xml' prefix",
            XML_NAMESPACE
        ));
    }
    if uri == XMLNS_NAMESPACE {
        return Err(format!("'{}' must not be bound to a prefix", XMLNS_NAMESPACE));
    }
    if prefix.is_empty() {
        return Ok(());
    }
    if !is_valid_ncname(prefix) {
        return Err(format!("'{}' is not a valid prefix", prefix));
    }
    if uri.is_empty() {
        return Err(format!("prefix '{}' cannot be undeclared", prefix));
    }
    Ok(())
}
