//! Event producers
//!
//! A producer turns a document into calls on an
//! [`EventSink`](crate::events::EventSink): prefix declarations before the
//! start tag that makes them, and their ends after the matching end tag.

pub mod dtd;
pub mod reader;
pub mod tree;

pub use dtd::DtdDecl;
pub use reader::XmlReaderProducer;
pub use tree::TreeProducer;

#[cfg(test)]
pub(crate) mod testing;
