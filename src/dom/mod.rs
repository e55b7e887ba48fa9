//! In-memory DOM facade.
//!
//! The recorder never touches a live browser DOM directly. Everything it
//! needs from an element — tag, attributes, siblings, parent, selector
//! matching, visibility — goes through [`Document`], an arena-backed tree
//! that can be parsed from an XML fixture or built programmatically. This
//! keeps capture and label detection testable against in-memory fixtures
//! and portable to a real DOM binding.

pub mod node;
pub mod parse;
pub mod selector;

pub use node::{Document, DocumentBuilder, ElementData, Node, NodeId, NodeKind};
pub use parse::{parse_document, parse_document_file};
pub use selector::{Compound, SelectorError, SelectorList};
