//! Fixture document parsing.
//!
//! Documents are loaded from XML/XHTML-ish fixture files. The root
//! element may carry `url` / `origin` attributes; otherwise the caller's
//! fallback URL applies (origin is derived from the URL either way).

use anyhow::{bail, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::node::{origin_of, Document, ElementData, Node, NodeId, NodeKind};

static DECIMAL_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#(\d+);").unwrap());
static HEX_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#x([0-9A-Fa-f]+);").unwrap());

/// Decode common HTML entities: &lt; &gt; &quot; &apos; &nbsp; plus
/// decimal and hex numeric forms, with &amp; handled last.
fn decode_entities(s: &str) -> String {
    let mut result = s.to_string();

    result = result.replace("&lt;", "<");
    result = result.replace("&gt;", ">");
    result = result.replace("&quot;", "\"");
    result = result.replace("&apos;", "'");
    result = result.replace("&nbsp;", " ");

    result = DECIMAL_ENTITY
        .replace_all(&result, |caps: &regex::Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();

    result = HEX_ENTITY
        .replace_all(&result, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();

    result.replace("&amp;", "&")
}

fn read_element(e: &BytesStart) -> ElementData {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let mut attributes = BTreeMap::new();
    for attr in e.attributes().filter_map(|a| a.ok()) {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = decode_entities(&String::from_utf8_lossy(&attr.value));
        attributes.insert(key, value);
    }
    ElementData { tag, attributes }
}

/// Parse a fixture document from XML text.
pub fn parse_document(xml: &str, fallback_url: &str) -> Result<Document> {
    let mut doc = Document::new(fallback_url);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let id = append_element(&mut doc, &stack, read_element(e));
                stack.push(id);
            }
            Ok(Event::Empty(ref e)) => {
                append_element(&mut doc, &stack, read_element(e));
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(ref t)) => {
                let text = decode_entities(&String::from_utf8_lossy(t.as_ref()));
                if let Some(&parent) = stack.last() {
                    if !text.trim().is_empty() {
                        doc.push_node(Node {
                            kind: NodeKind::Text(text.trim().to_string()),
                            parent: Some(parent),
                            children: Vec::new(),
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("XML parse error at byte {}: {e}", reader.buffer_position()),
            _ => {}
        }
        buf.clear();
    }

    if doc.root().is_none() {
        bail!("fixture contains no root element");
    }
    Ok(doc)
}

fn append_element(doc: &mut Document, stack: &[NodeId], el: ElementData) -> NodeId {
    let parent = stack.last().copied();
    // Root element may override the document URL/origin.
    if parent.is_none() && doc.root().is_none() {
        if let Some(url) = el.attr("url") {
            doc.url = url.to_string();
            doc.origin = origin_of(url);
        }
        if let Some(origin) = el.attr("origin") {
            doc.origin = origin.to_string();
        }
    }
    doc.push_node(Node {
        kind: NodeKind::Element(el),
        parent,
        children: Vec::new(),
    })
}

/// Parse a fixture document from a file on disk.
pub fn parse_document_file(path: &std::path::Path, fallback_url: &str) -> Result<Document> {
    let xml = std::fs::read_to_string(path)?;
    parse_document(&xml, fallback_url)
}
