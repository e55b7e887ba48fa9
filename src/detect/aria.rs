//! Explicit-markup label detection (ARIA attributes, `<label for>`,
//! wrapping `<label>`).
//!
//! The most trusted strategy in the default registry: when the page
//! author wired up labeling explicitly, believe them.

use std::collections::BTreeMap;

use crate::dom::{Document, NodeId};

use super::engine::{Candidate, Detector};
use super::text;

pub const NAME: &str = "explicit-markup";
pub const PRIORITY: u8 = 10;
pub const BASE_CONFIDENCE: f32 = 0.90;

const FLOOR: f32 = 0.40;

pub fn detector() -> Detector {
    Detector {
        name: NAME,
        priority: PRIORITY,
        base_confidence: BASE_CONFIDENCE,
        can_detect,
        detect,
    }
}

fn can_detect(doc: &Document, node: NodeId) -> bool {
    if !doc.is_element(node) {
        return false;
    }
    doc.attr(node, "aria-label").is_some()
        || doc.attr(node, "aria-labelledby").is_some()
        || referencing_label(doc, node).is_some()
        || wrapping_label(doc, node).is_some()
}

fn detect(doc: &Document, node: NodeId) -> Option<Candidate> {
    let (raw, base, source) = if let Some(v) = doc.attr(node, "aria-label") {
        (v.to_string(), 0.90, "aria-label")
    } else if let Some(ids) = doc.attr(node, "aria-labelledby") {
        (labelledby_text(doc, ids), 0.85, "aria-labelledby")
    } else if let Some(label) = referencing_label(doc, node) {
        (doc.text_content(label), 0.85, "label-for")
    } else if let Some(label) = wrapping_label(doc, node) {
        (doc.text_content(label), 0.80, "label-wrapper")
    } else {
        return None;
    };

    let label = text::clean_label(&raw);
    if label.is_empty() {
        return None;
    }

    let mut confidence = base + text::length_adjustment(&label);
    if text::is_generic_label(&label) {
        confidence -= 0.10;
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), source.to_string());

    Some(Candidate {
        label,
        confidence: text::clamp_confidence(confidence, FLOOR),
        metadata,
    })
}

/// Space-separated id list resolved to concatenated referent text.
fn labelledby_text(doc: &Document, ids: &str) -> String {
    let mut parts = Vec::new();
    for id in ids.split_whitespace() {
        if let Some(node) = doc.element_by_id(id) {
            let t = doc.text_content(node);
            if !t.trim().is_empty() {
                parts.push(t.trim().to_string());
            }
        }
    }
    parts.join(" ")
}

/// A `<label for=...>` pointing at this element's id.
fn referencing_label(doc: &Document, node: NodeId) -> Option<NodeId> {
    let id = doc.attr(node, "id")?;
    doc.descendants()
        .find(|&n| doc.tag_name(n) == Some("label") && doc.attr(n, "for") == Some(id))
}

/// A `<label>` ancestor wrapping the element.
fn wrapping_label(doc: &Document, node: NodeId) -> Option<NodeId> {
    let list = "label".parse().ok()?;
    let hit = doc.closest(node, &list)?;
    if hit == node {
        None
    } else {
        Some(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_aria_label_wins() {
        let mut b = Document::builder("https://x.test/");
        let root = b.elem(None, "form", &[]);
        let input = b.elem(
            Some(root),
            "input",
            &[("type", "text"), ("aria-label", "Search orders")],
        );
        let doc = b.finish();
        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Search orders");
        assert_eq!(c.metadata.get("source").map(String::as_str), Some("aria-label"));
        assert!((c.confidence - 0.92).abs() < 1e-6);
    }

    #[test]
    fn test_aria_labelledby_resolution() {
        let mut b = Document::builder("https://x.test/");
        let root = b.elem(None, "form", &[]);
        let t1 = b.elem(Some(root), "span", &[("id", "billing")]);
        b.text(t1, "Billing");
        let t2 = b.elem(Some(root), "span", &[("id", "addr")]);
        b.text(t2, "Address");
        let input = b.elem(
            Some(root),
            "input",
            &[("type", "text"), ("aria-labelledby", "billing addr")],
        );
        let doc = b.finish();
        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Billing Address");
    }

    #[test]
    fn test_label_for() {
        let mut b = Document::builder("https://x.test/");
        let root = b.elem(None, "form", &[]);
        let label = b.elem(Some(root), "label", &[("for", "pw")]);
        b.text(label, "Password:");
        let input = b.elem(Some(root), "input", &[("type", "password"), ("id", "pw")]);
        let doc = b.finish();
        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Password");
        assert_eq!(c.metadata.get("source").map(String::as_str), Some("label-for"));
    }

    #[test]
    fn test_wrapping_label() {
        let mut b = Document::builder("https://x.test/");
        let root = b.elem(None, "form", &[]);
        let label = b.elem(Some(root), "label", &[]);
        b.text(label, "Remember me");
        let input = b.elem(Some(label), "input", &[("type", "checkbox")]);
        let doc = b.finish();
        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Remember me");
        assert_eq!(c.metadata.get("source").map(String::as_str), Some("label-wrapper"));
    }

    #[test]
    fn test_not_applicable_without_markup() {
        let mut b = Document::builder("https://x.test/");
        let root = b.elem(None, "form", &[]);
        let input = b.elem(Some(root), "input", &[("type", "text")]);
        let doc = b.finish();
        assert!(!can_detect(&doc, input));
    }
}
