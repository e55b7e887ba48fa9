//! Placeholder/title label detection.
//!
//! Reads labeling hints the element carries itself: the `placeholder`
//! attribute family and, last, `title` (tooltip semantics, weakest
//! signal). Runs after explicit markup and sibling proximity in the
//! default registry.

use std::collections::BTreeMap;

use crate::dom::{Document, NodeId};

use super::engine::{Candidate, Detector};
use super::text;

pub const NAME: &str = "placeholder";
pub const PRIORITY: u8 = 30;
pub const BASE_CONFIDENCE: f32 = 0.70;

/// Confidence never leaves [0.30, 1.0] no matter how adjustments stack.
const FLOOR: f32 = 0.30;

/// Input types where a placeholder-family attribute cannot be a label.
const INCOMPATIBLE_TYPES: &[&str] = &[
    "hidden",
    "checkbox",
    "radio",
    "file",
    "submit",
    "reset",
    "button",
    "color",
    "date",
    "datetime-local",
    "month",
    "week",
    "time",
    "range",
];

/// Attribute candidates in trust order with their base confidences.
const SOURCES: &[(&str, f32)] = &[
    ("placeholder", 0.70),
    ("data-placeholder", 0.65),
    ("data-original-placeholder", 0.65),
    ("data-label", 0.65),
    ("title", 0.60),
];

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
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    let carries_hint = SOURCES.iter().any(|(attr, _)| doc.attr(node, attr).is_some());
    let input_like = tag == "input" || tag == "textarea";
    if !input_like && !carries_hint {
        return false;
    }
    if tag == "input" {
        let ty = doc.attr(node, "type").unwrap_or("text").to_ascii_lowercase();
        if INCOMPATIBLE_TYPES.contains(&ty.as_str()) {
            return false;
        }
    }
    true
}

fn detect(doc: &Document, node: NodeId) -> Option<Candidate> {
    for (attr, base) in SOURCES {
        let Some(raw) = doc.attr(node, attr) else {
            continue;
        };
        let cleaned = text::clean_label(raw);
        if cleaned.is_empty() {
            continue;
        }
        return Some(score(cleaned, *base, attr));
    }
    None
}

fn score(cleaned: String, base: f32, source: &str) -> Candidate {
    let mut confidence = base;
    let mut label = cleaned.clone();
    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), source.to_string());

    if text::is_generic_placeholder(&cleaned) {
        confidence -= 0.15;
        metadata.insert("generic_placeholder".to_string(), "true".to_string());
    }

    if text::is_instructional(&cleaned) {
        if let Some(concept) = text::extract_instructional_concept(&cleaned) {
            // A usable label survives the phrasing, so penalize less.
            confidence -= 0.05;
            metadata.insert("extracted_from".to_string(), cleaned.clone());
            label = concept;
        } else {
            confidence -= 0.10;
        }
    }

    if text::looks_like_example(&cleaned) {
        confidence += 0.05;
        metadata.insert("example_pattern".to_string(), "true".to_string());
    }

    confidence += text::length_adjustment(&label);

    if text::is_generic_label(&label) {
        confidence -= 0.10;
    }

    Candidate {
        label,
        confidence: text::clamp_confidence(confidence, FLOOR),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn input_doc(attrs: &[(&str, &str)]) -> (Document, NodeId) {
        let mut b = Document::builder("https://x.test/");
        let root = b.elem(None, "form", &[]);
        let input = b.elem(Some(root), "input", attrs);
        (b.finish(), input)
    }

    #[test]
    fn test_plain_placeholder() {
        let (doc, input) = input_doc(&[("type", "text"), ("placeholder", "Shipping address")]);
        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Shipping address");
        // 0.70 base + 0.02 ideal length
        assert!((c.confidence - 0.72).abs() < 1e-6);
    }

    #[test]
    fn test_attribute_order() {
        let (doc, input) = input_doc(&[
            ("type", "text"),
            ("title", "Tooltip text"),
            ("data-label", "Data label"),
            ("placeholder", "Primary"),
        ]);
        let c = detect(&doc, input).unwrap();
        assert_eq!(c.metadata.get("source").map(String::as_str), Some("placeholder"));
        assert_eq!(c.label, "Primary");
    }

    #[test]
    fn test_title_is_weakest() {
        let (doc, input) = input_doc(&[("type", "text"), ("title", "Billing reference")]);
        let c = detect(&doc, input).unwrap();
        assert_eq!(c.metadata.get("source").map(String::as_str), Some("title"));
        assert!(c.confidence < 0.70);
    }

    #[test]
    fn test_instructional_extraction_recovers_concept() {
        let (doc, input) = input_doc(&[("type", "text"), ("placeholder", "Enter your email")]);
        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "email");
        assert_eq!(
            c.metadata.get("extracted_from").map(String::as_str),
            Some("Enter your email")
        );
    }

    #[test]
    fn test_generic_placeholder_penalized() {
        let (doc, input) = input_doc(&[("type", "text"), ("placeholder", "Search")]);
        let strong = input_doc(&[("type", "text"), ("placeholder", "Order number")]);
        let weak = detect(&doc, input).unwrap();
        let strong = detect(&strong.0, strong.1).unwrap();
        assert!(weak.confidence < strong.confidence);
    }

    #[test]
    fn test_incompatible_types_rejected() {
        for ty in ["hidden", "checkbox", "radio", "file", "submit", "color", "range", "date"] {
            let (doc, input) = input_doc(&[("type", ty), ("placeholder", "x")]);
            assert!(!can_detect(&doc, input), "type {ty} must not apply");
        }
    }

    #[test]
    fn test_non_input_with_placeholder_family_applies() {
        let mut b = Document::builder("https://x.test/");
        let root = b.elem(None, "div", &[]);
        let editable = b.elem(Some(root), "div", &[("data-placeholder", "Comment")]);
        let doc = b.finish();
        assert!(can_detect(&doc, editable));
        assert_eq!(detect(&doc, editable).unwrap().label, "Comment");
    }

    #[test]
    fn test_confidence_bounds_under_stacking() {
        // Worst stack: generic + instructional + too short still floors
        // at 0.30; best stack never exceeds 1.0.
        let (doc, input) = input_doc(&[("type", "text"), ("title", "..")]);
        if let Some(c) = detect(&doc, input) {
            assert!(c.confidence >= 0.30 && c.confidence <= 1.0);
        }
        let long = "long ".repeat(20);
        let cases = [
            "Search",
            "..",
            "Enter text",
            "Type here",
            "e.g. jane@corp.com",
            "x",
            long.as_str(),
        ];
        for case in cases {
            let (doc, input) = input_doc(&[("type", "text"), ("placeholder", case)]);
            if let Some(c) = detect(&doc, input) {
                assert!(
                    (0.30..=1.0).contains(&c.confidence),
                    "confidence {} out of bounds for {case:?}",
                    c.confidence
                );
            }
        }
    }
}
