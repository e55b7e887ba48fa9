//! Sibling-proximity label detection.
//!
//! Infers a label from nearby markup: preceding label-like siblings,
//! loose text nodes, table row/header cells, trailing labels, and
//! wrapper-ancestor siblings. The workhorse fallback for forms that
//! carry no explicit labeling markup.

use std::collections::BTreeMap;

use crate::dom::{Document, NodeId};

use super::engine::{Candidate, Detector};
use super::text;

pub const NAME: &str = "sibling-proximity";
pub const PRIORITY: u8 = 20;
pub const BASE_CONFIDENCE: f32 = 0.60;

const FLOOR: f32 = 0.25;

/// How far back the previous-sibling scan reaches.
const MAX_SIBLING_HOPS: usize = 5;
/// How far up the wrapper walk climbs.
const MAX_WRAPPER_LEVELS: usize = 3;

const LABEL_LIKE_TAGS: &[&str] = &[
    "label", "span", "div", "p", "strong", "b", "em", "i", "small", "legend", "th", "dt",
];

const INTERACTIVE_TAGS: &[&str] = &["input", "button", "select", "textarea", "a", "option"];

const WRAPPER_TAGS: &[&str] = &["div", "span", "p", "td", "li", "dd"];

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
    doc.parent(node)
        .map(|p| doc.children(p).len() > 1)
        .unwrap_or(false)
}

struct RawCandidate {
    text: String,
    base: f32,
    pattern: &'static str,
}

fn detect(doc: &Document, node: NodeId) -> Option<Candidate> {
    let raw = previous_sibling_label(doc, node)
        .or_else(|| previous_text_node(doc, node))
        .or_else(|| table_cell_label(doc, node))
        .or_else(|| next_sibling_label(doc, node))
        .or_else(|| wrapper_label(doc, node))?;

    let label = text::clean_label(&raw.text);
    if label.is_empty() {
        return None;
    }

    let mut confidence = raw.base + text::length_adjustment(&label);
    if text::is_generic_label(&label) {
        confidence -= 0.10;
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("pattern".to_string(), raw.pattern.to_string());

    Some(Candidate {
        label,
        confidence: text::clamp_confidence(confidence, FLOOR),
        metadata,
    })
}

fn is_interactive(doc: &Document, node: NodeId) -> bool {
    doc.tag_name(node)
        .map(|t| INTERACTIVE_TAGS.contains(&t))
        .unwrap_or(false)
}

fn is_label_like(doc: &Document, node: NodeId) -> bool {
    doc.tag_name(node)
        .map(|t| LABEL_LIKE_TAGS.contains(&t))
        .unwrap_or(false)
}

/// Text of a label-like element, or of a shallow label-like descendant
/// (one or two levels down — a label inside a small wrapper).
fn label_like_text(doc: &Document, node: NodeId) -> Option<String> {
    if is_label_like(doc, node) {
        let own = text::clean_label(&doc.text_content(node));
        if !own.is_empty() {
            return Some(own);
        }
    }
    for child in doc.child_elements(node) {
        if is_label_like(doc, child) && !doc.is_hidden(child) {
            let t = text::clean_label(&doc.text_content(child));
            if !t.is_empty() {
                return Some(t);
            }
        }
        for grandchild in doc.child_elements(child) {
            if is_label_like(doc, grandchild) && !doc.is_hidden(grandchild) {
                let t = text::clean_label(&doc.text_content(grandchild));
                if !t.is_empty() {
                    return Some(t);
                }
            }
        }
    }
    None
}

/// (a) Previous element siblings, up to five hops, skipping interactive
/// and hidden ones. Extra hops cost 0.05 each.
fn previous_sibling_label(doc: &Document, node: NodeId) -> Option<RawCandidate> {
    let mut cur = doc.previous_element_sibling(node);
    let mut hop = 0usize;
    while let Some(sib) = cur {
        hop += 1;
        if hop > MAX_SIBLING_HOPS {
            break;
        }
        if !is_interactive(doc, sib) && !doc.is_hidden(sib) {
            if let Some(text) = label_like_text(doc, sib) {
                return Some(RawCandidate {
                    text,
                    base: 0.60 - 0.05 * (hop as f32 - 1.0),
                    pattern: "previous-sibling",
                });
            }
        }
        cur = doc.previous_element_sibling(sib);
    }
    None
}

/// (b) Loose text nodes before the element, walking backward until an
/// interactive element marks the boundary of the previous field.
fn previous_text_node(doc: &Document, node: NodeId) -> Option<RawCandidate> {
    let mut cur = doc.previous_sibling(node);
    while let Some(sib) = cur {
        if let Some(t) = doc.text_of(sib) {
            if !text::clean_label(t).is_empty() {
                return Some(RawCandidate {
                    text: t.to_string(),
                    base: 0.50,
                    pattern: "text-node",
                });
            }
        } else if is_interactive(doc, sib) {
            break;
        }
        cur = doc.previous_sibling(sib);
    }
    None
}

/// (c) Table cells: previous td/th in the same row, else the header (or
/// first-row) cell in the same column.
fn table_cell_label(doc: &Document, node: NodeId) -> Option<RawCandidate> {
    let cell_list = "td".parse().ok()?;
    let cell = doc.closest(node, &cell_list)?;
    let row = doc.parent(cell)?;
    if doc.tag_name(row) != Some("tr") {
        return None;
    }

    let cells: Vec<NodeId> = doc
        .child_elements(row)
        .filter(|&c| matches!(doc.tag_name(c), Some("td") | Some("th")))
        .collect();
    let col = cells.iter().position(|&c| c == cell)?;

    // Previous cell in the same row.
    if col > 0 {
        let t = text::clean_label(&doc.text_content(cells[col - 1]));
        if !t.is_empty() {
            return Some(RawCandidate {
                text: t,
                base: 0.60,
                pattern: "table-row",
            });
        }
    }

    // Header (or first) row cell at the same column index.
    let table_list = "table".parse().ok()?;
    let table = doc.closest(row, &table_list)?;
    let header_row = first_row(doc, table)?;
    if header_row == row {
        return None;
    }
    let header_cells: Vec<NodeId> = doc
        .child_elements(header_row)
        .filter(|&c| matches!(doc.tag_name(c), Some("td") | Some("th")))
        .collect();
    let t = text::clean_label(&doc.text_content(*header_cells.get(col)?));
    if t.is_empty() {
        return None;
    }
    Some(RawCandidate {
        text: t,
        base: 0.60 - 0.05,
        pattern: "table-header",
    })
}

fn first_row(doc: &Document, table: NodeId) -> Option<NodeId> {
    let mut stack: Vec<NodeId> = doc.children(table).to_vec();
    stack.reverse();
    while let Some(id) = stack.pop() {
        match doc.tag_name(id) {
            Some("tr") => return Some(id),
            Some("thead") | Some("tbody") => {
                for &c in doc.children(id).iter().rev() {
                    stack.push(c);
                }
            }
            _ => {}
        }
    }
    None
}

/// (d) Next element sibling — labels trailing the control. Less common,
/// so only label/span qualify and the base is penalized.
fn next_sibling_label(doc: &Document, node: NodeId) -> Option<RawCandidate> {
    let next = doc.next_element_sibling(node)?;
    if doc.is_hidden(next) {
        return None;
    }
    if !matches!(doc.tag_name(next), Some("label") | Some("span")) {
        return None;
    }
    let t = text::clean_label(&doc.text_content(next));
    if t.is_empty() {
        return None;
    }
    Some(RawCandidate {
        text: t,
        base: 0.55,
        pattern: "next-sibling",
    })
}

/// (e) Wrapper walk: climb while the ancestor is a known wrapper tag and
/// scan that wrapper's own previous siblings at each level.
fn wrapper_label(doc: &Document, node: NodeId) -> Option<RawCandidate> {
    let mut ancestor = doc.parent(node)?;
    for _ in 0..MAX_WRAPPER_LEVELS {
        let tag = doc.tag_name(ancestor)?;
        if !WRAPPER_TAGS.contains(&tag) {
            return None;
        }
        let mut cur = doc.previous_element_sibling(ancestor);
        let mut hop = 0usize;
        while let Some(sib) = cur {
            hop += 1;
            if hop > MAX_SIBLING_HOPS {
                break;
            }
            if !is_interactive(doc, sib) && !doc.is_hidden(sib) {
                if let Some(text) = label_like_text(doc, sib) {
                    return Some(RawCandidate {
                        text,
                        base: 0.55 - 0.05 * (hop as f32 - 1.0),
                        pattern: "wrapper",
                    });
                }
            }
            cur = doc.previous_element_sibling(sib);
        }
        ancestor = doc.parent(ancestor)?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, DocumentBuilder};

    fn builder() -> DocumentBuilder {
        Document::builder("https://x.test/")
    }

    #[test]
    fn test_previous_label_sibling() {
        let mut b = builder();
        let form = b.elem(None, "form", &[]);
        let label = b.elem(Some(form), "label", &[]);
        b.text(label, "Email address:");
        let input = b.elem(Some(form), "input", &[("type", "text")]);
        let doc = b.finish();

        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Email address");
        assert_eq!(c.metadata.get("pattern").map(String::as_str), Some("previous-sibling"));
        // 0.60 base + 0.02 ideal length
        assert!((c.confidence - 0.62).abs() < 1e-6);
    }

    #[test]
    fn test_hop_penalty_and_interactive_skip() {
        let mut b = builder();
        let form = b.elem(None, "form", &[]);
        let label = b.elem(Some(form), "span", &[]);
        b.text(label, "Quantity");
        let _button = b.elem(Some(form), "button", &[]);
        let input = b.elem(Some(form), "input", &[("type", "text")]);
        let doc = b.finish();

        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Quantity");
        // Second hop: 0.60 - 0.05, + 0.02 length
        assert!((c.confidence - 0.57).abs() < 1e-6);
    }

    #[test]
    fn test_hidden_sibling_skipped() {
        let mut b = builder();
        let form = b.elem(None, "form", &[]);
        let visible = b.elem(Some(form), "span", &[]);
        b.text(visible, "Amount");
        let hidden = b.elem(Some(form), "span", &[("hidden", "")]);
        b.text(hidden, "internal marker");
        let input = b.elem(Some(form), "input", &[("type", "text")]);
        let doc = b.finish();

        assert_eq!(detect(&doc, input).unwrap().label, "Amount");
    }

    #[test]
    fn test_shallow_descendant_label() {
        let mut b = builder();
        let form = b.elem(None, "form", &[]);
        let holder = b.elem(Some(form), "div", &[]);
        let inner = b.elem(Some(holder), "div", &[]);
        let strong = b.elem(Some(inner), "strong", &[]);
        b.text(strong, "Card number");
        let input = b.elem(Some(form), "input", &[("type", "text")]);
        let doc = b.finish();

        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Card number");
    }

    #[test]
    fn test_previous_text_node() {
        let mut b = builder();
        let form = b.elem(None, "form", &[]);
        b.text(form, "Coupon code");
        let input = b.elem(Some(form), "input", &[("type", "text")]);
        let doc = b.finish();

        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Coupon code");
        assert_eq!(c.metadata.get("pattern").map(String::as_str), Some("text-node"));
        assert!((c.confidence - 0.52).abs() < 1e-6);
    }

    #[test]
    fn test_text_node_stops_at_interactive_boundary() {
        let mut b = builder();
        let form = b.elem(None, "form", &[]);
        b.text(form, "First field");
        let _other = b.elem(Some(form), "input", &[("type", "text")]);
        let input = b.elem(Some(form), "input", &[("type", "text")]);
        let doc = b.finish();

        // The text belongs to the previous input, not this one.
        assert!(previous_text_node(&doc, input).is_none());
    }

    #[test]
    fn test_table_row_label() {
        let mut b = builder();
        let table = b.elem(None, "table", &[]);
        let tr = b.elem(Some(table), "tr", &[]);
        let th = b.elem(Some(tr), "td", &[]);
        b.text(th, "Quantity");
        let td = b.elem(Some(tr), "td", &[]);
        let input = b.elem(Some(td), "input", &[("type", "text")]);
        let doc = b.finish();

        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Quantity");
        assert_eq!(c.metadata.get("pattern").map(String::as_str), Some("table-row"));
    }

    #[test]
    fn test_table_header_fallback() {
        let mut b = builder();
        let table = b.elem(None, "table", &[]);
        let head = b.elem(Some(table), "thead", &[]);
        let hrow = b.elem(Some(head), "tr", &[]);
        let h0 = b.elem(Some(hrow), "th", &[]);
        b.text(h0, "Product");
        let h1 = b.elem(Some(hrow), "th", &[]);
        b.text(h1, "Amount");
        let body = b.elem(Some(table), "tbody", &[]);
        let row = b.elem(Some(body), "tr", &[]);
        let c0 = b.elem(Some(row), "td", &[]);
        let input0 = b.elem(Some(c0), "input", &[("type", "text")]);
        let c1 = b.elem(Some(row), "td", &[]);
        let input1 = b.elem(Some(c1), "input", &[("type", "text")]);
        let doc = b.finish();

        let first = detect(&doc, input0).unwrap();
        assert_eq!(first.label, "Product");
        assert_eq!(first.metadata.get("pattern").map(String::as_str), Some("table-header"));

        // Second column: the same-row lookup finds the first cell's
        // content is an input, not text, so the header wins by index.
        let second = detect(&doc, input1).unwrap();
        assert_eq!(second.label, "Amount");
    }

    #[test]
    fn test_next_sibling_label() {
        let mut b = builder();
        let form = b.elem(None, "form", &[]);
        let input = b.elem(Some(form), "input", &[("type", "checkbox")]);
        let label = b.elem(Some(form), "label", &[]);
        b.text(label, "Subscribe to updates");
        let doc = b.finish();

        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Subscribe to updates");
        assert_eq!(c.metadata.get("pattern").map(String::as_str), Some("next-sibling"));
        assert!((c.confidence - 0.57).abs() < 1e-6);
    }

    #[test]
    fn test_wrapper_label() {
        let mut b = builder();
        let root = b.elem(None, "form", &[]);
        let label = b.elem(Some(root), "label", &[]);
        b.text(label, "Delivery notes");
        let wrap = b.elem(Some(root), "div", &[]);
        let input = b.elem(Some(wrap), "input", &[("type", "text")]);
        let _icon = b.elem(Some(wrap), "span", &[("class", "icon")]);
        let doc = b.finish();

        let c = detect(&doc, input).unwrap();
        assert_eq!(c.label, "Delivery notes");
        assert_eq!(c.metadata.get("pattern").map(String::as_str), Some("wrapper"));
    }

    #[test]
    fn test_confidence_floor() {
        let mut b = builder();
        let form = b.elem(None, "form", &[]);
        let label = b.elem(Some(form), "span", &[]);
        b.text(label, "x"); // single generic char: heavy penalties
        let input = b.elem(Some(form), "input", &[("type", "text")]);
        let doc = b.finish();

        if let Some(c) = detect(&doc, input) {
            assert!(c.confidence >= FLOOR);
        }
    }

    #[test]
    fn test_not_applicable_without_siblings() {
        let mut b = builder();
        let form = b.elem(None, "form", &[]);
        let input = b.elem(Some(form), "input", &[("type", "text")]);
        let doc = b.finish();
        assert!(!can_detect(&doc, input));
    }
}
