use std::collections::BTreeMap;

use uuid::Uuid;

use super::selector::{Compound, SelectorList};

/// Index of a node within its document's arena.
pub type NodeId = usize;

/// Element payload: tag name plus attribute map.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Whitespace-separated class list from the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// An arena-backed document tree.
///
/// Nodes are referenced by [`NodeId`]; the arena owns them for the life of
/// the document, so ids stay valid and cheap to copy around (the detection
/// results keep a node id for lookup, never ownership).
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub url: String,
    pub origin: String,
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Document {
    pub fn new(url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.to_string(),
            origin: origin_of(url),
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Start building a document programmatically (test fixtures, tools).
    pub fn builder(url: &str) -> DocumentBuilder {
        DocumentBuilder {
            doc: Document::new(url),
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        if let Some(parent) = node.parent {
            self.nodes[parent].children.push(id);
        } else if self.root.is_none() {
            if matches!(node.kind, NodeKind::Element(_)) {
                self.root = Some(id);
            }
        }
        self.nodes.push(node);
        id
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercased tag name, or None for text nodes.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child_elements<'a>(&'a self, id: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.is_element(c))
    }

    fn sibling_index(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let pos = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, pos))
    }

    /// Previous sibling of any kind, text nodes included.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.sibling_index(id)?;
        if pos == 0 {
            None
        } else {
            Some(self.children(parent)[pos - 1])
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.sibling_index(id)?;
        self.children(parent).get(pos + 1).copied()
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.previous_sibling(id);
        while let Some(c) = cur {
            if self.is_element(c) {
                return Some(c);
            }
            cur = self.previous_sibling(c);
        }
        None
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.next_sibling(id);
        while let Some(c) = cur {
            if self.is_element(c) {
                return Some(c);
            }
            cur = self.next_sibling(c);
        }
        None
    }

    /// 1-based position among same-tag element siblings (xpath style).
    pub fn same_tag_position(&self, id: NodeId) -> usize {
        let tag = match self.tag_name(id) {
            Some(t) => t.to_string(),
            None => return 1,
        };
        let Some(parent) = self.parent(id) else {
            return 1;
        };
        let mut pos = 0;
        for &c in self.children(parent) {
            if self.tag_name(c) == Some(tag.as_str()) {
                pos += 1;
            }
            if c == id {
                break;
            }
        }
        pos.max(1)
    }

    /// Concatenated text content of the subtree (DOM `textContent`).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(t)) => {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push_str(t);
            }
            Some(NodeKind::Element(_)) => {
                for &c in self.children(id) {
                    self.collect_text(c, out);
                }
            }
            None => {}
        }
    }

    /// Text of a text node, None for elements.
    pub fn text_of(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Hidden per the facade contract: `hidden`, `type=hidden`,
    /// `aria-hidden=true`, or inline display:none / visibility:hidden.
    pub fn is_hidden(&self, id: NodeId) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if el.attr("hidden").is_some() {
            return true;
        }
        if el.attr("type").map(|t| t.eq_ignore_ascii_case("hidden")) == Some(true) {
            return true;
        }
        if el.attr("aria-hidden") == Some("true") {
            return true;
        }
        if let Some(style) = el.attr("style") {
            let squashed: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            if squashed.contains("display:none") || squashed.contains("visibility:hidden") {
                return true;
            }
        }
        false
    }

    pub fn matches_compound(&self, id: NodeId, compound: &Compound) -> bool {
        match self.element(id) {
            Some(el) => compound.matches(el),
            None => false,
        }
    }

    pub fn matches(&self, id: NodeId, selectors: &SelectorList) -> bool {
        selectors
            .compounds()
            .iter()
            .any(|c| self.matches_compound(id, c))
    }

    /// Nearest ancestor-or-self matching the selector list (DOM `closest`).
    pub fn closest(&self, id: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if self.matches(c, selectors) {
                return Some(c);
            }
            cur = self.parent(c);
        }
        None
    }

    /// Depth-first pre-order walk of all node ids.
    pub fn descendants(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            for &c in self.children(id).iter().rev() {
                stack.push(c);
            }
            Some(id)
        })
    }

    /// First element matching a selector string. Malformed selectors match
    /// nothing.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let list: SelectorList = selector.parse().ok()?;
        self.descendants().find(|&id| self.matches(id, &list))
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let Ok(list) = selector.parse::<SelectorList>() else {
            return Vec::new();
        };
        self.descendants()
            .filter(|&id| self.matches(id, &list))
            .collect()
    }

    /// Element with a matching `id` attribute.
    pub fn element_by_id(&self, dom_id: &str) -> Option<NodeId> {
        self.descendants()
            .find(|&n| self.attr(n, "id") == Some(dom_id))
    }
}

/// Programmatic document construction for fixtures and tools.
pub struct DocumentBuilder {
    doc: Document,
}

impl DocumentBuilder {
    pub fn elem(&mut self, parent: Option<NodeId>, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attributes = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.doc.push_node(Node {
            kind: NodeKind::Element(ElementData {
                tag: tag.to_ascii_lowercase(),
                attributes,
            }),
            parent,
            children: Vec::new(),
        })
    }

    pub fn text(&mut self, parent: NodeId, content: &str) -> NodeId {
        self.doc.push_node(Node {
            kind: NodeKind::Text(content.to_string()),
            parent: Some(parent),
            children: Vec::new(),
        })
    }

    pub fn finish(self) -> Document {
        self.doc
    }
}

/// Scheme + authority portion of a URL, the way same-origin checks see it.
pub fn origin_of(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let rest = &url[scheme_end + 3..];
        let authority_end = rest.find('/').unwrap_or(rest.len());
        return url[..scheme_end + 3 + authority_end].to_string();
    }
    url.to_string()
}
