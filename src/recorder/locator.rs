//! Locator bundle boundary.
//!
//! Selector generation proper is an external collaborator; the recorder
//! consumes bundles opaquely, caring only about the identity fields
//! (`id`, `xpath`) for input merging and `url` for the synthetic open
//! step. [`PathLocatorBuilder`] is a serviceable default so the crate
//! works standalone.

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};

/// Structural description of an element, sufficient to re-locate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub xpath: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl LocatorBundle {
    /// Bundle for the synthetic open step.
    pub fn for_page(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    /// Merge identity: two bundles describe the same element iff their
    /// id and xpath agree.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.id == other.id && self.xpath == other.xpath
    }
}

/// Collaborator building a locator bundle for an element. Invoked
/// synchronously whenever a step finalizes.
pub trait LocatorBuilder: Send + Sync {
    fn build(&self, doc: &Document, node: NodeId) -> LocatorBundle;
}

/// Default builder: absolute positional xpath, id-anchored css path, a
/// text snippet.
pub struct PathLocatorBuilder;

impl LocatorBuilder for PathLocatorBuilder {
    fn build(&self, doc: &Document, node: NodeId) -> LocatorBundle {
        let text = doc.text_content(node);
        let snippet = text.trim();
        LocatorBundle {
            id: doc.attr(node, "id").map(str::to_string),
            xpath: absolute_xpath(doc, node),
            css: Some(css_path(doc, node)),
            text: if snippet.is_empty() {
                None
            } else {
                Some(snippet.chars().take(40).collect())
            },
            url: None,
        }
    }
}

fn absolute_xpath(doc: &Document, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut cur = Some(node);
    while let Some(id) = cur {
        if let Some(tag) = doc.tag_name(id) {
            segments.push(format!("{}[{}]", tag, doc.same_tag_position(id)));
        }
        cur = doc.parent(id);
    }
    segments.reverse();
    format!("/{}", segments.join("/"))
}

fn css_path(doc: &Document, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut cur = Some(node);
    while let Some(id) = cur {
        if let Some(dom_id) = doc.attr(id, "id") {
            segments.push(format!("#{dom_id}"));
            break;
        }
        if let Some(tag) = doc.tag_name(id) {
            let pos = doc.same_tag_position(id);
            if pos > 1 {
                segments.push(format!("{tag}:nth-of-type({pos})"));
            } else {
                segments.push(tag.to_string());
            }
        }
        cur = doc.parent(id);
    }
    segments.reverse();
    segments.join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_absolute_xpath_positions() {
        let mut b = Document::builder("https://x.test/");
        let html = b.elem(None, "html", &[]);
        let body = b.elem(Some(html), "body", &[]);
        let _first = b.elem(Some(body), "input", &[]);
        let second = b.elem(Some(body), "input", &[]);
        let doc = b.finish();

        let bundle = PathLocatorBuilder.build(&doc, second);
        assert_eq!(bundle.xpath, "/html[1]/body[1]/input[2]");
    }

    #[test]
    fn test_css_path_anchors_on_id() {
        let mut b = Document::builder("https://x.test/");
        let html = b.elem(None, "html", &[]);
        let form = b.elem(Some(html), "form", &[("id", "checkout")]);
        let input = b.elem(Some(form), "input", &[]);
        let doc = b.finish();

        let bundle = PathLocatorBuilder.build(&doc, input);
        assert_eq!(bundle.css.as_deref(), Some("#checkout > input"));
    }

    #[test]
    fn test_identity_uses_id_and_xpath_only() {
        let a = LocatorBundle {
            id: Some("email".into()),
            xpath: "/html[1]/body[1]/input[1]".into(),
            css: Some("one".into()),
            ..Default::default()
        };
        let b = LocatorBundle {
            id: Some("email".into()),
            xpath: "/html[1]/body[1]/input[1]".into(),
            css: Some("different".into()),
            ..Default::default()
        };
        assert!(a.same_identity(&b));

        let c = LocatorBundle {
            id: Some("other".into()),
            ..a.clone()
        };
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn test_page_bundle() {
        let bundle = LocatorBundle::for_page("https://app.example.com/");
        assert_eq!(bundle.url.as_deref(), Some("https://app.example.com/"));
        assert!(bundle.xpath.is_empty());
    }
}
