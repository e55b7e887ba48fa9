//! Highlight feedback boundary.
//!
//! Visual feedback is an external collaborator. Calls are
//! fire-and-forget: a failing highlighter is logged and capture
//! proceeds. Throttling and auto-expiry are handled by the coordinator,
//! not by implementations.

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::dom::{Document, NodeId};

/// Opaque handle to an active highlight, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightHandle(pub u64);

pub trait HighlightService: Send + Sync {
    /// Request a highlight; `None` means the request could not be
    /// honored (never an error the recorder acts on).
    fn highlight(&self, doc: &Document, node: NodeId, message: &str) -> Option<HighlightHandle>;

    fn remove_highlight(&self, handle: HighlightHandle);
}

/// No-op implementation for headless use.
pub struct NullHighlighter;

impl HighlightService for NullHighlighter {
    fn highlight(&self, _doc: &Document, _node: NodeId, _message: &str) -> Option<HighlightHandle> {
        None
    }

    fn remove_highlight(&self, _handle: HighlightHandle) {}
}

/// Log-backed implementation: traces what would be flashed on screen.
pub struct ConsoleHighlighter {
    counter: AtomicU64,
}

impl ConsoleHighlighter {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }
}

impl Default for ConsoleHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightService for ConsoleHighlighter {
    fn highlight(&self, doc: &Document, node: NodeId, message: &str) -> Option<HighlightHandle> {
        let handle = HighlightHandle(self.counter.fetch_add(1, Ordering::Relaxed));
        debug!(
            "highlight #{} <{}> — {}",
            handle.0,
            doc.tag_name(node).unwrap_or("?"),
            message
        );
        Some(handle)
    }

    fn remove_highlight(&self, handle: HighlightHandle) {
        debug!("highlight #{} expired", handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_console_highlighter_hands_out_unique_handles() {
        let mut b = Document::builder("https://x.test/");
        let node = b.elem(None, "button", &[]);
        let doc = b.finish();

        let service = ConsoleHighlighter::new();
        let a = service.highlight(&doc, node, "clicked").unwrap();
        let b = service.highlight(&doc, node, "clicked").unwrap();
        assert_ne!(a, b);
        service.remove_highlight(a);
    }
}
