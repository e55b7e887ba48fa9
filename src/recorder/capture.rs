//! Event capture coordination.
//!
//! Attaches the recorder to document-like targets, filters incoming DOM
//! events and routes the survivors: immediate capture for clicks,
//! toggles and committed values, the debounced accumulator path for
//! free-text typing, and flush-first handling for Enter and blur.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::MutexGuard;
use uuid::Uuid;

use crate::dom::{Document, NodeId};
use crate::error::RecorderError;

use super::accumulator::ElementKey;
use super::session::{Recorder, RecorderInner, RecorderState};
use super::step::{CapturedStep, Coords, StepKind};

/// Highlight requests closer together than this are dropped.
const HIGHLIGHT_MIN_INTERVAL_MS: u64 = 250;

/// Raw DOM event kinds the coordinator listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEventKind {
    Click,
    Input,
    Change,
    KeyDown,
    Focus,
    Blur,
}

/// A raw DOM event dispatched against an attached document.
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub kind: DomEventKind,
    pub target: NodeId,
    /// Current value for input/change events.
    pub value: Option<String>,
    /// Key name for keydown events.
    pub key: Option<String>,
    /// Pointer position for click events.
    pub coords: Option<Coords>,
}

impl DomEvent {
    pub fn new(kind: DomEventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            value: None,
            key: None,
            coords: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_coords(mut self, x: f64, y: f64) -> Self {
        self.coords = Some(Coords { x, y });
        self
    }
}

/// How an element's value is entered, which decides the capture route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputCategory {
    /// Free text: debounced input path.
    TextEntry,
    /// Checkbox/radio: a state toggle recorded as a click.
    Toggle,
    /// Select, date/time family, file: committed value, no debounce.
    ImmediateValue,
    Other,
}

fn input_category(doc: &Document, node: NodeId) -> InputCategory {
    match doc.tag_name(node) {
        Some("textarea") => InputCategory::TextEntry,
        Some("select") => InputCategory::ImmediateValue,
        Some("input") => {
            let ty = doc.attr(node, "type").unwrap_or("text").to_ascii_lowercase();
            match ty.as_str() {
                "checkbox" | "radio" => InputCategory::Toggle,
                "date" | "datetime-local" | "month" | "week" | "time" | "file" => {
                    InputCategory::ImmediateValue
                }
                "hidden" | "button" | "submit" | "reset" | "image" => InputCategory::Other,
                _ => InputCategory::TextEntry,
            }
        }
        Some(_) if doc.attr(node, "contenteditable").is_some() => InputCategory::TextEntry,
        _ => InputCategory::Other,
    }
}

impl Recorder {
    /// Attach capture listeners to a document-like target. The first
    /// attached document pins the recording origin; documents from any
    /// other origin fail closed with `None` (cross-origin frames cannot
    /// be instrumented).
    pub async fn attach_document(&self, doc: Arc<Document>) -> Option<Uuid> {
        let mut inner = self.inner.lock().await;
        if let Some(origin) = inner.root_origin.as_deref() {
            if origin != doc.origin.as_str() {
                warn!(
                    "cannot attach cross-origin document {} (recording origin {origin})",
                    doc.origin
                );
                return None;
            }
        } else {
            inner.root_origin = Some(doc.origin.clone());
        }
        debug!(
            "attaching listeners to {} (capture phase: {})",
            doc.url, inner.config.use_capture
        );
        let id = doc.id;
        inner.documents.insert(id, doc);
        Some(id)
    }

    /// Detach a previously attached document. Pending input for its
    /// elements stays queued and flushes at `stop()`.
    pub async fn detach_document(&self, id: Uuid) -> bool {
        self.inner.lock().await.documents.remove(&id).is_some()
    }

    /// Feed one DOM event through the filter pipeline and routing rules.
    ///
    /// # Errors
    /// [`RecorderError::UnknownDocument`] when the document was never
    /// attached. Filter rejections are not errors.
    pub async fn dispatch(&self, doc_id: Uuid, event: DomEvent) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().await;
        let doc = inner
            .documents
            .get(&doc_id)
            .cloned()
            .ok_or(RecorderError::UnknownDocument(doc_id))?;

        // Filter pipeline, short-circuiting on first rejection.
        if inner.state != RecorderState::Recording {
            if inner.config.debug_log {
                debug!("event dropped: state is {}", inner.state);
            }
            return Ok(());
        }
        if let Some(filter) = inner.config.event_filter.clone() {
            if !filter(&event) {
                return Ok(());
            }
        }
        if let Some(scope) = &inner.scope {
            if doc.closest(event.target, scope).is_none() {
                return Ok(());
            }
        }
        if is_ignored(&inner, &doc, event.target) {
            return Ok(());
        }

        match event.kind {
            DomEventKind::Click => self.on_click(&mut inner, &doc, &event),
            DomEventKind::Change => self.on_change(&mut inner, &doc, &event),
            DomEventKind::Input => self.on_input(&mut inner, &doc, &event),
            DomEventKind::KeyDown => self.on_keydown(&mut inner, &doc, &event),
            DomEventKind::Blur => self.on_blur(&mut inner, &doc, &event),
            DomEventKind::Focus => {}
        }
        Ok(())
    }

    fn on_click(&self, inner: &mut MutexGuard<'_, RecorderInner>, doc: &Arc<Document>, event: &DomEvent) {
        if !inner.config.capture_clicks {
            return;
        }
        match input_category(doc, event.target) {
            // Deferred to the input path: a click into a text field is
            // focus, not an action.
            InputCategory::TextEntry => return,
            // Toggles are recorded from their change event.
            InputCategory::Toggle => return,
            _ => {}
        }
        let bundle = inner.locators.build(doc, event.target);
        let label = inner.detect_label(doc, event.target);
        let step = CapturedStep::new(StepKind::Click, bundle)
            .with_label(label)
            .with_coords(event.coords);
        inner.push_step(step);
        self.maybe_highlight(inner, doc, event.target, "click");
    }

    fn on_change(&self, inner: &mut MutexGuard<'_, RecorderInner>, doc: &Arc<Document>, event: &DomEvent) {
        match input_category(doc, event.target) {
            InputCategory::Toggle => {
                // State toggle, not a text value: recorded as a click.
                if !inner.config.capture_clicks {
                    return;
                }
                let bundle = inner.locators.build(doc, event.target);
                let label = inner.detect_label(doc, event.target);
                let step = CapturedStep::new(StepKind::Click, bundle)
                    .with_label(label)
                    .with_coords(event.coords);
                inner.push_step(step);
                self.maybe_highlight(inner, doc, event.target, "toggle");
            }
            InputCategory::ImmediateValue => {
                if !inner.config.capture_inputs {
                    return;
                }
                let value = event
                    .value
                    .clone()
                    .or_else(|| doc.attr(event.target, "value").map(str::to_string))
                    .unwrap_or_default();
                let bundle = inner.locators.build(doc, event.target);
                let label = inner.detect_label(doc, event.target);
                let step = CapturedStep::new(StepKind::Input, bundle)
                    .with_value(value)
                    .with_label(label);
                inner.push_step(step);
                self.maybe_highlight(inner, doc, event.target, "input");
            }
            _ => {}
        }
    }

    fn on_input(&self, inner: &mut MutexGuard<'_, RecorderInner>, doc: &Arc<Document>, event: &DomEvent) {
        if !inner.config.capture_inputs {
            return;
        }
        if input_category(doc, event.target) != InputCategory::TextEntry {
            return;
        }
        let key: ElementKey = (doc.id, event.target);
        let value = event.value.clone().unwrap_or_default();
        let generation =
            inner
                .accumulator
                .observe(key, doc.clone(), event.target, value, event.coords);

        let debounce = Duration::from_millis(inner.config.input_debounce_ms);
        let shared = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let mut guard = shared.lock().await;
            if let Some(pending) = guard.accumulator.claim(key, generation) {
                guard.finalize_input(pending);
            }
        });
        inner.accumulator.attach_timer(key, generation, handle);
        self.maybe_highlight(inner, doc, event.target, "typing");
    }

    fn on_keydown(&self, inner: &mut MutexGuard<'_, RecorderInner>, doc: &Arc<Document>, event: &DomEvent) {
        if event.key.as_deref() != Some("Enter") {
            return;
        }
        if !inner.config.capture_enter {
            return;
        }
        // Flush this element's pending debounce first so the enter step
        // observes the committed text value.
        let key: ElementKey = (doc.id, event.target);
        if let Some(pending) = inner.accumulator.flush(key) {
            inner.finalize_input(pending);
        }
        let bundle = inner.locators.build(doc, event.target);
        let label = inner.detect_label(doc, event.target);
        let step = CapturedStep::new(StepKind::Enter, bundle).with_label(label);
        inner.push_step(step);
        self.maybe_highlight(inner, doc, event.target, "enter");
    }

    fn on_blur(&self, inner: &mut MutexGuard<'_, RecorderInner>, doc: &Arc<Document>, event: &DomEvent) {
        let key: ElementKey = (doc.id, event.target);
        if let Some(pending) = inner.accumulator.flush(key) {
            inner.finalize_input(pending);
        }
    }

    /// Fire-and-forget highlight request: throttled, auto-expiring, and
    /// incapable of aborting capture.
    fn maybe_highlight(
        &self,
        inner: &mut MutexGuard<'_, RecorderInner>,
        doc: &Arc<Document>,
        node: NodeId,
        message: &str,
    ) {
        if !inner.config.highlight_elements {
            return;
        }
        let now = Instant::now();
        if let Some(last) = inner.last_highlight {
            if now.duration_since(last) < Duration::from_millis(HIGHLIGHT_MIN_INTERVAL_MS) {
                return;
            }
        }
        inner.last_highlight = Some(now);

        let highlighter = Arc::clone(&inner.highlighter);
        let outcome = catch_unwind(AssertUnwindSafe(|| highlighter.highlight(doc, node, message)));
        let handle = match outcome {
            Ok(Some(handle)) => handle,
            Ok(None) => return,
            Err(_) => {
                warn!("highlight service panicked, continuing");
                return;
            }
        };
        let expiry = Duration::from_millis(inner.config.highlight_duration_ms);
        tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            highlighter.remove_highlight(handle);
        });
    }
}

fn is_ignored(inner: &MutexGuard<'_, RecorderInner>, doc: &Document, target: NodeId) -> bool {
    inner
        .ignored
        .iter()
        .any(|list| doc.closest(target, list).is_some())
}
