//! Event trace input.
//!
//! The CLI drives the recorder from recorded event traces: a JSON array
//! for batch replay, or NDJSON lines streamed on stdin in follow mode.
//! Targets are selector strings resolved against the fixture document.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::dom::Document;
use crate::error::RecorderError;
use crate::recorder::{Coords, DomEvent, DomEventKind};

/// One trace entry: an event kind, a target selector and its payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    pub event: DomEventKind,
    /// Selector resolved against the document (first match wins).
    pub target: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    /// Millisecond offset from trace start. Informational in batch mode.
    #[serde(default)]
    pub at: Option<u64>,
}

/// Load a JSON array trace from disk.
pub fn load_trace(path: &Path) -> Result<Vec<TraceEvent>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing trace {}", path.display()))
}

/// Parse one NDJSON line (follow mode).
pub fn parse_line(line: &str) -> Result<TraceEvent> {
    serde_json::from_str(line.trim()).with_context(|| format!("parsing trace line '{line}'"))
}

/// Resolve a trace entry into a dispatchable event.
pub fn resolve(doc: &Document, entry: &TraceEvent) -> Result<DomEvent, RecorderError> {
    let target = doc
        .query_selector(&entry.target)
        .ok_or_else(|| RecorderError::NoSuchElement(entry.target.clone()))?;
    let mut event = DomEvent::new(entry.event, target);
    event.value = entry.value.clone();
    event.key = entry.key.clone();
    if let (Some(x), Some(y)) = (entry.x, entry.y) {
        event.coords = Some(Coords { x, y });
    }
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r##"[
        {"event": "click", "target": "#save", "x": 10.0, "y": 20.0, "at": 100},
        {"event": "input", "target": "#email", "value": "jane@corp.com", "at": 400},
        {"event": "keydown", "target": "#email", "key": "Enter", "at": 900}
    ]"##;

    fn doc() -> Document {
        let mut b = Document::builder("https://app.example.com/");
        let html = b.elem(None, "html", &[]);
        let body = b.elem(Some(html), "body", &[]);
        b.elem(Some(body), "button", &[("id", "save")]);
        b.elem(Some(body), "input", &[("type", "text"), ("id", "email")]);
        b.finish()
    }

    #[test]
    fn test_parse_trace_array() {
        let events: Vec<TraceEvent> = serde_json::from_str(TRACE).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event, DomEventKind::Click);
        assert_eq!(events[2].event, DomEventKind::KeyDown);
        assert_eq!(events[2].key.as_deref(), Some("Enter"));
    }

    #[test]
    fn test_resolve_against_document() {
        let doc = doc();
        let events: Vec<TraceEvent> = serde_json::from_str(TRACE).unwrap();
        let click = resolve(&doc, &events[0]).unwrap();
        assert_eq!(Some(click.target), doc.query_selector("#save"));
        assert_eq!(click.coords.map(|c| c.x), Some(10.0));

        let missing = TraceEvent {
            event: DomEventKind::Click,
            target: "#nope".into(),
            value: None,
            key: None,
            x: None,
            y: None,
            at: None,
        };
        assert!(matches!(
            resolve(&doc, &missing),
            Err(RecorderError::NoSuchElement(_))
        ));
    }

    #[test]
    fn test_parse_ndjson_line() {
        let entry = parse_line(r##"{"event":"blur","target":"#email"}"##).unwrap();
        assert_eq!(entry.event, DomEventKind::Blur);
        assert!(parse_line("not json").is_err());
    }
}
