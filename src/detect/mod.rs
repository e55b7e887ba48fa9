//! Heuristic, confidence-scored label detection.
//!
//! A flat registry of pluggable strategies infers a human-readable name
//! for a target element. Strategies are immutable value records run in
//! priority order; the first candidate clearing the configured
//! confidence threshold wins.

pub mod aria;
pub mod engine;
pub mod placeholder;
pub mod sibling;
pub mod text;

pub use engine::{
    Candidate, DetectionOptions, Detector, LabelDetection, LabelDetectionEngine,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    /// An element with both a sibling label and a placeholder must yield
    /// the sibling-derived label: DOM proximity outranks placeholder text
    /// in the default registry even when both clear the threshold.
    #[test]
    fn test_sibling_outranks_placeholder() {
        let mut b = Document::builder("https://x.test/");
        let form = b.elem(None, "form", &[]);
        let label = b.elem(Some(form), "label", &[]);
        b.text(label, "Work email");
        let input = b.elem(
            Some(form),
            "input",
            &[("type", "text"), ("placeholder", "Enter your email")],
        );
        let doc = b.finish();

        let engine = LabelDetectionEngine::new();
        let hit = engine
            .detect(&doc, input, &DetectionOptions::default())
            .unwrap();
        assert_eq!(hit.strategy, sibling::NAME);
        assert_eq!(hit.label, "Work email");
    }

    /// Explicit markup outranks both fallbacks.
    #[test]
    fn test_explicit_markup_outranks_all() {
        let mut b = Document::builder("https://x.test/");
        let form = b.elem(None, "form", &[]);
        let label = b.elem(Some(form), "label", &[]);
        b.text(label, "Nearby text");
        let input = b.elem(
            Some(form),
            "input",
            &[
                ("type", "text"),
                ("aria-label", "Recipient email"),
                ("placeholder", "Enter your email"),
            ],
        );
        let doc = b.finish();

        let engine = LabelDetectionEngine::new();
        let hit = engine
            .detect(&doc, input, &DetectionOptions::default())
            .unwrap();
        assert_eq!(hit.strategy, aria::NAME);
        assert_eq!(hit.label, "Recipient email");
    }

    /// With nothing nearby and no markup, the placeholder still lands.
    #[test]
    fn test_placeholder_as_last_resort() {
        let mut b = Document::builder("https://x.test/");
        let form = b.elem(None, "form", &[]);
        let _spacer = b.elem(Some(form), "hr", &[]);
        let input = b.elem(
            Some(form),
            "input",
            &[("type", "text"), ("placeholder", "Tracking number")],
        );
        let doc = b.finish();

        let engine = LabelDetectionEngine::new();
        let hit = engine
            .detect(&doc, input, &DetectionOptions::default())
            .unwrap();
        assert_eq!(hit.strategy, placeholder::NAME);
        assert_eq!(hit.label, "Tracking number");
    }

    #[test]
    fn test_default_registry_order() {
        let engine = LabelDetectionEngine::new();
        let names: Vec<&str> = engine.detectors().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![aria::NAME, sibling::NAME, placeholder::NAME]
        );
    }
}
