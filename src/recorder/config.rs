use std::sync::Arc;

use super::capture::DomEvent;

/// Caller-supplied event predicate; rejected events produce no step.
pub type EventFilter = Arc<dyn Fn(&DomEvent) -> bool + Send + Sync>;

/// Recorder configuration.
#[derive(Clone)]
pub struct RecorderConfig {
    /// Capture click steps.
    pub capture_clicks: bool,
    /// Capture debounced text input steps.
    pub capture_inputs: bool,
    /// Capture Enter-key steps.
    pub capture_enter: bool,
    /// Quiet period before a text input finalizes (ms).
    pub input_debounce_ms: u64,
    /// Selectors whose matches (or descendants of matches) never produce
    /// steps. Defaults cover the recorder's own UI markers.
    pub ignored_selectors: Vec<String>,
    /// Restrict capture to the subtree matching this selector.
    pub scope_selector: Option<String>,
    /// Project the session belongs to.
    pub project_id: Option<String>,
    /// Ask the highlight collaborator to flash captured elements.
    pub highlight_elements: bool,
    /// How long a highlight stays up before auto-expiry (ms).
    pub highlight_duration_ms: u64,
    /// Register listeners in the capture phase.
    pub use_capture: bool,
    /// Optional caller predicate run on every event.
    pub event_filter: Option<EventFilter>,
    /// Verbose per-event logging.
    pub debug_log: bool,
    /// Acceptance threshold for label detection.
    pub min_confidence: f32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            capture_clicks: true,
            capture_inputs: true,
            capture_enter: true,
            input_debounce_ms: 500,
            ignored_selectors: vec![".ps-ignore".to_string(), "[data-ps-ui]".to_string()],
            scope_selector: None,
            project_id: None,
            highlight_elements: true,
            highlight_duration_ms: 1200,
            use_capture: true,
            event_filter: None,
            debug_log: false,
            min_confidence: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecorderConfig::default();
        assert!(config.capture_clicks && config.capture_inputs && config.capture_enter);
        assert_eq!(config.input_debounce_ms, 500);
        assert!(config.use_capture);
        assert_eq!(config.ignored_selectors.len(), 2);
        assert!((config.min_confidence - 0.5).abs() < f32::EPSILON);
    }
}
