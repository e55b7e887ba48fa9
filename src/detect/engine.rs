//! Label detection engine.
//!
//! Holds a flat, ordered registry of detection strategies as immutable
//! value records and scans them in priority order (ascending). The first
//! candidate clearing the acceptance threshold wins; priority ordering
//! encodes domain trust (explicit markup before DOM-proximity fallbacks,
//! both before placeholder text), so first-acceptable-wins approximates
//! "best available" while bounding per-element latency during live
//! capture.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::warn;

use crate::dom::{Document, NodeId};

use super::{aria, placeholder, sibling};

pub type CanDetectFn = fn(&Document, NodeId) -> bool;
pub type DetectFn = fn(&Document, NodeId) -> Option<Candidate>;

/// A registered detection strategy. Constructed once at engine build
/// time; read-only thereafter.
#[derive(Clone)]
pub struct Detector {
    pub name: &'static str,
    /// Ascending: lower runs earlier.
    pub priority: u8,
    pub base_confidence: f32,
    pub can_detect: CanDetectFn,
    pub detect: DetectFn,
}

/// An unaccepted candidate produced by a single strategy.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub label: String,
    pub confidence: f32,
    pub metadata: BTreeMap<String, String>,
}

/// An accepted detection result. Ephemeral: computed on demand and
/// consumed alongside the step that requested it. Holds the source node
/// id for lookup only, never ownership of the node.
#[derive(Debug, Clone)]
pub struct LabelDetection {
    pub label: String,
    pub confidence: f32,
    pub strategy: &'static str,
    pub node: NodeId,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy)]
pub struct DetectionOptions {
    /// Minimum confidence a candidate needs to be accepted.
    pub min_confidence: f32,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
        }
    }
}

pub struct LabelDetectionEngine {
    detectors: Vec<Detector>,
}

impl LabelDetectionEngine {
    /// Engine with the default registry: explicit markup (10), sibling
    /// proximity (20), placeholder text (30).
    pub fn new() -> Self {
        Self::with_detectors(vec![
            aria::detector(),
            sibling::detector(),
            placeholder::detector(),
        ])
    }

    /// Engine with a custom registry; detectors are sorted by ascending
    /// priority once here.
    pub fn with_detectors(mut detectors: Vec<Detector>) -> Self {
        detectors.sort_by_key(|d| d.priority);
        Self { detectors }
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    /// Scan the registry in priority order; first candidate clearing
    /// `min_confidence` wins. A strategy that panics is logged and
    /// skipped, never aborts the scan.
    pub fn detect(
        &self,
        doc: &Document,
        node: NodeId,
        options: &DetectionOptions,
    ) -> Option<LabelDetection> {
        for detector in &self.detectors {
            if !(detector.can_detect)(doc, node) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| (detector.detect)(doc, node)));
            let candidate = match outcome {
                Ok(c) => c,
                Err(_) => {
                    warn!("label detector '{}' panicked, skipping", detector.name);
                    continue;
                }
            };
            if let Some(candidate) = candidate {
                let confidence = candidate.confidence.clamp(0.0, 1.0);
                if confidence >= options.min_confidence {
                    return Some(LabelDetection {
                        label: candidate.label,
                        confidence,
                        strategy: detector.name,
                        node,
                        metadata: candidate.metadata,
                    });
                }
            }
        }
        None
    }
}

impl Default for LabelDetectionEngine {
    fn default() -> Self {
        Self::new()
    }
}
