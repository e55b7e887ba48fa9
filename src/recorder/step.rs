use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::locator::LocatorBundle;

/// Kind of a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Synthetic first step carrying the session start URL.
    Open,
    Click,
    Input,
    Enter,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepKind::Open => "open",
            StepKind::Click => "click",
            StepKind::Input => "input",
            StepKind::Enter => "enter",
        };
        f.write_str(s)
    }
}

/// Viewport coordinates of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

/// A step while its session is live. Mutable in place only through the
/// merge path; frozen into a [`Step`] at `stop()`.
#[derive(Debug, Clone)]
pub struct CapturedStep {
    pub kind: StepKind,
    pub bundle: LocatorBundle,
    pub value: Option<String>,
    pub label: Option<String>,
    pub coords: Option<Coords>,
    pub timestamp: DateTime<Utc>,
    pub merged: bool,
}

impl CapturedStep {
    pub fn new(kind: StepKind, bundle: LocatorBundle) -> Self {
        Self {
            kind,
            bundle,
            value: None,
            label: None,
            coords: None,
            timestamp: Utc::now(),
            merged: false,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn with_coords(mut self, coords: Option<Coords>) -> Self {
        self.coords = coords;
        self
    }
}

/// A finalized, exported step. Produced only at `stop()`; 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub order: u32,
    pub event: StepKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coords>,
    pub timestamp: DateTime<Utc>,
    pub bundle: LocatorBundle,
}

impl Step {
    pub fn from_captured(order: u32, captured: &CapturedStep) -> Self {
        Self {
            order,
            event: captured.kind,
            path: captured.bundle.xpath.clone(),
            value: captured.value.clone(),
            label: captured.label.clone(),
            coords: captured.coords,
            timestamp: captured.timestamp,
            bundle: captured.bundle.clone(),
        }
    }
}
