//! Recording session lifecycle.
//!
//! A [`Recorder`] owns at most one live session at a time. All shared
//! state sits behind a single async mutex: capture handlers run to
//! completion under the lock, debounce timers re-enter through the same
//! lock, and UI mirrors only ever receive cloned snapshots.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::detect::{DetectionOptions, LabelDetectionEngine};
use crate::dom::{Document, NodeId, SelectorList};
use crate::error::RecorderError;

use super::accumulator::{PendingInput, StepAccumulator};
use super::config::RecorderConfig;
use super::highlight::{HighlightService, NullHighlighter};
use super::locator::{LocatorBuilder, LocatorBundle, PathLocatorBuilder};
use super::step::{CapturedStep, Step, StepKind};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
}

impl std::fmt::Display for RecorderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecorderState::Idle => "idle",
            RecorderState::Recording => "recording",
            RecorderState::Paused => "paused",
        };
        f.write_str(s)
    }
}

pub type StepCallback = Box<dyn Fn(&CapturedStep, usize) + Send>;
pub type StateCallback = Box<dyn Fn(RecorderState, RecorderState) + Send>;

/// A live session: identity, start context and the growing step list.
pub struct RecordingSession {
    pub id: String,
    pub project_id: Option<String>,
    pub start_url: String,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<CapturedStep>,
}

pub(crate) struct RecorderInner {
    pub(crate) config: RecorderConfig,
    pub(crate) state: RecorderState,
    pub(crate) session: Option<RecordingSession>,
    pub(crate) documents: HashMap<Uuid, Arc<Document>>,
    pub(crate) root_origin: Option<String>,
    pub(crate) accumulator: StepAccumulator,
    pub(crate) locators: Arc<dyn LocatorBuilder>,
    pub(crate) highlighter: Arc<dyn HighlightService>,
    pub(crate) engine: Arc<LabelDetectionEngine>,
    /// Parsed ignore list; malformed entries are dropped at construction
    /// (fail open) after a single warning.
    pub(crate) ignored: Vec<SelectorList>,
    pub(crate) scope: Option<SelectorList>,
    pub(crate) step_callbacks: Vec<StepCallback>,
    pub(crate) state_callbacks: Vec<StateCallback>,
    pub(crate) last_highlight: Option<Instant>,
}

impl RecorderInner {
    fn new(
        config: RecorderConfig,
        locators: Arc<dyn LocatorBuilder>,
        highlighter: Arc<dyn HighlightService>,
        engine: Arc<LabelDetectionEngine>,
    ) -> Self {
        let mut ignored = Vec::new();
        for raw in &config.ignored_selectors {
            match raw.parse::<SelectorList>() {
                Ok(list) => ignored.push(list),
                Err(e) => warn!("ignoring malformed ignore-selector '{raw}': {e}"),
            }
        }
        let scope = config.scope_selector.as_ref().and_then(|raw| {
            raw.parse::<SelectorList>()
                .map_err(|e| warn!("ignoring malformed scope selector '{raw}': {e}"))
                .ok()
        });
        Self {
            config,
            state: RecorderState::Idle,
            session: None,
            documents: HashMap::new(),
            root_origin: None,
            accumulator: StepAccumulator::new(),
            locators,
            highlighter,
            engine,
            ignored,
            scope,
            step_callbacks: Vec::new(),
            state_callbacks: Vec::new(),
            last_highlight: None,
        }
    }

    pub(crate) fn set_state(&mut self, new: RecorderState) {
        if new == self.state {
            return;
        }
        let old = self.state;
        self.state = new;
        debug!("recorder state {old} -> {new}");
        for cb in &self.state_callbacks {
            if catch_unwind(AssertUnwindSafe(|| cb(new, old))).is_err() {
                warn!("state subscriber panicked, continuing");
            }
        }
    }

    /// Append (or merge) a captured step and notify subscribers with a
    /// snapshot. Dropped silently without a live session.
    pub(crate) fn push_step(&mut self, step: CapturedStep) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let (index, merged) = StepAccumulator::merge_or_append(&mut session.steps, step);
        let snapshot = session.steps[index].clone();
        if self.config.debug_log {
            debug!(
                "step[{index}] {} value={:?} merged={merged}",
                snapshot.kind, snapshot.value
            );
        }
        for cb in &self.step_callbacks {
            if catch_unwind(AssertUnwindSafe(|| cb(&snapshot, index))).is_err() {
                warn!("step subscriber panicked, continuing");
            }
        }
    }

    /// Turn a pending debounced input into a finalized step.
    pub(crate) fn finalize_input(&mut self, pending: PendingInput) {
        let bundle = self.locators.build(&pending.doc, pending.node);
        let label = self.detect_label(&pending.doc, pending.node);
        let step = CapturedStep::new(StepKind::Input, bundle)
            .with_value(pending.value)
            .with_label(label)
            .with_coords(pending.coords);
        self.push_step(step);
    }

    pub(crate) fn detect_label(&self, doc: &Document, node: NodeId) -> Option<String> {
        let options = DetectionOptions {
            min_confidence: self.config.min_confidence,
        };
        self.engine.detect(doc, node, &options).map(|d| d.label)
    }
}

/// The recording engine facade.
pub struct Recorder {
    pub(crate) inner: Arc<Mutex<RecorderInner>>,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(PathLocatorBuilder),
            Arc::new(NullHighlighter),
            Arc::new(LabelDetectionEngine::new()),
        )
    }

    pub fn with_collaborators(
        config: RecorderConfig,
        locators: Arc<dyn LocatorBuilder>,
        highlighter: Arc<dyn HighlightService>,
        engine: Arc<LabelDetectionEngine>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RecorderInner::new(
                config,
                locators,
                highlighter,
                engine,
            ))),
        }
    }

    /// Begin a session. Synthesizes the `open` step carrying the start
    /// URL and moves to Recording.
    ///
    /// # Errors
    /// [`RecorderError::AlreadyRecording`] when a session is live.
    pub async fn start(&self, url: &str) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().await;
        if inner.state != RecorderState::Idle {
            return Err(RecorderError::AlreadyRecording);
        }
        let session = RecordingSession {
            id: Uuid::new_v4().to_string(),
            project_id: inner.config.project_id.clone(),
            start_url: url.to_string(),
            started_at: Utc::now(),
            steps: Vec::new(),
        };
        debug!("session {} started at {url}", session.id);
        inner.session = Some(session);
        let open = CapturedStep::new(StepKind::Open, LocatorBundle::for_page(url)).with_value(url);
        inner.push_step(open);
        inner.set_state(RecorderState::Recording);
        Ok(())
    }

    /// Suspend capture. No-op unless currently Recording.
    pub async fn pause(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == RecorderState::Recording {
            inner.set_state(RecorderState::Paused);
        } else {
            debug!("pause() ignored in state {}", inner.state);
        }
    }

    /// Resume capture. No-op unless currently Paused.
    pub async fn resume(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == RecorderState::Paused {
            inner.set_state(RecorderState::Recording);
        } else {
            debug!("resume() ignored in state {}", inner.state);
        }
    }

    /// End the session: flush every pending debounced input, convert the
    /// captured list into 1-indexed steps, clear the session and return
    /// the list. Graceful no-op returning an empty list while Idle.
    pub async fn stop(&self) -> Vec<Step> {
        let mut inner = self.inner.lock().await;
        if inner.state == RecorderState::Idle {
            return Vec::new();
        }
        let drained = inner.accumulator.drain();
        for pending in drained {
            inner.finalize_input(pending);
        }
        let session = inner.session.take();
        inner.set_state(RecorderState::Idle);
        let steps: Vec<Step> = session
            .map(|s| {
                s.steps
                    .iter()
                    .enumerate()
                    .map(|(i, c)| Step::from_captured(i as u32 + 1, c))
                    .collect()
            })
            .unwrap_or_default();
        debug!("session stopped with {} steps", steps.len());
        steps
    }

    /// Tear down: end any live session (discarding its output), detach
    /// all documents and drop subscribers.
    pub async fn destroy(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != RecorderState::Idle {
            let drained = inner.accumulator.drain();
            drop(drained);
            inner.session = None;
            inner.set_state(RecorderState::Idle);
        }
        inner.documents.clear();
        inner.root_origin = None;
        inner.step_callbacks.clear();
        inner.state_callbacks.clear();
    }

    pub async fn state(&self) -> RecorderState {
        self.inner.lock().await.state
    }

    pub async fn session_id(&self) -> Option<String> {
        self.inner.lock().await.session.as_ref().map(|s| s.id.clone())
    }

    /// Copy of the live step list for UI mirroring.
    pub async fn steps_snapshot(&self) -> Vec<CapturedStep> {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|s| s.steps.clone())
            .unwrap_or_default()
    }

    /// Subscribe to step-captured notifications.
    pub async fn on_step(&self, callback: StepCallback) {
        self.inner.lock().await.step_callbacks.push(callback);
    }

    /// Subscribe to state-changed notifications.
    pub async fn on_state(&self, callback: StateCallback) {
        self.inner.lock().await.state_callbacks.push(callback);
    }
}
