//! The recording engine: session state machine, event capture and the
//! debounce/merge accumulator, plus the locator and highlight
//! collaborator boundaries.

pub mod accumulator;
pub mod capture;
pub mod config;
pub mod highlight;
pub mod locator;
pub mod session;
pub mod step;

pub use capture::{DomEvent, DomEventKind};
pub use config::{EventFilter, RecorderConfig};
pub use highlight::{ConsoleHighlighter, HighlightHandle, HighlightService, NullHighlighter};
pub use locator::{LocatorBuilder, LocatorBundle, PathLocatorBuilder};
pub use session::{Recorder, RecorderState, RecordingSession, StateCallback, StepCallback};
pub use step::{CapturedStep, Coords, Step, StepKind};
