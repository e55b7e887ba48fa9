pub mod detect;
pub mod dom;
pub mod error;
pub mod export;
pub mod recorder;
pub mod trace;

// Re-export common items
pub use detect::{DetectionOptions, LabelDetectionEngine};
pub use error::RecorderError;
pub use recorder::{Recorder, RecorderConfig, Step};
