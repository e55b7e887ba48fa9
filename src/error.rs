use thiserror::Error;

/// Errors surfaced by the recording engine.
///
/// Filter rejections (paused session, ignored targets) are not errors;
/// they silently produce no step. Only caller bugs and malformed inputs
/// surface here.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// `start()` was called while a session is already live. Caller bug.
    #[error("recording already in progress")]
    AlreadyRecording,

    /// An event was dispatched against a document that was never attached
    /// (or was detached).
    #[error("document {0} is not attached to this recorder")]
    UnknownDocument(uuid::Uuid),

    /// A trace/CLI target selector matched nothing in the document.
    #[error("no element matches selector '{0}'")]
    NoSuchElement(String),
}
