mod gating;
mod tracker;

use thiserror::Error;

pub use tracker::CourseProgress;

/// Shown verbatim when a locked lecture is opened; gating violations block
/// navigation instead of silently no-opping.
pub const LOCKED_REASON: &str = "Finish the current stage (watch 90%) to unlock the next.";

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("{0}")]
    Locked(String),
    #[error("unknown lecture {0}")]
    UnknownLecture(String),
}
