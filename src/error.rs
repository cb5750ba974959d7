use std::path::PathBuf;

use thiserror::Error;

/// Failures that prevent a level from starting.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no playable rows")]
    Empty,

    #[error("level rows have zero width")]
    ZeroWidth,

    #[error("level has no open cell for the player")]
    NoOpenCell,

    #[error("malformed marker row {line}: {reason}")]
    MalformedMarker { line: usize, reason: String },

    #[error("failed to read level {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(String),
}

/// Non-fatal motion failures. State is left as it was, except for progress a
/// multi-step command already made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MotionError {
    #[error("motion could not move the actor")]
    InvalidMotion,

    #[error("no reachable line found for the jump")]
    UnreachableLineTarget,
}

pub type MotionResult = Result<(), MotionError>;
