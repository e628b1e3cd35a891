use crate::canvas::Mode;
use crate::types::ShapeType;

/// Errors that reach the caller. Geometric failures never show up here: a
/// degenerate gesture is reported through the observer as an empty result.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("cannot start {requested:?} while {active:?} is active")]
    ModeConflict { active: Mode, requested: Mode },

    #[error("{shape} is not supported in {mode:?} mode")]
    UnsupportedShape { mode: Mode, shape: ShapeType },

    #[error("unsupported tool: {0}")]
    UnsupportedTool(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CanvasError>;
