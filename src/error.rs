use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the tutor core.
///
/// Collaborator failures (transcription, face detection) never show up here;
/// they are absorbed into fallback signal values at the boundary.
#[derive(Debug, Error)]
pub enum TutorError {
    #[error("failed to load difficulty model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("failed to save difficulty model to {path}: {reason}")]
    ModelSave { path: PathBuf, reason: String },

    #[error("cannot fit difficulty model: {0}")]
    Training(&'static str),

    #[error("invalid signal: {field} = {value}")]
    InvalidInput { field: &'static str, value: f64 },

    #[error("history store error: {0}")]
    History(#[from] rusqlite::Error),

    #[error("history export error: {0}")]
    Export(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TutorError>;
