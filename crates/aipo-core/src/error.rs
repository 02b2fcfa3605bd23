use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AipoError {
    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("parse error in {} (line {line}): {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid document {}: {message}", path.display())]
    InvalidDocument { path: PathBuf, message: String },

    #[error("no layer descriptor found under: {}", .0.display())]
    NoLayers(PathBuf),

    #[error("unsafe path: {0}")]
    UnsafePath(String),

    #[error("invalid language: {0} (expected ja, en, or auto)")]
    InvalidLang(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AipoError>;
