use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasGenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Atlas output directory is a file: {}", .0.display())]
    OutputNotDirectory(PathBuf),
    #[error("Invalid bundle name: {0:?}")]
    InvalidBundleName(String),
    #[error("Unknown bundle: {0}")]
    UnknownBundle(String),
}

pub type Result<T> = std::result::Result<T, AtlasGenError>;
