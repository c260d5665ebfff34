use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to parse manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Invalid known-bad list at line {line}: {details}")]
    Catalog { line: usize, details: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
