use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid flavor descriptor {path}: {source}")]
    InvalidFlavor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid worker path: {0}")]
    InvalidWorkerPath(PathBuf),
}

pub type Result<T> = std::result::Result<T, CoreError>;
