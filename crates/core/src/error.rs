use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LofpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error in {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("repository '{repo}' does not appear in path: {path}")]
    RepoNotInPath { repo: String, path: PathBuf },

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown rule source: '{0}'")]
    UnknownSource(String),
}

/// Result alias for lofp operations.
pub type Result<T> = std::result::Result<T, LofpError>;
