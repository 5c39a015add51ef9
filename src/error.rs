// Library error type
//
// Tag parsing itself never fails: malformed input degrades to "no chapters".
// These errors only come from the edges (opening paths, loading config).

use std::path::PathBuf;

/// Errors surfaced by path and configuration entry points
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("not a regular file: {}", .0.display())]
    InvalidPath(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
