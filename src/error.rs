//! Error types for the Tabula binary

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading the startup file
#[derive(Error, Debug)]
pub enum RcError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is {size} bytes; startup files are limited to {limit} bytes")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
}

pub type Result<T> = std::result::Result<T, RcError>;
