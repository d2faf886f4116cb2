use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunktarError {
    #[error("Cannot open source {}: {source}", .path.display())]
    SourceOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot open chunk {}: {source}", .path.display())]
    ChunkOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot remove stale chunk {}: {source}", .path.display())]
    ChunkRemove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Read error: {0}")]
    Read(std::io::Error),

    #[error("Write error: {0}")]
    Write(std::io::Error),

    #[error("Invalid key length: {0} bytes. Must be 16, 24, or 32")]
    KeyLengthInvalid(usize),

    #[error("Encryption key mismatch or tampered data")]
    KeyMismatch,

    #[error("Cannot create destination {}: {source}", .path.display())]
    DestinationCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, ChunktarError>;
