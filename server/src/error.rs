//! Error types for the intake server

use std::io;
use thiserror::Error;

/// Failures of the persistence store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create store directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Every candidate registration number collided with an existing one.
    #[error("no unique registration number after {attempts} attempts")]
    IdentifierExhausted { attempts: u32 },
    #[error("store task failed: {0}")]
    Task(String),
}

/// Fatal startup errors. Per-connection failures never surface here.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("could not resolve bind address {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
