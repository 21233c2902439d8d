// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Marker could not be created, read or removed. Not raised when the
    /// marker simply already exists.
    #[error("Marker store error at {path}: {message}")]
    Store { path: String, message: String },

    #[error("Staging failed for run {run}: {message}")]
    Staging { run: String, message: String },

    #[error("Trigger failed for run {run}: {message}")]
    Trigger { run: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MonitorError>;
