//! Error types for portprobe.
//!
//! Uses `thiserror` for ergonomic error definitions. Errors raised while
//! scanning never leave the scanner: they are folded into a port state.
//! Only the edges (arguments, configuration, catalog construction) return
//! errors to the caller.

use crate::types::{PortError, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single connection attempt.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("connection to {address} failed: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors building a probe catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("invalid match pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors reading the service name registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read service registry {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("invalid configuration: {0}")]
    InvalidValue(String),
}

/// Top-level errors surfaced by the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias for connection attempts.
pub type ConnectResult<T> = Result<T, ScanError>;

/// Result type alias for catalog construction.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type alias for registry loading.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
