//! Error types for cache restore operations

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Message reported when strict mode is on and nothing was restored.
pub const CACHE_MISS_MESSAGE: &str = "Cache miss and fail-on-cache-miss is enabled";

/// Error type for cache restore operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Missing, conflicting or malformed action inputs
    #[error("{message}")]
    #[diagnostic(
        code(boringcache::inputs::validation),
        help("Provide either `workspace` + `entries` or `path` + `key`")
    )]
    Validation {
        /// Human-readable description of the problem
        message: String,
    },

    /// A `tag:path` segment without a colon
    #[error("Invalid entry format: {entry}. Expected format: tag:path")]
    #[diagnostic(code(boringcache::inputs::entry_format))]
    InvalidEntryFormat {
        /// The offending segment, trimmed
        entry: String,
    },

    /// The cache CLI could not be installed or verified
    #[error("Failed to install BoringCache CLI: {message}")]
    #[diagnostic(
        code(boringcache::installer),
        help("Check network access and the requested `cli-version`")
    )]
    Installation {
        /// Cause of the failure
        message: String,
    },

    /// No key produced a hit and `fail-on-cache-miss` was requested
    #[error("{}", CACHE_MISS_MESSAGE)]
    #[diagnostic(code(boringcache::restore::miss))]
    CacheMiss,

    /// An external process could not be run or exited unexpectedly
    #[error("Failed to execute '{command}': {message}")]
    #[diagnostic(code(boringcache::exec))]
    Exec {
        /// Program that was invoked
        command: String,
        /// What went wrong
        message: String,
    },

    /// I/O error while talking to the runner (output files, path files)
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(boringcache::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "append")
        operation: String,
    },
}

impl Error {
    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an invalid entry error
    #[must_use]
    pub fn invalid_entry(entry: impl Into<String>) -> Self {
        Self::InvalidEntryFormat {
            entry: entry.into(),
        }
    }

    /// Create an installation error
    #[must_use]
    pub fn installation(msg: impl Into<String>) -> Self {
        Self::Installation {
            message: msg.into(),
        }
    }

    /// Create a process execution error
    #[must_use]
    pub fn exec(command: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Exec {
            command: command.into(),
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }
}

/// Result type for cache restore operations
pub type Result<T> = std::result::Result<T, Error>;
