// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for compiler operations
//!
//! This module defines the error types used throughout the compiler layer.

use thiserror::Error;

/// Result type alias for compiler operations
pub type CompilerResult<T> = Result<T, CompilerError>;

/// Errors that can occur while driving the external compiler
#[derive(Debug, Error)]
pub enum CompilerError {
    /// The compiler rejected the model (template or SQL error)
    ///
    /// Carries the compiler's raw error output so diagnostics can be
    /// located from it.
    #[error("{0}")]
    CompileFailed(String),

    /// The compile run exceeded the configured timeout
    #[error("Compilation timed out after {0}s")]
    Timeout(u64),

    /// The compiler executable could not be started
    #[error("Compiler unavailable: {0}")]
    Unavailable(String),

    /// The compile run succeeded but produced no artifact for the model
    #[error("Compiled artifact for model '{0}' not found")]
    ArtifactMissing(String),

    /// Filesystem error while reading a compiled artifact
    #[error("Failed to read compiled artifact: {0}")]
    Io(#[from] std::io::Error),
}
