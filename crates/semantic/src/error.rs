// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Error types for semantic analysis
//!
//! This module defines error types used at the analyzer seam.

use thiserror::Error;

/// Result type alias for analysis operations
pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

/// Errors that can occur during semantic analysis
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    /// The analyzer could not resolve the compiled SQL at all
    #[error("Analysis failed: {0}")]
    Failed(String),

    /// The analyzer backend is not available
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),
}
