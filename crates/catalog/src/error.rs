// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for Catalog operations
//!
//! This module defines the error types used throughout the catalog layer.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur during Catalog operations
#[derive(Debug, Error, Clone, Serialize)]
pub enum CatalogError {
    /// Failed to connect to the destination
    #[error("Failed to connect to destination: {0}")]
    ConnectionFailed(String),

    /// Metadata query timed out
    #[error("Metadata query timed out after {0}s")]
    QueryTimeout(u64),

    /// Invalid table reference (malformed dataset or table name)
    #[error("Invalid table reference: {0}")]
    InvalidReference(String),

    /// Failed to decode destination metadata
    #[error("Failed to decode metadata: {0}")]
    Decode(String),
}
