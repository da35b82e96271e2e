// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog trait for destination schema abstraction
//!
//! This module defines the async Catalog trait used for querying destination
//! schema information.

use crate::error::CatalogResult;
use crate::metadata::TableMetadata;

/// Catalog trait for destination schema abstraction
///
/// This trait provides an async interface for querying table metadata from a
/// destination. Implementations can talk to a live destination, read from
/// static definitions, or wrap another catalog with caching.
///
/// # Examples
///
/// ```rust,ignore
/// use templated_sql_lsp_catalog::Catalog;
///
/// async fn column_names(catalog: &impl Catalog) -> Vec<String> {
///     match catalog.get_metadata("analytics", "orders").await {
///         Ok(Some(table)) => table.columns.into_iter().map(|c| c.name).collect(),
///         _ => Vec::new(),
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch metadata for one table
    ///
    /// # Arguments
    ///
    /// * `dataset` - Dataset (schema) name
    /// * `table` - Table name
    ///
    /// # Returns
    ///
    /// `Some(TableMetadata)` when the table exists and is readable. Not-found
    /// and permission failures return `None`; implementations log them.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ConnectionFailed` if the destination connection
    /// fails, `CatalogError::QueryTimeout` if the query exceeds its timeout.
    async fn get_metadata(&self, dataset: &str, table: &str)
    -> CatalogResult<Option<TableMetadata>>;
}
