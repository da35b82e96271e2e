// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Static Catalog
//!
//! This module provides a static catalog implementation that uses predefined
//! schema data.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use templated_sql_lsp_catalog::{StaticCatalog, TableMetadata};
//!
//! let catalog = StaticCatalog::new()
//!     .with_table(TableMetadata::new("analytics", "orders"));
//! let table = catalog.get_metadata("analytics", "orders").await?;
//! ```

use async_trait::async_trait;
use std::collections::HashMap;

use crate::metadata::TableMetadata;
use crate::{Catalog, CatalogResult};

/// Static catalog with predefined schema data
///
/// This is used for tests and offline operation without a real destination.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    tables: HashMap<(String, String), TableMetadata>,
}

impl StaticCatalog {
    /// Create a new empty static catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table definition
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.tables
            .insert((table.dataset.clone(), table.name.clone()), table);
        self
    }

    /// Number of defined tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn get_metadata(
        &self,
        dataset: &str,
        table: &str,
    ) -> CatalogResult<Option<TableMetadata>> {
        Ok(self
            .tables
            .get(&(dataset.to_string(), table.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnMetadata, DataType};

    #[tokio::test]
    async fn test_static_catalog_lookup() {
        let catalog = StaticCatalog::new().with_table(
            TableMetadata::new("analytics", "orders")
                .with_column(ColumnMetadata::new("id", DataType::Integer).required()),
        );

        let table = catalog.get_metadata("analytics", "orders").await.unwrap();
        assert_eq!(table.unwrap().columns.len(), 1);

        let missing = catalog.get_metadata("analytics", "customers").await.unwrap();
        assert!(missing.is_none());
    }
}
