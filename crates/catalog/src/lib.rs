// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Templated SQL LSP - Catalog Layer
//!
//! This crate provides destination schema abstraction for the Templated SQL
//! LSP server. It defines the `Catalog` trait and metadata types used for:
//!
//! - **Static Catalogs**: Schema definitions held in memory (tests, offline use)
//! - **Cached Catalogs**: The shared, memoized metadata cache every open
//!   document reads from
//!
//! ## Architecture
//!
//! The catalog layer is responsible for:
//! - Providing destination schema information (datasets, tables, columns)
//! - Abstracting different destination clients behind one trait
//! - Guaranteeing at-most-once metadata fetches per table across documents
//!
//! ## Metadata Types
//!
//! - [`TableMetadata`]: Table information including columns and table type
//! - [`ColumnMetadata`]: Column details including type and nullability
//! - [`DataType`]: Destination data type representation
//!
//! ## Error Handling
//!
//! Not-found and permission failures are expected states, not errors: the
//! trait surfaces them as `Ok(None)` and implementations log them. Hard
//! errors (connection loss, timeouts) use [`CatalogError`].

pub mod cache;
pub mod error;
pub mod metadata;
pub mod r#static;
pub mod r#trait;

// Re-exports for convenience
pub use cache::MetadataCache;
pub use error::{CatalogError, CatalogResult};
pub use metadata::{ColumnMetadata, DataType, TableMetadata, TableType};
pub use r#static::StaticCatalog;
pub use r#trait::Catalog;
