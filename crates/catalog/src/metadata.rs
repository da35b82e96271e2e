// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for destination schema information
//!
//! These types describe the tables and columns the destination reports for a
//! dataset. They are deliberately destination-neutral; client implementations
//! translate their native type systems into [`DataType`].

use serde::{Deserialize, Serialize};

/// Destination data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Arbitrary-precision decimal
    Numeric,
    /// Boolean
    Boolean,
    /// Variable-length string
    String,
    /// Raw bytes
    Bytes,
    /// Calendar date
    Date,
    /// Wall-clock time
    Time,
    /// Civil date and time
    DateTime,
    /// Absolute point in time
    Timestamp,
    /// JSON value
    Json,
    /// Nested record
    Record,
    /// Geography value
    Geography,
    /// Type the client could not translate
    Unknown,
}

impl DataType {
    /// Translate a destination type name into a [`DataType`]
    pub fn from_destination(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "INT64" | "INTEGER" => DataType::Integer,
            "FLOAT64" | "FLOAT" => DataType::Float,
            "NUMERIC" | "BIGNUMERIC" | "DECIMAL" => DataType::Numeric,
            "BOOL" | "BOOLEAN" => DataType::Boolean,
            "STRING" => DataType::String,
            "BYTES" => DataType::Bytes,
            "DATE" => DataType::Date,
            "TIME" => DataType::Time,
            "DATETIME" => DataType::DateTime,
            "TIMESTAMP" => DataType::Timestamp,
            "JSON" => DataType::Json,
            "RECORD" | "STRUCT" => DataType::Record,
            "GEOGRAPHY" => DataType::Geography,
            _ => DataType::Unknown,
        }
    }
}

/// Table type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableType {
    /// Base table
    Table,
    /// View
    View,
    /// External table
    External,
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,

    /// Column data type
    pub data_type: DataType,

    /// Whether the column is nullable
    pub nullable: bool,

    /// Column description, if the destination carries one
    pub description: Option<String>,
}

impl ColumnMetadata {
    /// Create a new column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            description: None,
        }
    }

    /// Mark the column as non-nullable
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Table metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Dataset (schema) the table lives in
    pub dataset: String,

    /// Table name
    pub name: String,

    /// Table type
    pub table_type: TableType,

    /// Columns, in destination order
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    /// Create a new table
    pub fn new(dataset: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            name: name.into(),
            table_type: TableType::Table,
            columns: Vec::new(),
        }
    }

    /// Add a column
    pub fn with_column(mut self, column: ColumnMetadata) -> Self {
        self.columns.push(column);
        self
    }
}
