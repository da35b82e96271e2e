// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for templated-sql-lsp
//!
//! This crate provides common testing components including:
//! - Mock compiler with scripted per-model results and call counting
//! - Mock analyzer with scripted findings
//! - Fixture texts for templated and compiled SQL

pub mod fixtures;
pub mod mock_analyzer;
pub mod mock_compiler;

// Re-exports for convenience
pub use mock_analyzer::MockAnalyzer;
pub use mock_compiler::MockCompiler;
