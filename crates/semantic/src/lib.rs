// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Templated SQL LSP - Semantic Analysis Layer
//!
//! This crate defines the seam to the semantic analyzer that resolves
//! compiled (fully-expanded) SQL.
//!
//! ## Overview
//!
//! The synchronization core hands the analyzer a compiled SQL text and
//! receives an [`Analysis`]: resolved-AST findings rendered as diagnostics in
//! compiled-text coordinates. The core then translates those coordinates back
//! into the raw document.
//!
//! Analyzer findings are not errors at the interface level; only a total
//! analysis failure (the analyzer cannot resolve the text at all) is an
//! [`AnalyzeError`].

pub mod analyzer;
pub mod error;

// Re-exports for convenience
pub use analyzer::{Analysis, Analyzer, AnalyzerDiagnostic, AnalyzerSeverity, NoopAnalyzer, RelatedInfo};
pub use error::{AnalyzeError, AnalyzeResult};
