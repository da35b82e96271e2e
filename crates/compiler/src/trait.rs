// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Compiler trait for model compilation abstraction
//!
//! This module defines the async Compiler trait used to expand templated SQL
//! models into plain SQL.

use crate::error::CompilerResult;

/// Compiler abstraction for template expansion
///
/// Implementations take a model identifier, run the external compiler on it,
/// and return the fully-expanded plain SQL. A compile run is a single
/// request/response exchange; there are no partial or streaming results.
#[async_trait::async_trait]
pub trait Compiler: Send + Sync {
    /// Compile one model and return its expanded SQL text
    ///
    /// # Arguments
    ///
    /// * `model` - Model identifier (the model's name, without extension)
    ///
    /// # Errors
    ///
    /// Returns `CompilerError::CompileFailed` with the compiler's raw error
    /// output when the model does not compile.
    /// Returns `CompilerError::Unavailable` when the compiler process cannot
    /// be started.
    async fn compile(&self, model: &str) -> CompilerResult<String>;

    /// Refresh stale compiler state
    ///
    /// Called before a save-triggered compile so a backing process that went
    /// stale while the document was being edited is restarted.
    async fn refresh(&self) -> CompilerResult<()>;
}
