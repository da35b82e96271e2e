// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Templated SQL LSP - Compiler Layer
//!
//! This crate defines the seam to the external model compiler that expands
//! templated SQL into plain SQL.
//!
//! ## Overview
//!
//! The compiler layer is responsible for:
//! - Abstracting the compiler behind the async [`Compiler`] trait
//! - Driving the real compiler as a subprocess ([`CliCompiler`])
//! - Locating the compiled SQL artifact a compile run produced
//!
//! The synchronization core never inspects compiler internals; it submits a
//! model identifier and receives either the expanded SQL text or the
//! compiler's raw error output.

pub mod cli;
pub mod error;
pub mod r#trait;

// Re-exports for convenience
pub use cli::CliCompiler;
pub use error::{CompilerError, CompilerResult};
pub use r#trait::Compiler;
