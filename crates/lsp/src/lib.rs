// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Templated SQL LSP - Language Server Protocol
//!
//! This crate provides the LSP server implementation for Templated SQL LSP.
//!
//! ## Overview
//!
//! The server keeps two synchronized views of every open model file:
//! - The **raw document**: templated SQL the user edits
//! - The **compiled document**: the fully-expanded plain SQL the external
//!   compiler produces from it
//!
//! Edits always land in the raw buffer immediately. Plain-SQL edits are
//! mirrored into the compiled buffer through diff-based coordinate
//! translation (the fast path); template-relevant edits schedule a debounced
//! recompilation and replace the compiled buffer wholesale when the compiler
//! finishes. Diagnostics are produced in compiled-text coordinates and
//! translated back into the raw document before publishing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Client (VS Code, etc.)          │
//! └──────────────┬──────────────────────────┘
//!                │ LSP Protocol
//!                ↓
//! ┌─────────────────────────────────────────┐
//! │         LSP Backend (tower-lsp)         │
//! ├─────────────────────────────────────────┤
//! │  • did_open / did_change / did_close   │
//! │  • will_save / did_save                 │
//! └──────────────┬──────────────────────────┘
//!                │
//!                ↓
//! ┌─────────────────────────────────────────┐
//! │          Session (per project)          │
//! └──────┬──────────────┬───────────────────┘
//!        ↓              ↓
//! ┌────────────┐ ┌─────────────────────────┐
//! │  Metadata  │ │   DocumentController    │
//! │   Cache    │ │  detector → scheduler   │
//! └────────────┘ │  transducer → publisher │
//!                └─────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`backend`]: Main LSP server implementation
//! - [`session`]: Session context owning the open documents
//! - [`sync`]: Dual-document controller and its state machine
//! - [`document`]: The raw/compiled buffer pair
//! - [`position`]: Diff-based coordinate transducer
//! - [`detector`]: Template change detector
//! - [`scheduler`]: Debounced compile scheduler
//! - [`diagnostic`]: Diagnostic construction and error-text parsing
//! - [`preview`]: Custom notifications and the publisher seam
//! - [`config`]: Server configuration
//!
//! ## Error Handling
//!
//! The server uses graceful degradation:
//! - Compile errors → one located diagnostic, document stays editable
//! - Analysis errors → diagnostics on both views, edits keep flowing
//! - Translation out of bounds → clamp, never drop a diagnostic
//! - Protocol violations (full replacement on the fast path, non-monotonic
//!   versions) → the operation is rejected loudly

pub mod backend;
pub mod config;
pub mod detector;
pub mod diagnostic;
pub mod document;
pub mod position;
pub mod preview;
pub mod scheduler;
pub mod session;
pub mod sync;

// Re-exports for convenience
pub use backend::{LspBackend, LspError};
pub use config::{CompilerSettings, ConfigError, ServerConfig};
pub use detector::ChangeDetector;
pub use diagnostic::{DIAGNOSTIC_SOURCE, DiagnosticCode, compile_error_diagnostic};
pub use document::{DocumentError, DocumentPair, SyncState};
pub use position::translate;
pub use preview::{
    ClientPublisher, PreviewPublisher, UpdateQueryPreview, UpdateQueryPreviewDiagnostics,
    UpdateQueryPreviewDiagnosticsParams, UpdateQueryPreviewParams,
};
pub use scheduler::{CompileEvents, CompileJobs, CompileScheduler, SchedulerSettings};
pub use session::Session;
pub use sync::{DocumentController, model_name};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name
pub const SERVER_NAME: &str = "templated-sql-lsp";
