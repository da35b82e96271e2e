// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dual-Document Controller
//!
//! This module owns the synchronization of one document pair: the raw
//! templated text and the compiled plain-SQL text derived from it.
//!
//! ## Overview
//!
//! The controller handles:
//! - Document lifecycle entry points (open, change, willSave, save)
//! - The recompile-vs-fast-patch decision via the change detector
//! - Compile scheduling through the debounced scheduler
//! - Applying compile results and republishing both diagnostic sets
//!
//! ## State machine
//!
//! ```text
//! Clean ──non-template edit──→ DirtyFastPatch ─┐
//!   │                                          │ (next compile)
//!   ├──template edit──→ DirtyPendingCompile ──→ Compiling ──→ Clean
//!   │                                              │
//!   └──────────── error-fixed signal ◄── CompileError
//! ```
//!
//! `CompileError` is not terminal: a later successful compile of this
//! document, or the cross-document error-fixed signal (the project-wide
//! compile error may live in a different file), transitions back to `Clean`
//! and clears this document's diagnostics without any local edit.
//!
//! ## Ordering
//!
//! Every transition that changes the compiled buffer pushes a preview update
//! before diagnostics, so a human watching the preview never sees diagnostics
//! for text that is not rendered yet.

use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tower_lsp::lsp_types::{
    Position, Range, TextDocumentContentChangeEvent, TextDocumentSaveReason, Url,
};
use tracing::{debug, error, info, warn};

use templated_sql_lsp_compiler::Compiler;
use templated_sql_lsp_semantic::Analyzer;
use templated_sql_lsp_template::TemplateScanner;

use crate::detector::ChangeDetector;
use crate::diagnostic;
use crate::document::{DocumentError, DocumentPair, SyncState};
use crate::preview::PreviewPublisher;
use crate::scheduler::{CompileEvents, CompileJobs, CompileScheduler, SchedulerSettings};
use crate::session::Session;

/// Derive the model identifier from a document URI
///
/// The compiler selects models by name, which is the file stem of the
/// model's source file.
pub fn model_name(uri: &Url) -> String {
    uri.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|name| name.strip_suffix(".sql").unwrap_or(name).to_string())
        .unwrap_or_else(|| uri.to_string())
}

/// Controller for one open document pair
pub struct DocumentController {
    inner: Arc<DocumentInner>,
    scheduler: CompileScheduler,
    detector: ChangeDetector,
}

/// Shared document state, also the scheduler's event target
///
/// Split from [`DocumentController`] so the scheduler worker can hold it
/// without a reference cycle through the scheduler itself.
struct DocumentInner {
    uri: Url,
    pair: Mutex<DocumentPair>,
    compiler: Arc<dyn Compiler>,
    analyzer: Arc<dyn Analyzer>,
    publisher: Arc<dyn PreviewPublisher>,
    session: Weak<Session>,
}

impl DocumentController {
    /// Create a controller and spawn its compile scheduler
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn spawn(
        uri: Url,
        text: &str,
        version: i32,
        settings: SchedulerSettings,
        compiler: Arc<dyn Compiler>,
        analyzer: Arc<dyn Analyzer>,
        scanner: Arc<dyn TemplateScanner>,
        publisher: Arc<dyn PreviewPublisher>,
        jobs: Arc<CompileJobs>,
        session: Weak<Session>,
    ) -> Arc<Self> {
        let model = model_name(&uri);
        let inner = Arc::new(DocumentInner {
            uri,
            pair: Mutex::new(DocumentPair::new(text, version)),
            compiler: compiler.clone(),
            analyzer,
            publisher,
            session,
        });
        let scheduler = CompileScheduler::spawn(settings, model, compiler, jobs, inner.clone());

        Arc::new(Self {
            inner,
            scheduler,
            detector: ChangeDetector::new(scanner),
        })
    }

    /// Document URI
    pub fn uri(&self) -> &Url {
        &self.inner.uri
    }

    /// Handle `textDocument/didOpen`
    ///
    /// Both buffers already hold the opened text. Template syntax in the
    /// text forces the compile-required flag and schedules the initial
    /// compile, the same path a full-document template edit would take.
    pub async fn did_open(&self) {
        let (preview, has_templates) = {
            let pair = self.inner.pair.lock().await;
            let raw = pair.raw_text();
            let has_templates = self.detector.has_template_markers(&raw);
            (pair.compiled_text(), has_templates)
        };

        self.inner
            .publisher
            .update_preview(&self.inner.uri, &preview)
            .await;

        if has_templates {
            let mut pair = self.inner.pair.lock().await;
            pair.compile_required_on_save = true;
            pair.compile_requested = true;
            pair.sync_state = SyncState::DirtyPendingCompile;
            drop(pair);

            debug!("opened document contains template syntax: {}", self.inner.uri);
            self.scheduler.request_compile();
        }
    }

    /// Handle `textDocument/didChange`
    ///
    /// Edits always reach the raw buffer immediately; only the compiled
    /// buffer's refresh may be deferred behind a compile.
    pub async fn did_change(
        &self,
        version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<(), DocumentError> {
        let mut pair = self.inner.pair.lock().await;
        let raw_text = pair.raw_text();
        let needs_recompile =
            self.detector
                .needs_recompile(&raw_text, self.scheduler.is_compiling(), changes);

        if needs_recompile {
            pair.apply_raw_changes(changes, version)?;
            pair.compile_requested = true;
            if pair.sync_state != SyncState::Compiling {
                pair.sync_state = SyncState::DirtyPendingCompile;
            }
            drop(pair);

            self.scheduler.request_compile();
            return Ok(());
        }

        // Fast path: mirror the plain-SQL edit into the compiled buffer
        pair.apply_fast_patch(changes, version)?;
        if pair.sync_state == SyncState::Clean {
            pair.sync_state = SyncState::DirtyFastPatch;
        }
        let preview = pair.compiled_text();
        let compiled_diagnostics = pair.compiled_diagnostics.clone();
        let raw_diagnostics = pair.raw_diagnostics.clone();
        let raw_version = pair.raw_version();
        drop(pair);

        let publisher = &self.inner.publisher;
        publisher.update_preview(&self.inner.uri, &preview).await;
        publisher
            .update_preview_diagnostics(&self.inner.uri, compiled_diagnostics)
            .await;
        publisher
            .publish_raw_diagnostics(&self.inner.uri, raw_diagnostics, Some(raw_version))
            .await;
        Ok(())
    }

    /// Handle `textDocument/willSave`
    ///
    /// A document modified before the server finished initializing never ran
    /// the change detector, so the first explicit save forces a compile.
    pub async fn will_save(&self, reason: TextDocumentSaveReason) {
        let mut pair = self.inner.pair.lock().await;
        if pair.first_save_seen {
            return;
        }
        pair.first_save_seen = true;
        if reason != TextDocumentSaveReason::AFTER_DELAY && !pair.compile_requested {
            debug!("first save of {} forces a compile", self.inner.uri);
            pair.compile_required_on_save = true;
        }
    }

    /// Handle `textDocument/didSave`
    pub async fn did_save(&self) {
        let required = {
            let mut pair = self.inner.pair.lock().await;
            let required = pair.compile_required_on_save;
            pair.compile_required_on_save = false;
            if required {
                pair.compile_requested = true;
                if pair.sync_state != SyncState::Compiling {
                    pair.sync_state = SyncState::DirtyPendingCompile;
                }
            }
            required
        };

        if required {
            // The backing process may have gone stale while the document
            // was edited; refresh it before compiling
            if let Err(e) = self.inner.compiler.refresh().await {
                warn!("compiler refresh failed: {}", e);
            }
            self.scheduler.request_compile();
        } else {
            // Some clients re-request state on focus/save; republishing the
            // current compiled state is enough
            self.republish().await;
        }
    }

    /// Re-publish the current preview and both diagnostic sets
    pub async fn republish(&self) {
        let (preview, compiled_diagnostics, raw_diagnostics, raw_version) = {
            let pair = self.inner.pair.lock().await;
            (
                pair.compiled_text(),
                pair.compiled_diagnostics.clone(),
                pair.raw_diagnostics.clone(),
                pair.raw_version(),
            )
        };

        let publisher = &self.inner.publisher;
        publisher.update_preview(&self.inner.uri, &preview).await;
        publisher
            .update_preview_diagnostics(&self.inner.uri, compiled_diagnostics)
            .await;
        publisher
            .publish_raw_diagnostics(&self.inner.uri, raw_diagnostics, Some(raw_version))
            .await;
    }

    /// Clear this document's compile error after the cross-document
    /// error-fixed signal
    ///
    /// The project-wide error was fixed by a recompilation elsewhere; this
    /// document trusts that compile's own diagnostics to re-report if its
    /// text is still wrong.
    pub async fn clear_compile_error(&self) {
        {
            let mut pair = self.inner.pair.lock().await;
            if !pair.unresolved_compile_error {
                return;
            }
            info!("clearing resolved compile error: {}", self.inner.uri);
            pair.unresolved_compile_error = false;
            if pair.sync_state == SyncState::CompileError {
                pair.sync_state = SyncState::Clean;
            }
            pair.raw_diagnostics.clear();
            pair.compiled_diagnostics.clear();
        }

        let publisher = &self.inner.publisher;
        publisher
            .update_preview_diagnostics(&self.inner.uri, Vec::new())
            .await;
        publisher
            .publish_raw_diagnostics(&self.inner.uri, Vec::new(), None)
            .await;
    }

    /// Whether this document currently holds an unresolved compile error
    pub async fn has_unresolved_compile_error(&self) -> bool {
        self.inner.pair.lock().await.unresolved_compile_error
    }

    /// Whether a compile for this document is in flight
    pub fn is_compiling(&self) -> bool {
        self.scheduler.is_compiling()
    }

    /// Current raw text
    pub async fn raw_text(&self) -> String {
        self.inner.pair.lock().await.raw_text()
    }

    /// Current compiled text
    pub async fn compiled_text(&self) -> String {
        self.inner.pair.lock().await.compiled_text()
    }

    /// Current synchronization state
    pub async fn sync_state(&self) -> SyncState {
        self.inner.pair.lock().await.sync_state
    }

    /// Current raw-space diagnostics
    pub async fn raw_diagnostics(&self) -> Vec<tower_lsp::lsp_types::Diagnostic> {
        self.inner.pair.lock().await.raw_diagnostics.clone()
    }
}

#[async_trait::async_trait]
impl CompileEvents for DocumentInner {
    async fn on_compilation_started(&self) {
        let mut pair = self.pair.lock().await;
        pair.sync_state = SyncState::Compiling;
        drop(pair);
        self.publisher.compilation_started(&self.uri).await;
    }

    async fn on_compilation_finished(&self, compiled_sql: String) {
        let (raw_text, raw_version) = {
            let mut pair = self.pair.lock().await;
            pair.replace_compiled(&compiled_sql);
            pair.unresolved_compile_error = false;
            pair.compile_required_on_save = false;
            pair.sync_state = SyncState::Clean;
            (pair.raw_text(), pair.raw_version())
        };

        // Preview first, diagnostics after
        self.publisher.update_preview(&self.uri, &compiled_sql).await;

        let (compiled_diagnostics, raw_diagnostics) =
            match self.analyzer.analyze(&compiled_sql).await {
                Ok(analysis) => {
                    let compiled: Vec<_> = analysis
                        .diagnostics
                        .iter()
                        .map(|finding| diagnostic::from_analyzer(&self.uri, finding))
                        .collect();
                    let raw: Vec<_> = compiled
                        .iter()
                        .map(|d| diagnostic::to_raw_space(d, &raw_text, &compiled_sql))
                        .collect();
                    (compiled, raw)
                }
                Err(e) => {
                    warn!("analysis failed for {}: {}", self.uri, e);
                    let head = Range::new(Position::new(0, 0), Position::new(0, 0));
                    let failure = diagnostic::make_diagnostic(
                        head,
                        e.to_string(),
                        tower_lsp::lsp_types::DiagnosticSeverity::ERROR,
                        diagnostic::DiagnosticCode::AnalysisFailure,
                    );
                    (vec![failure.clone()], vec![failure])
                }
            };

        {
            let mut pair = self.pair.lock().await;
            pair.compiled_diagnostics = compiled_diagnostics.clone();
            pair.raw_diagnostics = raw_diagnostics.clone();
        }

        self.publisher
            .update_preview_diagnostics(&self.uri, compiled_diagnostics)
            .await;
        self.publisher
            .publish_raw_diagnostics(&self.uri, raw_diagnostics, Some(raw_version))
            .await;

        // A successful compile proves the project compiles again; other
        // documents may be holding an error this compile just fixed
        if let Some(session) = self.session.upgrade() {
            session.notify_compile_error_fixed(&self.uri).await;
        }
    }

    async fn on_compilation_error(&self, raw_error_text: String) {
        let (diagnostic, raw_version) = {
            let mut pair = self.pair.lock().await;
            pair.unresolved_compile_error = true;
            pair.sync_state = SyncState::CompileError;
            let diagnostic =
                diagnostic::compile_error_diagnostic(&raw_error_text, &pair.raw_text());
            pair.raw_diagnostics = vec![diagnostic.clone()];
            pair.compiled_diagnostics.clear();
            (diagnostic, pair.raw_version())
        };

        error!("compile error for {}: {}", self.uri, raw_error_text.trim());

        // The compiled buffer is unchanged; only diagnostics move
        self.publisher
            .update_preview_diagnostics(&self.uri, Vec::new())
            .await;
        self.publisher
            .publish_raw_diagnostics(&self.uri, vec![diagnostic], Some(raw_version))
            .await;
    }

    async fn on_finish_all_compile_jobs(&self) {
        self.publisher.all_compilations_finished().await;
    }
}
