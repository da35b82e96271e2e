// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Session Context
//!
//! This module owns the per-session state shared by all open documents.
//!
//! ## Overview
//!
//! The session holds:
//! - The URI → controller map for every open document
//! - The cross-document in-flight compile counter
//! - The shared collaborators (compiler, analyzer, scanner, metadata cache,
//!   publisher) injected once at construction
//!
//! It is an explicit context object passed to every handler; there are no
//! process-wide registries. The session also carries the cross-document
//! "compile error fixed" signal: a successful compile of any document clears
//! error state on every other document that holds one, because a project-wide
//! compile error is often caused by a different file than the ones reporting
//! it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info};

use templated_sql_lsp_catalog::{Catalog, MetadataCache};
use templated_sql_lsp_compiler::Compiler;
use templated_sql_lsp_semantic::Analyzer;
use templated_sql_lsp_template::TemplateScanner;

use crate::preview::PreviewPublisher;
use crate::scheduler::{CompileJobs, SchedulerSettings};
use crate::sync::DocumentController;

/// Shared state of one editing session
pub struct Session {
    documents: RwLock<HashMap<Url, Arc<DocumentController>>>,
    jobs: Arc<CompileJobs>,
    compiler: Arc<dyn Compiler>,
    analyzer: Arc<dyn Analyzer>,
    scanner: Arc<dyn TemplateScanner>,
    metadata: Arc<MetadataCache>,
    publisher: Arc<dyn PreviewPublisher>,
    scheduler_settings: SchedulerSettings,

    /// Handle to this session, handed to controllers for the error-fixed
    /// signal without creating a reference cycle
    weak_self: Weak<Session>,
}

impl Session {
    /// Create a session with its collaborators
    pub fn new(
        scheduler_settings: SchedulerSettings,
        compiler: Arc<dyn Compiler>,
        analyzer: Arc<dyn Analyzer>,
        scanner: Arc<dyn TemplateScanner>,
        catalog: Arc<dyn Catalog>,
        publisher: Arc<dyn PreviewPublisher>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            documents: RwLock::new(HashMap::new()),
            jobs: Arc::new(CompileJobs::new()),
            compiler,
            analyzer,
            scanner,
            metadata: Arc::new(MetadataCache::new(catalog)),
            publisher,
            scheduler_settings,
            weak_self: weak_self.clone(),
        })
    }

    /// Open a document and run its open transition
    ///
    /// Re-opening a URI replaces the previous controller; dropping it stops
    /// its scheduler worker.
    pub async fn open_document(
        &self,
        uri: Url,
        text: &str,
        version: i32,
    ) -> Arc<DocumentController> {
        info!("Document opened: uri={}, version={}", uri, version);

        let controller = DocumentController::spawn(
            uri.clone(),
            text,
            version,
            self.scheduler_settings,
            self.compiler.clone(),
            self.analyzer.clone(),
            self.scanner.clone(),
            self.publisher.clone(),
            self.jobs.clone(),
            self.weak_self.clone(),
        );

        self.documents
            .write()
            .await
            .insert(uri, controller.clone());
        controller.did_open().await;
        controller
    }

    /// Close a document, dropping its controller and clearing diagnostics
    pub async fn close_document(&self, uri: &Url) -> bool {
        let removed = self.documents.write().await.remove(uri);
        match removed {
            Some(_) => {
                info!("Document closed: uri={}", uri);
                self.publisher
                    .publish_raw_diagnostics(uri, Vec::new(), None)
                    .await;
                self.publisher
                    .update_preview_diagnostics(uri, Vec::new())
                    .await;
                true
            }
            None => false,
        }
    }

    /// Look up the controller for a document
    pub async fn controller(&self, uri: &Url) -> Option<Arc<DocumentController>> {
        self.documents.read().await.get(uri).cloned()
    }

    /// Number of open documents
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Broadcast that a compile succeeded somewhere in the project
    ///
    /// Every other document holding an unresolved compile error clears its
    /// error diagnostics without re-verifying; the triggering compile's own
    /// diagnostics re-report anything still wrong.
    pub async fn notify_compile_error_fixed(&self, origin: &Url) {
        let controllers: Vec<_> = {
            let documents = self.documents.read().await;
            documents
                .iter()
                .filter(|(uri, _)| *uri != origin)
                .map(|(_, controller)| controller.clone())
                .collect()
        };

        for controller in controllers {
            debug!("error-fixed signal reaches {}", controller.uri());
            controller.clear_compile_error().await;
        }
    }

    /// Shared destination metadata cache
    pub fn metadata(&self) -> &Arc<MetadataCache> {
        &self.metadata
    }

    /// Cross-document compile job counter
    pub fn jobs(&self) -> &Arc<CompileJobs> {
        &self.jobs
    }
}
