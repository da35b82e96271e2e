// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # LSP Backend Implementation
//!
//! This module provides the main LSP server backend using tower-lsp.
//!
//! ## Overview
//!
//! The backend handles:
//! - LSP protocol communication via tower-lsp
//! - Document lifecycle (open, change, willSave, save, close)
//! - Session construction from client initialization options
//!
//! ## Architecture
//!
//! ```text
//! Client → LSP Backend → Session → DocumentController (per document)
//!                           │            ├─→ ChangeDetector
//!                           │            ├─→ CompileScheduler → Compiler
//!                           │            └─→ PreviewPublisher
//!                           └─→ MetadataCache (shared)
//! ```
//!
//! The backend itself stays thin: every document decision lives in the
//! controller, and the session is the only state the backend holds.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{error, info, warn};

use templated_sql_lsp_catalog::StaticCatalog;
use templated_sql_lsp_compiler::CliCompiler;
use templated_sql_lsp_semantic::NoopAnalyzer;
use templated_sql_lsp_template::JinjaScanner;

use crate::config::ServerConfig;
use crate::preview::ClientPublisher;
use crate::session::Session;

/// LSP backend implementation
///
/// Main entry point for all LSP protocol operations.
/// Uses tower-lsp framework for protocol handling.
pub struct LspBackend {
    /// LSP client for sending notifications and requests
    client: Client,

    /// Session context, built during `initialize`
    session: RwLock<Option<Arc<Session>>>,
}

impl LspBackend {
    /// Create a new LSP backend
    ///
    /// # Arguments
    ///
    /// - `client`: LSP client handle
    pub fn new(client: Client) -> Self {
        Self {
            client,
            session: RwLock::new(None),
        }
    }

    /// Get the session, if initialization has happened
    async fn session(&self) -> Option<Arc<Session>> {
        self.session.read().await.clone()
    }

    /// Build the session from decoded configuration
    fn build_session(&self, config: &ServerConfig) -> Arc<Session> {
        let project_dir = config
            .compiler
            .project_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut compiler = CliCompiler::new(config.compiler.command.clone(), project_dir);
        if let Some(dir) = &config.compiler.profiles_dir {
            compiler = compiler.with_profiles_dir(dir);
        }
        if let Some(path) = &config.compiler.target_path {
            compiler = compiler.with_target_path(path);
        }

        Session::new(
            config.scheduler_settings(),
            Arc::new(compiler),
            Arc::new(NoopAnalyzer),
            Arc::new(JinjaScanner::new()),
            Arc::new(StaticCatalog::new()),
            Arc::new(ClientPublisher::new(self.client.clone())),
        )
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for LspBackend {
    /// Initialize the LSP server
    ///
    /// Called when the client starts the server.
    /// Returns server capabilities and configuration.
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Initializing LSP server");
        info!("Client info: {:?}", params.client_info);

        let config = ServerConfig::from_initialization_options(params.initialization_options);
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Configuration rejected, using defaults: {}", e);
                ServerConfig::default()
            }
        };

        *self.session.write().await = Some(self.build_session(&config));

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                // Incremental sync plus save notifications: the save path
                // drives compiles for documents edited before initialization
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        will_save: Some(true),
                        will_save_wait_until: Some(false),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(false),
                        })),
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: crate::SERVER_NAME.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    /// Initialized notification
    ///
    /// Called after `initialize` completes successfully.
    async fn initialized(&self, _params: InitializedParams) {
        info!("LSP server initialized successfully");
        self.client
            .log_message(MessageType::INFO, "Templated SQL LSP server ready")
            .await;
    }

    /// Shutdown the LSP server
    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down LSP server");
        Ok(())
    }

    /// Document opened notification
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        info!(
            "Document opened: uri={}, language={}, version={}",
            doc.uri, doc.language_id, doc.version
        );

        let Some(session) = self.session().await else {
            warn!("didOpen before initialize, ignoring: {}", doc.uri);
            return;
        };

        session.open_document(doc.uri, &doc.text, doc.version).await;
    }

    /// Document changed notification
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let identifier = params.text_document;
        let Some(session) = self.session().await else {
            warn!("didChange before initialize, ignoring: {}", identifier.uri);
            return;
        };

        let Some(controller) = session.controller(&identifier.uri).await else {
            warn!("Document not found for change: {}", identifier.uri);
            return;
        };

        if let Err(e) = controller
            .did_change(identifier.version, &params.content_changes)
            .await
        {
            // Contract violation: reject the operation loudly instead of
            // silently desynchronizing the buffers
            error!("Rejected change for {}: {}", identifier.uri, e);
            self.client
                .show_message(
                    MessageType::ERROR,
                    format!("Rejected text change for {}: {}", identifier.uri, e),
                )
                .await;
        }
    }

    /// Document will-save notification
    async fn will_save(&self, params: WillSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(session) = self.session().await else {
            return;
        };

        if let Some(controller) = session.controller(&uri).await {
            controller.will_save(params.reason).await;
        }
    }

    /// Document saved notification
    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(session) = self.session().await else {
            return;
        };

        if let Some(controller) = session.controller(&uri).await {
            controller.did_save().await;
        } else {
            warn!("Document not found for save: {}", uri);
        }
    }

    /// Document closed notification
    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(session) = self.session().await else {
            return;
        };

        if !session.close_document(&uri).await {
            warn!("Document not found for close: {}", uri);
        }
    }
}

/// LSP backend errors
///
/// Errors that can occur during LSP operations.
#[derive(Debug, thiserror::Error)]
pub enum LspError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Document error
    #[error("Document error: {0}")]
    Document(#[from] crate::document::DocumentError),

    /// Compiler error
    #[error("Compiler error: {0}")]
    Compiler(#[from] templated_sql_lsp_compiler::CompilerError),

    /// Generic error
    #[error("LSP error: {0}")]
    Generic(String),
}
