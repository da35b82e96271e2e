// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Preview and Diagnostics Publishing
//!
//! This module defines the outbound notification surface of the server.
//!
//! ## Overview
//!
//! The publisher handles:
//! - `custom/updateQueryPreview`: the compiled SQL rendered in the read-only
//!   preview panel
//! - `custom/updateQueryPreviewDiagnostics`: diagnostics in compiled-text
//!   coordinates, shown on the preview
//! - `textDocument/publishDiagnostics`: diagnostics in raw-text coordinates,
//!   shown on the source file
//! - Compile progress begin/end signals
//!
//! The controller talks to the [`PreviewPublisher`] trait so tests can record
//! notifications instead of speaking the protocol. Ordering matters for a
//! human watching the preview: the preview text updates before diagnostics.

use serde::{Deserialize, Serialize};
use tower_lsp::Client;
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::{Diagnostic, MessageType, Url};
use tracing::debug;

/// Parameters of `custom/updateQueryPreview`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQueryPreviewParams {
    /// Raw document the preview belongs to
    pub uri: Url,

    /// Full compiled SQL text
    pub preview_text: String,
}

/// Notification pushing new compiled SQL to the preview panel
#[derive(Debug)]
pub enum UpdateQueryPreview {}

impl Notification for UpdateQueryPreview {
    type Params = UpdateQueryPreviewParams;
    const METHOD: &'static str = "custom/updateQueryPreview";
}

/// Parameters of `custom/updateQueryPreviewDiagnostics`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQueryPreviewDiagnosticsParams {
    /// Raw document the preview belongs to
    pub uri: Url,

    /// Diagnostics in compiled-text coordinates
    pub diagnostics: Vec<Diagnostic>,
}

/// Notification pushing compiled-space diagnostics to the preview panel
#[derive(Debug)]
pub enum UpdateQueryPreviewDiagnostics {}

impl Notification for UpdateQueryPreviewDiagnostics {
    type Params = UpdateQueryPreviewDiagnosticsParams;
    const METHOD: &'static str = "custom/updateQueryPreviewDiagnostics";
}

/// Outbound notification seam used by the document controller
#[async_trait::async_trait]
pub trait PreviewPublisher: Send + Sync {
    /// Push new compiled SQL to the preview
    async fn update_preview(&self, uri: &Url, preview_text: &str);

    /// Push compiled-space diagnostics to the preview
    async fn update_preview_diagnostics(&self, uri: &Url, diagnostics: Vec<Diagnostic>);

    /// Publish raw-space diagnostics on the source document
    async fn publish_raw_diagnostics(
        &self,
        uri: &Url,
        diagnostics: Vec<Diagnostic>,
        version: Option<i32>,
    );

    /// A compile started for a document
    async fn compilation_started(&self, uri: &Url);

    /// The last in-flight compile across all documents finished
    async fn all_compilations_finished(&self);
}

/// Publisher speaking the protocol through the tower-lsp client
pub struct ClientPublisher {
    client: Client,
}

impl ClientPublisher {
    /// Create a publisher over a client handle
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl PreviewPublisher for ClientPublisher {
    async fn update_preview(&self, uri: &Url, preview_text: &str) {
        debug!("Updating preview: uri={}", uri);
        self.client
            .send_notification::<UpdateQueryPreview>(UpdateQueryPreviewParams {
                uri: uri.clone(),
                preview_text: preview_text.to_string(),
            })
            .await;
    }

    async fn update_preview_diagnostics(&self, uri: &Url, diagnostics: Vec<Diagnostic>) {
        self.client
            .send_notification::<UpdateQueryPreviewDiagnostics>(
                UpdateQueryPreviewDiagnosticsParams {
                    uri: uri.clone(),
                    diagnostics,
                },
            )
            .await;
    }

    async fn publish_raw_diagnostics(
        &self,
        uri: &Url,
        diagnostics: Vec<Diagnostic>,
        version: Option<i32>,
    ) {
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, version)
            .await;
    }

    async fn compilation_started(&self, uri: &Url) {
        self.client
            .log_message(MessageType::INFO, format!("Compiling {uri}"))
            .await;
    }

    async fn all_compilations_finished(&self) {
        self.client
            .log_message(MessageType::INFO, "All compilations finished")
            .await;
    }
}
