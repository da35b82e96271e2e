// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Shared helpers for controller integration tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tower_lsp::lsp_types::{
    Diagnostic, Position, Range, TextDocumentContentChangeEvent, Url,
};

use templated_sql_lsp_catalog::StaticCatalog;
use templated_sql_lsp_lsp::preview::PreviewPublisher;
use templated_sql_lsp_lsp::scheduler::SchedulerSettings;
use templated_sql_lsp_lsp::session::Session;
use templated_sql_lsp_template::JinjaScanner;
use templated_sql_lsp_test_utils::{MockAnalyzer, MockCompiler};

/// One recorded outbound notification
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Preview { uri: Url, text: String },
    PreviewDiagnostics { uri: Url, count: usize },
    RawDiagnostics { uri: Url, diagnostics: Vec<Diagnostic> },
    CompileStarted { uri: Url },
    AllFinished,
}

/// Publisher that records every notification instead of speaking LSP
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<Published>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Published> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_preview(&self, uri: &Url) -> Option<String> {
        self.events()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                Published::Preview { uri: u, text } if &u == uri => Some(text),
                _ => None,
            })
    }

    pub fn last_raw_diagnostics(&self, uri: &Url) -> Option<Vec<Diagnostic>> {
        self.events()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                Published::RawDiagnostics {
                    uri: u,
                    diagnostics,
                } if &u == uri => Some(diagnostics),
                _ => None,
            })
    }
}

#[async_trait::async_trait]
impl PreviewPublisher for RecordingPublisher {
    async fn update_preview(&self, uri: &Url, preview_text: &str) {
        self.events.lock().unwrap().push(Published::Preview {
            uri: uri.clone(),
            text: preview_text.to_string(),
        });
    }

    async fn update_preview_diagnostics(&self, uri: &Url, diagnostics: Vec<Diagnostic>) {
        self.events
            .lock()
            .unwrap()
            .push(Published::PreviewDiagnostics {
                uri: uri.clone(),
                count: diagnostics.len(),
            });
    }

    async fn publish_raw_diagnostics(
        &self,
        uri: &Url,
        diagnostics: Vec<Diagnostic>,
        _version: Option<i32>,
    ) {
        self.events.lock().unwrap().push(Published::RawDiagnostics {
            uri: uri.clone(),
            diagnostics,
        });
    }

    async fn compilation_started(&self, uri: &Url) {
        self.events
            .lock()
            .unwrap()
            .push(Published::CompileStarted { uri: uri.clone() });
    }

    async fn all_compilations_finished(&self) {
        self.events.lock().unwrap().push(Published::AllFinished);
    }
}

/// Session wired to mocks, ready for controller tests
pub struct Harness {
    pub session: Arc<Session>,
    pub compiler: Arc<MockCompiler>,
    pub analyzer: Arc<MockAnalyzer>,
    pub publisher: Arc<RecordingPublisher>,
}

pub fn harness() -> Harness {
    let compiler = Arc::new(MockCompiler::new());
    let analyzer = Arc::new(MockAnalyzer::new());
    let publisher = Arc::new(RecordingPublisher::new());

    let session = Session::new(
        SchedulerSettings {
            debounce: Duration::from_millis(300),
            compile_timeout: Duration::from_secs(10),
        },
        compiler.clone(),
        analyzer.clone(),
        Arc::new(JinjaScanner::new()),
        Arc::new(StaticCatalog::new()),
        publisher.clone(),
    );

    Harness {
        session,
        compiler,
        analyzer,
        publisher,
    }
}

pub fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///models/{name}.sql")).unwrap()
}

pub fn incremental(
    start: (u32, u32),
    end: (u32, u32),
    text: &str,
) -> TextDocumentContentChangeEvent {
    TextDocumentContentChangeEvent {
        range: Some(Range {
            start: Position::new(start.0, start.1),
            end: Position::new(end.0, end.1),
        }),
        range_length: None,
        text: text.to_string(),
    }
}

/// Poll until a condition holds; paused tokio time auto-advances the clock
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
