// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock analyzer with scripted findings

use std::sync::Mutex;

use async_trait::async_trait;
use templated_sql_lsp_semantic::{Analysis, AnalyzeError, AnalyzeResult, Analyzer, AnalyzerDiagnostic};

/// Analyzer test double
///
/// By default every text analyzes cleanly. Tests can script findings for the
/// next analysis or a hard failure. Analyzed texts are recorded.
#[derive(Debug, Default)]
pub struct MockAnalyzer {
    diagnostics: Mutex<Vec<AnalyzerDiagnostic>>,
    failure: Mutex<Option<String>>,
    analyzed: Mutex<Vec<String>>,
}

impl MockAnalyzer {
    /// Create a new mock analyzer
    pub fn new() -> Self {
        Self::default()
    }

    /// Script findings returned by every subsequent analysis
    pub fn report(&self, diagnostics: Vec<AnalyzerDiagnostic>) {
        *self.diagnostics.lock().unwrap() = diagnostics;
    }

    /// Script a hard analysis failure
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Texts analyzed so far, in call order
    pub fn analyzed_texts(&self) -> Vec<String> {
        self.analyzed.lock().unwrap().clone()
    }

    /// Number of analyze calls so far
    pub fn analyze_count(&self) -> usize {
        self.analyzed.lock().unwrap().len()
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(&self, compiled_sql: &str) -> AnalyzeResult<Analysis> {
        self.analyzed.lock().unwrap().push(compiled_sql.to_string());

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(AnalyzeError::Failed(message));
        }

        Ok(Analysis {
            diagnostics: self.diagnostics.lock().unwrap().clone(),
        })
    }
}
