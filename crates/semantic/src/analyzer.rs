// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Analyzer trait and analysis results
//!
//! The analyzer consumes compiled SQL and produces findings in compiled-text
//! coordinates. Translating them into raw-document coordinates is the
//! caller's job.

use lsp_types::Range;
use serde::{Deserialize, Serialize};

use crate::error::AnalyzeResult;

/// Severity of an analyzer finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalyzerSeverity {
    /// The compiled SQL cannot run as written
    Error,
    /// The compiled SQL is suspect but runnable
    Warning,
    /// Informational finding
    Information,
}

/// A location related to a finding (e.g. the other candidate of an
/// ambiguous column reference)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedInfo {
    /// Range in compiled-text coordinates
    pub range: Range,

    /// Explanation of the relation
    pub message: String,
}

/// One analyzer finding, in compiled-text coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerDiagnostic {
    /// Range of the finding in the compiled SQL
    pub range: Range,

    /// Finding message
    pub message: String,

    /// Severity
    pub severity: AnalyzerSeverity,

    /// Related locations, if any
    pub related: Vec<RelatedInfo>,
}

impl AnalyzerDiagnostic {
    /// Create an error finding
    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
            severity: AnalyzerSeverity::Error,
            related: Vec::new(),
        }
    }

    /// Create a warning finding
    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
            severity: AnalyzerSeverity::Warning,
            related: Vec::new(),
        }
    }

    /// Attach related locations
    pub fn with_related(mut self, related: Vec<RelatedInfo>) -> Self {
        self.related = related;
        self
    }
}

/// Result of analyzing one compiled SQL text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    /// Findings, in document order
    pub diagnostics: Vec<AnalyzerDiagnostic>,
}

/// Analyzer abstraction over compiled SQL
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze one compiled SQL text
    ///
    /// # Errors
    ///
    /// Returns `AnalyzeError::Failed` when the text cannot be resolved at
    /// all. Individual findings are part of the successful [`Analysis`].
    async fn analyze(&self, compiled_sql: &str) -> AnalyzeResult<Analysis>;
}

/// Analyzer that reports nothing
///
/// Used when no analyzer backend is configured; documents still compile and
/// preview, they just carry no semantic findings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalyzer;

#[async_trait::async_trait]
impl Analyzer for NoopAnalyzer {
    async fn analyze(&self, _compiled_sql: &str) -> AnalyzeResult<Analysis> {
        Ok(Analysis::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Position;

    #[tokio::test]
    async fn test_noop_analyzer_reports_nothing() {
        let analysis = NoopAnalyzer.analyze("select 1").await.unwrap();
        assert!(analysis.diagnostics.is_empty());
    }

    #[test]
    fn test_diagnostic_builders() {
        let range = Range::new(Position::new(1, 0), Position::new(1, 5));
        let diag = AnalyzerDiagnostic::error(range, "Unknown column 'idd'").with_related(vec![
            RelatedInfo {
                range,
                message: "Did you mean 'id'?".to_string(),
            },
        ]);

        assert_eq!(diag.severity, AnalyzerSeverity::Error);
        assert_eq!(diag.related.len(), 1);
    }
}
