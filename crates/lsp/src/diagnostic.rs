// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Diagnostics Infrastructure
//!
//! This module builds the diagnostics published for a document pair.
//!
//! ## Overview
//!
//! The diagnostics system handles:
//! - Conversion of analyzer findings into LSP diagnostic format
//! - Locating compile errors from the compiler's raw error text
//! - Translation of compiled-space diagnostics into raw-space ones
//!
//! Diagnostics are always produced in compiled-text coordinates first; the
//! raw-space variant is derived with the coordinate transducer so both the
//! source file and the read-only preview carry exact positions.

use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, Location, NumberOrString,
    Position, Range, Url,
};

use templated_sql_lsp_semantic::{AnalyzerDiagnostic, AnalyzerSeverity};

use crate::position::translate;

/// Source tag attached to every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "templated-sql-lsp";

/// Diagnostic code identifying the type of diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// The external compiler rejected the template or SQL
    CompileError,

    /// The semantic analyzer reported a finding on the compiled SQL
    AnalysisFinding,

    /// The analyzer could not resolve the compiled SQL at all
    AnalysisFailure,
}

impl DiagnosticCode {
    /// Get the string representation of this diagnostic code
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::CompileError => "COMPILE-001",
            DiagnosticCode::AnalysisFinding => "ANALYSIS-001",
            DiagnosticCode::AnalysisFailure => "ANALYSIS-002",
        }
    }
}

impl From<DiagnosticCode> for NumberOrString {
    fn from(code: DiagnosticCode) -> Self {
        NumberOrString::String(code.as_str().to_string())
    }
}

/// Build an LSP diagnostic with this server's source tag
pub fn make_diagnostic(
    range: Range,
    message: String,
    severity: DiagnosticSeverity,
    code: DiagnosticCode,
) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(severity),
        code: Some(code.into()),
        code_description: None,
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message,
        related_information: None,
        tags: None,
        data: None,
    }
}

/// Convert an analyzer finding into a compiled-space LSP diagnostic
pub fn from_analyzer(uri: &Url, finding: &AnalyzerDiagnostic) -> Diagnostic {
    let severity = match finding.severity {
        AnalyzerSeverity::Error => DiagnosticSeverity::ERROR,
        AnalyzerSeverity::Warning => DiagnosticSeverity::WARNING,
        AnalyzerSeverity::Information => DiagnosticSeverity::INFORMATION,
    };

    let mut diagnostic = make_diagnostic(
        finding.range,
        finding.message.clone(),
        severity,
        DiagnosticCode::AnalysisFinding,
    );

    if !finding.related.is_empty() {
        diagnostic.related_information = Some(
            finding
                .related
                .iter()
                .map(|info| DiagnosticRelatedInformation {
                    location: Location {
                        uri: uri.clone(),
                        range: info.range,
                    },
                    message: info.message.clone(),
                })
                .collect(),
        );
    }

    diagnostic
}

/// Translate a compiled-space diagnostic into raw-space coordinates
///
/// Related-information locations translate as well; they point at the raw
/// document once the diagnostic is published there.
pub fn to_raw_space(diagnostic: &Diagnostic, raw_text: &str, compiled_text: &str) -> Diagnostic {
    let mut translated = diagnostic.clone();
    translated.range = translate_range(&diagnostic.range, raw_text, compiled_text);
    if let Some(related) = &mut translated.related_information {
        for info in related {
            info.location.range = translate_range(&info.location.range, raw_text, compiled_text);
        }
    }
    translated
}

fn translate_range(range: &Range, raw_text: &str, compiled_text: &str) -> Range {
    Range {
        start: translate(range.start, raw_text, compiled_text),
        end: translate(range.end, raw_text, compiled_text),
    }
}

/// Build the single diagnostic for a failed compile
///
/// The compiler reports errors as free text; the location is recovered by
/// scanning for a `line N` reference and spanning that whole line of the raw
/// document. Without a location the diagnostic lands on the first line.
pub fn compile_error_diagnostic(raw_error_text: &str, raw_text: &str) -> Diagnostic {
    let line_count = raw_text.split('\n').count() as u32;
    let line = find_line_reference(raw_error_text)
        .map(|line| line.saturating_sub(1))
        .unwrap_or(0)
        .min(line_count.saturating_sub(1));

    let line_length = raw_text
        .split('\n')
        .nth(line as usize)
        .map(|l| l.chars().count() as u32)
        .unwrap_or(0);

    make_diagnostic(
        Range {
            start: Position::new(line, 0),
            end: Position::new(line, line_length),
        },
        raw_error_text.trim().to_string(),
        DiagnosticSeverity::ERROR,
        DiagnosticCode::CompileError,
    )
}

/// Find the first `line N` reference in error text (1-based)
fn find_line_reference(text: &str) -> Option<u32> {
    let lower = text.to_ascii_lowercase();
    let bytes = lower.as_bytes();

    let mut search_from = 0;
    while let Some(found) = lower[search_from..].find("line") {
        let after = search_from + found + "line".len();
        search_from = after;

        // Accept "line 12" and "line:12", skipping whitespace and one colon
        let mut idx = after;
        while idx < bytes.len() && (bytes[idx] == b' ' || bytes[idx] == b':') {
            idx += 1;
        }
        let digits_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx > digits_start {
            if let Ok(number) = lower[digits_start..idx].parse::<u32>() {
                if number > 0 {
                    return Some(number);
                }
            }
        }
    }
    None
}
