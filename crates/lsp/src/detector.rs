// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Template Change Detector
//!
//! This module decides whether a batch of edits requires a templating-aware
//! recompilation or can be mirrored into the compiled buffer as plain SQL.
//!
//! ## Overview
//!
//! The detector is stateless per call and conservative: whenever it cannot
//! prove that an edit is plain SQL outside every template construct, it
//! requests a recompile. The cheap fast path is only taken when all of the
//! following hold:
//!
//! - No compile is in flight for the document (an edit arriving during
//!   compilation invalidates the in-flight result's freshness)
//! - No inserted text carries template markers
//! - The current raw text scans successfully
//! - No edit range overlaps an existing template-construct range

use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent};
use tracing::debug;

use templated_sql_lsp_template::TemplateScanner;

/// Detector over a template scanner
#[derive(Clone)]
pub struct ChangeDetector {
    scanner: Arc<dyn TemplateScanner>,
}

impl ChangeDetector {
    /// Create a new detector
    pub fn new(scanner: Arc<dyn TemplateScanner>) -> Self {
        Self { scanner }
    }

    /// Whether the text carries any template delimiter
    pub fn has_template_markers(&self, text: &str) -> bool {
        self.scanner.has_template_markers(text)
    }

    /// Decide whether the edits require recompilation
    ///
    /// # Arguments
    ///
    /// - `raw_text`: The raw text *before* the edits are applied; edit
    ///   ranges refer to this text
    /// - `compile_in_flight`: Whether a compile for this document is running
    /// - `changes`: The LSP content changes, in application order
    pub fn needs_recompile(
        &self,
        raw_text: &str,
        compile_in_flight: bool,
        changes: &[TextDocumentContentChangeEvent],
    ) -> bool {
        if compile_in_flight {
            debug!("compile in flight, edit marks document dirty");
            return true;
        }

        if changes
            .iter()
            .any(|change| self.scanner.has_template_markers(&change.text))
        {
            debug!("inserted text contains template syntax");
            return true;
        }

        let Some(ranges) = self.scanner.find_template_ranges(raw_text) else {
            // Scan failure: conservatively assume template structure changed
            debug!("template scan failed, assuming recompile is needed");
            return true;
        };

        if ranges.is_empty() {
            return false;
        }

        changes.iter().any(|change| match change.range {
            // A full-document replacement rewrites every construct
            None => true,
            Some(edit) => ranges
                .iter()
                .any(|template| ranges_touch(&edit, &template.range)),
        })
    }
}

/// Whether two ranges overlap or touch
///
/// Touching counts: an edit at a construct's boundary may extend or break
/// the construct, so it is treated as altering it.
fn ranges_touch(a: &Range, b: &Range) -> bool {
    position_le(&a.start, &b.end) && position_le(&b.start, &a.end)
}

fn position_le(a: &Position, b: &Position) -> bool {
    (a.line, a.character) <= (b.line, b.character)
}
