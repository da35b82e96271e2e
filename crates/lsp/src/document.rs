// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Document Pair Management
//!
//! This module provides the in-memory representation of one synchronized
//! source file: the raw templated text the user edits and the compiled
//! plain-SQL text derived from it.
//!
//! ## Overview
//!
//! The document pair handles:
//! - The raw buffer, mutated by every editor edit in arrival order
//! - The compiled buffer, mutated by translated fast-path patches or by
//!   wholesale replacement with compiler output
//! - The synchronization state machine and per-document flags
//! - Both diagnostics lists (raw-space and compiled-space)
//!
//! Buffers use Ropey for efficient incremental edits. A pair is created when
//! a file opens, lives only in memory, and is dropped when the file closes.
//!
//! ## Contract
//!
//! Editor edits must arrive with strictly increasing versions, and fast-path
//! edits must be true incremental diffs. Violations are rejected loudly with
//! [`DocumentError`]; a best-effort repair would silently desynchronize the
//! two buffers.

use ropey::Rope;
use tower_lsp::lsp_types::{Diagnostic, Position, Range, TextDocumentContentChangeEvent};

use crate::position::translate;

/// Synchronization state of a document pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Raw and compiled are up to date and consistent
    Clean,

    /// A non-template edit was mirrored into the compiled buffer; no compile
    /// is needed, but the compiled text is a patch, not compiler output
    DirtyFastPatch,

    /// A template-relevant edit arrived; a debounced compile is pending
    DirtyPendingCompile,

    /// A compile is in flight
    Compiling,

    /// The last compile failed; cleared by a later success or by the
    /// cross-document error-fixed signal
    CompileError,
}

/// The two synchronized text buffers of one source file
#[derive(Debug, Clone)]
pub struct DocumentPair {
    /// Raw templated text, mutated directly by editor edits
    raw: Rope,

    /// Editor-supplied version of the raw text, strictly increasing
    raw_version: i32,

    /// Compiled plain-SQL text
    compiled: Rope,

    /// Current synchronization state
    pub sync_state: SyncState,

    /// An edit requires recompilation but could not be submitted yet
    pub compile_required_on_save: bool,

    /// The last compile reported an error that has not been resolved
    pub unresolved_compile_error: bool,

    /// A compile has been requested at least once for this document
    pub compile_requested: bool,

    /// A willSave has been observed for this document
    pub first_save_seen: bool,

    /// Diagnostics in raw-text coordinates (published on the source file)
    pub raw_diagnostics: Vec<Diagnostic>,

    /// Diagnostics in compiled-text coordinates (published on the preview)
    pub compiled_diagnostics: Vec<Diagnostic>,
}

impl DocumentPair {
    /// Create a pair from freshly opened text
    ///
    /// Both buffers start as the opened text; the compiled buffer diverges
    /// once the first compile completes.
    pub fn new(text: &str, version: i32) -> Self {
        Self {
            raw: Rope::from_str(text),
            raw_version: version,
            compiled: Rope::from_str(text),
            sync_state: SyncState::Clean,
            compile_required_on_save: false,
            unresolved_compile_error: false,
            compile_requested: false,
            first_save_seen: false,
            raw_diagnostics: Vec::new(),
            compiled_diagnostics: Vec::new(),
        }
    }

    /// Current raw text
    pub fn raw_text(&self) -> String {
        self.raw.to_string()
    }

    /// Current compiled text
    pub fn compiled_text(&self) -> String {
        self.compiled.to_string()
    }

    /// Current raw version
    pub fn raw_version(&self) -> i32 {
        self.raw_version
    }

    /// Apply editor edits to the raw buffer only
    ///
    /// Used when the edits require recompilation: the compiled buffer stays
    /// untouched until the compiler result arrives.
    pub fn apply_raw_changes(
        &mut self,
        changes: &[TextDocumentContentChangeEvent],
        new_version: i32,
    ) -> Result<(), DocumentError> {
        self.check_version(new_version)?;

        for change in changes {
            match change.range {
                Some(range) => apply_change(&mut self.raw, range, &change.text)?,
                None => self.raw = Rope::from_str(&change.text),
            }
        }

        self.raw_version = new_version;
        Ok(())
    }

    /// Apply editor edits to both buffers via coordinate translation
    ///
    /// Each edit range is translated into compiled-buffer coordinates before
    /// the raw buffer changes, then the same inserted text is applied to both
    /// buffers.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::UnexpectedFullReplacement` when a change has
    /// no range: the fast path requires true incremental diffs.
    pub fn apply_fast_patch(
        &mut self,
        changes: &[TextDocumentContentChangeEvent],
        new_version: i32,
    ) -> Result<(), DocumentError> {
        self.check_version(new_version)?;
        let mut ranges = Vec::with_capacity(changes.len());
        for change in changes {
            ranges.push(
                change
                    .range
                    .ok_or(DocumentError::UnexpectedFullReplacement)?,
            );
        }

        for (change, range) in changes.iter().zip(ranges) {
            // Translate against the texts the range refers to, before the
            // raw buffer changes underneath it
            let raw_snapshot = self.raw.to_string();
            let compiled_snapshot = self.compiled.to_string();
            let start = translate(range.start, &compiled_snapshot, &raw_snapshot);
            let end = translate(range.end, &compiled_snapshot, &raw_snapshot);

            apply_change(&mut self.raw, range, &change.text)?;
            apply_clamped_change(&mut self.compiled, Range { start, end }, &change.text);
        }

        self.raw_version = new_version;
        Ok(())
    }

    /// Replace the compiled buffer wholesale with compiler output
    pub fn replace_compiled(&mut self, compiled_sql: &str) {
        self.compiled = Rope::from_str(compiled_sql);
    }

    fn check_version(&self, new_version: i32) -> Result<(), DocumentError> {
        if new_version <= self.raw_version {
            return Err(DocumentError::NonMonotonicVersion {
                current: self.raw_version,
                received: new_version,
            });
        }
        Ok(())
    }
}

/// Apply one incremental change to a rope, validating the range
fn apply_change(rope: &mut Rope, range: Range, text: &str) -> Result<(), DocumentError> {
    let start_line = range.start.line as usize;
    let start_col = range.start.character as usize;
    let end_line = range.end.line as usize;
    let end_col = range.end.character as usize;

    if start_line >= rope.len_lines() || end_line >= rope.len_lines() {
        return Err(DocumentError::InvalidRange {
            start: (start_line, start_col),
            end: (end_line, end_col),
        });
    }

    let start_char = rope.line_to_char(start_line) + start_col;
    let end_char = rope.line_to_char(end_line) + end_col;

    if start_char > end_char || end_char > rope.len_chars() {
        return Err(DocumentError::InvalidRange {
            start: (start_line, start_col),
            end: (end_line, end_col),
        });
    }

    rope.remove(start_char..end_char);
    rope.insert(start_char, text);
    Ok(())
}

/// Apply a translated change to a rope, clamping instead of failing
///
/// Translated positions are approximations; they must always land somewhere
/// sensible rather than be dropped.
fn apply_clamped_change(rope: &mut Rope, range: Range, text: &str) {
    let start_char = clamped_offset(rope, range.start);
    let end_char = clamped_offset(rope, range.end);
    let (start_char, end_char) = if start_char <= end_char {
        (start_char, end_char)
    } else {
        (end_char, start_char)
    };

    rope.remove(start_char..end_char);
    rope.insert(start_char, text);
}

/// Character offset of a position, clamped to the rope's bounds
fn clamped_offset(rope: &Rope, position: Position) -> usize {
    let line = (position.line as usize).min(rope.len_lines().saturating_sub(1));
    let line_start = rope.line_to_char(line);
    let line_end = if line + 1 < rope.len_lines() {
        // Exclude the newline separating this line from the next
        rope.line_to_char(line + 1).saturating_sub(1)
    } else {
        rope.len_chars()
    };
    (line_start + position.character as usize).min(line_end)
}

/// Document-related errors
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Edit version did not increase
    #[error("Non-monotonic document version: current={current}, received={received}")]
    NonMonotonicVersion { current: i32, received: i32 },

    /// Full-document replacement received where incremental edits were expected
    #[error("Full-document replacement received on the incremental fast path")]
    UnexpectedFullReplacement,

    /// Invalid range for text operation
    #[error("Invalid range: start={start:?}, end={end:?}")]
    InvalidRange {
        start: (usize, usize),
        end: (usize, usize),
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incremental(
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

    #[test]
    fn test_new_pair_mirrors_text() {
        let pair = DocumentPair::new("select 1", 1);
        assert_eq!(pair.raw_text(), "select 1");
        assert_eq!(pair.compiled_text(), "select 1");
        assert_eq!(pair.sync_state, SyncState::Clean);
    }

    #[test]
    fn test_raw_changes_leave_compiled_untouched() {
        let mut pair = DocumentPair::new("select 1", 1);
        pair.apply_raw_changes(&[incremental((0, 8), (0, 8), ", 2")], 2)
            .unwrap();

        assert_eq!(pair.raw_text(), "select 1, 2");
        assert_eq!(pair.compiled_text(), "select 1");
        assert_eq!(pair.raw_version(), 2);
    }

    #[test]
    fn test_fast_patch_mirrors_edit_into_compiled() {
        let mut pair = DocumentPair::new("select 1", 1);
        pair.apply_fast_patch(&[incremental((0, 8), (0, 8), ", 2")], 2)
            .unwrap();

        assert_eq!(pair.raw_text(), "select 1, 2");
        assert_eq!(pair.compiled_text(), "select 1, 2");
    }

    #[test]
    fn test_fast_patch_with_diverged_compiled_buffer() {
        let mut pair = DocumentPair::new("select id from {{ ref('t') }} where x = 1", 1);
        pair.replace_compiled("select id from `db`.`t` where x = 1");

        // Edit in the shared prefix, before the expanded reference
        pair.apply_fast_patch(&[incremental((0, 7), (0, 9), "total")], 2)
            .unwrap();

        assert_eq!(
            pair.raw_text(),
            "select total from {{ ref('t') }} where x = 1"
        );
        assert_eq!(pair.compiled_text(), "select total from `db`.`t` where x = 1");
    }

    #[test]
    fn test_fast_patch_rejects_full_replacement() {
        let mut pair = DocumentPair::new("select 1", 1);
        let full = TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "select 2".to_string(),
        };

        let result = pair.apply_fast_patch(&[full], 2);
        assert!(matches!(
            result,
            Err(DocumentError::UnexpectedFullReplacement)
        ));
        // Nothing was applied
        assert_eq!(pair.raw_text(), "select 1");
        assert_eq!(pair.raw_version(), 1);
    }

    #[test]
    fn test_non_monotonic_version_rejected() {
        let mut pair = DocumentPair::new("select 1", 5);
        let result = pair.apply_raw_changes(&[incremental((0, 0), (0, 0), "x")], 5);
        assert!(matches!(
            result,
            Err(DocumentError::NonMonotonicVersion {
                current: 5,
                received: 5
            })
        ));
    }

    #[test]
    fn test_full_replacement_allowed_on_raw_path() {
        let mut pair = DocumentPair::new("select 1", 1);
        let full = TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "select 2".to_string(),
        };
        pair.apply_raw_changes(&[full], 2).unwrap();
        assert_eq!(pair.raw_text(), "select 2");
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut pair = DocumentPair::new("select 1", 1);
        let result = pair.apply_raw_changes(&[incremental((5, 0), (5, 1), "x")], 2);
        assert!(matches!(result, Err(DocumentError::InvalidRange { .. })));
    }

    #[test]
    fn test_multiple_changes_apply_in_order() {
        let mut pair = DocumentPair::new("select a from t", 1);
        pair.apply_fast_patch(
            &[
                incremental((0, 7), (0, 8), "b"),
                incremental((0, 14), (0, 15), "u"),
            ],
            2,
        )
        .unwrap();

        assert_eq!(pair.raw_text(), "select b from u");
        assert_eq!(pair.compiled_text(), "select b from u");
    }
}
