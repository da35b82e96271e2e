// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Template scanner trait
//!
//! This module defines the scanner abstraction used to locate template
//! constructs inside templated SQL text.

use lsp_types::{Position, Range};

/// Kind of template construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Substitution expression, e.g. `{{ ref('orders') }}`
    Expression,

    /// Control statement, e.g. `{% if target.name == 'prod' %}`
    Statement,

    /// Template comment, e.g. `{# disabled #}`
    Comment,
}

/// A template-construct range within a document
///
/// The range spans the construct including its delimiters, in line/character
/// coordinates of the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRange {
    /// Range of the construct, delimiters included
    pub range: Range,

    /// Kind of construct
    pub kind: TemplateKind,
}

impl TemplateRange {
    /// Create a new template range
    pub fn new(start: Position, end: Position, kind: TemplateKind) -> Self {
        Self {
            range: Range { start, end },
            kind,
        }
    }
}

/// Scanner abstraction for locating template constructs
///
/// Implementations scan raw document text and report every construct range.
/// A scan failure (malformed template syntax the scanner cannot recover from)
/// is reported as `None` so callers can fall back to conservative behavior.
pub trait TemplateScanner: Send + Sync {
    /// Find all template-construct ranges in the text
    ///
    /// # Returns
    ///
    /// - `Some(ranges)`: every construct found, in document order
    /// - `None`: the text could not be scanned (e.g. an unterminated construct)
    fn find_template_ranges(&self, text: &str) -> Option<Vec<TemplateRange>>;

    /// Check whether the text contains any template delimiter at all
    ///
    /// Used for inserted text fragments, which are usually incomplete and
    /// would fail a full scan.
    fn has_template_markers(&self, text: &str) -> bool;
}
