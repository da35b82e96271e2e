// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Jinja delimiter scanner
//!
//! Bundled [`TemplateScanner`] implementation for Jinja-style templated SQL.
//!
//! The scanner recognizes the three Jinja construct kinds by their delimiters
//! and tracks line/character positions while walking the text. It does not
//! parse the template language itself; construct contents are opaque to it.

use lsp_types::Position;
use tracing::debug;

use crate::scanner::{TemplateKind, TemplateRange, TemplateScanner};

/// Opening and closing delimiters for each construct kind
const DELIMITERS: [(&str, &str, TemplateKind); 3] = [
    ("{{", "}}", TemplateKind::Expression),
    ("{%", "%}", TemplateKind::Statement),
    ("{#", "#}", TemplateKind::Comment),
];

/// All delimiter tokens, opening and closing
const MARKERS: [&str; 6] = ["{{", "}}", "{%", "%}", "{#", "#}"];

/// Scanner for Jinja-style template delimiters
#[derive(Debug, Clone, Copy, Default)]
pub struct JinjaScanner;

impl JinjaScanner {
    /// Create a new scanner
    pub fn new() -> Self {
        Self
    }
}

/// Cursor over text that tracks line/character coordinates
struct Cursor<'a> {
    rest: &'a str,
    line: u32,
    character: u32,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            rest: text,
            line: 0,
            character: 0,
        }
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            character: self.character,
        }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn starts_with(&self, token: &str) -> bool {
        self.rest.starts_with(token)
    }

    /// Advance past the next character, updating coordinates
    fn bump(&mut self) {
        let Some(c) = self.rest.chars().next() else {
            return;
        };
        self.rest = &self.rest[c.len_utf8()..];
        if c == '\n' {
            self.line += 1;
            self.character = 0;
        } else {
            self.character += 1;
        }
    }

    /// Advance past a delimiter token (delimiters never contain newlines)
    fn bump_token(&mut self, token: &str) {
        self.rest = &self.rest[token.len()..];
        self.character += token.len() as u32;
    }
}

impl TemplateScanner for JinjaScanner {
    fn find_template_ranges(&self, text: &str) -> Option<Vec<TemplateRange>> {
        let mut ranges = Vec::new();
        let mut cursor = Cursor::new(text);

        'outer: while !cursor.is_empty() {
            for (open, close, kind) in DELIMITERS {
                if !cursor.starts_with(open) {
                    continue;
                }
                let start = cursor.position();
                cursor.bump_token(open);

                // Walk to the matching closer. Constructs do not nest with
                // the same delimiters in Jinja, so the first closer wins.
                while !cursor.is_empty() && !cursor.starts_with(close) {
                    cursor.bump();
                }
                if cursor.is_empty() {
                    debug!(
                        "unterminated template construct at line {}, col {}",
                        start.line, start.character
                    );
                    return None;
                }
                cursor.bump_token(close);
                ranges.push(TemplateRange::new(start, cursor.position(), kind));
                continue 'outer;
            }
            cursor.bump();
        }

        Some(ranges)
    }

    fn has_template_markers(&self, text: &str) -> bool {
        MARKERS.iter().any(|m| text.contains(m))
    }
}
