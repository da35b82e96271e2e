// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Coordinate Transducer
//!
//! This module translates positions between the two coordinate spaces of a
//! document pair: the raw templated text and the compiled plain-SQL text.
//!
//! ## Overview
//!
//! The two texts are related by template expansion, not independent editing,
//! so a conventional source map does not exist. Instead the translation is
//! computed on demand from a two-pass diff:
//!
//! 1. A line-level diff locates the corresponding line. A line inside an
//!    equal block maps exactly. A line inside an insert-only block has no
//!    counterpart (generated output) and maps to the nearest preceding
//!    unchanged line at character 0. A line inside a replace block maps to
//!    the offset-clamped line of the block's other side.
//! 2. A character-level diff restricted to the two matched lines maps the
//!    character the same way.
//!
//! ## Contract
//!
//! Translation is pure, deterministic, and total: out-of-bounds positions
//! clamp to the furthest known position instead of failing, identical texts
//! translate by identity, and an empty text on either side yields `(0, 0)`.

use imara_diff::{Algorithm, Diff, Hunk, InternedInput};
use tower_lsp::lsp_types::Position;

/// Diff algorithm for the line-level pass
const LINE_ALGORITHM: Algorithm = Algorithm::Histogram;

/// Diff algorithm for the character-level pass
///
/// The histogram heuristic degrades on characters because the same tokens
/// reoccur constantly; Myers behaves better there.
const CHAR_ALGORITHM: Algorithm = Algorithm::Myers;

/// Translate a position in `text_b` to the corresponding position in `text_a`
///
/// `text_b` must be derived from `text_a` (or vice versa) by template
/// expansion or contraction; the direction of derivation does not matter.
///
/// # Arguments
///
/// - `position`: Position in `text_b` (line/character, 0-indexed)
/// - `text_a`: The text to translate into
/// - `text_b`: The text the position refers to
pub fn translate(position: Position, text_a: &str, text_b: &str) -> Position {
    if text_a.is_empty() || text_b.is_empty() {
        return Position::new(0, 0);
    }
    if text_a == text_b {
        return clamp_to_text(position, text_a);
    }

    let input = InternedInput::new(text_a, text_b);
    let mut diff = Diff::default();
    diff.compute_with(
        LINE_ALGORITHM,
        &input.before,
        &input.after,
        input.interner.num_tokens(),
    );

    let len_a = line_count(text_a);
    let len_b = line_count(text_b);
    let line_b = position.line.min(len_b - 1);

    match match_line(line_b, diff.hunks(), len_a) {
        LineMatch::Inserted(line_a) => Position::new(line_a, 0),
        LineMatch::Matched(line_a) => {
            let line_a_text = line_at(text_a, line_a);
            let line_b_text = line_at(text_b, line_b);
            let character = match_character(position.character, line_a_text, line_b_text);
            Position::new(line_a, character)
        }
    }
}

/// Outcome of the line-level pass
enum LineMatch {
    /// The line has a counterpart; run the character-level pass on the pair
    Matched(u32),

    /// The line only exists in `text_b`; character is pinned to 0
    Inserted(u32),
}

/// Walk line hunks to find the counterpart of `line_b`
///
/// Hunk ranges are `before` (in A) and `after` (in B), in ascending order.
/// Lines between hunks are equal and shift by the accumulated line delta.
fn match_line(line_b: u32, hunks: impl Iterator<Item = Hunk>, len_a: u32) -> LineMatch {
    let mut delta: i64 = 0;
    for hunk in hunks {
        if line_b < hunk.after.start {
            break;
        }
        if line_b < hunk.after.end {
            if hunk.before.is_empty() {
                // Generated content: nearest preceding unchanged line in A
                return LineMatch::Inserted(hunk.before.start.saturating_sub(1));
            }
            let offset = line_b - hunk.after.start;
            let line_a = (hunk.before.start + offset).min(hunk.before.end - 1);
            return LineMatch::Matched(line_a);
        }
        delta = i64::from(hunk.before.end) - i64::from(hunk.after.end);
    }
    let line_a = (i64::from(line_b) + delta).max(0) as u32;
    LineMatch::Matched(line_a.min(len_a - 1))
}

/// Walk character hunks within the matched line pair
fn match_character(character_b: u32, line_a: &str, line_b: &str) -> u32 {
    let len_a = line_a.chars().count() as u32;
    let len_b = line_b.chars().count() as u32;
    let character_b = character_b.min(len_b);

    if line_a == line_b {
        return character_b;
    }
    if len_a == 0 || len_b == 0 {
        return 0;
    }

    let mut input = InternedInput::default();
    input.update_before(line_a.chars());
    input.update_after(line_b.chars());
    let mut diff = Diff::default();
    diff.compute_with(
        CHAR_ALGORITHM,
        &input.before,
        &input.after,
        input.interner.num_tokens(),
    );

    let mut delta: i64 = 0;
    for hunk in diff.hunks() {
        if character_b < hunk.after.start {
            break;
        }
        if character_b < hunk.after.end {
            let character_a = if hunk.before.is_empty() {
                hunk.before.start
            } else {
                (hunk.before.start + (character_b - hunk.after.start)).min(hunk.before.end)
            };
            return character_a.min(len_a);
        }
        delta = i64::from(hunk.before.end) - i64::from(hunk.after.end);
    }
    ((i64::from(character_b) + delta).max(0) as u32).min(len_a)
}

/// Clamp a position to the bounds of a text
fn clamp_to_text(position: Position, text: &str) -> Position {
    let line = position.line.min(line_count(text) - 1);
    let character = position
        .character
        .min(line_at(text, line).chars().count() as u32);
    Position::new(line, character)
}

/// Number of lines, counting a line after a trailing newline
///
/// Matches the LSP view of a document, where `"a\n"` has a second, empty
/// line that a position can refer to.
fn line_count(text: &str) -> u32 {
    text.split('\n').count() as u32
}

/// Line content without its line ending
fn line_at(text: &str, line: u32) -> &str {
    text.split('\n')
        .nth(line as usize)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or("")
}
