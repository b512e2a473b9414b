//! Text normalization and tokenization shared by both ranking engines.
//!
//! Pasted error output arrives with arbitrary casing, terminal color codes,
//! and ragged whitespace. [`normalize`] reduces it to a canonical form that
//! every matcher signal and search pass agrees on, and [`tokenize`] splits
//! that form into comparable word tokens. Both engines must use these exact
//! functions so token semantics never drift between scoring and search.

use regex::Regex;
use std::sync::LazyLock;

/// Hard cap on input length, applied before any other processing. Bounds the
/// cost of every downstream regex scan against pathological inputs.
const MAX_INPUT_CHARS: usize = 20_000;

/// Tokens this short ("rm", "ls", "ok") carry no signal and are dropped.
const MIN_TOKEN_CHARS: usize = 3;

/// Terminal color sequences (`ESC [ <digits/semicolons> m`) commonly present
/// in copy-pasted CLI output.
static ANSI_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("ANSI pattern is valid"));

/// Reduces arbitrary input text to canonical form: truncated to 20,000
/// characters, lowercased, ANSI color codes stripped, whitespace runs
/// collapsed to single spaces, and trimmed.
///
/// Total and pure; empty or whitespace-only input yields an empty string.
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let truncated = match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    };

    let lowered = truncated.to_lowercase();
    let stripped = ANSI_COLOR.replace_all(&lowered, "");

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits text into lowercase word tokens, discarding tokens of 2 characters
/// or fewer. Word characters are alphanumerics and underscores; everything
/// else acts as a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    spaced
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Number of Unicode scalar values in `text`. Length rules (truncation,
/// short-query penalties, score formulas) all count characters, not bytes.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
