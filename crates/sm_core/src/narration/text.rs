//! Script cleaning and phrase splitting.
//!
//! A script is flattened to one line, stripped of characters the TTS engine
//! and the subtitle renderer choke on, then split on sentence and clause
//! boundaries and packed greedily into phrases of at most `max_chars`
//! characters.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters removed from narration text.
static STRIP_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\\@$%^&*()\[\]{};:"/<>#]"#).expect("strip pattern is valid")
});

/// Flatten line breaks and remove unsupported characters.
pub fn clean_script(text: &str) -> String {
    let flattened = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
    STRIP_CHARS.replace_all(&flattened, "").into_owned()
}

/// Split cleaned text into subtitle phrases of at most `max_chars` characters.
///
/// Pieces longer than the budget are kept whole rather than cut mid-word.
pub fn split_phrases(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in split_clauses(text) {
        let clean = STRIP_CHARS.replace_all(piece.trim(), "");
        let clean = clean.trim();
        if clean.is_empty() {
            continue;
        }

        let current_len = current.chars().count();
        let piece_len = clean.chars().count();

        if current_len + piece_len + 1 <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(clean);
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(clean);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split on runs of spaces that follow a clause boundary.
///
/// Boundaries are: after `.`, `!` or `?`; after `.,`; and after `,` when the
/// next word has at least three word characters.
fn split_clauses(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut pieces = Vec::new();
    let mut piece_start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (byte_idx, c) = chars[i];
        if c != ' ' || i == 0 {
            i += 1;
            continue;
        }

        // Extent of this run of spaces
        let mut run_end = i;
        while run_end < chars.len() && chars[run_end].1 == ' ' {
            run_end += 1;
        }

        let prev = chars[i - 1].1;
        let before_prev = if i >= 2 { Some(chars[i - 2].1) } else { None };

        let is_boundary = match prev {
            '.' | '!' | '?' => true,
            ',' if before_prev == Some('.') => true,
            ',' => leading_word_len(&chars[run_end..]) >= 3,
            _ => false,
        };

        if is_boundary {
            pieces.push(&text[piece_start..byte_idx]);
            piece_start = chars
                .get(run_end)
                .map(|(b, _)| *b)
                .unwrap_or(text.len());
        }
        i = run_end;
    }

    pieces.push(&text[piece_start..]);
    pieces
}

fn leading_word_len(chars: &[(usize, char)]) -> usize {
    chars
        .iter()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .count()
}
