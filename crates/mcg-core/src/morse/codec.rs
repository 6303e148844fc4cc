//! Morse <-> text conversion.
//!
//! Wire format: character codes separated by one space. Words are separated
//! either by a double space or by a standalone `/` token; `encode` always emits
//! the `/` form.

use super::table::SymbolTable;

const WORD_GAP: &str = "  ";
const WORD_TOKEN: &str = "/";

/// Why an utterance could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown Morse code {code:?}")]
    UnknownCode { code: String },

    #[error("Morse input decoded to blank text")]
    Blank,
}

/// Decode Morse into uppercase text using the standard table.
///
/// Underscores are accepted as dashes. A single unrecognised character code
/// fails the whole utterance; there is no partial output.
pub fn decode(morse: &str) -> Result<String, DecodeError> {
    decode_with(SymbolTable::standard(), morse)
}

/// [`decode`], discarding the failure reason.
pub fn decode_opt(morse: &str) -> Option<String> {
    decode(morse).ok()
}

pub fn decode_with(table: &SymbolTable, morse: &str) -> Result<String, DecodeError> {
    let normalized = morse.replace('_', "-");

    let mut words = Vec::new();
    for group in normalized.split(WORD_GAP) {
        let mut word = String::new();
        for raw in group.split(' ') {
            let code = raw.trim();
            if code.is_empty() {
                continue;
            }
            if code == WORD_TOKEN {
                word.push(' ');
                continue;
            }
            match table.char_for(code) {
                Some(ch) => word.push(ch),
                None => {
                    tracing::warn!(code, "unknown Morse code");
                    return Err(DecodeError::UnknownCode {
                        code: code.to_string(),
                    });
                }
            }
        }
        words.push(word);
    }

    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(DecodeError::Blank);
    }
    Ok(text)
}

/// Encode text as Morse using the standard table.
///
/// Input is uppercased first. Spaces become the `/` word token; characters
/// without a code are dropped silently.
pub fn encode(text: &str) -> String {
    encode_with(SymbolTable::standard(), text)
}

pub fn encode_with(table: &SymbolTable, text: &str) -> String {
    text.to_uppercase()
        .chars()
        .filter_map(|ch| {
            if ch == ' ' {
                Some(WORD_TOKEN)
            } else {
                table.code_for(ch)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
