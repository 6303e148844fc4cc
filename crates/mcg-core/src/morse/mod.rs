//! Morse code: symbol table, classifier, and codec.

pub mod classify;
pub mod codec;
pub mod table;

pub use classify::is_morse_like;
pub use codec::{decode, decode_opt, encode, DecodeError};
pub use table::SymbolTable;
