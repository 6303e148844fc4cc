use std::{collections::HashMap, sync::LazyLock};

/// The single source of truth for the International Morse alphabet used by the gateway.
///
/// Both lookup directions are derived from this list; see [`SymbolTable::from_pairs`].
pub const STANDARD_SYMBOLS: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('?', "..--.."),
    ('\'', ".----."),
    ('!', "-.-.--"),
    ('/', "-..-."),
    ('(', "-.--."),
    (')', "-.--.-"),
    ('&', ".-..."),
    (':', "---..."),
    (';', "-.-.-."),
    ('=', "-...-"),
    ('+', ".-.-."),
    ('-', "-....-"),
    ('_', "..--.-"),
    ('"', ".-..-."),
    ('$', "...-..-"),
    ('@', ".--.-."),
];

static STANDARD: LazyLock<SymbolTable> = LazyLock::new(|| {
    SymbolTable::from_pairs(STANDARD_SYMBOLS).expect("standard Morse table is a bijection")
});

/// Reasons a symbol list cannot form a table.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("character {0:?} is mapped more than once")]
    DuplicateChar(char),

    #[error("code {code:?} is shared by {first:?} and {second:?}")]
    DuplicateCode {
        code: String,
        first: char,
        second: char,
    },

    #[error("code {code:?} for {ch:?} must be a non-empty run of '.' and '-'")]
    InvalidCode { ch: char, code: String },
}

/// Bidirectional character <-> dot/dash code mapping.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    by_char: HashMap<char, &'static str>,
    by_code: HashMap<&'static str, char>,
}

impl SymbolTable {
    /// Process-wide table built from [`STANDARD_SYMBOLS`] on first use.
    pub fn standard() -> &'static SymbolTable {
        &STANDARD
    }

    /// Build a table from a pair list, rejecting anything that would break the bijection.
    pub fn from_pairs(pairs: &[(char, &'static str)]) -> Result<Self, TableError> {
        let mut by_char = HashMap::with_capacity(pairs.len());
        let mut by_code = HashMap::with_capacity(pairs.len());

        for &(ch, code) in pairs {
            if code.is_empty() || !code.chars().all(|c| c == '.' || c == '-') {
                return Err(TableError::InvalidCode {
                    ch,
                    code: code.to_string(),
                });
            }
            if by_char.insert(ch, code).is_some() {
                return Err(TableError::DuplicateChar(ch));
            }
            if let Some(first) = by_code.insert(code, ch) {
                return Err(TableError::DuplicateCode {
                    code: code.to_string(),
                    first,
                    second: ch,
                });
            }
        }

        Ok(Self { by_char, by_code })
    }

    /// Code for an (already uppercased) character.
    pub fn code_for(&self, ch: char) -> Option<&'static str> {
        self.by_char.get(&ch).copied()
    }

    /// Character for a dot/dash code.
    pub fn char_for(&self, code: &str) -> Option<char> {
        self.by_code.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.by_char.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_char.is_empty()
    }
}
