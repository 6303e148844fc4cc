//! English-only reply guard.

/// Replacement for model replies that fail [`looks_non_english`].
pub const ENGLISH_ONLY_FALLBACK: &str = "I apologize, but I'm required to respond in English only. \
Here's my response: The Morse code for SOS is ... --- ... (dot dot dot, dash dash dash, dot dot dot). \
This is an internationally recognized distress signal.";

const NON_LATIN_RATIO_THRESHOLD: f64 = 0.1;

/// True when more than 10% of the text is alphabetic outside basic Latin.
///
/// Accented Latin letters count as non-Latin. The emptiness check uses the
/// trimmed text while the ratio divides by the untrimmed length.
///
/// "Alphabetic" is the Unicode `Alphabetic` property, which is wider than the
/// letter categories alone: circled letters (`Ⓐ`), letter numbers (`Ⅻ`) and
/// combining vowel signs are counted too.
pub fn looks_non_english(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    let non_latin = text
        .chars()
        .filter(|c| c.is_alphabetic() && (*c as u32) > 127)
        .count();
    let total = text.chars().count();

    non_latin as f64 / total as f64 > NON_LATIN_RATIO_THRESHOLD
}

/// Return `reply` unchanged, or the fallback when it looks non-English.
pub fn enforce_english(reply: String) -> (String, bool) {
    if looks_non_english(&reply) {
        (ENGLISH_ONLY_FALLBACK.to_string(), true)
    } else {
        (reply, false)
    }
}
