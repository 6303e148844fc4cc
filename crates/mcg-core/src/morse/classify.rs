use std::collections::HashSet;

const MORSE_LIKE: [char; 5] = ['.', '-', '_', '/', ' '];
const MORSE_RATIO_THRESHOLD: f64 = 0.8;

/// Heuristic: does this input look like Morse code?
///
/// Inputs made only of spaces (or nothing) are never Morse, even though they
/// would pass the ratio test.
pub fn is_morse_like(input: &str) -> bool {
    let distinct: HashSet<char> = input.chars().filter(|&c| c != ' ').collect();
    if distinct.is_empty() {
        return false;
    }

    let total = input.chars().count();
    let morse_like = input.chars().filter(|c| MORSE_LIKE.contains(c)).count();

    morse_like as f64 / total as f64 > MORSE_RATIO_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_are_not_morse() {
        assert!(!is_morse_like(""));
        assert!(!is_morse_like("   "));
    }

    #[test]
    fn plain_words_are_not_morse() {
        assert!(!is_morse_like("HELLO"));
        assert!(!is_morse_like("how are you today?"));
    }

    #[test]
    fn dots_and_dashes_are_morse() {
        assert!(is_morse_like(".- -..."));
        assert!(is_morse_like(".... . .-.. .-.. --- / .-- --- .-. .-.. -.."));
        assert!(is_morse_like("..._ ___ ..."));
        assert!(is_morse_like("-"));
    }

    #[test]
    fn ratio_must_be_strictly_above_threshold() {
        // 4 of 5 chars are Morse-like: exactly 0.8, not enough.
        assert!(!is_morse_like("....x"));
        // 9 of 10: 0.9.
        assert!(is_morse_like(".........x"));
    }

    #[test]
    fn spaces_count_toward_the_ratio() {
        // 1 non-Morse char among 6: 5/6 > 0.8.
        assert!(is_morse_like("x .  -"));
    }

    #[test]
    fn counts_characters_not_bytes() {
        // "한" is three bytes in UTF-8 but one char: 4/5 = 0.8 stays below.
        assert!(!is_morse_like("...-한"));
    }
}
