use std::fmt;

/// Client-supplied conversation identifier.
///
/// Opaque to the gateway; callers inject it explicitly (e.g. from a request
/// header). Never derived from a network address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    pub const MAX_LEN: usize = 128;

    /// Accepts a trimmed, non-empty key of at most [`Self::MAX_LEN`] visible ASCII chars.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim();
        if key.is_empty() || key.len() > Self::MAX_LEN {
            return None;
        }
        if !key.chars().all(|c| c.is_ascii_graphic()) {
            return None;
        }
        Some(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_validates() {
        assert_eq!(SessionKey::parse("  abc-123 ").unwrap().as_str(), "abc-123");
        assert!(SessionKey::parse("").is_none());
        assert!(SessionKey::parse("   ").is_none());
        assert!(SessionKey::parse("has space").is_none());
        assert!(SessionKey::parse("키").is_none());
        assert!(SessionKey::parse(&"k".repeat(SessionKey::MAX_LEN + 1)).is_none());
        assert!(SessionKey::parse(&"k".repeat(SessionKey::MAX_LEN)).is_some());
    }
}
