//! Heuristic token counting for calls without provider usage data.

/// Rough token estimate at one token per four characters, never below one.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64 / 4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens(&"x".repeat(401)), 100);
        // Counted in characters, not bytes.
        assert_eq!(estimate_tokens("ééééééééé"), 2);
    }
}
