//! Script detection heuristics.

/// Whether `text` contains a CJK unified ideograph in the basic block
/// (U+4E00..=U+9FA5).
pub fn contains_han(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c))
}

/// Whether `text` is a quick-reply command such as `/thanks`: a slash, at
/// least one more character, and no spaces.
pub fn is_shortcut_command(text: &str) -> bool {
    text.starts_with('/') && text.chars().count() > 1 && !text.contains(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_han() {
        assert!(contains_han("你好"));
        assert!(contains_han("ok 好的"));
        assert!(!contains_han("hello"));
        assert!(!contains_han("こんにちは"));
        assert!(!contains_han(""));
    }

    #[test]
    fn test_is_shortcut_command() {
        assert!(is_shortcut_command("/thanks"));
        assert!(is_shortcut_command("/好的"));
        assert!(!is_shortcut_command("/"));
        assert!(!is_shortcut_command("/ok then"));
        assert!(!is_shortcut_command("thanks"));
    }
}
