/// Maximum length of a user name, in characters.
pub const NAME_MAX_CHARS: usize = 32;
/// Maximum length of a user's `about` text, in characters.
pub const ABOUT_MAX_CHARS: usize = 200;
/// Maximum length of a comment body, in characters.
pub const COMMENT_MAX_CHARS: usize = 2000;

/// Cut `text` down to at most `max_chars` Unicode scalar values.
///
/// Counts characters rather than bytes, so a multi-byte character is either
/// kept whole or dropped, never split.
pub fn crop_to_length(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(crop_to_length("srgold78", NAME_MAX_CHARS), "srgold78");
        assert_eq!(crop_to_length("", 5), "");
    }

    #[test]
    fn exact_length_is_untouched() {
        let text = "a".repeat(COMMENT_MAX_CHARS);
        assert_eq!(crop_to_length(&text, COMMENT_MAX_CHARS), text);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 6 Cyrillic chars, 12 bytes
        let text = "Привет";
        assert_eq!(crop_to_length(text, 6), "Привет");
        assert_eq!(crop_to_length(text, 3), "При");
    }

    #[test]
    fn never_splits_a_multibyte_char_at_the_boundary() {
        let mut text = "x".repeat(COMMENT_MAX_CHARS - 1);
        text.push('Ж');
        text.push('y');
        assert_eq!(text.chars().count(), COMMENT_MAX_CHARS + 1);

        let cropped = crop_to_length(&text, COMMENT_MAX_CHARS);
        assert_eq!(cropped.chars().count(), COMMENT_MAX_CHARS);
        assert!(cropped.ends_with('Ж'));
    }

    #[test]
    fn zero_limit_yields_empty() {
        assert_eq!(crop_to_length("abc", 0), "");
    }
}
