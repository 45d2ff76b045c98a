//! Text normalization and tokenization shared by queries and post fields.
//!
//! Normalization is deterministic: separators become spaces, a fixed set of
//! punctuation is dropped, and lowercasing is optional. Numeric comparisons use
//! a separate, narrower strip (`$ % ,`) so "$1,200" and "1200" line up.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Characters replaced by a single space.
const SEPARATORS: &[char] = &['&', '_', '|', '+', '-', '{', '}', '[', ']', '\\', '/'];

/// Characters removed outright.
const STRIPPED: &[char] = &['`', '(', ')', '=', '?', ';', ':', '\'', '"', '<', '>'];

/// Formatting characters ignored when comparing numbers.
const NUMERIC_PUNCTUATION: &[char] = &['$', '%', ','];

/// Tokens shorter than this never take part in strong (stage 2) matching.
pub const MIN_STRONG_TOKEN_LEN: usize = 2;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Replace separators with spaces and drop stripped punctuation, lowercasing first if asked.
pub fn normalize(text: &str, to_lower: bool) -> String {
    let source: Cow<'_, str> = if to_lower {
        Cow::Owned(text.to_lowercase())
    } else {
        Cow::Borrowed(text)
    };

    source
        .chars()
        .filter_map(|c| {
            if SEPARATORS.contains(&c) {
                Some(' ')
            } else if STRIPPED.contains(&c) {
                None
            } else {
                Some(c)
            }
        })
        .collect()
}

/// Normalize, split on single spaces and drop empty pieces. Order is preserved.
pub fn tokenize(text: &str, to_lower: bool) -> Vec<String> {
    normalize(text, to_lower)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove `$`, `%` and `,` only.
pub fn strip_numeric_punctuation(text: &str) -> String {
    text.chars().filter(|c| !NUMERIC_PUNCTUATION.contains(c)).collect()
}

/// Substring test with numeric formatting removed from both sides.
pub fn is_numeric_match(token: &str, haystack: &str) -> bool {
    strip_numeric_punctuation(haystack).contains(&strip_numeric_punctuation(token))
}

/// Replace every `<...>` tag with a single space.
pub fn strip_html_tags(html: &str) -> String {
    HTML_TAG.replace_all(html, " ").into_owned()
}

pub fn contains_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// Length in characters, which is what every ratio in ranking is measured in.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Whether a token is long enough to count toward strong matching.
pub(crate) fn is_strong_token(token: &str) -> bool {
    char_len(token) >= MIN_STRONG_TOKEN_LEN
}
