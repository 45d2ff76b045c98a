//! Per-token field matchers.
//!
//! A token is classified against a post by trying matchers in priority order
//! (title, date, body). The first field that matches wins, so a token counts
//! once per post even when it appears in several fields.

use crate::candidate::PostCandidate;
use crate::interface::{MatchField, TokenMatch};
use crate::text::strip_numeric_punctuation;

pub const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// A single field test for one normalized token
pub trait Matcher: Send + Sync {
    fn field(&self) -> MatchField;

    fn matches(&self, token: &str, candidate: &PostCandidate<'_>) -> bool;
}

/// Substring in the normalized title, or in its numeric-insensitive form
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleMatcher;

impl Matcher for TitleMatcher {
    fn field(&self) -> MatchField {
        MatchField::Title
    }

    fn matches(&self, token: &str, candidate: &PostCandidate<'_>) -> bool {
        candidate.title_lower().contains(token)
            || candidate.title_numeric().contains(&strip_numeric_punctuation(token))
    }
}

/// Publish year, day of month, or month name
#[derive(Debug, Clone, Copy, Default)]
pub struct DateMatcher;

impl Matcher for DateMatcher {
    fn field(&self) -> MatchField {
        MatchField::Date
    }

    fn matches(&self, token: &str, candidate: &PostCandidate<'_>) -> bool {
        let post = candidate.post();

        if let Ok(value) = token.replace(',', "").parse::<i64>() {
            if value == post.publish_year() || value == post.publish_day() {
                return true;
            }
        }

        // "ju" names both june and july; either may be the post's month
        let token_lower = token.to_lowercase();
        let date = candidate.publish_date();
        MONTH_NAMES
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains(token_lower.as_str()))
            .any(|(i, _)| date.contains(&format!("-{:02}-", i + 1)))
    }
}

/// Substring in the normalized body html, or in its numeric-insensitive form.
/// Never matches a post fetched without its body.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyMatcher;

impl Matcher for BodyMatcher {
    fn field(&self) -> MatchField {
        MatchField::Body
    }

    fn matches(&self, token: &str, candidate: &PostCandidate<'_>) -> bool {
        match (candidate.body_lower(), candidate.body_numeric()) {
            (Some(body), Some(numeric)) => {
                body.contains(token) || numeric.contains(&strip_numeric_punctuation(token))
            }
            _ => false,
        }
    }
}

/// Ordered list of matchers; earlier entries take precedence
pub struct MatcherChain {
    matchers: Vec<Box<dyn Matcher>>,
}

impl Default for MatcherChain {
    fn default() -> Self {
        Self::new(vec![Box::new(TitleMatcher), Box::new(DateMatcher), Box::new(BodyMatcher)])
    }
}

impl MatcherChain {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Field of the first matcher accepting `token`
    pub fn classify_token(&self, token: &str, candidate: &PostCandidate<'_>) -> Option<MatchField> {
        self.matchers
            .iter()
            .find(|m| m.matches(token, candidate))
            .map(|m| m.field())
    }

    /// One match per token that hit any field, in token order
    pub fn classify(&self, tokens: &[String], candidate: &PostCandidate<'_>) -> Vec<TokenMatch> {
        tokens
            .iter()
            .filter_map(|token| {
                self.classify_token(token, candidate)
                    .map(|field| TokenMatch::new(field, token))
            })
            .collect()
    }
}

impl std::fmt::Debug for MatcherChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.matchers.iter().map(|m| m.field()))
            .finish()
    }
}
