//! Two-stage relevance ranking.
//!
//! Stage 1 (coarse) decides from the per-token field matches whether a post is
//! worth keeping at all. Stage 2 (strong) looks at the actual words of the
//! title and body to produce a rank and a preview.
//!
//! Rank bands, highest first:
//! - date: every token matched the publish date, fixed `date_rank` (3)
//! - title: `title_rank_weight * (token share + char share)`, at most ~2.8
//! - body: `token share + char share` within the best run, at most 2
//! - unscored: accepted without a strong match, rank 0

use std::collections::HashSet;
use std::ops::Range;

use crate::config::SearchConfig;
use crate::interface::{HighlightSpan, MatchField, SearchResult, StrongMatch, TokenMatch};
use crate::models::Post;
use crate::text::{char_len, is_numeric_match, is_strong_token, normalize, strip_html_tags, tokenize};

/// Stage 1 verdict for one post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Rejected,
    /// Every token matched the publish date
    Date,
    /// Enough tokens matched in title, date or body to go on to stage 2
    Text,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Stage 1: coarse acceptance from the match list.
pub fn accept(matches: &[TokenMatch], token_count: usize, config: &SearchConfig) -> Acceptance {
    if token_count == 0 {
        return Acceptance::Rejected;
    }

    let date_matches = matches.iter().filter(|m| m.field == MatchField::Date).count();
    if date_matches >= token_count {
        return Acceptance::Date;
    }

    if !matches.is_empty() && ratio(matches.len(), token_count) >= config.coarse_threshold {
        Acceptance::Text
    } else {
        Acceptance::Rejected
    }
}

/// Synthetic strong match for a post found purely by its date
pub fn date_strong_match(post: &Post, config: &SearchConfig) -> StrongMatch {
    StrongMatch {
        field: MatchField::Date,
        preview_text: post.publish_date_iso(),
        rank: config.date_rank,
        highlight_spans: Vec::new(),
        preview_words: None,
    }
}

/// Stage 2: refine an accepted post into a title or body strong match.
///
/// Tokens are recomputed from the raw query. Only text matches with tokens of
/// at least two characters take part.
pub fn strong_match(matches: &[TokenMatch], post: &Post, query: &str, config: &SearchConfig) -> Option<StrongMatch> {
    let token_count = tokenize(query, true).len();
    if token_count == 0 {
        return None;
    }

    let text_tokens: Vec<&str> = matches
        .iter()
        .filter_map(TokenMatch::text_token)
        .filter(|t| is_strong_token(t))
        .collect();

    if let Some(title) = title_strong_match(&text_tokens, post, token_count, config) {
        return Some(title);
    }

    let has_body_match = matches.iter().any(|m| m.field == MatchField::Body);
    match post.html.as_deref() {
        Some(html) if has_body_match => body_strong_match(&text_tokens, html, token_count, config),
        _ => None,
    }
}

fn distinct_tokens(spans: &[HighlightSpan]) -> usize {
    spans.iter().map(|s| s.token.as_str()).collect::<HashSet<_>>().len()
}

fn title_strong_match(
    text_tokens: &[&str],
    post: &Post,
    token_count: usize,
    config: &SearchConfig,
) -> Option<StrongMatch> {
    let title_lower = post.title.to_lowercase();
    let title_words: Vec<&str> = title_lower.split(' ').collect();

    let spans: Vec<HighlightSpan> = title_words
        .iter()
        .enumerate()
        .filter_map(|(word_index, word)| {
            let normalized = normalize(word, true);
            text_tokens
                .iter()
                .find(|t| word.contains(**t) || normalized.contains(**t))
                .map(|t| HighlightSpan {
                    word_index,
                    word: word.to_string(),
                    token: t.to_string(),
                })
        })
        .collect();

    let tokens_share = ratio(distinct_tokens(&spans), token_count);
    let chars_matched: usize = spans.iter().map(|s| char_len(&s.token)).sum();
    let chars_share = ratio(chars_matched, char_len(&post.title));

    if tokens_share > config.title_threshold || chars_share > config.title_threshold {
        Some(StrongMatch {
            field: MatchField::Title,
            preview_text: post.title.clone(),
            rank: config.title_rank_weight * (tokens_share + chars_share),
            highlight_spans: spans,
            preview_words: Some(0..title_words.len()),
        })
    } else {
        None
    }
}

fn body_strong_match(
    text_tokens: &[&str],
    html: &str,
    token_count: usize,
    config: &SearchConfig,
) -> Option<StrongMatch> {
    let stripped = strip_html_tags(html);
    let words: Vec<&str> = stripped.split(' ').collect();

    // One span per word index: the first token that hits it
    let spans: Vec<HighlightSpan> = words
        .iter()
        .enumerate()
        .filter_map(|(word_index, word)| {
            let lower = word.to_lowercase();
            let normalized = normalize(word, true);
            text_tokens
                .iter()
                .find(|t| lower.contains(**t) || is_numeric_match(t, word) || normalized.contains(**t))
                .map(|t| HighlightSpan {
                    word_index,
                    word: word.to_string(),
                    token: t.to_string(),
                })
        })
        .collect();

    let run = longest_run(&spans)?;
    let first = run.first()?.word_index;
    let last = run.last()?.word_index;

    let window = expand_window(first, last, words.len(), config.preview_words);
    let preview_text = words[window.clone()].join(" ");

    let chars_matched: usize = run.iter().map(|s| char_len(&s.token)).sum();
    let chars_in_run: usize = run.iter().map(|s| char_len(&s.word)).sum();
    let rank = ratio(distinct_tokens(run), token_count) + ratio(chars_matched, chars_in_run);

    Some(StrongMatch {
        field: MatchField::Body,
        preview_text,
        rank,
        highlight_spans: spans,
        preview_words: Some(window),
    })
}

/// Longest run of spans whose word indices are consecutive.
/// On equal length the later run wins.
pub(crate) fn longest_run(spans: &[HighlightSpan]) -> Option<&[HighlightSpan]> {
    if spans.is_empty() {
        return None;
    }

    let mut best: &[HighlightSpan] = &[];
    let mut start = 0;
    for end in 1..=spans.len() {
        let breaks = end == spans.len() || spans[end].word_index > spans[end - 1].word_index + 1;
        if breaks {
            let run = &spans[start..end];
            if run.len() >= best.len() {
                best = run;
            }
            start = end;
        }
    }
    Some(best)
}

/// Grow `[min, max]` until it spans `preview_words` words or covers the whole text.
/// Grows left first each step. The returned range is always within `0..word_count`.
pub(crate) fn expand_window(min: usize, max: usize, word_count: usize, preview_words: usize) -> Range<usize> {
    let mut lo = min.min(word_count.saturating_sub(1));
    let mut hi = max.max(lo);

    while hi - lo < preview_words {
        if lo > 0 {
            lo -= 1;
        }
        if hi - lo < preview_words && hi < word_count {
            hi += 1;
        }
        if lo == 0 && hi >= word_count {
            break;
        }
    }

    lo..(hi + 1).min(word_count)
}

/// Stable sort, highest rank first; unscored results (rank 0) keep their corpus order at the end
pub fn sort_results(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.rank().total_cmp(&a.rank()));
}
