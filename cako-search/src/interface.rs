//! cako-search public interface
//!
//! Result and error types shared by the engine, the store and the CLI.
//! Renderers consume `StrongMatch::preview_text` and `highlight_spans`;
//! nothing here produces markup.

use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::models::Post;
use crate::source::SourceError;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Post field a query token matched in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Title,
    Date,
    Body,
}

/// Whether a completed search found anything.
/// `NoResults` is a normal outcome, distinct from a failed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStatus {
    Results,
    NoResults,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// One query token matched one post in one field.
/// Date matches carry no token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub field: MatchField,
    pub token: Option<String>,
}

impl TokenMatch {
    pub fn new(field: MatchField, token: &str) -> Self {
        let token = match field {
            MatchField::Date => None,
            MatchField::Title | MatchField::Body => Some(token.to_string()),
        };
        Self { field, token }
    }

    /// Token text for title/body matches
    pub fn text_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// A matched word: its position in the field's word sequence and the token that hit it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub word_index: usize,
    pub word: String,
    pub token: String,
}

/// Refined, ranked summary of why a post matched
///
/// For body matches `highlight_spans` index into the body's word sequence
/// (tags replaced by spaces, split on single spaces) and cover every matched
/// word, not only the run the preview was centred on. `preview_words` is the
/// word window `preview_text` was cut from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrongMatch {
    pub field: MatchField,
    pub preview_text: String,
    pub rank: f64,
    pub highlight_spans: Vec<HighlightSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_words: Option<Range<usize>>,
}

/// A post accepted by the ranker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub post: Arc<Post>,
    pub strong: Option<StrongMatch>,
}

impl SearchResult {
    /// Sort key: the strong match rank, 0 when the post was accepted without one
    pub fn rank(&self) -> f64 {
        self.strong.as_ref().map_or(0.0, |s| s.rank)
    }
}

/// Search result container
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub results: Vec<SearchResult>,
    pub status: SearchStatus,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            status: SearchStatus::NoResults,
        }
    }
}

impl From<Vec<SearchResult>> for SearchResults {
    fn from(results: Vec<SearchResult>) -> Self {
        let status = if results.is_empty() {
            SearchStatus::NoResults
        } else {
            SearchStatus::Results
        };
        Self { results, status }
    }
}

/// Outcome of a sequenced search
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// The search was the latest one issued when it finished
    Fresh(SearchResults),
    /// A newer search was issued while this one was resolving; its results were dropped
    Stale,
}

impl SearchOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    pub fn into_results(self) -> Option<SearchResults> {
        match self {
            Self::Fresh(results) => Some(results),
            Self::Stale => None,
        }
    }
}

/// Error type for search operations
///
/// `Clone` so a single failed corpus fetch can be handed to every waiter.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Could not load posts after {attempts} attempts: {last_error}")]
    Fetch {
        attempts: u32,
        #[source]
        last_error: Arc<SourceError>,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Operation cancelled")]
    Cancelled,
}
