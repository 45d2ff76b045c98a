//! Query engine (incremental search over the post corpus)
//!
//! A search either runs over the full corpus or, when the new query extends
//! the previous one, over the previous results only. Narrowing assumes that
//! adding text can only remove matches; that holds for title and body
//! substrings but not for date tokens, so any query with a digit runs in full.
//!
//! Per-post scoring is pure once the corpus is resolved and runs on rayon
//! with order preserved.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::candidate::PostCandidate;
use crate::config::{SearchConfig, UnscoredPolicy};
use crate::corpus::PostCache;
use crate::interface::{SearchError, SearchResult};
use crate::matching::MatcherChain;
use crate::models::Post;
use crate::ranking::{accept, date_strong_match, sort_results, strong_match, Acceptance};
use crate::text::{contains_digit, normalize, tokenize};

/// Which corpus a query runs against
#[derive(Debug, Clone, PartialEq)]
pub enum SearchMode {
    /// Only the previous results, in their ranked order
    Narrowing(Vec<Arc<Post>>),
    Full,
}

/// Previous query and its results, owned by whoever drives the searches.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    previous_query: String,
    previous_results: Option<Vec<Arc<Post>>>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized (lowercased) form of the last completed query
    pub fn previous_query(&self) -> &str {
        &self.previous_query
    }

    pub fn previous_results(&self) -> Option<&[Arc<Post>]> {
        self.previous_results.as_deref()
    }

    /// Narrowing when the normalized query contains the previous one and has no digit
    pub fn mode_for(&self, query: &str) -> SearchMode {
        match &self.previous_results {
            Some(previous)
                if !self.previous_query.is_empty()
                    && !contains_digit(query)
                    && normalize(query, true).contains(&self.previous_query) =>
            {
                SearchMode::Narrowing(previous.clone())
            }
            _ => SearchMode::Full,
        }
    }

    pub fn clear(&mut self) {
        self.previous_query.clear();
        self.previous_results = None;
    }

    fn record(&mut self, query: &str, results: &[SearchResult]) {
        self.previous_results = Some(results.iter().map(|r| Arc::clone(&r.post)).collect());
        self.previous_query = normalize(query, true);
    }
}

#[derive(Debug, Default)]
pub struct SearchEngine {
    config: SearchConfig,
    matchers: MatcherChain,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_matchers(config, MatcherChain::default())
    }

    pub fn with_matchers(config: SearchConfig, matchers: MatcherChain) -> Self {
        Self { config, matchers }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run `query`, picking the corpus from the session, and record the outcome in it.
    /// An empty query clears the session.
    pub async fn search(
        &self,
        session: &mut SearchSession,
        cache: &PostCache,
        query: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if query.is_empty() {
            session.clear();
            return Ok(Vec::new());
        }

        let results = match session.mode_for(query) {
            SearchMode::Narrowing(previous) => {
                debug!(query, candidates = previous.len(), "narrowing previous results");
                self.rank_corpus(&previous, query)
            }
            SearchMode::Full => {
                let corpus = cache.get_corpus().await?;
                debug!(query, candidates = corpus.len(), "searching full corpus");
                self.rank_corpus(&corpus, query)
            }
        };

        session.record(query, &results);
        Ok(results)
    }

    /// Rank `corpus` for `query` and record the outcome in the session
    pub fn search_corpus(&self, session: &mut SearchSession, corpus: &[Arc<Post>], query: &str) -> Vec<SearchResult> {
        if query.is_empty() {
            session.clear();
            return Vec::new();
        }
        let results = self.rank_corpus(corpus, query);
        session.record(query, &results);
        results
    }

    /// Match, accept, refine and sort. Does not touch any session.
    pub fn rank_corpus(&self, corpus: &[Arc<Post>], query: &str) -> Vec<SearchResult> {
        let tokens = tokenize(query, true);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = corpus
            .par_iter()
            .filter_map(|post| self.score_post(post, &tokens, query))
            .collect();

        sort_results(&mut results);
        debug!(query, tokens = tokens.len(), results = results.len(), "search ranked");
        results
    }

    fn score_post(&self, post: &Arc<Post>, tokens: &[String], query: &str) -> Option<SearchResult> {
        let candidate = PostCandidate::new(post);
        let matches = self.matchers.classify(tokens, &candidate);

        let strong = match accept(&matches, tokens.len(), &self.config) {
            Acceptance::Rejected => return None,
            Acceptance::Date => Some(date_strong_match(post, &self.config)),
            Acceptance::Text => strong_match(&matches, post, query, &self.config),
        };

        if strong.is_none() && self.config.unscored == UnscoredPolicy::Exclude {
            return None;
        }

        Some(SearchResult {
            post: Arc::clone(post),
            strong,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::MatchField;
    use chrono::{TimeZone, Utc};

    fn corpus() -> Vec<Arc<Post>> {
        vec![
            Arc::new(
                Post::new("Spring Sale Event", Utc.with_ymd_and_hms(2023, 3, 15, 0, 0, 0).unwrap(), "spring-sale")
                    .with_html("<p>Join us for spring savings up to 50% off</p>"),
            ),
            Arc::new(
                Post::new("Rust Notes", Utc.with_ymd_and_hms(2022, 7, 4, 0, 0, 0).unwrap(), "rust-notes")
                    .with_html("<p>Ownership and borrowing in springtime cleaning of code</p>"),
            ),
        ]
    }

    #[test]
    fn test_mode_full_without_history() {
        assert_eq!(SearchSession::new().mode_for("spring"), SearchMode::Full);
    }

    #[test]
    fn test_mode_narrows_on_extension() {
        let engine = SearchEngine::default();
        let mut session = SearchSession::new();
        engine.search_corpus(&mut session, &corpus(), "spr");
        assert_eq!(session.previous_query(), "spr");

        match session.mode_for("Spring") {
            SearchMode::Narrowing(previous) => assert_eq!(previous.len(), 2),
            SearchMode::Full => panic!("expected narrowing mode"),
        }
        assert_eq!(session.mode_for("sale"), SearchMode::Full);
    }

    #[test]
    fn test_mode_digits_bypass_narrowing() {
        let engine = SearchEngine::default();
        let mut session = SearchSession::new();
        engine.search_corpus(&mut session, &corpus(), "spring");
        assert_eq!(session.mode_for("spring 2023"), SearchMode::Full);
    }

    #[test]
    fn test_empty_query_clears_session() {
        let engine = SearchEngine::default();
        let mut session = SearchSession::new();
        engine.search_corpus(&mut session, &corpus(), "spring");
        assert!(session.previous_results().is_some());

        assert!(engine.search_corpus(&mut session, &corpus(), "").is_empty());
        assert_eq!(session.previous_query(), "");
        assert!(session.previous_results().is_none());
    }

    #[test]
    fn test_punctuation_only_query_has_no_results() {
        let engine = SearchEngine::default();
        assert!(engine.rank_corpus(&corpus(), "?()").is_empty());
    }

    #[test]
    fn test_title_match_outranks_body_match() {
        let engine = SearchEngine::default();
        let results = engine.rank_corpus(&corpus(), "spring");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].post.slug, "spring-sale");
        assert_eq!(results[0].strong.as_ref().unwrap().field, MatchField::Title);
        assert_eq!(results[1].strong.as_ref().unwrap().field, MatchField::Body);
    }

    #[test]
    fn test_unscored_policy() {
        // date + title matches, but the title shares are 1/2 tokens and 4/10 chars
        let corpus = vec![Arc::new(Post::new(
            "Rust Notes",
            Utc.with_ymd_and_hms(2022, 7, 4, 0, 0, 0).unwrap(),
            "rust-notes",
        ))];

        let included = SearchEngine::default().rank_corpus(&corpus, "2022 rust");
        assert_eq!(included.len(), 1);
        assert!(included[0].strong.is_none());
        assert_eq!(included[0].rank(), 0.0);

        let excluding = SearchEngine::new(SearchConfig {
            unscored: UnscoredPolicy::Exclude,
            ..SearchConfig::default()
        });
        assert!(excluding.rank_corpus(&corpus, "2022 rust").is_empty());
    }

    #[tokio::test]
    async fn test_search_uses_cache_then_previous_results() {
        use crate::source::{FetchOptions, MemorySource};

        let posts: Vec<Post> = corpus().iter().map(|p| (**p).clone()).collect();
        let source = Arc::new(MemorySource::new(posts));
        let cache = PostCache::new(source.clone(), FetchOptions::default(), 10);
        let engine = SearchEngine::default();
        let mut session = SearchSession::new();

        let first = engine.search(&mut session, &cache, "spring").await.unwrap();
        assert_eq!(first.len(), 2);

        let narrowed = engine.search(&mut session, &cache, "spring sale").await.unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].post.slug, "spring-sale");
        assert_eq!(source.fetch_count(), 1);
    }
}
