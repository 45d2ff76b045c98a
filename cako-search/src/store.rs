//! SearchStore - the object a UI controller holds
//!
//! Owns the post cache, the engine, one search session and the request
//! sequence.
//!
//! Concurrency model:
//! - The corpus is resolved before the session lock is taken; the lock is
//!   only held for the synchronous ranking step, never across an await.
//! - Sequenced searches (`search_latest`) check their ticket under the
//!   session lock and drop their results, leaving the session untouched, when
//!   a newer search has been issued.
//! - Debounced searches (`search_debounced`) are cancelled by the next
//!   keystroke before they start.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::SearchConfig;
use crate::corpus::{CacheState, PostCache};
use crate::interface::{SearchError, SearchOutcome, SearchResults};
use crate::search::{SearchEngine, SearchMode, SearchSession};
use crate::source::PostSource;
use crate::trigger::{Debouncer, RequestSequence, Ticket};

pub struct SearchStore {
    cache: PostCache,
    engine: SearchEngine,
    session: Mutex<SearchSession>,
    sequence: RequestSequence,
    debouncer: Debouncer,
}

impl SearchStore {
    pub fn new(source: Arc<dyn PostSource>, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let cache = PostCache::new(source, config.fetch_options(), config.max_fetch_attempts);
        let debouncer = Debouncer::new(config.debounce_interval());
        Ok(Self {
            cache,
            engine: SearchEngine::new(config),
            session: Mutex::new(SearchSession::new()),
            sequence: RequestSequence::new(),
            debouncer,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        self.engine.config()
    }

    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    /// Start loading the corpus ahead of the first query (e.g. on input focus)
    pub async fn warm(&self) -> Result<(), SearchError> {
        self.cache.get_corpus().await.map(|_| ())
    }

    /// Search and record the results as the new narrowing base
    pub async fn search(&self, query: &str) -> Result<SearchResults, SearchError> {
        let outcome = self.run(query, None).await?;
        Ok(outcome.into_results().unwrap_or_else(SearchResults::empty))
    }

    /// Search, reporting `Stale` instead of results if a newer search was issued meanwhile
    pub async fn search_latest(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let ticket = self.sequence.issue();
        self.run(query, Some(ticket)).await
    }

    /// Wait for the input to settle, then run a sequenced search.
    /// Fails with `Cancelled` when a later keystroke superseded this one.
    pub async fn search_debounced(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let ticket = self.sequence.issue();
        if self.debouncer.schedule(ticket).await.is_none() {
            return Err(SearchError::Cancelled);
        }
        self.run(query, Some(ticket)).await
    }

    /// Forget the previous query and results, and drop any scheduled search
    pub fn clear(&self) {
        self.debouncer.cancel();
        self.sequence.issue();
        self.session.lock().clear();
    }

    async fn run(&self, query: &str, ticket: Option<Ticket>) -> Result<SearchOutcome, SearchError> {
        if query.is_empty() {
            if ticket.map_or(true, |t| self.sequence.is_latest(t)) {
                self.session.lock().clear();
            }
            return Ok(SearchOutcome::Fresh(SearchResults::empty()));
        }

        let mode = self.session.lock().mode_for(query);
        let corpus = match mode {
            SearchMode::Narrowing(previous) => previous,
            SearchMode::Full => self.cache.get_corpus().await?.to_vec(),
        };

        let mut session = self.session.lock();
        if let Some(ticket) = ticket {
            if !self.sequence.is_latest(ticket) {
                debug!(query, ticket = ticket.value(), "dropping stale search");
                return Ok(SearchOutcome::Stale);
            }
        }

        let results = self.engine.search_corpus(&mut session, &corpus, query);
        Ok(SearchOutcome::Fresh(SearchResults::from(results)))
    }
}

impl std::fmt::Debug for SearchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchStore")
            .field("cache", &self.cache)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
