//! Post cache: the search corpus, fetched once and shared.
//!
//! State machine:
//!
//! ```text
//! NotStarted ──get_corpus──▶ Pending(shared fetch) ──ok──▶ Ready(corpus)
//!      ▲                          │
//!      │                          └──all attempts failed──▶ Failed(error)
//!      └──────────────── next get_corpus starts over ◀──────────┘
//! ```
//!
//! Callers arriving while a fetch is pending await the same shared future, so
//! at most one fetch is in flight per cache. The lock is never held across an await.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::interface::SearchError;
use crate::models::Post;
use crate::source::{FetchOptions, PageSize, PostSource};

/// The resolved corpus; cheap to clone and share between searches
pub type Corpus = Arc<Vec<Arc<Post>>>;

type SharedFetch = Shared<BoxFuture<'static, Result<Corpus, SearchError>>>;

enum State {
    NotStarted,
    Pending { generation: u64, fetch: SharedFetch },
    Ready(Corpus),
    Failed(SearchError),
}

/// Snapshot of the cache state for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    NotStarted,
    Pending,
    Ready { posts: usize },
    Failed { message: String },
}

pub struct PostCache {
    source: Arc<dyn PostSource>,
    options: FetchOptions,
    max_attempts: u32,
    state: Mutex<State>,
    next_generation: AtomicU64,
}

impl PostCache {
    pub fn new(source: Arc<dyn PostSource>, options: FetchOptions, max_attempts: u32) -> Self {
        Self {
            source,
            options,
            max_attempts: max_attempts.max(1),
            state: Mutex::new(State::NotStarted),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Resolve the corpus, starting the fetch if nothing is cached or pending.
    pub async fn get_corpus(&self) -> Result<Corpus, SearchError> {
        let (generation, fetch) = {
            let mut state = self.state.lock();
            match &*state {
                State::Ready(corpus) => return Ok(Arc::clone(corpus)),
                State::Pending { generation, fetch } => (*generation, fetch.clone()),
                State::NotStarted | State::Failed(_) => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let fetch = fetch_with_retry(Arc::clone(&self.source), self.options, self.max_attempts)
                        .boxed()
                        .shared();
                    *state = State::Pending {
                        generation,
                        fetch: fetch.clone(),
                    };
                    (generation, fetch)
                }
            }
        };

        let result = fetch.await;

        // Only the waiter of the fetch that is still current may settle the state;
        // a newer fetch may already have been started after an earlier failure.
        let mut state = self.state.lock();
        if matches!(&*state, State::Pending { generation: current, .. } if *current == generation) {
            *state = match &result {
                Ok(corpus) => State::Ready(Arc::clone(corpus)),
                Err(e) => State::Failed(e.clone()),
            };
        }
        result
    }

    pub fn state(&self) -> CacheState {
        match &*self.state.lock() {
            State::NotStarted => CacheState::NotStarted,
            State::Pending { .. } => CacheState::Pending,
            State::Ready(corpus) => CacheState::Ready { posts: corpus.len() },
            State::Failed(e) => CacheState::Failed { message: e.to_string() },
        }
    }

    /// Drop a ready corpus so the next search refetches. A pending fetch is left alone.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        if matches!(&*state, State::Ready(_) | State::Failed(_)) {
            *state = State::NotStarted;
        }
    }
}

impl std::fmt::Debug for PostCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostCache")
            .field("options", &self.options)
            .field("max_attempts", &self.max_attempts)
            .field("state", &self.state())
            .finish()
    }
}

/// Fetch every post, retrying immediately up to `max_attempts` times.
async fn fetch_with_retry(
    source: Arc<dyn PostSource>,
    options: FetchOptions,
    max_attempts: u32,
) -> Result<Corpus, SearchError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        trace!(attempt, "fetching posts for search");

        match fetch_all_pages(source.as_ref(), options).await {
            Ok(posts) => {
                debug!(attempt, posts = posts.len(), "search corpus loaded");
                return Ok(Arc::new(posts.into_iter().map(Arc::new).collect()));
            }
            Err(e) => {
                warn!(attempt, error = %e, "error fetching posts for search");
                if attempt >= max_attempts {
                    error!(attempts = attempt, "giving up fetching posts for search");
                    return Err(SearchError::Fetch {
                        attempts: attempt,
                        last_error: Arc::new(e),
                    });
                }
            }
        }
    }
}

/// Page 1 with no limit, following `next` if a source paginates anyway
async fn fetch_all_pages(
    source: &dyn PostSource,
    options: FetchOptions,
) -> Result<Vec<Post>, crate::source::SourceError> {
    let mut page = 1;
    let mut posts = Vec::new();
    loop {
        let batch = source.fetch_posts(PageSize::All, page, options).await?;
        posts.extend(batch.items);
        match batch.pagination.next {
            Some(next) if next > page => page = next,
            _ => return Ok(posts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemorySource, Pagination, PostPage, SourceError, SourceResult};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn posts(n: usize) -> Vec<Post> {
        (0..n)
            .map(|i| Post::new(format!("Post {}", i), Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap(), format!("p{}", i)))
            .collect()
    }

    /// Fails the first `failures` calls, then serves the posts
    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
        delay: Duration,
        posts: Vec<Post>,
    }

    impl FlakySource {
        fn new(failures: u32, posts: Vec<Post>) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
                posts,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PostSource for FlakySource {
        async fn fetch_posts(&self, _limit: PageSize, _page: u32, _options: FetchOptions) -> SourceResult<PostPage> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if call <= self.failures {
                return Err(SourceError::Status(503));
            }
            Ok(PostPage {
                items: self.posts.clone(),
                pagination: Pagination::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetches_once_and_caches() {
        let source = Arc::new(MemorySource::new(posts(3)));
        let cache = PostCache::new(source.clone(), FetchOptions::default(), 10);
        assert_eq!(cache.state(), CacheState::NotStarted);

        let first = cache.get_corpus().await.unwrap();
        let second = cache.get_corpus().await.unwrap();

        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(cache.state(), CacheState::Ready { posts: 3 });
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let source = Arc::new(FlakySource::new(3, posts(2)));
        let cache = PostCache::new(source.clone(), FetchOptions::default(), 10);

        let corpus = cache.get_corpus().await.unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_exhaustion_fails_then_next_call_refetches() {
        let source = Arc::new(FlakySource::new(10, posts(2)));
        let cache = PostCache::new(source.clone(), FetchOptions::default(), 10);

        let err = cache.get_corpus().await.unwrap_err();
        assert!(matches!(err, SearchError::Fetch { attempts: 10, .. }));
        assert_eq!(source.calls(), 10);
        assert!(matches!(cache.state(), CacheState::Failed { .. }));

        // The source recovers; the next call starts from scratch
        let corpus = cache.get_corpus().await.unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(source.calls(), 11);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let mut source = FlakySource::new(0, posts(4));
        source.delay = Duration::from_millis(20);
        let source = Arc::new(source);
        let cache = Arc::new(PostCache::new(source.clone(), FetchOptions::default(), 10));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_corpus().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 4);
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = Arc::new(MemorySource::new(posts(1)));
        let cache = PostCache::new(source.clone(), FetchOptions::default(), 10);

        cache.get_corpus().await.unwrap();
        cache.invalidate();
        assert_eq!(cache.state(), CacheState::NotStarted);
        cache.get_corpus().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_lightweight_fetch_has_no_bodies() {
        let source = Arc::new(MemorySource::new(
            posts(2).into_iter().map(|p| p.with_html("<p>x</p>")).collect(),
        ));
        let cache = PostCache::new(source, FetchOptions { include_body: false }, 10);
        let corpus = cache.get_corpus().await.unwrap();
        assert!(corpus.iter().all(|p| p.html.is_none()));
    }
}
