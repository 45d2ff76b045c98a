//! In-memory post source, used for tests, benchmarks and pre-loaded corpora.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::{paginate, FetchOptions, PageSize, PostPage, PostSource, SourceResult};
use crate::models::Post;

#[derive(Debug, Default)]
pub struct MemorySource {
    posts: Vec<Post>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of `fetch_posts` calls served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PostSource for MemorySource {
    async fn fetch_posts(&self, limit: PageSize, page: u32, options: FetchOptions) -> SourceResult<PostPage> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(paginate(&self.posts, limit, page, options))
    }
}
