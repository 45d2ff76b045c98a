//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use cako_search::source::{FetchOptions, MemorySource, PageSize, Pagination, PostPage, PostSource, SourceError, SourceResult};
use cako_search::{Post, SearchConfig, SearchStore};

pub fn spring_sale() -> Post {
    Post::new("Spring Sale Event", Utc.with_ymd_and_hms(2023, 3, 15, 0, 0, 0).unwrap(), "spring-sale")
        .with_html("Join us for spring savings up to 50% off")
}

pub fn blog_posts() -> Vec<Post> {
    vec![
        spring_sale(),
        Post::new("Rust Notes", Utc.with_ymd_and_hms(2022, 7, 4, 0, 0, 0).unwrap(), "rust-notes")
            .with_html("<p>Ownership and <em>borrowing</em> explained with examples</p>"),
        Post::new("March Madness Recap", Utc.with_ymd_and_hms(2023, 4, 2, 0, 0, 0).unwrap(), "march-madness")
            .with_html("<p>Brackets, upsets and a sale on jerseys</p>"),
        Post::new("Year in Review", Utc.with_ymd_and_hms(2021, 12, 31, 0, 0, 0).unwrap(), "year-in-review")
            .with_html("<p>We shipped $1,200 worth of stickers</p>"),
    ]
}

pub fn store_with(posts: Vec<Post>) -> SearchStore {
    SearchStore::new(Arc::new(MemorySource::new(posts)), SearchConfig::default()).unwrap()
}

pub fn slugs(results: &cako_search::SearchResults) -> Vec<String> {
    results.results.iter().map(|r| r.post.slug.clone()).collect()
}

/// Fails the first `failures` fetches, sleeping `delay` before each answer
pub struct ScriptedSource {
    pub failures: u32,
    pub delay: Duration,
    pub calls: AtomicU32,
    pub posts: Vec<Post>,
}

impl ScriptedSource {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            failures: 0,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            posts,
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostSource for ScriptedSource {
    async fn fetch_posts(&self, _limit: PageSize, _page: u32, _options: FetchOptions) -> SourceResult<PostPage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if call <= self.failures {
            return Err(SourceError::Status(502));
        }
        Ok(PostPage {
            items: self.posts.clone(),
            pagination: Pagination::default(),
        })
    }
}
