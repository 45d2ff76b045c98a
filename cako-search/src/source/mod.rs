//! Post sources: where the search corpus comes from.
//!
//! The engine only sees the `PostSource` trait. Concrete providers read the
//! Ghost Content API, a JSON export on disk, or an in-memory list.

mod file;
mod ghost;
mod memory;

pub use file::JsonFileSource;
pub use ghost::GhostSource;
pub use memory::MemorySource;

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::models::Post;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Page size for a posts request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    All,
    Limit(u32),
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::All => f.write_str("all"),
            PageSize::Limit(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Request rendered `html` along with title, date and slug
    pub include_body: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { include_body: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub items: Vec<Post>,
    pub pagination: Pagination,
}

/// Provider of paged posts. Implementations may fail transiently; retry is the caller's job.
#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self, limit: PageSize, page: u32, options: FetchOptions) -> SourceResult<PostPage>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Ghost response envelope, shared by the HTTP and file sources
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct PostsEnvelope {
    pub(crate) posts: Vec<Post>,
    #[serde(default)]
    pub(crate) meta: Option<EnvelopeMeta>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EnvelopeMeta {
    #[serde(default)]
    pub(crate) pagination: Pagination,
}

impl PostsEnvelope {
    pub(crate) fn into_page(self) -> PostPage {
        PostPage {
            items: self.posts,
            pagination: self.meta.map(|m| m.pagination).unwrap_or_default(),
        }
    }
}

/// Slice one page out of a full post list (pages are 1-based).
pub(crate) fn paginate(posts: &[Post], limit: PageSize, page: u32, options: FetchOptions) -> PostPage {
    let (start, end, next) = match limit {
        PageSize::All => (0, posts.len(), None),
        PageSize::Limit(n) => {
            let n = n.max(1) as usize;
            let start = (page.max(1) as usize - 1).saturating_mul(n).min(posts.len());
            let end = start.saturating_add(n).min(posts.len());
            let next = (end < posts.len()).then(|| page.max(1) + 1);
            (start, end, next)
        }
    };

    let items = posts[start..end]
        .iter()
        .cloned()
        .map(|p| if options.include_body { p } else { p.without_body() })
        .collect();

    PostPage {
        items,
        pagination: Pagination { next },
    }
}
