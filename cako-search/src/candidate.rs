//! Post view with memoized derived text.
//!
//! Every query token is tested against the same post fields, so the
//! normalized forms are computed on first access and reused for the rest of
//! the search. The post is borrowed immutably, so the caches can never go stale.

use std::sync::OnceLock;

use crate::models::Post;
use crate::text::{normalize, strip_numeric_punctuation};

#[derive(Debug)]
pub struct PostCandidate<'a> {
    post: &'a Post,
    title_lower: OnceLock<String>,
    title_numeric: OnceLock<String>,
    body_lower: OnceLock<Option<String>>,
    body_numeric: OnceLock<Option<String>>,
    publish_date: OnceLock<String>,
}

impl<'a> PostCandidate<'a> {
    pub fn new(post: &'a Post) -> Self {
        Self {
            post,
            title_lower: OnceLock::new(),
            title_numeric: OnceLock::new(),
            body_lower: OnceLock::new(),
            body_numeric: OnceLock::new(),
            publish_date: OnceLock::new(),
        }
    }

    pub fn post(&self) -> &'a Post {
        self.post
    }

    /// Lowercased, normalized title
    pub fn title_lower(&self) -> &str {
        self.title_lower.get_or_init(|| normalize(&self.post.title, true))
    }

    /// Normalized title with `$ % ,` removed
    pub fn title_numeric(&self) -> &str {
        self.title_numeric
            .get_or_init(|| strip_numeric_punctuation(self.title_lower()))
    }

    /// Lowercased, normalized body html; `None` for lightweight posts
    pub fn body_lower(&self) -> Option<&str> {
        self.body_lower
            .get_or_init(|| self.post.html.as_deref().map(|html| normalize(html, true)))
            .as_deref()
    }

    pub fn body_numeric(&self) -> Option<&str> {
        self.body_numeric
            .get_or_init(|| self.body_lower().map(strip_numeric_punctuation))
            .as_deref()
    }

    /// `YYYY-MM-DD`
    pub fn publish_date(&self) -> &str {
        self.publish_date.get_or_init(|| self.post.publish_date_iso())
    }
}
