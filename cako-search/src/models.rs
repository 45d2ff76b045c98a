//! Core data models for cako-search
//!
//! `Post` mirrors the subset of a Ghost Content API post the search needs.
//! Posts are owned by the post source and are never mutated by the engine.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Tag reference attached to a post (`include=tags`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A blog post as delivered by a `PostSource`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub slug: String,
    /// Rendered body. Absent when posts were fetched without `html`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Post {
    pub fn new(title: impl Into<String>, published_at: DateTime<Utc>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            published_at,
            slug: slug.into(),
            html: None,
            tags: Vec::new(),
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    /// Publish date as `YYYY-MM-DD` (UTC), the form month matching looks at
    pub fn publish_date_iso(&self) -> String {
        self.published_at.format("%Y-%m-%d").to_string()
    }

    pub fn publish_year(&self) -> i64 {
        i64::from(self.published_at.year())
    }

    pub fn publish_day(&self) -> i64 {
        i64::from(self.published_at.day())
    }

    /// Same post with the body dropped, as a lightweight fetch would return it
    pub(crate) fn without_body(mut self) -> Self {
        self.html = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_post() -> Post {
        Post::new(
            "Spring Sale Event",
            Utc.with_ymd_and_hms(2023, 3, 15, 0, 0, 0).unwrap(),
            "spring-sale",
        )
    }

    #[test]
    fn test_publish_date_parts() {
        let post = sample_post();
        assert_eq!(post.publish_date_iso(), "2023-03-15");
        assert_eq!(post.publish_year(), 2023);
        assert_eq!(post.publish_day(), 15);
    }

    #[test]
    fn test_deserialize_ghost_post() {
        let json = r#"{
            "title": "Hello",
            "published_at": "2021-07-04T18:30:00.000+00:00",
            "slug": "hello",
            "html": "<p>Body</p>",
            "tags": [{"slug": "rust", "name": "Rust", "id": "abc"}],
            "id": "ignored"
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.publish_date_iso(), "2021-07-04");
        assert_eq!(post.html.as_deref(), Some("<p>Body</p>"));
        assert_eq!(post.tags[0].slug, "rust");
    }

    #[test]
    fn test_deserialize_without_body_or_tags() {
        let json = r#"{"title": "T", "published_at": "2020-01-02T00:00:00Z", "slug": "t", "html": null}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert!(post.html.is_none());
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_offset_dates_are_read_as_utc() {
        let json = r#"{"title": "T", "published_at": "2020-01-01T23:30:00-02:00", "slug": "t"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.publish_date_iso(), "2020-01-02");
    }

    #[test]
    fn test_without_body() {
        let post = sample_post().with_html("<p>x</p>").without_body();
        assert!(post.html.is_none());
    }
}
