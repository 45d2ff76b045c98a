//! JSON export source: a Ghost `{ "posts": [...] }` envelope or a bare array of posts.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{paginate, FetchOptions, PageSize, PostPage, PostSource, PostsEnvelope, SourceResult};
use crate::models::Post;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PostsFile {
    Envelope(PostsEnvelope),
    Posts(Vec<Post>),
}

impl PostsFile {
    fn into_posts(self) -> Vec<Post> {
        match self {
            PostsFile::Envelope(envelope) => envelope.into_page().items,
            PostsFile::Posts(posts) => posts,
        }
    }
}

/// Reads posts from disk on every fetch; caching is the `PostCache`'s job.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl PostSource for JsonFileSource {
    async fn fetch_posts(&self, limit: PageSize, page: u32, options: FetchOptions) -> SourceResult<PostPage> {
        let bytes = tokio::fs::read(&self.path).await?;
        let posts = serde_json::from_slice::<PostsFile>(&bytes)?.into_posts();
        tracing::trace!(path = %self.path.display(), posts = posts.len(), "read posts file");
        Ok(paginate(&posts, limit, page, options))
    }
}
