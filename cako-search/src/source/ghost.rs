//! Ghost Content API source (`/ghost/api/{version}/content/posts/`)

use std::time::Duration;

use url::Url;

use super::{FetchOptions, PageSize, PostPage, PostSource, PostsEnvelope, SourceError, SourceResult};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_API_VERSION: &str = "v3";

#[derive(Debug, Clone)]
pub struct GhostSource {
    client: reqwest::Client,
    posts_url: Url,
    key: String,
}

impl GhostSource {
    /// `base_url` is the site root, e.g. `https://cako.io`
    pub fn new(base_url: &str, key: impl Into<String>) -> SourceResult<Self> {
        Self::with_version(base_url, key, DEFAULT_API_VERSION)
    }

    pub fn with_version(base_url: &str, key: impl Into<String>, version: &str) -> SourceResult<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let posts_url = base.join(&format!("ghost/api/{}/content/posts/", version))?;

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            posts_url,
            key: key.into(),
        })
    }

    /// Browse URL for one page: title, date and slug, plus `html` when the body is wanted
    pub(crate) fn request_url(&self, limit: PageSize, page: u32, options: FetchOptions) -> Url {
        let mut fields = String::from("title,published_at,slug");
        if options.include_body {
            fields.push_str(",html");
        }

        let mut url = self.posts_url.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.key)
            .append_pair("limit", &limit.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("fields", &fields)
            .append_pair("include", "tags");
        url
    }
}

#[async_trait::async_trait]
impl PostSource for GhostSource {
    async fn fetch_posts(&self, limit: PageSize, page: u32, options: FetchOptions) -> SourceResult<PostPage> {
        let url = self.request_url(limit, page, options);
        tracing::trace!(%limit, page, include_body = options.include_body, "requesting posts");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let envelope: PostsEnvelope = response.json().await?;
        Ok(envelope.into_page())
    }
}
