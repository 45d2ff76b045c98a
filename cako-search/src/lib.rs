//! cako-search - client-side search over a blog's posts
//!
//! The corpus is fetched once from a [`source::PostSource`] (the Ghost Content
//! API or a JSON export), cached, and searched entirely in memory. Each query
//! is tokenized, matched per field (title, publish date, body), accepted or
//! rejected by coverage thresholds, and refined into a ranked preview with
//! highlight spans.
//!
//! [`SearchStore`] is the entry point for interactive use: it narrows over the
//! previous results while the user keeps typing and drops stale searches.

pub(crate) mod candidate;
pub mod config;
pub mod corpus;
pub mod interface;
pub mod matching;
pub mod models;
pub mod ranking;
pub mod search;
pub mod source;
mod store;
pub mod text;
pub mod trigger;

pub use config::{SearchConfig, UnscoredPolicy};
pub use corpus::{CacheState, PostCache};
pub use interface::*;
pub use models::{Post, Tag};
pub use search::{SearchEngine, SearchSession};
pub use store::SearchStore;
