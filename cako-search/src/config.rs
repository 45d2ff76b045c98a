//! Tunable search parameters.
//!
//! The thresholds were tuned by hand against the blog's posts; they are
//! product knobs, not structural invariants, so they live here instead of in
//! the ranker. Loadable from TOML; every field has a default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::interface::SearchError;
use crate::source::FetchOptions;

/// What to do with posts that pass coarse acceptance but get no strong match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnscoredPolicy {
    /// Keep them, sorted last with rank 0
    #[default]
    IncludeAtZero,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum share of query tokens a post must match to be considered
    pub coarse_threshold: f64,
    /// Token or character share above which a title becomes a strong match
    pub title_threshold: f64,
    pub title_rank_weight: f64,
    /// Rank given to posts whose every token matched the publish date
    pub date_rank: f64,
    /// Target size of a body preview, in words
    pub preview_words: usize,
    pub max_fetch_attempts: u32,
    /// Fetch post bodies; without them only titles and dates are searchable
    pub include_body: bool,
    pub debounce_ms: u64,
    pub unscored: UnscoredPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            coarse_threshold: 0.6,
            title_threshold: 0.7,
            title_rank_weight: 1.4,
            date_rank: 3.0,
            preview_words: 42,
            max_fetch_attempts: 10,
            include_body: true,
            debounce_ms: 150,
            unscored: UnscoredPolicy::IncludeAtZero,
        }
    }
}

impl SearchConfig {
    /// Read a TOML file; missing keys fall back to defaults
    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SearchError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, SearchError> {
        let config: Self = toml::from_str(raw).map_err(|e| SearchError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        let in_unit = |v: f64| v > 0.0 && v <= 1.0;
        if !in_unit(self.coarse_threshold) {
            return Err(SearchError::InvalidConfig(format!(
                "coarse_threshold must be in (0, 1], got {}",
                self.coarse_threshold
            )));
        }
        if !in_unit(self.title_threshold) {
            return Err(SearchError::InvalidConfig(format!(
                "title_threshold must be in (0, 1], got {}",
                self.title_threshold
            )));
        }
        if !(self.title_rank_weight.is_finite() && self.title_rank_weight > 0.0) {
            return Err(SearchError::InvalidConfig("title_rank_weight must be positive".into()));
        }
        if !(self.date_rank.is_finite() && self.date_rank > 0.0) {
            return Err(SearchError::InvalidConfig("date_rank must be positive".into()));
        }
        if self.preview_words == 0 {
            return Err(SearchError::InvalidConfig("preview_words must be at least 1".into()));
        }
        if self.max_fetch_attempts == 0 {
            return Err(SearchError::InvalidConfig("max_fetch_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            include_body: self.include_body,
        }
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
