//! Issue sources.
//!
//! An [`IssueSource`] fetches normalized issue records from one remote bug
//! tracker, walking all result pages internally. Implementations are bound
//! to configs through a [`SourceRegistry`], so unknown source types are
//! rejected before any network activity.

pub mod github;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::BugDbConfig;
use crate::error::TracehoundError;

/// One remote issue, flattened for the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedIssue {
    /// Source-native identifier, e.g. the issue number
    pub native_id: String,
    pub url: String,
    pub title: String,
    /// Description plus all comment bodies, blank-line separated,
    /// in chronological order
    pub body_text: String,
}

/// Paginated issue retrieval for one configured remote source
pub trait IssueSource: std::fmt::Debug {
    /// Source type tag, e.g. "github"
    fn source_type(&self) -> &str;

    /// Identifies this source within its type, e.g. the repository path
    fn key(&self) -> &str;

    /// Fetch all issues updated since `since` (`None` = everything),
    /// aggregated across all result pages in order. A failure on any page
    /// aborts the whole call; there is no partial success at this layer.
    fn fetch_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<NormalizedIssue>, TracehoundError>;
}

/// Builds an [`IssueSource`] from its config entry
pub type SourceFactory =
    Box<dyn Fn(&BugDbConfig) -> Result<Box<dyn IssueSource>, TracehoundError>>;

/// Registry of source-type constructors
pub struct SourceRegistry {
    factories: BTreeMap<String, SourceFactory>,
}

impl SourceRegistry {
    /// Empty registry, no source types
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with all built-in source types
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("github", Box::new(github::GithubSource::from_config));
        registry
    }

    pub fn register(&mut self, source_type: &str, factory: SourceFactory) {
        self.factories.insert(source_type.to_string(), factory);
    }

    /// Bind one config to its source implementation
    pub fn bind(&self, config: &BugDbConfig) -> Result<Box<dyn IssueSource>, TracehoundError> {
        let db_type = config.db_type.trim();
        let factory = self
            .factories
            .get(db_type)
            .ok_or_else(|| TracehoundError::UnsupportedSource(db_type.to_string()))?;
        factory(config)
    }

    /// Bind all configs, in order; any unknown type or malformed config
    /// fails the whole batch
    pub fn bind_all(
        &self,
        configs: &[BugDbConfig],
    ) -> Result<Vec<Box<dyn IssueSource>>, TracehoundError> {
        configs.iter().map(|c| self.bind(c)).collect()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
