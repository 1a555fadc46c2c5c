//! Profile configuration.
//!
//! A profile is a JSON file naming the local cache profile and the remote
//! bug databases to pull from:
//!
//! ```json
//! {
//!   "profile": "myproject",
//!   "bugdbs": [
//!     { "type": "github", "repo": "me/myproject",
//!       "api_user": "me", "api_password": "token" }
//!   ]
//! }
//! ```

use serde::Deserialize;

use crate::error::TracehoundError;

/// A parsed profile config
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the local cache profile
    pub profile: String,

    /// Remote bug databases to sync from
    #[serde(default)]
    pub bugdbs: Vec<BugDbConfig>,
}

/// Configuration for one remote bug database
#[derive(Debug, Clone, Deserialize)]
pub struct BugDbConfig {
    /// Source type tag, e.g. "github"
    #[serde(rename = "type")]
    pub db_type: String,

    /// Repository path, e.g. "owner/name" (github)
    pub repo: Option<String>,

    /// API username
    pub api_user: Option<String>,

    /// API password or token
    pub api_password: Option<String>,

    /// API host override; each source type supplies its own default
    pub host: Option<String>,
}

impl Config {
    /// Parse a profile config from JSON text
    pub fn from_json(text: &str) -> Result<Self, TracehoundError> {
        serde_json::from_str(text)
            .map_err(|e| TracehoundError::InvalidConfig(format!("malformed profile config: {e}")))
    }
}

/// How `BugCache::open` refreshes from remote sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshMode {
    /// Pull changes since the last successful sync
    #[default]
    Partial,
    /// Re-pull everything, ignoring stored watermarks
    Full,
    /// Skip synchronization, use the cache as-is
    None,
}
