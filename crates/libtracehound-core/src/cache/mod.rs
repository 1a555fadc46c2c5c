//! Local bug cache.
//!
//! Talks to remote bug databases through [`IssueSource`] implementations and
//! caches normalized records in a per-profile sled database. Two trees back
//! the cache: `bugs` holds one record per issue, `meta` holds the schema
//! version and the per-source sync watermarks.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{BugDbConfig, RefreshMode};
use crate::error::TracehoundError;
use crate::source::SourceRegistry;

/// Schema version written into new caches; a stored mismatch is fatal
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &str = "schema_version";
const WATERMARKS_KEY: &str = "watermarks";

/// Cache-wide identifier for one bug record, scoped by its source type.
///
/// Ordering is lexicographic on `(source_type, native_id)`; the ranker's
/// tie-break depends on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub source_type: String,
    pub native_id: String,
}

impl RecordId {
    pub fn new(source_type: impl Into<String>, native_id: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            native_id: native_id.into(),
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source_type, self.native_id)
    }
}

/// Cached normalized representation of one remote issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugRecord {
    pub id: RecordId,
    pub url: String,
    pub title: String,
    /// Issue description plus all comment bodies, blank-line separated
    pub text: String,
}

/// Per-profile bug store backed by sled.
///
/// Single-writer, single-process; concurrent invocations against the same
/// profile must be prevented by the caller.
#[derive(Debug)]
pub struct BugCache {
    db: sled::Db,
    bugs: sled::Tree,
    meta: sled::Tree,
}

impl BugCache {
    /// Open or create the cache for `profile` under `data_dir`, then refresh
    /// it from the configured sources unless `refresh` is `None`.
    ///
    /// Fails with `CacheVersion` if the stored schema version mismatches,
    /// with `UnsupportedSource` if a config names an unregistered source
    /// type (checked before any network activity), and with `RemoteFetch`
    /// if any source's fetch fails. A failed refresh aborts the whole open;
    /// sources already ingested in the same refresh keep their writes.
    pub fn open(
        data_dir: &Path,
        profile: &str,
        configs: &[BugDbConfig],
        refresh: RefreshMode,
        registry: &SourceRegistry,
    ) -> Result<Self, TracehoundError> {
        std::fs::create_dir_all(data_dir)?;
        let db = sled::open(data_dir.join(profile))?;
        let bugs = db.open_tree("bugs")?;
        let meta = db.open_tree("meta")?;

        let cache = Self { db, bugs, meta };
        cache.init_schema_version()?;

        if refresh == RefreshMode::None {
            debug!("not refreshing any bug dbs due to refresh=none");
        } else {
            // On error the cache is dropped here, releasing the store.
            cache.refresh(configs, refresh, registry)?;
        }

        Ok(cache)
    }

    fn init_schema_version(&self) -> Result<(), TracehoundError> {
        match self.meta.get(SCHEMA_VERSION_KEY)? {
            None => {
                // new cache
                self.meta
                    .insert(SCHEMA_VERSION_KEY, serde_json::to_vec(&SCHEMA_VERSION)?)?;
                Ok(())
            }
            Some(bytes) => {
                let found: u32 = serde_json::from_slice(&bytes)?;
                if found != SCHEMA_VERSION {
                    return Err(TracehoundError::CacheVersion {
                        found,
                        expected: SCHEMA_VERSION,
                    });
                }
                Ok(())
            }
        }
    }

    /// Update from remote databases, as specified by the refresh mode
    fn refresh(
        &self,
        configs: &[BugDbConfig],
        mode: RefreshMode,
        registry: &SourceRegistry,
    ) -> Result<(), TracehoundError> {
        // Bind every config before touching the network; an unknown source
        // type fails the whole refresh up front.
        let sources = registry.bind_all(configs)?;

        let marks = self.watermarks()?;

        let configured: HashSet<String> = sources.iter().map(|s| watermark_key(s.as_ref())).collect();
        for stale in marks.keys().filter(|k| !configured.contains(*k)) {
            warn!(source = %stale, "cached bug source no longer in config; keeping its records");
        }

        // Sources are refreshed one at a time, in config order. Any fetch
        // failure propagates immediately and aborts the remaining sources.
        for source in &sources {
            let wkey = watermark_key(source.as_ref());
            let since = match mode {
                RefreshMode::Full => None,
                _ => marks.get(&wkey).copied(),
            };

            // The watermark is captured before the first page fetch, so
            // issues updated while paginating are re-fetched on the next
            // partial cycle instead of being skipped.
            let now = Utc::now();

            debug!(source = %wkey, since = ?since, "refreshing bug source");
            let issues = source.fetch_since(since)?;

            for issue in issues {
                self.put(&BugRecord {
                    id: RecordId::new(source.source_type(), issue.native_id),
                    url: issue.url,
                    title: issue.title,
                    text: issue.body_text,
                })?;
            }

            self.set_watermark(&wkey, now)?;
        }

        Ok(())
    }

    /// Insert or wholesale-overwrite a record, keyed by its id
    pub fn put(&self, record: &BugRecord) -> Result<(), TracehoundError> {
        self.bugs
            .insert(bug_key(&record.id), serde_json::to_vec(record)?)?;
        Ok(())
    }

    /// Walk all cached bug records. Restartable across independent calls.
    pub fn bugs(&self) -> impl Iterator<Item = Result<BugRecord, TracehoundError>> + '_ {
        self.bugs.iter().map(|entry| {
            let (_, value) = entry?;
            Ok(serde_json::from_slice(&value)?)
        })
    }

    /// Last successful sync instant per source, keyed by `type:source-key`
    pub fn watermarks(&self) -> Result<BTreeMap<String, DateTime<Utc>>, TracehoundError> {
        match self.meta.get(WATERMARKS_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn set_watermark(&self, key: &str, ts: DateTime<Utc>) -> Result<(), TracehoundError> {
        let mut marks = self.watermarks()?;
        marks.insert(key.to_string(), ts);
        self.meta.insert(WATERMARKS_KEY, serde_json::to_vec(&marks)?)?;
        Ok(())
    }

    /// Flush and release the store. Dropping the cache flushes too, so this
    /// runs on every exit path; calling it explicitly surfaces flush errors.
    pub fn close(self) -> Result<(), TracehoundError> {
        self.db.flush()?;
        Ok(())
    }
}

impl Drop for BugCache {
    fn drop(&mut self) {
        let _ = self.db.flush();
    }
}

fn bug_key(id: &RecordId) -> Vec<u8> {
    format!("bug/{}/{}", id.source_type, id.native_id).into_bytes()
}

fn watermark_key(source: &dyn crate::source::IssueSource) -> String {
    format!("{}:{}", source.source_type(), source.key())
}
