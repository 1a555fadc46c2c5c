//! Orchestration: extract the query tracebacks, open and refresh the bug
//! cache, then rank the cached bugs against the query.

use std::path::PathBuf;

use crate::cache::{BugCache, BugRecord};
use crate::config::{Config, RefreshMode};
use crate::error::TracehoundError;
use crate::rank::{rank, ScoredMatch};
use crate::source::SourceRegistry;
use crate::trace::extract_traces;

/// Options threaded in from the entry point
#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub refresh: RefreshMode,
    /// Directory holding the per-profile caches
    pub data_dir: PathBuf,
}

/// Match `trace_text` against the cached bugs for `config`'s profile,
/// returning the full ranked list (callers truncate for display).
///
/// Fails with `NoTraces` before touching the cache if the input contains
/// no recognizable traceback.
pub fn find_matches(
    trace_text: &str,
    config: &Config,
    options: &MatchOptions,
    registry: &SourceRegistry,
) -> Result<Vec<ScoredMatch>, TracehoundError> {
    let query_traces = extract_traces(trace_text);
    if query_traces.is_empty() {
        return Err(TracehoundError::NoTraces);
    }

    let cache = BugCache::open(
        &options.data_dir,
        &config.profile,
        &config.bugdbs,
        options.refresh,
        registry,
    )?;
    // Collect before closing; the cache flushes on drop if collection fails.
    let bugs: Vec<BugRecord> = cache.bugs().collect::<Result<_, _>>()?;
    cache.close()?;

    Ok(rank(&query_traces, bugs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{BugCache, RecordId};
    use tempfile::tempdir;

    const TB: &str =
        "Traceback (most recent call last):\n  File \"a.py\", line 1\nValueError: x";

    fn options(dir: &std::path::Path) -> MatchOptions {
        MatchOptions {
            refresh: RefreshMode::None,
            data_dir: dir.to_path_buf(),
        }
    }

    fn profile_config() -> Config {
        Config {
            profile: "p".to_string(),
            bugdbs: Vec::new(),
        }
    }

    fn seed_bug(dir: &std::path::Path, native_id: &str, text: &str) {
        let registry = SourceRegistry::new();
        let cache = BugCache::open(dir, "p", &[], RefreshMode::None, &registry).unwrap();
        cache
            .put(&BugRecord {
                id: RecordId::new("github", native_id),
                url: format!("https://example.com/{native_id}"),
                title: format!("bug {native_id}"),
                text: text.to_string(),
            })
            .unwrap();
        cache.close().unwrap();
    }

    #[test]
    fn input_without_traceback_fails_without_touching_cache() {
        let dir = tempdir().unwrap();
        let err = find_matches(
            "nothing to see here",
            &profile_config(),
            &options(dir.path()),
            &SourceRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TracehoundError::NoTraces));
        // No cache was created for the profile
        assert!(!dir.path().join("p").exists());
    }

    #[test]
    fn matches_seeded_bug_exactly() {
        let dir = tempdir().unwrap();
        seed_bug(dir.path(), "7", &format!("some prose\n\n{TB}\n\nmore prose"));
        seed_bug(dir.path(), "8", "no traceback in this one");

        let matches = find_matches(
            TB,
            &profile_config(),
            &options(dir.path()),
            &SourceRegistry::new(),
        )
        .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].bug.id, RecordId::new("github", "7"));
        assert_eq!(matches[0].score, 1.0);
    }
}
