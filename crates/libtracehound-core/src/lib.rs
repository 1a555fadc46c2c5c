//! Core library for tracehound.
//!
//! Matches a failure traceback against a locally cached corpus of issue
//! reports pulled from remote bug trackers. Three pieces make up the
//! pipeline: the trace extractor ([`trace`]), the incremental bug cache
//! ([`cache`]) fed by pluggable issue sources ([`source`]), and the
//! similarity ranker ([`rank`]). [`matcher`] composes them.

pub mod cache;
pub mod config;
pub mod error;
pub mod matcher;
pub mod rank;
pub mod source;
pub mod trace;

pub use error::TracehoundError;
