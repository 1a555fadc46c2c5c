//! Traceback extraction.
//!
//! Recognizes Python-style traceback blocks inside arbitrary text: a
//! `Traceback (most recent call last):` marker, one or more indented frame
//! lines, an optional error line, and any trailing lines up to a blank line.

use std::sync::OnceLock;

use regex::Regex;

/// A recognized traceback block, kept as raw text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace(String);

impl Trace {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn traceback_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // marker line, 1+ indented frame lines, optional non-indented error
        // line, then any remaining lines up to a blank line or end of chunk
        Regex::new(
            r"Traceback \(most recent call last\): *\n(?: +[^\n]*\n)+(?:[^ \n][^\n]*\n?)?(?:[^\n]+\n?)*",
        )
        .expect("traceback pattern is valid")
    })
}

/// Extract any and all tracebacks from `text`, in order of appearance.
///
/// Multiple tracebacks are assumed to be separated by at least one blank
/// line; a chunk containing two tracebacks back to back yields only the
/// first. Never fails; unrecognized chunks are skipped.
pub fn extract_traces(text: &str) -> Vec<Trace> {
    let text = normalize_linebreaks(text);
    text.split("\n\n").filter_map(extract_trace).collect()
}

/// Attempt to extract a single traceback from a chunk of text, discarding
/// any leading context before the marker.
///
/// The chunk must use `\n` line separators only.
pub fn extract_trace(chunk: &str) -> Option<Trace> {
    traceback_re()
        .find(chunk)
        .map(|m| Trace(m.as_str().to_string()))
}

/// Make all line breaks `\n` only
fn normalize_linebreaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
