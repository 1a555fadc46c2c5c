//! Similarity ranking.
//!
//! Scores cached bugs by how closely their embedded tracebacks match the
//! query tracebacks, using a longest-common-subsequence character ratio.

use std::cmp::Ordering;

use similar::TextDiff;

use crate::cache::BugRecord;
use crate::trace::{extract_traces, Trace};

/// One ranked bug with its best similarity score
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub bug: BugRecord,
    /// In `[0.0, 1.0]`; `1.0` is an exact sequence match
    pub score: f32,
}

/// Rank `bugs` against the query tracebacks.
///
/// Each bug's own tracebacks are re-extracted from its text; bugs with no
/// extractable traceback are excluded entirely. A bug's score is the
/// maximum similarity over all (query trace, bug trace) pairs. The result
/// is sorted by descending score, ties broken by descending record id so
/// the output is deterministic.
pub fn rank(
    query_traces: &[Trace],
    bugs: impl IntoIterator<Item = BugRecord>,
) -> Vec<ScoredMatch> {
    let mut matches: Vec<ScoredMatch> = Vec::new();

    for bug in bugs {
        let bug_traces = extract_traces(&bug.text);
        if bug_traces.is_empty() {
            continue;
        }

        let mut score = 0.0f32;
        for query in query_traces {
            for bug_trace in &bug_traces {
                score = score.max(similarity(query, bug_trace));
            }
        }
        matches.push(ScoredMatch { bug, score });
    }

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.bug.id.cmp(&a.bug.id))
    });

    matches
}

/// Symmetric similarity ratio between two tracebacks, in `[0.0, 1.0]`:
/// matched characters relative to the combined length
pub fn similarity(a: &Trace, b: &Trace) -> f32 {
    TextDiff::from_chars(a.as_str(), b.as_str()).ratio()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RecordId;
    use crate::trace::extract_trace;

    const TB: &str =
        "Traceback (most recent call last):\n  File \"a.py\", line 1\nValueError: x";

    const OTHER_TB: &str = "Traceback (most recent call last):\n  File \"server.py\", line 42, in handle\n    sock.recv(1024)\nConnectionResetError: [Errno 104] Connection reset by peer\n";

    fn trace(text: &str) -> Trace {
        extract_trace(text).expect("test text contains a traceback")
    }

    fn bug(native_id: &str, text: &str) -> BugRecord {
        BugRecord {
            id: RecordId::new("github", native_id),
            url: format!("https://example.com/{native_id}"),
            title: format!("bug {native_id}"),
            text: text.to_string(),
        }
    }

    #[test]
    fn identical_traces_score_one() {
        let t = trace(TB);
        assert_eq!(similarity(&t, &t), 1.0);
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let a = trace(TB);
        let b = trace(OTHER_TB);
        let ab = similarity(&a, &b);
        let ba = similarity(&b, &a);
        assert_eq!(ab, ba);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn embedded_trace_scores_exact_match() {
        let query = trace(TB);
        let record = bug("1", &format!("some prose\n\n{TB}\n\nmore prose"));
        let matches = rank(&[query], vec![record]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score, 1.0);
    }

    #[test]
    fn bugs_without_traces_are_excluded() {
        let query = trace(TB);
        let matches = rank(
            &[query],
            vec![bug("1", "no traceback here"), bug("2", TB)],
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].bug.id, RecordId::new("github", "2"));
    }

    #[test]
    fn sorted_descending_by_score() {
        let query = trace(TB);
        let near = format!("{TB}\nextra context line");
        let matches = rank(
            &[query],
            vec![bug("1", &near), bug("2", OTHER_TB), bug("3", TB)],
        );
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].bug.id, RecordId::new("github", "3"));
        assert_eq!(matches[0].score, 1.0);
        assert!(matches[0].score >= matches[1].score);
        assert!(matches[1].score >= matches[2].score);
        assert_eq!(matches[2].bug.id, RecordId::new("github", "2"));
    }

    #[test]
    fn ties_break_by_descending_id() {
        let query = trace(TB);
        let matches = rank(&[query], vec![bug("1", TB), bug("3", TB), bug("2", TB)]);
        let ids: Vec<String> = matches.iter().map(|m| m.bug.id.to_string()).collect();
        assert_eq!(ids, vec!["github:3", "github:2", "github:1"]);
    }

    #[test]
    fn best_pair_wins_across_multiple_traces() {
        let query = trace(TB);
        // Bug text carries both an unrelated and an exact traceback
        let record = bug("1", &format!("{OTHER_TB}\n{TB}"));
        let matches = rank(&[query], vec![record]);
        assert_eq!(matches[0].score, 1.0);
    }
}
