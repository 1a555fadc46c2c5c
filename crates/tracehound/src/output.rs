use libtracehound_core::rank::ScoredMatch;

/// Print the best matches, truncated to `limit`
pub fn print_matches(matches: &[ScoredMatch], limit: usize) {
    println!("Displaying best matches:");
    for m in matches.iter().take(limit) {
        println!();
        println!("{}", m.bug.title);
        println!("Url: {}", m.bug.url);
        println!("Score: [{:.3}/1.0]", m.score);
    }
}
